/// Errors that can occur while building, registering or resolving labware
#[derive(Debug, thiserror::Error)]
pub enum LabwareError {
    /// The labware type is not present in the registry
    #[error("Unknown labware type: {0}")]
    UnknownLabware(String),

    /// A definition violates a geometry or volume invariant
    #[error("Invalid labware definition '{name}': {reason}")]
    InvalidDefinition {
        /// Labware type name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A string is not a well name at all (e.g. "7A", "A0")
    #[error("Invalid well name: '{0}'")]
    InvalidWellName(String),

    /// A well name that does not exist on the labware
    #[error("Well '{well}' is outside the layout of {labware}")]
    InvalidWellReference {
        /// Well name as written in the input
        well: String,
        /// Labware type whose layout was used
        labware: String,
    },

    /// Error parsing a labware XML document
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Invalid labware document structure
    #[error("Invalid labware document structure: {0}")]
    InvalidStructure(String),

    /// Required XML attribute is missing
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    /// Invalid value for an XML attribute
    #[error("Invalid attribute value: {0}")]
    InvalidAttributeValue(String),
}
