//! Small quick-xml helpers shared by the survey and labware readers.

use std::collections::BTreeMap;

use quick_xml::encoding::Decoder;
use quick_xml::events::BytesStart;

/// Collect every attribute of an element into an ordered map.
///
/// Values are decoded with the reader's encoding and unescaped. Keys are
/// taken verbatim so vendor attribute names survive a read/write cycle
/// unchanged.
pub(crate) fn collect_attributes(
    e: &BytesStart<'_>,
    decoder: Decoder,
) -> Result<BTreeMap<String, String>, quick_xml::Error> {
    let mut attributes = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// Name of an element as an owned string
pub(crate) fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn first_element_attributes(xml: &str) -> BTreeMap<String, String> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    return collect_attributes(&e, reader.decoder()).unwrap()
                }
                Event::Eof => panic!("no element in {}", xml),
                _ => {}
            }
        }
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let attrs = first_element_attributes(r#"<w n="A1" note="A&amp;B &lt;1&gt; &quot;x&quot;"/>"#);
        assert_eq!(attrs.get("n").map(String::as_str), Some("A1"));
        assert_eq!(attrs.get("note").map(String::as_str), Some(r#"A&B <1> "x""#));
    }

    #[test]
    fn test_attribute_keys_are_verbatim() {
        let attrs = first_element_attributes(r#"<plateinfo PlateType="X" usage='SRC'/>"#);
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["PlateType", "usage"]);
    }

    #[test]
    fn test_malformed_entity_is_an_error() {
        let mut reader = Reader::from_str(r#"<w n="A&bogus;1"/>"#);
        let event = reader.read_event().unwrap();
        let Event::Empty(e) = event else {
            panic!("expected an empty element");
        };
        assert!(collect_attributes(&e, reader.decoder()).is_err());
    }
}
