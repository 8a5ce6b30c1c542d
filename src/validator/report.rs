use std::fmt;

use serde::Serialize;

use crate::picklist::PickListEntry;

#[cfg(feature = "colorized_output")]
use console::style;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    Info,
    /// Suspicious, but the run can proceed
    Warning,
    /// The transfer cannot be executed as written
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FindingKind {
    /// A plate type is not registered
    UnknownLabware,
    /// A well lies outside the plate layout
    WellOutsideLayout,
    /// Withdrawals from a well exceed capacity minus dead volume
    VolumeOverdraft,
    /// A source well is missing from the supplied survey
    UnsurveyedWell,
    /// Withdrawals exceed the surveyed volume minus dead volume
    SurveyedVolumeShortfall,
    /// A source plate type is not a source plate, or vice versa
    UsageMismatch,
    /// One plate name is used with several plate types
    InconsistentPlateType,
    /// A volume is not a whole number of drops
    DropVolumeMismatch,
    /// Plates feed each other in a cycle
    TransferCycle,
    /// A survey was supplied but no transfer draws from it
    SurveyUnmatched,
}

impl FindingKind {
    /// Severity findings of this kind are reported with
    pub fn severity(self) -> Severity {
        match self {
            FindingKind::UnknownLabware
            | FindingKind::WellOutsideLayout
            | FindingKind::UsageMismatch
            | FindingKind::InconsistentPlateType => Severity::Error,
            FindingKind::VolumeOverdraft
            | FindingKind::UnsurveyedWell
            | FindingKind::SurveyedVolumeShortfall
            | FindingKind::DropVolumeMismatch
            | FindingKind::TransferCycle => Severity::Warning,
            FindingKind::SurveyUnmatched => Severity::Info,
        }
    }
}

/// Reference to the picklist entry a finding concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntryRef {
    /// Position among validated entries
    pub index: usize,
    /// Zero-based data row in the source file
    pub row: usize,
}

impl From<&PickListEntry> for EntryRef {
    fn from(entry: &PickListEntry) -> Self {
        Self {
            index: entry.index,
            row: entry.row,
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry {} (row {})", self.index, self.row)
    }
}

/// One anomaly found during cross validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Entry concerned, `None` for plate-level findings
    pub entry: Option<EntryRef>,
    /// How serious it is
    pub severity: Severity,
    /// What it is about
    pub kind: FindingKind,
    /// Human-readable explanation
    pub message: String,
}

impl Finding {
    pub(crate) fn new(entry: Option<EntryRef>, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            entry,
            severity: kind.severity(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "{} {:?}: {}", entry, self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Findings of one cross-validation run, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// All findings
    pub findings: Vec<Finding>,
    /// Number of picklist entries checked
    pub entries_checked: usize,
    /// Plate id of the survey used, if any
    pub survey_plate: Option<String>,
}

impl ValidationReport {
    /// Empty report for a picklist of `entries_checked` entries
    pub fn new(entries_checked: usize, survey_plate: Option<String>) -> Self {
        Self {
            findings: Vec::new(),
            entries_checked,
            survey_plate,
        }
    }

    /// Add a finding
    pub fn add(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Whether nothing was found
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Check if any finding is an error
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Check if any finding is a warning
    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Warning)
    }

    /// Count findings of one severity
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Count the number of errors
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Count the number of warnings
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Findings of one kind
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Findings attached to one entry
    pub fn for_entry(&self, index: usize) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |f| f.entry.map(|e| e.index) == Some(index))
    }

    fn verdict(&self) -> &'static str {
        if self.has_errors() {
            "Validation FAILED"
        } else if self.has_warnings() {
            "Validation PASSED with warnings"
        } else {
            "Validation PASSED"
        }
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static INFO: Emoji<'_, '_> = Emoji("ℹ", "[INFO]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();

            output.push_str(&format!("{}\n", style("Picklist Validation Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("==========================").cyan()));
            output.push_str(&format!("{}: {}\n", style("Entries").bold(), self.entries_checked));
            if let Some(plate) = &self.survey_plate {
                output.push_str(&format!("{}: {}\n", style("Survey").bold(), plate));
            }
            output.push('\n');

            if self.findings.is_empty() {
                output.push_str(&format!("[{}] {}\n", OK, style("No findings").green()));
            }
            for finding in &self.findings {
                let (symbol, label) = match finding.severity {
                    Severity::Info => (INFO, style("INFO").cyan().bold()),
                    Severity::Warning => (WARN, style("WARNING").yellow().bold()),
                    Severity::Error => (FAIL, style("ERROR").red().bold()),
                };
                let location = finding
                    .entry
                    .map(|e| format!("{} ", e))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "[{}] {}{:?} - {}: {}\n",
                    symbol, location, finding.kind, label, finding.message
                ));
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} errors, {} warnings, {} info\n",
                style("Summary").bold(),
                style(self.error_count()).red(),
                style(self.warning_count()).yellow(),
                style(self.count(Severity::Info)).cyan()
            ));

            output.push('\n');
            let verdict = if self.has_errors() {
                style(self.verdict()).red().bold()
            } else if self.has_warnings() {
                style(self.verdict()).yellow().bold()
            } else {
                style(self.verdict()).green().bold()
            };
            output.push_str(&format!("{}\n", verdict));

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Picklist Validation Report")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Entries: {}", self.entries_checked)?;
        if let Some(plate) = &self.survey_plate {
            writeln!(f, "Survey: {}", plate)?;
        }
        writeln!(f)?;

        if self.findings.is_empty() {
            writeln!(f, "[✓] No findings")?;
        }
        for finding in &self.findings {
            let symbol = match finding.severity {
                Severity::Info => "ℹ",
                Severity::Warning => "⚠",
                Severity::Error => "✗",
            };
            write!(f, "[{}] ", symbol)?;
            if let Some(entry) = finding.entry {
                write!(f, "{} ", entry)?;
            }
            writeln!(f, "{:?} - {}: {}", finding.kind, finding.severity, finding.message)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} errors, {} warnings, {} info",
            self.error_count(),
            self.warning_count(),
            self.count(Severity::Info)
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.verdict())
    }
}
