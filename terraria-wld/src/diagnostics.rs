use std::fmt;

/// A non-fatal condition observed while decoding (§7 `Inconsistency`).
#[derive(Debug, Clone)]
pub enum Warning {
    SectionDrift { section: &'static str, expected: u64, actual: u64 },
    FooterMismatch { field: &'static str },
    Overread { section: &'static str, by: u64 },
    UnknownTileEntityType(u8),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SectionDrift { section, expected, actual } => write!(
                f,
                "section {section}: stream position {actual} does not match declared pointer {expected}"
            ),
            Warning::FooterMismatch { field } => {
                write!(f, "footer {field} disagrees with the header flag of the same name")
            }
            Warning::Overread { section, by } => {
                write!(f, "read {by} byte(s) past the end of section {section}")
            }
            Warning::UnknownTileEntityType(ty) => {
                write!(f, "unknown tile entity type {ty}, record skipped")
            }
        }
    }
}

/// Collects warnings raised during a single decode call.
///
/// Decoding never aborts because of a warning; callers inspect this sink
/// afterwards (or log each entry as it's pushed, see [`Warnings::push`]).
#[derive(Debug, Clone, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_accumulate_without_limit() {
        let mut warnings = Warnings::new();
        assert!(warnings.is_empty());
        warnings.push(Warning::SectionDrift { section: "chests", expected: 10, actual: 12 });
        warnings.push(Warning::FooterMismatch { field: "title" });
        assert_eq!(warnings.as_slice().len(), 2);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn section_drift_display_names_both_positions() {
        let w = Warning::SectionDrift { section: "tiles", expected: 100, actual: 104 };
        assert_eq!(
            w.to_string(),
            "section tiles: stream position 104 does not match declared pointer 100"
        );
    }
}
