//! Aggregated validation.
//!
//! Validators run every check and report all violations at once instead of
//! stopping at the first failure.

use serde::Serialize;

/// One or more validation failures.
///
/// `Display` joins the messages with `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", .violations.join(", "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    /// A single-message failure.
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }
}

/// Collects violation messages while a request is checked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Violations(Vec<String>);

impl Violations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Record `message` when `failed` is true.
    pub fn check(&mut self, failed: bool, message: impl Into<String>) {
        if failed {
            self.push(message);
        }
    }

    /// Record a "cannot be empty" message for blank text.
    ///
    /// Returns the trimmed value when present.
    pub fn require_text<'a>(&mut self, value: Option<&'a str>, field: &str) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.push(format!("{field} cannot be empty"));
                None
            }
        }
    }

    /// Parse an optional enum field, recording `message` when it does not
    /// parse. Blank input counts as absent.
    pub fn parse_optional<T: std::str::FromStr>(
        &mut self,
        value: Option<&str>,
        message: &str,
    ) -> Option<T> {
        let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
        raw.parse().map_or_else(
            |_| {
                self.push(message);
                None
            },
            Some,
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns every recorded message as one [`ValidationError`].
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.0 })
        }
    }
}

/// Length in characters, not bytes.
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PotSize;

    #[test]
    fn test_collects_all_violations() {
        let mut v = Violations::new();
        v.check(true, "First");
        v.check(false, "Skipped");
        v.push("Second");

        let err = v.finish().unwrap_err();
        assert_eq!(err.violations, ["First", "Second"]);
        assert_eq!(err.to_string(), "First, Second");
    }

    #[test]
    fn test_empty_collector_passes() {
        assert!(Violations::new().finish().is_ok());
    }

    #[test]
    fn test_require_text_trims_and_reports_blank() {
        let mut v = Violations::new();
        assert_eq!(v.require_text(Some("  hi "), "Name"), Some("hi"));
        assert_eq!(v.require_text(Some("   "), "Address"), None);
        assert_eq!(v.require_text(None, "Email"), None);
        assert_eq!(
            v.finish().unwrap_err().violations,
            ["Address cannot be empty", "Email cannot be empty"]
        );
    }

    #[test]
    fn test_parse_optional() {
        let mut v = Violations::new();
        assert_eq!(v.parse_optional::<PotSize>(Some("small"), "bad"), Some(PotSize::Small));
        assert_eq!(v.parse_optional::<PotSize>(Some(""), "bad"), None);
        assert!(v.is_empty());
        assert_eq!(v.parse_optional::<PotSize>(Some("giant"), "Invalid pot size value"), None);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_char_len_counts_unicode_scalars() {
        assert_eq!(char_len("čokolada"), 8);
    }
}
