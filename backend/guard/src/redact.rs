//! Log Redaction
//!
//! Scrubs patient names, contact details, and identifiers from strings
//! prior to logging. One-way: placeholders are not reversible. Dosage
//! numerals are deliberately left intact so redacted logs stay useful
//! for debugging extraction quality.

use regex::Regex;
use std::sync::LazyLock;

static NAME_IN_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<ctx>[Pp]rescribed\s+by|[Pp]atient|[Pp]rescriber|[Dd]octor|[Dd]r\.?|[Mm]rs?\.?|[Mm]s\.?)\s*:?\s+(?P<name>(?:[Dd]r\.?\s+)?[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
    )
    .unwrap()
});
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

/// Redacts recognized PHI patterns in a string.
pub fn redact(input: &str) -> String {
    let mut redacted = input.to_string();

    // Names following a clinical context word ("Patient Jane Doe",
    // "prescribed by Dr. Smith"). The context word itself is kept.
    redacted = NAME_IN_CONTEXT_RE
        .replace_all(&redacted, "$ctx [REDACTED_NAME]")
        .to_string();

    redacted = SSN_RE.replace_all(&redacted, "[REDACTED_SSN]").to_string();
    redacted = TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .to_string();
    redacted = EMAIL_RE
        .replace_all(&redacted, "[REDACTED_EMAIL]")
        .to_string();

    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_name_removed_dosage_kept() {
        let clean = redact("Patient John Doe, Metformin 500mg");
        assert!(!clean.contains("John Doe"));
        assert!(!clean.contains("John"));
        assert!(clean.contains("500mg"));
        assert!(clean.contains("[REDACTED_NAME]"));
    }

    #[test]
    fn test_prescriber_pair_redacted() {
        let clean = redact("Lisinopril 10mg prescribed by Dr. Sarah Chen");
        assert!(!clean.contains("Sarah Chen"));
        assert!(clean.contains("10mg"));
    }

    #[test]
    fn test_phone_and_ssn_redacted() {
        let clean = redact("Call +1-555-123-4567, SSN 123-45-6789");
        assert!(!clean.contains("555-123-4567"));
        assert!(!clean.contains("123-45-6789"));
        assert!(clean.contains("[REDACTED_PHONE]"));
        assert!(clean.contains("[REDACTED_SSN]"));
    }

    #[test]
    fn test_email_redacted() {
        let clean = redact("Contact jane.doe@clinic.example.org for refills");
        assert!(!clean.contains("jane.doe@clinic.example.org"));
        assert!(clean.contains("[REDACTED_EMAIL]"));
    }

    #[test]
    fn test_plain_medication_text_untouched() {
        let text = "Metformin 500mg twice daily with meals";
        assert_eq!(redact(text), text);
    }
}
