//! Normalization of raw vision output into the typed extraction model.
//!
//! The capability returns free text that should be JSON; this module is
//! the only place that opinion is enforced. Anything structurally off
//! becomes `ExtractionError::InvalidSchema` here and never travels
//! further down the pipeline.

use scanforge_core::{ExtractedRecord, Extraction, ExtractionHint, UIElement, UISchema};
use serde_json::Value;

use crate::error::ExtractionError;

/// Strip a Markdown code fence if the model wrapped its JSON in one.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Normalize raw capability text into a typed extraction.
pub fn normalize(content: &str, hint: ExtractionHint) -> Result<Extraction, ExtractionError> {
    let body = strip_code_fences(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::InvalidSchema(format!("not valid JSON: {e}")))?;

    match hint {
        ExtractionHint::Form => normalize_ui_schema(value).map(Extraction::UiSchema),
        ExtractionHint::Prescription => {
            normalize_prescription(value).map(Extraction::Prescription)
        }
    }
}

fn normalize_ui_schema(value: Value) -> Result<UISchema, ExtractionError> {
    let object = value
        .as_object()
        .ok_or_else(|| ExtractionError::InvalidSchema("top level is not an object".into()))?;

    let page_type = object
        .get("page_type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ExtractionError::InvalidSchema("missing page_type".into()))?
        .to_string();

    let url_hint = object
        .get("url_hint")
        .and_then(Value::as_str)
        .map(str::to_string);

    let elements = object
        .get("elements")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ExtractionError::InvalidSchema("missing elements array".into()))?;
    if !elements.is_array() {
        return Err(ExtractionError::InvalidSchema(
            "elements is not an array".into(),
        ));
    }
    let elements: Vec<UIElement> = serde_json::from_value(elements.clone())
        .map_err(|e| ExtractionError::InvalidSchema(format!("bad element: {e}")))?;
    if elements.iter().any(|e| e.id.is_empty() || e.kind.is_empty()) {
        return Err(ExtractionError::InvalidSchema(
            "element with empty id or type".into(),
        ));
    }

    Ok(UISchema {
        page_type,
        url_hint,
        elements,
    })
}

fn normalize_prescription(value: Value) -> Result<ExtractedRecord, ExtractionError> {
    let object = value
        .as_object()
        .ok_or_else(|| ExtractionError::InvalidSchema("top level is not an object".into()))?;

    // Either {"medications": [..]} or a bare record object.
    let record_value = if let Some(medications) = object.get("medications") {
        if medications.is_null() || !medications.is_array() {
            return Err(ExtractionError::InvalidSchema(
                "medications is not an array".into(),
            ));
        }
        medications
            .as_array()
            .and_then(|list| list.first())
            .cloned()
            .ok_or_else(|| ExtractionError::InvalidSchema("empty medications array".into()))?
    } else {
        value.clone()
    };

    let record: ExtractedRecord = serde_json::from_value(record_value)
        .map_err(|e| ExtractionError::InvalidSchema(format!("bad medication record: {e}")))?;
    if record.medication_name.trim().is_empty() {
        return Err(ExtractionError::InvalidSchema(
            "missing medication_name".into(),
        ));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_json_unchanged() {
        assert_eq!(strip_code_fences(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_strip_fenced_json() {
        let fenced = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\":1}");
    }

    #[test]
    fn test_ui_schema_normalizes() {
        let raw = r#"{
            "page_type": "login_form",
            "elements": [
                {"id": "user", "type": "text_input", "label": "Username"}
            ]
        }"#;
        let extraction = normalize(raw, ExtractionHint::Form).unwrap();
        let schema = extraction.as_ui_schema().unwrap();
        assert_eq!(schema.page_type, "login_form");
        assert_eq!(schema.elements.len(), 1);
        assert_eq!(schema.elements[0].kind, "text_input");
    }

    #[test]
    fn test_missing_elements_rejected() {
        let raw = r#"{"page_type": "form"}"#;
        assert!(matches!(
            normalize(raw, ExtractionHint::Form),
            Err(ExtractionError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_null_elements_rejected() {
        let raw = r#"{"page_type": "form", "elements": null}"#;
        assert!(matches!(
            normalize(raw, ExtractionHint::Form),
            Err(ExtractionError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_prescription_from_medications_array() {
        let raw = r#"{
            "medications": [
                {"medication_name": "Metformin", "dosage": "500mg", "frequency": "twice daily"}
            ]
        }"#;
        let extraction = normalize(raw, ExtractionHint::Prescription).unwrap();
        let record = extraction.as_prescription().unwrap();
        assert_eq!(record.medication_name, "Metformin");
        assert_eq!(record.dosage.as_deref(), Some("500mg"));
    }

    #[test]
    fn test_prescription_from_bare_record() {
        let raw = r#"{"medication_name": "Lisinopril", "dosage": "10mg"}"#;
        let extraction = normalize(raw, ExtractionHint::Prescription).unwrap();
        assert_eq!(
            extraction.as_prescription().unwrap().medication_name,
            "Lisinopril"
        );
    }

    #[test]
    fn test_empty_medications_rejected() {
        let raw = r#"{"medications": []}"#;
        assert!(matches!(
            normalize(raw, ExtractionHint::Prescription),
            Err(ExtractionError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_non_json_rejected() {
        assert!(matches!(
            normalize("I could not read the image, sorry!", ExtractionHint::Form),
            Err(ExtractionError::InvalidSchema(_))
        ));
    }
}
