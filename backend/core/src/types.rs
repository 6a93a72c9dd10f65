use serde::{Deserialize, Serialize};

/// One detected form field or readable field on the source image or target page.
/// Immutable once produced by the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIElement {
    pub id: String,
    /// Element vocabulary from the vision capability ("text_input", "button", ...).
    /// Left open; only plan actions are a closed set.
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Bounding-box position of an element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Full structured read of one image or page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UISchema {
    pub page_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_hint: Option<String>,
    pub elements: Vec<UIElement>,
}

/// Canonical structured output of extraction when the source is a prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub medication_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescriber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// What the extraction gateway produced for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extraction {
    UiSchema(UISchema),
    Prescription(ExtractedRecord),
}

impl Extraction {
    /// Prescription records carry PHI and must be encoded before storage.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Extraction::Prescription(_))
    }

    pub fn as_ui_schema(&self) -> Option<&UISchema> {
        match self {
            Extraction::UiSchema(schema) => Some(schema),
            Extraction::Prescription(_) => None,
        }
    }

    pub fn as_prescription(&self) -> Option<&ExtractedRecord> {
        match self {
            Extraction::Prescription(record) => Some(record),
            Extraction::UiSchema(_) => None,
        }
    }
}

/// Which shape the caller expects the extraction to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionHint {
    /// Generic form or page read: produce a `UISchema`.
    #[default]
    Form,
    /// Prescription document: produce an `ExtractedRecord`.
    Prescription,
}
