//! Prompt templates for the vision capability.
//!
//! Both templates pin the exact JSON keys the normalizer expects; anything
//! else the model adds is rejected at normalization, not at execution.

pub const UI_SCHEMA_PROMPT: &str = r#"Read this image of a form or web page and return ONLY a JSON object, no prose, with this exact shape:
{
  "page_type": "<short label such as login_form, patient_intake, pharmacy_order>",
  "url_hint": "<target URL if visible, else omit>",
  "elements": [
    {
      "id": "<stable identifier, e.g. the field name or a css selector>",
      "type": "<text_input | button | select | checkbox | label | link>",
      "label": "<visible label text>",
      "value": "<current value if visible, else omit>"
    }
  ]
}
Include every fillable field and clickable control you can see. "elements" must always be present as an array."#;

pub const PRESCRIPTION_PROMPT: &str = r#"Read this prescription image and return ONLY a JSON object, no prose, with this exact shape:
{
  "medications": [
    {
      "medication_name": "<drug name>",
      "dosage": "<strength, e.g. 500mg>",
      "frequency": "<e.g. twice daily>",
      "quantity": "<dispensed quantity>",
      "refills": "<number of refills>",
      "instructions": "<sig / directions>",
      "prescriber": "<prescriber name>",
      "date": "<prescription date>"
    }
  ]
}
Omit any field you cannot read. "medications" must always be present as an array with one entry per medication."#;
