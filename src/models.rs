//! Defines the core data structures used in the resume-contacts application.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One position held, as reported by the language model.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
}

/// One qualification, as reported by the language model.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub graduation_date: String,
}

/// The structured contact record recovered from a document.
///
/// Every field is optional or may be empty, so an all-absent record is the
/// worst possible outcome of an extraction.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExtractedContactInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// When present, shaped `local@domain.tld`.
    pub email: Option<String>,
    /// Starts with `+` when the country code was resolved, otherwise the
    /// untruncated digits.
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    pub summary: Option<String>,
}

/// A candidate record from a single extraction source, prior to reconciliation.
pub(crate) type PartialContact = ExtractedContactInfo;

/// First and last name guessed from the leading line of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NameGuess {
    pub first: Option<String>,
    pub last: Option<String>,
}

/// The reconciled record together with the candidates it was merged from.
#[derive(Serialize, Debug, Clone, Default)]
pub(crate) struct ExtractionReport {
    pub contact: ExtractedContactInfo,
    /// Sources that contributed a candidate ("regex", "ai").
    pub methods_used: Vec<String>,
    pub regex_candidate: PartialContact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_candidate: Option<PartialContact>,
}

/// Represents an input document record read from a JSON batch file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct DocumentRecord {
    /// Caller-side identifier, echoed back untouched.
    pub id: Option<String>,
    /// Text already recovered from the uploaded document or attachment.
    #[serde(default, alias = "raw_text")]
    pub text: String,
    // Allow capturing other fields from the input JSON
    #[serde(flatten)]
    pub other_fields: HashMap<String, serde_json::Value>,
}

/// Represents the final output structure for each record, combining input and results.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ProcessingResult {
    #[serde(flatten)]
    pub document: DocumentRecord,

    /// The reconciled contact record. Absent only when the record was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ExtractedContactInfo>,
    /// A comma-separated list of sources that contributed (convenience field).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_methods: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub extraction_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_record_keeps_extra_fields() {
        let json = r#"{"id": "c-1", "raw_text": "John Doe", "source": "mailbox"}"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("c-1"));
        assert_eq!(record.text, "John Doe");
        assert_eq!(record.other_fields["source"], "mailbox");
    }

    #[test]
    fn test_skipped_flag_omitted_when_false() {
        let result = ProcessingResult {
            document: DocumentRecord {
                id: None,
                text: "x".to_string(),
                other_fields: HashMap::new(),
            },
            contact: Some(ExtractedContactInfo::default()),
            extraction_methods: Some("regex".to_string()),
            extraction_skipped: false,
            extraction_reason: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("extraction_skipped").is_none());
        assert_eq!(value["extraction_methods"], "regex");
    }
}
