//! Language model extraction stage.
//!
//! Sends the cleaned document to the model and maps its JSON answer onto a
//! `PartialContact`. Provider field-name drift (`firstname` vs `firstName`,
//! `experience` vs `workExperience`) is absorbed here so nothing downstream
//! sees it. Every failure degrades to an empty candidate.

use crate::config::Config;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{EducationEntry, ExperienceEntry, PartialContact};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) const EXTRACTION_SYSTEM: &str = "\
You extract contact information from resumes and CVs. \
Respond with a single valid JSON object only: no markdown fences, no explanations. \
Copy email addresses and phone numbers COMPLETELY and EXACTLY as written; never truncate them. \
Always include the international country code for phone numbers when it is written or can be \
determined from the document (for example +351, +44, +1). \
Use null for any field that is not present in the document. Do not invent data.";

pub(crate) const EXTRACTION_PROMPT: &str = r#"Extract the candidate's details from the resume text below.

OUTPUT SCHEMA (return exactly this structure):
{
  "firstName": "string" | null,
  "lastName": "string" | null,
  "email": "string" | null,
  "phone": "string" | null,
  "skills": ["string"],
  "experience": [{"company": "string", "position": "string", "startDate": "string", "endDate": "string" | null, "description": "string"}],
  "education": [{"institution": "string", "degree": "string", "field": "string", "graduationDate": "string"}],
  "summary": "string" | null
}

RESUME TEXT:
{text}"#;

/// Reads a scalar as text: strings as-is, numbers and booleans rendered.
/// Anything else (objects, arrays, null) is treated as absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_text))
}

/// Accepts a list of scalars or a single delimited string (`"Rust, SQL"`).
fn lenient_string_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Option<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(items.into_iter().map(scalar_text).collect()),
        Some(Value::String(joined)) => Some(
            joined
                .split([',', ';', '\n'])
                .map(|s| Some(s.to_string()))
                .collect(),
        ),
        _ => None,
    })
}

/// Accepts an array and drops the elements that do not fit `T`. A non-array
/// value is treated as absent.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawExperience {
    #[serde(deserialize_with = "lenient_string")]
    company: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    position: Option<String>,
    #[serde(rename = "startDate", alias = "start_date", deserialize_with = "lenient_string")]
    start_date: Option<String>,
    #[serde(rename = "endDate", alias = "end_date", deserialize_with = "lenient_string")]
    end_date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEducation {
    #[serde(deserialize_with = "lenient_string")]
    institution: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    degree: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    field: Option<String>,
    #[serde(
        rename = "graduationDate",
        alias = "graduation_date",
        deserialize_with = "lenient_string"
    )]
    graduation_date: Option<String>,
}

/// The model's answer. Both historical spellings are captured separately so a
/// response carrying both does not fail as a duplicate field. Each field is
/// read on its own, so one value of the wrong JSON type only loses that field.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AiResponse {
    #[serde(deserialize_with = "lenient_string")]
    firstname: Option<String>,
    #[serde(rename = "firstName", deserialize_with = "lenient_string")]
    first_name_camel: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    lastname: Option<String>,
    #[serde(rename = "lastName", deserialize_with = "lenient_string")]
    last_name_camel: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    phone: Option<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    skills: Option<Vec<Option<String>>>,
    #[serde(deserialize_with = "lenient_list")]
    experience: Option<Vec<RawExperience>>,
    #[serde(rename = "workExperience", deserialize_with = "lenient_list")]
    work_experience: Option<Vec<RawExperience>>,
    #[serde(deserialize_with = "lenient_list")]
    education: Option<Vec<RawEducation>>,
    #[serde(deserialize_with = "lenient_string")]
    summary: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<RawExperience> for ExperienceEntry {
    fn from(raw: RawExperience) -> Self {
        ExperienceEntry {
            company: non_empty(raw.company).unwrap_or_default(),
            position: non_empty(raw.position).unwrap_or_default(),
            start_date: non_empty(raw.start_date).unwrap_or_default(),
            end_date: non_empty(raw.end_date),
            description: non_empty(raw.description).unwrap_or_default(),
        }
    }
}

impl From<RawEducation> for EducationEntry {
    fn from(raw: RawEducation) -> Self {
        EducationEntry {
            institution: non_empty(raw.institution).unwrap_or_default(),
            degree: non_empty(raw.degree).unwrap_or_default(),
            field: non_empty(raw.field).unwrap_or_default(),
            graduation_date: non_empty(raw.graduation_date).unwrap_or_default(),
        }
    }
}

impl From<AiResponse> for PartialContact {
    fn from(raw: AiResponse) -> Self {
        let experience = match raw.experience {
            Some(entries) if !entries.is_empty() => entries,
            _ => raw.work_experience.unwrap_or_default(),
        };

        PartialContact {
            first_name: non_empty(raw.firstname).or_else(|| non_empty(raw.first_name_camel)),
            last_name: non_empty(raw.lastname).or_else(|| non_empty(raw.last_name_camel)),
            email: non_empty(raw.email),
            phone: non_empty(raw.phone),
            skills: raw
                .skills
                .unwrap_or_default()
                .into_iter()
                .filter_map(non_empty)
                .collect(),
            experience: experience.into_iter().map(ExperienceEntry::from).collect(),
            education: raw
                .education
                .unwrap_or_default()
                .into_iter()
                .map(EducationEntry::from)
                .collect(),
            summary: non_empty(raw.summary),
        }
    }
}

/// Parses the model's JSON answer into a candidate record.
pub(crate) fn parse_ai_response(text: &str) -> Result<PartialContact> {
    let raw: AiResponse = serde_json::from_str(text)?;
    Ok(raw.into())
}

/// Cuts `text` to at most `max_chars` characters without splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Calls the language model for one document.
#[derive(Debug, Clone)]
pub(crate) struct AiExtractor {
    client: LlmClient,
    max_input_chars: usize,
}

impl AiExtractor {
    /// Returns `None` when the AI stage is disabled or no credential is configured.
    pub(crate) fn from_config(config: &Config) -> Result<Option<Self>> {
        if !config.ai_active() {
            return Ok(None);
        }
        Ok(LlmClient::from_config(config)?.map(|client| Self {
            client,
            max_input_chars: config.max_input_chars,
        }))
    }

    async fn try_extract(&self, text: &str) -> Result<PartialContact> {
        let bounded = truncate_chars(text, self.max_input_chars);
        let prompt = EXTRACTION_PROMPT.replace("{text}", bounded);
        let reply = self.client.complete(EXTRACTION_SYSTEM, &prompt).await?;
        parse_ai_response(&reply)
    }

    /// Extracts a candidate record via the model.
    ///
    /// Transport, status and parse failures are logged and turned into an
    /// empty candidate; the caller never sees an error.
    pub(crate) async fn extract_via_ai(&self, text: &str) -> PartialContact {
        match self.try_extract(text).await {
            Ok(candidate) => {
                tracing::debug!(
                    "AI candidate: name={} email={} phone={} skills={} experience={}",
                    candidate.first_name.is_some(),
                    candidate.email.is_some(),
                    candidate.phone.is_some(),
                    candidate.skills.len(),
                    candidate.experience.len()
                );
                candidate
            }
            Err(e) => {
                tracing::warn!("AI extraction failed, continuing with regex signals: {}", e);
                PartialContact::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_lowercase_spelling() {
        let json = r#"{
            "firstname": "John", "lastname": "Doe",
            "email": "john.doe@example.com", "phone": "+351 912 345 678",
            "skills": ["Rust", "SQL", null, " "],
            "experience": [{"company": "Acme", "position": "Engineer", "startDate": "2019-01", "endDate": null, "description": "Built things"}],
            "education": [{"institution": "IST", "degree": "MSc", "field": "CS", "graduationDate": "2018"}],
            "summary": "Backend engineer"
        }"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("John"));
        assert_eq!(contact.last_name.as_deref(), Some("Doe"));
        assert_eq!(contact.skills, vec!["Rust", "SQL"]);
        assert_eq!(contact.experience.len(), 1);
        assert_eq!(contact.experience[0].company, "Acme");
        assert_eq!(contact.experience[0].end_date, None);
        assert_eq!(contact.education[0].graduation_date, "2018");
        assert_eq!(contact.summary.as_deref(), Some("Backend engineer"));
    }

    #[test]
    fn test_parse_camel_case_spelling() {
        let json = r#"{
            "firstName": "Jane", "lastName": "Smith",
            "workExperience": [{"company": "Globex", "position": "Lead", "startDate": "2020", "endDate": "2023", "description": ""}]
        }"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("Jane"));
        assert_eq!(contact.last_name.as_deref(), Some("Smith"));
        assert_eq!(contact.experience[0].position, "Lead");
        assert_eq!(contact.experience[0].end_date.as_deref(), Some("2023"));
        assert!(contact.email.is_none());
        assert!(contact.skills.is_empty());
    }

    #[test]
    fn test_parse_both_spellings_present() {
        let json = r#"{"firstname": "", "firstName": "Ana", "lastname": "Silva", "lastName": "Ignored"}"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("Ana"));
        assert_eq!(contact.last_name.as_deref(), Some("Silva"));
    }

    #[test]
    fn test_parse_nulls_everywhere() {
        let json = r#"{"firstName": null, "skills": null, "experience": null, "education": [{"institution": null}], "summary": null}"#;
        let contact = parse_ai_response(json).unwrap();
        assert!(contact.first_name.is_none());
        assert!(contact.experience.is_empty());
        assert_eq!(contact.education.len(), 1);
        assert_eq!(contact.education[0].institution, "");
    }

    #[test]
    fn test_parse_numeric_phone_keeps_other_fields() {
        let json = r#"{"firstName": "Ana", "phone": 912345678, "skills": ["Rust"], "summary": {"text": "x"}}"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("Ana"));
        assert_eq!(contact.phone.as_deref(), Some("912345678"));
        assert_eq!(contact.skills, vec!["Rust"]);
        assert_eq!(contact.summary, None);
    }

    #[test]
    fn test_parse_skills_as_single_string() {
        let json = r#"{"lastName": "Silva", "skills": "Rust, SQL;  Go\n"}"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.last_name.as_deref(), Some("Silva"));
        assert_eq!(contact.skills, vec!["Rust", "SQL", "Go"]);
    }

    #[test]
    fn test_parse_malformed_entries_dropped() {
        let json = r#"{
            "firstName": "Rui",
            "experience": ["Acme 2019-2021", {"company": "Globex", "startDate": 2020}],
            "education": "MSc CS"
        }"#;
        let contact = parse_ai_response(json).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("Rui"));
        assert_eq!(contact.experience.len(), 1);
        assert_eq!(contact.experience[0].company, "Globex");
        assert_eq!(contact.experience[0].start_date, "2020");
        assert!(contact.education.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_ai_response("Sorry, I cannot help with that.").is_err());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ção", 2), "çã");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_disabled_without_key() {
        assert!(AiExtractor::from_config(&Config::default()).unwrap().is_none());
        let config = Config {
            api_key: Some("sk-test".to_string()),
            ai_enabled: false,
            ..Config::default()
        };
        assert!(AiExtractor::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty_candidate() {
        let config = Config {
            api_key: Some("sk-test".to_string()),
            api_url: "http://127.0.0.1:9/v1/messages".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Config::default()
        };
        let extractor = AiExtractor::from_config(&config).unwrap().unwrap();
        let candidate = extractor.extract_via_ai("John Doe john@example.com").await;
        assert_eq!(candidate, PartialContact::default());
    }
}
