//! Core logic for turning document text into a reconciled contact record.

use crate::ai::AiExtractor;
use crate::config::Config;
use crate::email::extract_email;
use crate::error::Result;
use crate::models::{ExtractedContactInfo, ExtractionReport, PartialContact};
use crate::name::guess_name;
use crate::normalize::{normalize_text, strip_document_artifacts};
use crate::phone::extract_phone;
use crate::phone_format::{format_phone, normalize_phone};
use crate::reconcile::merge;

/// Runs the extraction pipeline. Holds nothing but the optional model client,
/// so one instance can serve any number of concurrent documents.
#[derive(Debug, Clone)]
pub(crate) struct ContactExtractor {
    ai: Option<AiExtractor>,
}

/// Computes the regex candidate from line-preserving document text.
pub(crate) fn regex_candidate(lines: &str) -> PartialContact {
    let name = guess_name(lines);
    let phone = extract_phone(lines).map(|raw| format_phone(&normalize_phone(&raw)));

    PartialContact {
        first_name: name.first,
        last_name: name.last,
        email: extract_email(lines),
        phone,
        ..PartialContact::default()
    }
}

impl ContactExtractor {
    /// Creates an extractor; the AI stage is wired in only when configured.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let ai = AiExtractor::from_config(config)?;
        if ai.is_some() {
            tracing::info!("AI extraction enabled (model: {})", config.model);
        } else {
            tracing::info!("AI extraction disabled; using regex heuristics only");
        }
        Ok(Self { ai })
    }

    /// An extractor that never calls the language model.
    #[cfg(test)]
    pub(crate) fn regex_only() -> Self {
        Self { ai: None }
    }

    pub(crate) fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }

    /// Extracts a contact record and keeps the candidates it was merged from.
    ///
    /// The regex heuristics finish before the model is called. Never fails.
    pub(crate) async fn extract_detailed(&self, raw: &str) -> ExtractionReport {
        let lines = strip_document_artifacts(raw);
        let regex = regex_candidate(&lines);
        let mut methods_used = vec!["regex".to_string()];
        tracing::debug!(
            "Regex candidate: name={} email={} phone={}",
            regex.first_name.is_some(),
            regex.email.is_some(),
            regex.phone.is_some()
        );

        let ai = match &self.ai {
            Some(ai) => {
                let normalized = normalize_text(raw);
                if normalized.is_empty() {
                    None
                } else {
                    methods_used.push("ai".to_string());
                    Some(ai.extract_via_ai(&normalized).await)
                }
            }
            None => None,
        };

        let contact = merge(&regex, ai.as_ref().unwrap_or(&PartialContact::default()));

        ExtractionReport {
            contact,
            methods_used,
            regex_candidate: regex,
            ai_candidate: ai,
        }
    }

    /// Extracts a contact record from raw document text. Never fails; the worst
    /// outcome is a record with every field absent.
    pub(crate) async fn extract(&self, raw: &str) -> ExtractedContactInfo {
        self.extract_detailed(raw).await.contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scenario_portuguese_mobile() {
        let extractor = ContactExtractor::regex_only();
        let contact = extractor
            .extract("John Doe\nEmail: john.doe@example.com\nMobile: 912345678\n")
            .await;
        assert_eq!(contact.first_name.as_deref(), Some("John"));
        assert_eq!(contact.last_name.as_deref(), Some("Doe"));
        assert_eq!(contact.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+351 912 345 678"));
    }

    #[tokio::test]
    async fn test_scenario_obfuscated_email_uk_phone() {
        let extractor = ContactExtractor::regex_only();
        let contact = extractor
            .extract("Jane Smith (jane (at) example (dot) com) 07123456789")
            .await;
        assert_eq!(contact.email.as_deref(), Some("jane@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+44 7123 456789"));
        assert_eq!(contact.first_name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn test_scenario_no_contact_details() {
        let extractor = ContactExtractor::regex_only();
        let contact = extractor
            .extract("Senior Engineer\nBuilt distributed systems in Rust and Go.\n")
            .await;
        assert_eq!(contact.email, None);
        assert_eq!(contact.phone, None);
    }

    #[tokio::test]
    async fn test_empty_document() {
        let report = ContactExtractor::regex_only().extract_detailed("").await;
        assert_eq!(report.contact, ExtractedContactInfo::default());
        assert_eq!(report.methods_used, vec!["regex"]);
        assert!(report.ai_candidate.is_none());
    }

    #[tokio::test]
    async fn test_pdf_noise_does_not_leak() {
        let raw = "%PDF-1.4\n1 0 obj << /Length 44 >> endobj\nstream\n00351 999 999 999\nendstream\nAna Silva\nana.silva@empresa.pt\nTel: 213 456 789\n%%EOF";
        let contact = ContactExtractor::regex_only().extract(raw).await;
        assert_eq!(contact.first_name.as_deref(), Some("Ana"));
        assert_eq!(contact.last_name.as_deref(), Some("Silva"));
        assert_eq!(contact.email.as_deref(), Some("ana.silva@empresa.pt"));
        assert_eq!(contact.phone.as_deref(), Some("+351 213 456 789"));
    }

    #[tokio::test]
    async fn test_unreachable_model_degrades_to_regex() {
        let config = Config {
            api_key: Some("sk-test".to_string()),
            api_url: "http://127.0.0.1:9/v1/messages".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Config::default()
        };
        let extractor = ContactExtractor::new(&config).unwrap();
        assert!(extractor.ai_enabled());

        let report = extractor
            .extract_detailed("John Doe\nEmail: john.doe@example.com\nMobile: 912345678\n")
            .await;
        assert_eq!(report.methods_used, vec!["regex", "ai"]);
        assert_eq!(report.ai_candidate, Some(PartialContact::default()));

        let contact = report.contact;
        assert_eq!(contact.first_name.as_deref(), Some("John"));
        assert_eq!(contact.last_name.as_deref(), Some("Doe"));
        assert_eq!(contact.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+351 912 345 678"));
        assert!(contact.skills.is_empty());
        assert!(contact.experience.is_empty());
        assert!(contact.education.is_empty());
        assert_eq!(contact.summary, None);
    }

    #[test]
    fn test_no_ai_without_key() {
        let extractor = ContactExtractor::new(&Config::default()).unwrap();
        assert!(!extractor.ai_enabled());
    }
}
