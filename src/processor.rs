//! Functions for processing document records in batches.

use crate::error::{AppError, Result};
use crate::extractor::ContactExtractor;
use crate::models::{DocumentRecord, ProcessingResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Reads a JSON array of document records from disk.
pub(crate) fn read_documents(path: &Path) -> Result<Vec<DocumentRecord>> {
    let input_data = std::fs::read_to_string(path)?;
    let documents: Vec<DocumentRecord> = serde_json::from_str(&input_data)?;
    Ok(documents)
}

/// Writes processing results to disk as pretty-printed JSON.
pub(crate) fn write_results(path: &Path, results: &[ProcessingResult]) -> Result<()> {
    let output_data = serde_json::to_string_pretty(results)?;
    std::fs::write(path, output_data)?;
    Ok(())
}

/// Processes a single document record into a contact record.
///
/// # Arguments
/// * `extractor` - An Arc-wrapped `ContactExtractor` shared across tasks.
/// * `record` - The input `DocumentRecord`.
///
/// # Returns
/// * `ProcessingResult` containing the original input and the extracted contact.
///   Blank documents are marked as skipped rather than failing.
pub(crate) async fn process_record(
    extractor: Arc<ContactExtractor>,
    record: DocumentRecord,
) -> ProcessingResult {
    let record_id = record.id.as_deref().unwrap_or("Unknown Record").to_string();
    tracing::info!(target: "process_record_task", "[{}] Starting processing ({} chars).", record_id, record.text.len());

    if record.text.trim().is_empty() {
        let reason = "Document text is empty".to_string();
        tracing::warn!(target: "process_record_task", "[{}] Skipping record. Reason: {}", record_id, reason);
        return ProcessingResult {
            document: record,
            contact: None,
            extraction_methods: None,
            extraction_skipped: true,
            extraction_reason: Some(reason),
        };
    }

    let report = extractor.extract_detailed(&record.text).await;
    let contact = report.contact;

    tracing::info!(target: "process_record_task",
        "[{}] Finished processing: email={} phone={} via {}",
        record_id,
        contact.email.is_some(),
        contact.phone.is_some(),
        report.methods_used.join(", ")
    );

    ProcessingResult {
        document: record,
        contact: Some(contact),
        extraction_methods: Some(report.methods_used.join(", ")),
        extraction_skipped: false,
        extraction_reason: None,
    }
}

/// Processes documents concurrently, at most `max_concurrency` at a time.
/// Results keep the input order. `on_done` is called once per finished record.
pub(crate) async fn process_all<F>(
    extractor: Arc<ContactExtractor>,
    documents: Vec<DocumentRecord>,
    max_concurrency: usize,
    on_done: F,
) -> Result<Vec<ProcessingResult>>
where
    F: Fn() + Clone + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = Vec::with_capacity(documents.len());

    for document in documents {
        let extractor_clone = extractor.clone();
        let semaphore_clone = semaphore.clone();
        let on_done_clone = on_done.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore_clone
                .acquire_owned()
                .await
                .map_err(|e| AppError::Task(format!("Semaphore closed: {}", e)))?;
            let result = process_record(extractor_clone, document).await;
            on_done_clone();
            Ok::<_, AppError>(result)
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for joined in futures::future::join_all(tasks).await {
        let result = joined.map_err(|e| AppError::Task(format!("Worker task failed: {}", e)))??;
        results.push(result);
    }
    Ok(results)
}
