//! API server for resume-contacts.

use crate::extractor::ContactExtractor;
use crate::models::{DocumentRecord, ExtractionReport, ProcessingResult};
use crate::processor::process_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use warp::{Filter, Rejection, Reply, http::StatusCode};

/// API response structure
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExtractionReport>,
}

/// Single document request structure
#[derive(Deserialize)]
struct ExtractRequest {
    text: String,
}

/// Batch API request structure
#[derive(Deserialize)]
struct BatchRequest {
    documents: Vec<DocumentRecord>,
}

/// Batch API response structure
#[derive(Serialize)]
struct BatchResponse {
    success: bool,
    message: String,
    results: Vec<ProcessingResult>,
}

/// Builds every route, so tests can drive them without binding a port.
fn routes(
    extractor: Arc<ContactExtractor>,
    max_concurrency: usize,
) -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
    let ai_state = if extractor.ai_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    let extractor_filter = warp::any().map(move || extractor.clone());

    // Limit concurrent requests
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let semaphore_filter = warp::any().map(move || semaphore.clone());

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(move || {
            warp::reply::json(&ApiResponse {
                success: true,
                message: format!("Resume Contacts API is running (AI extraction {})", ai_state),
                result: None,
            })
        });

    // Single document extraction endpoint
    let extract = warp::path("extract")
        .and(warp::post())
        .and(warp::body::json())
        .and(extractor_filter.clone())
        .and(semaphore_filter.clone())
        .and_then(handle_extract);

    // Batch extraction endpoint
    let batch = warp::path("batch")
        .and(warp::post())
        .and(warp::body::json())
        .and(extractor_filter)
        .and(semaphore_filter)
        .and(warp::any().map(move || max_concurrency))
        .and_then(handle_batch);

    health
        .or(extract)
        .or(batch)
        .with(warp::cors().allow_any_origin())
        .recover(handle_rejection)
}

/// Start the API server
pub(crate) async fn start_api_server(
    extractor: Arc<ContactExtractor>,
    port: u16,
    max_concurrency: usize,
) {
    tracing::info!("Starting API server on port {}", port);
    warp::serve(routes(extractor, max_concurrency))
        .run(([0, 0, 0, 0], port))
        .await;
}

/// Handle a single document extraction request
async fn handle_extract(
    request: ExtractRequest,
    extractor: Arc<ContactExtractor>,
    semaphore: Arc<Semaphore>,
) -> Result<impl Reply, Rejection> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| warp::reject::custom(ApiError))?;

    tracing::info!("Processing single extraction request ({} chars)", request.text.len());
    let report = extractor.extract_detailed(&request.text).await;

    Ok(warp::reply::json(&ApiResponse {
        success: true,
        message: "Document processed successfully".to_string(),
        result: Some(report),
    }))
}

/// Handle a batch extraction request
///
/// The batch holds one request permit and fans its documents out over at most
/// `max_concurrency` workers; results keep the request order.
async fn handle_batch(
    batch: BatchRequest,
    extractor: Arc<ContactExtractor>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
) -> Result<impl Reply, Rejection> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| warp::reject::custom(ApiError))?;

    tracing::info!("Processing batch of {} documents", batch.documents.len());

    let results = process_all(extractor, batch.documents, max_concurrency, || {})
        .await
        .map_err(|e| {
            tracing::error!("Batch processing failed: {}", e);
            warp::reject::custom(ApiError)
        })?;

    Ok(warp::reply::json(&BatchResponse {
        success: true,
        message: format!("Processed {} documents", results.len()),
        results,
    }))
}

/// Custom error type for API rejections
#[derive(Debug)]
struct ApiError;

impl warp::reject::Reject for ApiError {}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

/// Handle API rejections
async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if err.find::<ApiError>().is_some() {
        (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        (StatusCode::BAD_REQUEST, "Bad request")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            success: false,
            message: message.to_string(),
        }),
        status,
    ))
}
