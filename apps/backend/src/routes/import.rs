//! Batch import endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use cuotiben_core::batch::prepare_drafts;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::importer::BatchImporter;
use crate::AppState;

fn log_progress(drafts: &[Draft]) {
    let summary = DraftSummary::of(drafts);
    tracing::debug!(
        pending = summary.pending,
        analyzing = summary.analyzing,
        done = summary.done,
        error = summary.error,
        "Import progress"
    );
}

/// POST /api/import/batch
pub async fn batch(
    State(state): State<AppState>,
    Json(payload): Json<ImportBatchRequest>,
) -> Result<Json<DraftsResponse>> {
    let mut drafts = prepare_drafts(&payload.words);
    if drafts.is_empty() {
        return Err(ApiError::BadRequest("words must not be empty".to_string()));
    }

    tracing::info!("Analysing {} words", drafts.len());
    BatchImporter::new(state.gateway.as_ref(), state.config.batch)
        .run(&mut drafts, log_progress)
        .await;

    Ok(Json(DraftsResponse::new(drafts)))
}

/// POST /api/import/retry
pub async fn retry(
    State(state): State<AppState>,
    Json(payload): Json<DraftsRequest>,
) -> Result<Json<DraftsResponse>> {
    let mut drafts = payload.drafts;

    BatchImporter::new(state.gateway.as_ref(), state.config.batch)
        .retry_failed(&mut drafts, log_progress)
        .await;

    Ok(Json(DraftsResponse::new(drafts)))
}

/// POST /api/import/commit
///
/// Saves finished drafts as entries. Drafts that are not done are skipped.
pub async fn commit(
    State(state): State<AppState>,
    Json(payload): Json<DraftsRequest>,
) -> Result<Json<CommitResponse>> {
    let now = Utc::now().timestamp_millis();
    let mut entries = Vec::new();
    let mut skipped = 0;

    for draft in &payload.drafts {
        match draft.to_entry(now) {
            Some(Ok(entry)) => entries.push(entry),
            Some(Err(e)) => {
                tracing::warn!("Skipping draft '{}': {}", draft.word, e);
                skipped += 1;
            }
            None => skipped += 1,
        }
    }

    if !entries.is_empty() {
        state.db.upsert_entries(&entries).await?;
    }

    tracing::info!("Committed {} drafts, skipped {}", entries.len(), skipped);
    Ok(Json(CommitResponse { entries, skipped }))
}
