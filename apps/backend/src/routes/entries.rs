//! Entry store endpoints

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use cuotiben_core::available_dates;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/entries
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Entry>>> {
    let entries = state.db.list_entries().await?;
    Ok(Json(entries))
}

/// POST /api/entries
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Entry>)> {
    let entry = payload.into_entry(Utc::now().timestamp_millis())?;
    let entry = state.db.insert_entry(&entry).await?;

    tracing::info!(id = %entry.id, kind = entry.kind().as_str(), "Created entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/entries?id=
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<EntryIdQuery>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<Entry>> {
    let mut entry = state
        .db
        .get_entry(query.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("entry {}", query.id)))?;

    payload.apply(&mut entry)?;
    let entry = state.db.update_entry(&entry).await?;
    Ok(Json(entry))
}

/// DELETE /api/entries?id=
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<EntryIdQuery>,
) -> Result<StatusCode> {
    if !state.db.delete_entry(query.id).await? {
        return Err(ApiError::NotFound(format!("entry {}", query.id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/entries/status
pub async fn update_status(
    State(state): State<AppState>,
    Json(payload): Json<BatchStatusRequest>,
) -> Result<Json<AffectedResponse>> {
    let affected = state
        .db
        .update_status_batch(&payload.ids, payload.test_status)
        .await?;

    tracing::info!(
        "Marked {} entries as {}",
        affected,
        payload.test_status.as_str()
    );
    Ok(Json(AffectedResponse { affected }))
}

/// DELETE /api/entries/all
pub async fn clear(State(state): State<AppState>) -> Result<Json<AffectedResponse>> {
    let affected = state.db.delete_all_entries().await?;
    tracing::warn!("Cleared {} entries", affected);
    Ok(Json(AffectedResponse { affected }))
}

/// GET /api/entries/export
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let entries = state.db.list_entries().await?;
    let filename = format!(
        "attachment; filename=\"cuotiben-{}.json\"",
        Utc::now().format("%Y%m%d")
    );
    Ok(([(header::CONTENT_DISPOSITION, filename)], Json(entries)))
}

/// POST /api/entries/import
///
/// Upserts by id, so importing an export twice leaves the store unchanged.
pub async fn import(
    State(state): State<AppState>,
    Json(entries): Json<Vec<Entry>>,
) -> Result<Json<AffectedResponse>> {
    for entry in &entries {
        entry.validate()?;
    }
    let affected = state.db.upsert_entries(&entries).await?;

    tracing::info!("Imported {} entries", affected);
    Ok(Json(AffectedResponse { affected }))
}

/// GET /api/entries/dates
pub async fn dates(State(state): State<AppState>) -> Result<Json<DatesResponse>> {
    let entries = state.db.list_entries().await?;
    let dates = available_dates(&entries, state.config.exam_utc_offset_minutes);
    Ok(Json(DatesResponse { dates }))
}
