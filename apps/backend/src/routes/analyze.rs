//! AI analysis endpoint

use axum::{extract::State, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::gateway::GatewayError;
use crate::AppState;

/// POST /api/analyze
///
/// Runs one gateway request and returns the validated result. Nothing is
/// stored; clients save results through the entry endpoints.
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    match payload {
        AnalyzeRequest::BatchWords { words } => {
            let words: Vec<String> = words
                .iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
            if words.is_empty() {
                return Err(ApiError::BadRequest("words must not be empty".to_string()));
            }

            let mut results = state.gateway.analyze_words(&words).await?;
            for result in &mut results {
                for e in result.sanitize() {
                    tracing::warn!("Dropped invalid payload for '{}': {}", result.word, e);
                }
            }
            Ok(Json(AnalyzeResponse::Words(results)))
        }
        AnalyzeRequest::Poem { text } => {
            if text.trim().is_empty() {
                return Err(ApiError::BadRequest("text must not be empty".to_string()));
            }

            let mut analysis = state.gateway.analyze_poem(&text).await?;
            let dropped = analysis
                .normalize()
                .map_err(|e| GatewayError::Malformed(e.to_string()))?;
            for e in dropped {
                tracing::warn!("Dropped invalid poem question: {}", e);
            }
            Ok(Json(AnalyzeResponse::Poem(analysis)))
        }
        AnalyzeRequest::Ocr { image } => {
            if image.trim().is_empty() {
                return Err(ApiError::BadRequest("image must not be empty".to_string()));
            }

            let result = state.gateway.recognize_words(&image).await?;
            Ok(Json(AnalyzeResponse::Recognized {
                words: result.cleaned(),
            }))
        }
    }
}
