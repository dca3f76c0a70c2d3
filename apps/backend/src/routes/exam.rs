//! Exam endpoints

use axum::{
    extract::{Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use cuotiben_core::{compose, ExamDocument};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

const DEFAULT_TITLE: &str = "错题练习";

/// Set to "true" on printed exams without any question.
pub const EXAM_EMPTY_HEADER: &str = "x-exam-empty";

/// GET /api/exam
pub async fn compose_exam(
    State(state): State<AppState>,
    Query(query): Query<ExamQuery>,
) -> Result<Response> {
    let filter = query.to_filter(state.config.exam_utc_offset_minutes)?;
    let entries = state.db.list_entries().await?;

    let exam = compose(&entries, &filter);
    let answers = AnswerKey::derive(&exam);

    tracing::debug!(
        entries = entries.len(),
        questions = exam.question_count(),
        "Composed exam"
    );
    Ok(Json(ExamResponse { exam, answers }).into_response())
}

/// GET /api/exam/print
pub async fn print(
    State(state): State<AppState>,
    Query(query): Query<ExamQuery>,
) -> Result<Response> {
    let filter = query.to_filter(state.config.exam_utc_offset_minutes)?;
    let entries = state.db.list_entries().await?;

    let exam = compose(&entries, &filter);
    let answers = AnswerKey::derive(&exam);

    let title = match (query.title.as_deref(), filter.date) {
        (Some(title), _) if !title.trim().is_empty() => title.trim().to_string(),
        (_, Some(date)) => format!("{} {}", DEFAULT_TITLE, date.format("%Y-%m-%d")),
        _ => DEFAULT_TITLE.to_string(),
    };
    let document = ExamDocument::build(&title, &exam, &answers);
    let empty = if document.is_empty() { "true" } else { "false" };

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (HeaderName::from_static(EXAM_EMPTY_HEADER), empty),
        ],
        document.render_text(),
    )
        .into_response())
}
