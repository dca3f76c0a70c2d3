//! Database models and API types

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, Result};

// Re-export shared types from cuotiben-core
pub use cuotiben_core::types::{
    DefinitionData, DefinitionMatchData, Entry, EntryContent, EntryKind, PoemData, QuestionType,
    TestStatus,
};
pub use cuotiben_core::{
    AnswerKey, ComposedExam, DifficultyMode, Draft, DraftSummary, ExamFilter, OcrResult,
    PoemAnalysis, WordAnalysis,
};

// === Database Entity Types ===

/// Entry stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbEntry {
    pub id: Uuid,
    pub kind: String,
    pub headword: String,
    pub pronunciation: String,
    pub created_at: i64,
    pub definition_data: Option<Json<DefinitionData>>,
    pub definition_match_data: Option<Json<DefinitionMatchData>>,
    pub poem_data: Option<Json<PoemData>>,
    pub enabled_question_types: Vec<String>,
    pub test_status: String,
    pub passed_after_retries: bool,
    pub updated_at: DateTime<Utc>,
}

impl DbEntry {
    /// Convert to the shared entry type
    pub fn to_entry(&self) -> Result<Entry> {
        let kind = EntryKind::parse(&self.kind)
            .ok_or_else(|| ApiError::Parse(format!("unknown entry kind '{}'", self.kind)))?;

        let content = match kind {
            EntryKind::Word => EntryContent::Word {
                definition_data: self.definition_data.as_ref().map(|j| j.0.clone()),
                definition_match_data: self.definition_match_data.as_ref().map(|j| j.0.clone()),
            },
            EntryKind::Poem => EntryContent::Poem {
                poem_data: self.poem_data.as_ref().map(|j| j.0.clone()),
            },
        };

        let enabled_question_types = self
            .enabled_question_types
            .iter()
            .map(|t| {
                QuestionType::parse(t)
                    .ok_or_else(|| ApiError::Parse(format!("unknown question type '{}'", t)))
            })
            .collect::<Result<BTreeSet<_>>>()?;

        let test_status = TestStatus::parse(&self.test_status).ok_or_else(|| {
            ApiError::Parse(format!("unknown test status '{}'", self.test_status))
        })?;

        Ok(Entry {
            id: self.id,
            content,
            headword: self.headword.clone(),
            pronunciation: self.pronunciation.clone(),
            created_at: self.created_at,
            enabled_question_types,
            test_status,
            passed_after_retries: self.passed_after_retries,
        })
    }
}

/// Question type tags as stored in the `enabled_question_types` column
pub fn question_type_names(entry: &Entry) -> Vec<String> {
    entry
        .enabled_question_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

// === Entry API Types ===

/// Body of POST /api/entries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    #[serde(flatten)]
    pub content: EntryContent,
    pub headword: String,
    #[serde(default)]
    pub pronunciation: String,
    pub created_at: Option<i64>,
    pub enabled_question_types: Option<BTreeSet<QuestionType>>,
    pub test_status: Option<TestStatus>,
    #[serde(default)]
    pub passed_after_retries: bool,
}

impl CreateEntryRequest {
    pub fn into_entry(self, now_ms: i64) -> Result<Entry> {
        let mut entry = Entry::new(
            self.headword.trim(),
            self.pronunciation.trim(),
            self.content,
            self.created_at.unwrap_or(now_ms),
        );
        if let Some(types) = self.enabled_question_types {
            entry.enabled_question_types = types;
        }
        if let Some(status) = self.test_status {
            entry.test_status = status;
        }
        entry.passed_after_retries = self.passed_after_retries;
        entry.validate()?;
        Ok(entry)
    }
}

/// Body of PATCH /api/entries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub headword: Option<String>,
    pub pronunciation: Option<String>,
    pub enabled_question_types: Option<BTreeSet<QuestionType>>,
    pub test_status: Option<TestStatus>,
    pub passed_after_retries: Option<bool>,
    pub definition_data: Option<DefinitionData>,
    pub definition_match_data: Option<DefinitionMatchData>,
    pub poem_data: Option<PoemData>,
}

impl UpdateEntryRequest {
    /// Apply the fields that are present.
    ///
    /// A status change goes through [`Entry::mark`] so the hard flag is kept
    /// up to date; an explicit `passedAfterRetries` wins over it.
    pub fn apply(self, entry: &mut Entry) -> Result<()> {
        if let Some(headword) = self.headword {
            entry.headword = headword.trim().to_string();
        }
        if let Some(pronunciation) = self.pronunciation {
            entry.pronunciation = pronunciation.trim().to_string();
        }
        if let Some(types) = self.enabled_question_types {
            entry.enabled_question_types = types;
        }
        if let Some(status) = self.test_status {
            entry.mark(status);
        }
        if let Some(flag) = self.passed_after_retries {
            entry.passed_after_retries = flag;
        }

        match &mut entry.content {
            EntryContent::Word {
                definition_data,
                definition_match_data,
            } => {
                if self.poem_data.is_some() {
                    return Err(ApiError::BadRequest(
                        "poemData cannot be set on a word entry".to_string(),
                    ));
                }
                if let Some(data) = self.definition_data {
                    *definition_data = Some(data);
                }
                if let Some(data) = self.definition_match_data {
                    *definition_match_data = Some(data);
                }
            }
            EntryContent::Poem { poem_data } => {
                if self.definition_data.is_some() || self.definition_match_data.is_some() {
                    return Err(ApiError::BadRequest(
                        "word payloads cannot be set on a poem entry".to_string(),
                    ));
                }
                if let Some(data) = self.poem_data {
                    *poem_data = Some(data);
                }
            }
        }

        entry.validate()?;
        Ok(())
    }
}

/// `?id=` query of single-entry endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EntryIdQuery {
    pub id: Uuid,
}

/// Body of POST /api/entries/status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    pub ids: Vec<Uuid>,
    pub test_status: TestStatus,
}

/// Number of rows touched by a write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedResponse {
    pub affected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesResponse {
    pub dates: Vec<NaiveDate>,
}

// === Exam API Types ===

/// Query of GET /api/exam and GET /api/exam/print
///
/// `status` is a comma separated list; missing or empty means every status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamQuery {
    pub date: Option<String>,
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub title: Option<String>,
}

impl ExamQuery {
    pub fn to_filter(&self, utc_offset_minutes: i32) -> Result<ExamFilter> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| ApiError::Parse(format!("invalid date '{}'", s)))?,
            ),
            _ => None,
        };

        let test_statuses = self
            .status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                TestStatus::parse(s)
                    .ok_or_else(|| ApiError::Parse(format!("invalid status '{}'", s)))
            })
            .collect::<Result<BTreeSet<_>>>()?;

        let difficulty = match self.difficulty.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => DifficultyMode::parse(s)
                .ok_or_else(|| ApiError::Parse(format!("invalid difficulty '{}'", s)))?,
            _ => DifficultyMode::All,
        };

        Ok(ExamFilter {
            date,
            utc_offset_minutes,
            test_statuses,
            difficulty,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExamResponse<'a> {
    pub exam: ComposedExam<'a>,
    pub answers: AnswerKey,
}

// === Analysis and Import API Types ===

/// Body of POST /api/analyze
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AnalyzeRequest {
    #[serde(rename = "batch-words")]
    BatchWords { words: Vec<String> },
    #[serde(rename = "poem")]
    Poem { text: String },
    #[serde(rename = "ocr")]
    Ocr { image: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Words(Vec<WordAnalysis>),
    Poem(PoemAnalysis),
    Recognized { words: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatchRequest {
    pub words: Vec<String>,
}

/// Body of POST /api/import/retry and POST /api/import/commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsRequest {
    pub drafts: Vec<Draft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsResponse {
    pub drafts: Vec<Draft>,
    pub summary: DraftSummary,
}

impl DraftsResponse {
    pub fn new(drafts: Vec<Draft>) -> Self {
        let summary = DraftSummary::of(&drafts);
        Self { drafts, summary }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub entries: Vec<Entry>,
    /// Drafts that were not finished and therefore not saved.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn word_row() -> DbEntry {
        DbEntry {
            id: Uuid::new_v4(),
            kind: "WORD".to_string(),
            headword: "精益求精".to_string(),
            pronunciation: "jīng yì qiú jīng".to_string(),
            created_at: 1_700_000_000_000,
            definition_data: None,
            definition_match_data: None,
            poem_data: None,
            enabled_question_types: vec!["PINYIN".to_string(), "DICTATION".to_string()],
            test_status: "FAILED".to_string(),
            passed_after_retries: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_db_entry_to_entry() {
        let entry = word_row().to_entry().unwrap();
        assert_eq!(entry.kind(), EntryKind::Word);
        assert_eq!(entry.test_status, TestStatus::Failed);
        assert!(entry.is_enabled(QuestionType::Pinyin));
        assert_eq!(question_type_names(&entry), vec!["PINYIN", "DICTATION"]);
    }

    #[test]
    fn test_db_entry_rejects_unknown_values() {
        let mut row = word_row();
        row.test_status = "MAYBE".to_string();
        assert!(matches!(row.to_entry(), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateEntryRequest = serde_json::from_value(json!({
            "kind": "WORD",
            "headword": " 画蛇添足 ",
            "pronunciation": "huà shé tiān zú"
        }))
        .unwrap();

        let entry = request.into_entry(42).unwrap();
        assert_eq!(entry.headword, "画蛇添足");
        assert_eq!(entry.created_at, 42);
        assert_eq!(entry.test_status, TestStatus::Untested);
        assert!(entry.is_enabled(QuestionType::Dictation));
    }

    #[test]
    fn test_update_status_sets_hard_flag() {
        let mut entry = word_row().to_entry().unwrap();
        let update = UpdateEntryRequest {
            test_status: Some(TestStatus::Passed),
            ..Default::default()
        };
        update.apply(&mut entry).unwrap();
        assert_eq!(entry.test_status, TestStatus::Passed);
        assert!(entry.passed_after_retries);
    }

    #[test]
    fn test_update_rejects_poem_payload_on_word() {
        let mut entry = word_row().to_entry().unwrap();
        let update = UpdateEntryRequest {
            poem_data: Some(PoemData::default()),
            ..Default::default()
        };
        assert!(matches!(update.apply(&mut entry), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_exam_query_to_filter() {
        let query = ExamQuery {
            date: Some("2024-03-01".to_string()),
            status: Some("FAILED, UNTESTED".to_string()),
            difficulty: Some("HARD_ONLY".to_string()),
            title: None,
        };
        let filter = query.to_filter(480).unwrap();
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            filter.test_statuses,
            BTreeSet::from([TestStatus::Failed, TestStatus::Untested])
        );
        assert_eq!(filter.difficulty, DifficultyMode::HardOnly);
    }

    #[test]
    fn test_empty_exam_query_filters_nothing() {
        let filter = ExamQuery {
            status: Some(String::new()),
            ..Default::default()
        }
        .to_filter(480)
        .unwrap();
        assert_eq!(filter, ExamFilter::all());
    }

    #[test]
    fn test_exam_query_rejects_bad_values() {
        let bad_date = ExamQuery {
            date: Some("01/03/2024".to_string()),
            ..Default::default()
        };
        assert!(bad_date.to_filter(480).is_err());

        let bad_status = ExamQuery {
            status: Some("FAILED,LOST".to_string()),
            ..Default::default()
        };
        assert!(bad_status.to_filter(480).is_err());
    }

    #[test]
    fn test_analyze_request_tags() {
        let request: AnalyzeRequest =
            serde_json::from_value(json!({"type": "batch-words", "words": ["一", "二"]})).unwrap();
        assert!(matches!(request, AnalyzeRequest::BatchWords { ref words } if words.len() == 2));

        let request: AnalyzeRequest =
            serde_json::from_value(json!({"type": "ocr", "image": "aGVsbG8="})).unwrap();
        assert!(matches!(request, AnalyzeRequest::Ocr { .. }));

        assert!(serde_json::from_value::<AnalyzeRequest>(json!({"type": "essay"})).is_err());
    }
}
