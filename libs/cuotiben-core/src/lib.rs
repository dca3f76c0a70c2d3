//! Core library of the 错题本 study bank.
//!
//! Provides:
//! - Shared types (Entry, QuestionType, TestStatus, payloads)
//! - Exam composition (filter + categorize) and answer-key derivation
//! - Printable exam document model and plain-text rendering
//! - Validation of AI analysis results and draft bookkeeping for batch import

pub mod analysis;
pub mod answer_key;
pub mod batch;
pub mod composer;
pub mod document;
pub mod error;
pub mod matching;
pub mod types;

pub use analysis::{OcrResult, PoemAnalysis, WordAnalysis};
pub use answer_key::{option_letter, AnswerKey, MatchAnswer, PairAnswer, Relation};
pub use batch::{BatchPolicy, Draft, DraftError, DraftStatus, DraftSummary};
pub use composer::{available_dates, compose, ComposedExam, DifficultyMode, ExamFilter};
pub use document::ExamDocument;
pub use error::{Result, ValidationError};
pub use matching::normalize_word;
pub use types::{
    ChoiceQuestion, DefinitionData, DefinitionMatchData, Entry, EntryContent, EntryKind,
    FillAnswer, MatchQuestion, PoemData, PoemDefinitionQuestion, QuestionType, TestStatus,
};
