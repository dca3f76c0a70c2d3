//! Exam composition: filter entries and sort them into question categories.
//!
//! Composition is a pure function of `(entries, filter)`. Entries keep their
//! input order inside every category, so callers that pass the collection
//! newest-first get newest-first questions.

use std::collections::{BTreeSet, HashSet};

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::types::{DefinitionData, DefinitionMatchData, Entry, PoemData, QuestionType, TestStatus};

/// Default offset used to turn `createdAt` into a calendar day (UTC+8).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Filter on the `passedAfterRetries` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyMode {
    #[default]
    All,
    HardOnly,
    NormalOnly,
}

impl DifficultyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::HardOnly => "HARD_ONLY",
            Self::NormalOnly => "NORMAL_ONLY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ALL" => Some(Self::All),
            "HARD_ONLY" => Some(Self::HardOnly),
            "NORMAL_ONLY" => Some(Self::NormalOnly),
            _ => None,
        }
    }

    fn matches(self, passed_after_retries: bool) -> bool {
        match self {
            Self::All => true,
            Self::HardOnly => passed_after_retries,
            Self::NormalOnly => !passed_after_retries,
        }
    }
}

/// Which entries take part in an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFilter {
    /// Only entries created on this calendar day; `None` means all dates.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Offset used to compute the calendar day of an entry.
    #[serde(default = "default_offset")]
    pub utc_offset_minutes: i32,
    /// Statuses to include. An empty set disables status filtering.
    #[serde(default)]
    pub test_statuses: BTreeSet<TestStatus>,
    #[serde(default)]
    pub difficulty: DifficultyMode,
}

fn default_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

impl Default for ExamFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ExamFilter {
    /// Filter that lets every entry through.
    pub fn all() -> Self {
        Self {
            date: None,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            test_statuses: BTreeSet::new(),
            difficulty: DifficultyMode::All,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes)
    }

    /// Date, then status, then difficulty. All must hold.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(date) = self.date {
            if entry.created_day(self.offset()) != Some(date) {
                return false;
            }
        }

        if !self.test_statuses.is_empty() && !self.test_statuses.contains(&entry.test_status) {
            return false;
        }

        self.difficulty.matches(entry.passed_after_retries)
    }
}

/// Fixed offset from minutes east of UTC, falling back to UTC when out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// An entry selected for a category, together with the payload that backs it.
#[derive(Debug, Clone)]
pub struct Item<'a, T> {
    pub entry: &'a Entry,
    pub payload: &'a T,
}

impl<T> Serialize for Item<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entry.serialize(serializer)
    }
}

/// Entries sorted into the six question categories.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedExam<'a> {
    pub pinyin: Vec<&'a Entry>,
    pub dictation: Vec<&'a Entry>,
    pub definition: Vec<Item<'a, DefinitionData>>,
    pub definition_match: Vec<Item<'a, DefinitionMatchData>>,
    pub poem_fill: Vec<Item<'a, PoemData>>,
    pub poem_definition: Vec<Item<'a, PoemData>>,
}

impl<'a> ComposedExam<'a> {
    /// Entries of one category, in exam order.
    pub fn entries(&self, question_type: QuestionType) -> Vec<&'a Entry> {
        match question_type {
            QuestionType::Pinyin => self.pinyin.clone(),
            QuestionType::Dictation => self.dictation.clone(),
            QuestionType::Definition => self.definition.iter().map(|i| i.entry).collect(),
            QuestionType::DefinitionMatch => {
                self.definition_match.iter().map(|i| i.entry).collect()
            }
            QuestionType::PoemFill => self.poem_fill.iter().map(|i| i.entry).collect(),
            QuestionType::PoemDefinition => self.poem_definition.iter().map(|i| i.entry).collect(),
        }
    }

    pub fn len(&self, question_type: QuestionType) -> usize {
        match question_type {
            QuestionType::Pinyin => self.pinyin.len(),
            QuestionType::Dictation => self.dictation.len(),
            QuestionType::Definition => self.definition.len(),
            QuestionType::DefinitionMatch => self.definition_match.len(),
            QuestionType::PoemFill => self.poem_fill.len(),
            QuestionType::PoemDefinition => self.poem_definition.len(),
        }
    }

    /// Total number of questions across all categories.
    pub fn question_count(&self) -> usize {
        QuestionType::ALL.iter().map(|t| self.len(*t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.question_count() == 0
    }
}

/// Filter the collection and sort matching entries into categories.
pub fn compose<'a>(entries: &'a [Entry], filter: &ExamFilter) -> ComposedExam<'a> {
    let mut exam = ComposedExam::default();
    let mut seen = HashSet::new();

    for entry in entries {
        if !seen.insert(entry.id) || !filter.matches(entry) {
            continue;
        }

        if entry.is_enabled(QuestionType::Pinyin) {
            exam.pinyin.push(entry);
        }
        if entry.is_enabled(QuestionType::Dictation) {
            exam.dictation.push(entry);
        }
        if entry.is_enabled(QuestionType::Definition) {
            if let Some(payload) = entry.definition_data() {
                exam.definition.push(Item { entry, payload });
            }
        }
        if entry.is_enabled(QuestionType::DefinitionMatch) {
            if let Some(payload) = entry.definition_match_data() {
                if !payload.target_char.trim().is_empty() {
                    exam.definition_match.push(Item { entry, payload });
                }
            }
        }
        if let Some(payload) = entry.poem_data() {
            if entry.is_enabled(QuestionType::PoemFill) && !payload.fill_answers.is_empty() {
                exam.poem_fill.push(Item { entry, payload });
            }
            if entry.is_enabled(QuestionType::PoemDefinition)
                && !payload.definition_questions.is_empty()
            {
                exam.poem_definition.push(Item { entry, payload });
            }
        }
    }

    exam
}

/// Distinct creation days, newest first.
pub fn available_dates(entries: &[Entry], utc_offset_minutes: i32) -> Vec<NaiveDate> {
    let offset = offset_from_minutes(utc_offset_minutes);
    let days: BTreeSet<NaiveDate> = entries.iter().filter_map(|e| e.created_day(offset)).collect();
    days.into_iter().rev().collect()
}
