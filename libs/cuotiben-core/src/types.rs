//! Core types for the study bank.

use std::collections::BTreeSet;

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question category an entry can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Pinyin,
    Dictation,
    Definition,
    DefinitionMatch,
    PoemFill,
    PoemDefinition,
}

impl QuestionType {
    /// All categories in exam order.
    pub const ALL: [QuestionType; 6] = [
        Self::Pinyin,
        Self::Dictation,
        Self::Definition,
        Self::DefinitionMatch,
        Self::PoemFill,
        Self::PoemDefinition,
    ];

    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pinyin => "PINYIN",
            Self::Dictation => "DICTATION",
            Self::Definition => "DEFINITION",
            Self::DefinitionMatch => "DEFINITION_MATCH",
            Self::PoemFill => "POEM_FILL",
            Self::PoemDefinition => "POEM_DEFINITION",
        }
    }

    /// Parse from the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Result of the last test on an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    #[default]
    Untested,
    Failed,
    Passed,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untested => "UNTESTED",
            Self::Failed => "FAILED",
            Self::Passed => "PASSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNTESTED" => Some(Self::Untested),
            "FAILED" => Some(Self::Failed),
            "PASSED" => Some(Self::Passed),
            _ => None,
        }
    }
}

/// Entry kind without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Word,
    Poem,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "WORD",
            Self::Poem => "POEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WORD" => Some(Self::Word),
            "POEM" => Some(Self::Poem),
            _ => None,
        }
    }
}

/// Four-option question on the meaning of one character in the headword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionData {
    pub target_char: String,
    pub options: Vec<String>,
    pub correct_index: u8,
}

/// Options plus the index of the correct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceQuestion {
    pub options: Vec<String>,
    pub correct_index: u8,
}

/// Discrimination question, tagged by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchQuestion {
    /// Which option uses the target character the same way as the headword.
    SameAsTarget(ChoiceQuestion),
    /// Which option is closest in meaning to the target character.
    SynonymChoice(ChoiceQuestion),
    /// Whether the target character means the same thing in both words.
    #[serde(rename_all = "camelCase")]
    TwoWayCompare {
        word_a: String,
        word_b: String,
        is_same: bool,
    },
}

/// Character-meaning discrimination data for a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionMatchData {
    pub target_char: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(flatten)]
    pub question: MatchQuestion,
}

/// One blank of a poem fill-in question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillAnswer {
    pub line_index: usize,
    #[serde(default)]
    pub before: String,
    pub answer: String,
    #[serde(default)]
    pub after: String,
}

/// Character-meaning question tied to a poem line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemDefinitionQuestion {
    pub line_index: usize,
    pub target_char: String,
    pub options: Vec<String>,
    pub correct_index: u8,
}

/// Analysed classical poem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemData {
    pub title: String,
    #[serde(default)]
    pub dynasty: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub fill_answers: Vec<FillAnswer>,
    #[serde(default)]
    pub definition_questions: Vec<PoemDefinitionQuestion>,
}

impl PoemData {
    /// Fill answers ordered by line.
    pub fn fill_answers_in_line_order(&self) -> Vec<&FillAnswer> {
        let mut answers: Vec<&FillAnswer> = self.fill_answers.iter().collect();
        answers.sort_by_key(|a| a.line_index);
        answers
    }

    /// Text of a line, or empty when the index is out of range.
    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Kind-specific payload of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryContent {
    #[serde(rename_all = "camelCase")]
    Word {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition_data: Option<DefinitionData>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition_match_data: Option<DefinitionMatchData>,
    },
    #[serde(rename_all = "camelCase")]
    Poem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        poem_data: Option<PoemData>,
    },
}

impl EntryContent {
    /// A word without any analysis payload.
    pub fn plain_word() -> Self {
        Self::Word {
            definition_data: None,
            definition_match_data: None,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Word { .. } => EntryKind::Word,
            Self::Poem { .. } => EntryKind::Poem,
        }
    }

    /// Question types enabled by default for freshly created entries.
    pub fn default_question_types(&self) -> BTreeSet<QuestionType> {
        let mut types = BTreeSet::new();
        match self {
            Self::Word {
                definition_data,
                definition_match_data,
            } => {
                types.insert(QuestionType::Pinyin);
                types.insert(QuestionType::Dictation);
                if definition_data.is_some() {
                    types.insert(QuestionType::Definition);
                }
                if definition_match_data.is_some() {
                    types.insert(QuestionType::DefinitionMatch);
                }
            }
            Self::Poem { poem_data } => {
                if let Some(poem) = poem_data {
                    if !poem.fill_answers.is_empty() {
                        types.insert(QuestionType::PoemFill);
                    }
                    if !poem.definition_questions.is_empty() {
                        types.insert(QuestionType::PoemDefinition);
                    }
                }
            }
        }
        types
    }
}

/// One word, idiom or poem in the study bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: EntryContent,
    pub headword: String,
    /// Pinyin for words, author for poems.
    #[serde(default)]
    pub pronunciation: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub enabled_question_types: BTreeSet<QuestionType>,
    #[serde(default)]
    pub test_status: TestStatus,
    #[serde(default)]
    pub passed_after_retries: bool,
}

impl Entry {
    /// Create a new untested entry with a fresh ID and default question types.
    pub fn new(
        headword: impl Into<String>,
        pronunciation: impl Into<String>,
        content: EntryContent,
        created_at: i64,
    ) -> Self {
        let enabled_question_types = content.default_question_types();
        Self {
            id: Uuid::new_v4(),
            content,
            headword: headword.into(),
            pronunciation: pronunciation.into(),
            created_at,
            enabled_question_types,
            test_status: TestStatus::Untested,
            passed_after_retries: false,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.content.kind()
    }

    pub fn definition_data(&self) -> Option<&DefinitionData> {
        match &self.content {
            EntryContent::Word {
                definition_data, ..
            } => definition_data.as_ref(),
            EntryContent::Poem { .. } => None,
        }
    }

    pub fn definition_match_data(&self) -> Option<&DefinitionMatchData> {
        match &self.content {
            EntryContent::Word {
                definition_match_data,
                ..
            } => definition_match_data.as_ref(),
            EntryContent::Poem { .. } => None,
        }
    }

    pub fn poem_data(&self) -> Option<&PoemData> {
        match &self.content {
            EntryContent::Poem { poem_data } => poem_data.as_ref(),
            EntryContent::Word { .. } => None,
        }
    }

    pub fn is_enabled(&self, question_type: QuestionType) -> bool {
        self.enabled_question_types.contains(&question_type)
    }

    /// Calendar day of creation in the given offset.
    pub fn created_day(&self, offset: FixedOffset) -> Option<NaiveDate> {
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .map(|t| t.with_timezone(&offset).date_naive())
    }

    /// Record a test result.
    ///
    /// Passing an entry that is currently failed flags it as hard.
    pub fn mark(&mut self, status: TestStatus) {
        if self.test_status == TestStatus::Failed && status == TestStatus::Passed {
            self.passed_after_retries = true;
        }
        self.test_status = status;
    }
}
