//! AI analysis results and the checks they must pass before becoming entries.
//!
//! The composer trusts payloads to be well formed. Everything produced by a
//! model goes through [`WordAnalysis::sanitize`] or [`PoemAnalysis::into_entry`]
//! first, which drop sub-payloads that break the four-option contract.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::types::{
    ChoiceQuestion, DefinitionData, DefinitionMatchData, Entry, EntryContent, MatchQuestion,
    PoemData, PoemDefinitionQuestion,
};

/// Number of options in every choice question.
pub const OPTION_COUNT: usize = 4;

fn check_choice(field: &'static str, options: &[String], correct_index: u8) -> Result<()> {
    if options.len() != OPTION_COUNT {
        return Err(ValidationError::WrongOptionCount {
            field,
            found: options.len(),
        });
    }
    if usize::from(correct_index) >= OPTION_COUNT {
        return Err(ValidationError::CorrectIndexOutOfRange {
            field,
            index: correct_index,
        });
    }
    Ok(())
}

fn check_target(field: &'static str, target_char: &str) -> Result<()> {
    if target_char.trim().is_empty() {
        return Err(ValidationError::EmptyTargetChar { field });
    }
    Ok(())
}

impl DefinitionData {
    pub fn validate(&self) -> Result<()> {
        check_target("definitionData", &self.target_char)?;
        check_choice("definitionData", &self.options, self.correct_index)
    }
}

impl ChoiceQuestion {
    pub fn validate(&self, field: &'static str) -> Result<()> {
        check_choice(field, &self.options, self.correct_index)
    }
}

impl DefinitionMatchData {
    pub fn validate(&self) -> Result<()> {
        const FIELD: &str = "definitionMatchData";
        check_target(FIELD, &self.target_char)?;
        match &self.question {
            MatchQuestion::SameAsTarget(q) | MatchQuestion::SynonymChoice(q) => q.validate(FIELD),
            MatchQuestion::TwoWayCompare { word_a, word_b, .. } => {
                if word_a.trim().is_empty() || word_b.trim().is_empty() {
                    Err(ValidationError::EmptyComparedWords { field: FIELD })
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl PoemDefinitionQuestion {
    pub fn validate(&self, lines: usize) -> Result<()> {
        const FIELD: &str = "definitionQuestions";
        check_target(FIELD, &self.target_char)?;
        check_choice(FIELD, &self.options, self.correct_index)?;
        if self.line_index >= lines {
            return Err(ValidationError::LineIndexOutOfRange {
                field: FIELD,
                index: self.line_index,
                lines,
            });
        }
        Ok(())
    }
}

impl PoemData {
    /// Drop fill answers and definition questions that do not fit the poem.
    pub fn sanitize(&mut self) -> Vec<ValidationError> {
        let mut dropped = Vec::new();
        let lines = self.lines.len();

        self.fill_answers.retain(|a| {
            if a.line_index >= lines {
                dropped.push(ValidationError::LineIndexOutOfRange {
                    field: "fillAnswers",
                    index: a.line_index,
                    lines,
                });
                false
            } else if a.answer.trim().is_empty() {
                dropped.push(ValidationError::MissingField("fillAnswers.answer"));
                false
            } else {
                true
            }
        });

        self.definition_questions.retain(|q| match q.validate(lines) {
            Ok(()) => true,
            Err(e) => {
                dropped.push(e);
                false
            }
        });

        dropped
    }
}

impl Entry {
    /// Check an entry submitted by a client before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.headword.trim().is_empty() {
            return Err(ValidationError::MissingField("headword"));
        }
        if let Some(data) = self.definition_data() {
            data.validate()?;
        }
        if let Some(data) = self.definition_match_data() {
            data.validate()?;
        }
        if let Some(poem) = self.poem_data() {
            let lines = poem.lines.len();
            for answer in &poem.fill_answers {
                if answer.line_index >= lines {
                    return Err(ValidationError::LineIndexOutOfRange {
                        field: "fillAnswers",
                        index: answer.line_index,
                        lines,
                    });
                }
            }
            for question in &poem.definition_questions {
                question.validate(lines)?;
            }
        }
        Ok(())
    }
}

/// Analysis of one word as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAnalysis {
    pub word: String,
    #[serde(default)]
    pub pinyin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_data: Option<DefinitionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_match_data: Option<DefinitionMatchData>,
}

impl WordAnalysis {
    /// Drop malformed sub-payloads, returning what was dropped.
    pub fn sanitize(&mut self) -> Vec<ValidationError> {
        let mut dropped = Vec::new();
        if let Some(Err(e)) = self.definition_data.as_ref().map(DefinitionData::validate) {
            dropped.push(e);
            self.definition_data = None;
        }
        if let Some(Err(e)) = self
            .definition_match_data
            .as_ref()
            .map(DefinitionMatchData::validate)
        {
            dropped.push(e);
            self.definition_match_data = None;
        }
        dropped
    }

    pub fn into_entry(self, created_at: i64) -> Result<Entry> {
        if self.word.trim().is_empty() {
            return Err(ValidationError::MissingField("word"));
        }
        Ok(Entry::new(
            self.word.trim(),
            self.pinyin.trim(),
            EntryContent::Word {
                definition_data: self.definition_data,
                definition_match_data: self.definition_match_data,
            },
            created_at,
        ))
    }
}

/// Analysis of a poem as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemAnalysis {
    #[serde(flatten)]
    pub poem: PoemData,
}

impl PoemAnalysis {
    /// Fill in missing lines and drop questions that do not fit.
    ///
    /// Lines are split out of `content` when the model left them empty.
    pub fn normalize(&mut self) -> Result<Vec<ValidationError>> {
        let poem = &mut self.poem;
        if poem.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if poem.lines.is_empty() {
            poem.lines = split_lines(&poem.content);
        }
        Ok(poem.sanitize())
    }

    /// Validate and turn the analysis into a poem entry.
    pub fn into_entry(mut self, created_at: i64) -> Result<(Entry, Vec<ValidationError>)> {
        let dropped = self.normalize()?;
        let poem = self.poem;
        let entry = Entry::new(
            poem.title.trim().to_string(),
            poem.author.trim().to_string(),
            EntryContent::Poem {
                poem_data: Some(poem),
            },
            created_at,
        );
        Ok((entry, dropped))
    }
}

/// Split poem text into lines at line breaks and sentence-ending punctuation.
pub fn split_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for c in content.chars() {
        match c {
            '\n' | '\r' => {}
            _ => current.push(c),
        }
        if matches!(c, '\n' | '。' | '！' | '？' | '；') {
            let line = current.trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
            current.clear();
        }
    }
    let line = current.trim().to_string();
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Words recognised in an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub words: Vec<String>,
}

impl OcrResult {
    /// Trimmed, non-empty words in recognition order.
    pub fn cleaned(self) -> Vec<String> {
        self.words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect()
    }
}
