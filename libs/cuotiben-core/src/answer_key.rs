//! Answer key derived from a composed exam.

use serde::{Deserialize, Serialize};

use crate::composer::ComposedExam;
use crate::types::MatchQuestion;

/// Letter for an option index (0 -> 'A').
pub fn option_letter(index: u8) -> char {
    char::from(b'A'.saturating_add(index))
}

/// Prompt shown on the question page and the expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairAnswer {
    pub prompt: String,
    pub answer: String,
}

/// Outcome of a two-way comparison question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Holds,
    DoesNotHold,
}

impl Relation {
    pub fn from_same(is_same: bool) -> Self {
        if is_same {
            Self::Holds
        } else {
            Self::DoesNotHold
        }
    }

    /// Label printed on the answer page.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Holds => "相同",
            Self::DoesNotHold => "不同",
        }
    }
}

/// Answer to a discrimination question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchAnswer {
    Letter(char),
    Relation(Relation),
}

impl MatchAnswer {
    pub fn for_question(question: &MatchQuestion) -> Self {
        match question {
            MatchQuestion::SameAsTarget(q) | MatchQuestion::SynonymChoice(q) => {
                Self::Letter(option_letter(q.correct_index))
            }
            MatchQuestion::TwoWayCompare { is_same, .. } => {
                Self::Relation(Relation::from_same(*is_same))
            }
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Letter(c) => c.to_string(),
            Self::Relation(r) => r.label().to_string(),
        }
    }
}

/// Answers for every question of a composed exam, one per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub pinyin: Vec<PairAnswer>,
    pub dictation: Vec<PairAnswer>,
    pub definition: Vec<char>,
    pub definition_match: Vec<MatchAnswer>,
    /// Blank answers of each poem in line order.
    pub poem_fill: Vec<Vec<String>>,
    pub poem_definition: Vec<Vec<char>>,
}

impl AnswerKey {
    /// Derive the key from the composed categories.
    pub fn derive(exam: &ComposedExam<'_>) -> Self {
        Self {
            pinyin: exam
                .pinyin
                .iter()
                .map(|e| PairAnswer {
                    prompt: e.headword.clone(),
                    answer: e.pronunciation.clone(),
                })
                .collect(),
            dictation: exam
                .dictation
                .iter()
                .map(|e| PairAnswer {
                    prompt: e.pronunciation.clone(),
                    answer: e.headword.clone(),
                })
                .collect(),
            definition: exam
                .definition
                .iter()
                .map(|item| option_letter(item.payload.correct_index))
                .collect(),
            definition_match: exam
                .definition_match
                .iter()
                .map(|item| MatchAnswer::for_question(&item.payload.question))
                .collect(),
            poem_fill: exam
                .poem_fill
                .iter()
                .map(|item| {
                    item.payload
                        .fill_answers_in_line_order()
                        .into_iter()
                        .map(|a| a.answer.clone())
                        .collect()
                })
                .collect(),
            poem_definition: exam
                .poem_definition
                .iter()
                .map(|item| {
                    item.payload
                        .definition_questions
                        .iter()
                        .map(|q| option_letter(q.correct_index))
                        .collect()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{compose, ExamFilter};
    use crate::types::{
        ChoiceQuestion, DefinitionData, DefinitionMatchData, Entry, EntryContent, FillAnswer,
        PoemData, PoemDefinitionQuestion, QuestionType,
    };
    use pretty_assertions::assert_eq;

    fn options() -> Vec<String> {
        vec!["甲".into(), "乙".into(), "丙".into(), "丁".into()]
    }

    fn match_entry(question: MatchQuestion) -> Entry {
        let mut entry = Entry::new(
            "若无其事",
            "ruò wú qí shì",
            EntryContent::Word {
                definition_data: None,
                definition_match_data: Some(DefinitionMatchData {
                    target_char: "若".to_string(),
                    context: None,
                    question,
                }),
            },
            0,
        );
        entry.enabled_question_types = [QuestionType::DefinitionMatch].into_iter().collect();
        entry
    }

    fn mixed_entries() -> Vec<Entry> {
        let word = Entry::new(
            "精益求精",
            "jīng yì qiú jīng",
            EntryContent::Word {
                definition_data: Some(DefinitionData {
                    target_char: "益".to_string(),
                    options: options(),
                    correct_index: 2,
                }),
                definition_match_data: None,
            },
            0,
        );
        let poem = Entry::new(
            "登鹳雀楼",
            "王之涣",
            EntryContent::Poem {
                poem_data: Some(PoemData {
                    title: "登鹳雀楼".to_string(),
                    lines: vec![
                        "白日依山尽".to_string(),
                        "黄河入海流".to_string(),
                        "欲穷千里目".to_string(),
                    ],
                    fill_answers: vec![
                        FillAnswer {
                            line_index: 2,
                            before: String::new(),
                            answer: "欲穷千里目".to_string(),
                            after: String::new(),
                        },
                        FillAnswer {
                            line_index: 0,
                            before: String::new(),
                            answer: "白日依山尽".to_string(),
                            after: String::new(),
                        },
                    ],
                    definition_questions: vec![
                        PoemDefinitionQuestion {
                            line_index: 0,
                            target_char: "依".to_string(),
                            options: options(),
                            correct_index: 0,
                        },
                        PoemDefinitionQuestion {
                            line_index: 2,
                            target_char: "穷".to_string(),
                            options: options(),
                            correct_index: 3,
                        },
                    ],
                    ..PoemData::default()
                }),
            },
            0,
        );
        vec![
            word,
            poem,
            match_entry(MatchQuestion::SynonymChoice(ChoiceQuestion {
                options: options(),
                correct_index: 1,
            })),
            match_entry(MatchQuestion::TwoWayCompare {
                word_a: "若无其事".to_string(),
                word_b: "欣喜若狂".to_string(),
                is_same: true,
            }),
        ]
    }

    #[test]
    fn letters_start_at_a() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
    }

    #[test]
    fn pairs_echo_headword_and_pronunciation() {
        let entries = mixed_entries();
        let exam = compose(&entries, &ExamFilter::all());
        let key = AnswerKey::derive(&exam);

        assert_eq!(
            key.pinyin[0],
            PairAnswer {
                prompt: "精益求精".to_string(),
                answer: "jīng yì qiú jīng".to_string(),
            }
        );
        assert_eq!(
            key.dictation[0],
            PairAnswer {
                prompt: "jīng yì qiú jīng".to_string(),
                answer: "精益求精".to_string(),
            }
        );
    }

    #[test]
    fn choice_answers_are_letters() {
        let entries = mixed_entries();
        let key = AnswerKey::derive(&compose(&entries, &ExamFilter::all()));
        assert_eq!(key.definition, vec!['C']);
        assert_eq!(key.definition_match[0], MatchAnswer::Letter('B'));
        assert_eq!(key.poem_definition, vec![vec!['A', 'D']]);
    }

    #[test]
    fn two_way_compare_answers_with_relation() {
        let entries = mixed_entries();
        let key = AnswerKey::derive(&compose(&entries, &ExamFilter::all()));
        assert_eq!(key.definition_match[1], MatchAnswer::Relation(Relation::Holds));
        assert_eq!(key.definition_match[1].to_text(), "相同");

        let different = MatchAnswer::for_question(&MatchQuestion::TwoWayCompare {
            word_a: String::new(),
            word_b: String::new(),
            is_same: false,
        });
        assert_eq!(different, MatchAnswer::Relation(Relation::DoesNotHold));
    }

    #[test]
    fn poem_fill_keeps_blanks_in_line_order() {
        let entries = mixed_entries();
        let key = AnswerKey::derive(&compose(&entries, &ExamFilter::all()));
        assert_eq!(
            key.poem_fill,
            vec![vec!["白日依山尽".to_string(), "欲穷千里目".to_string()]]
        );
    }

    #[test]
    fn key_lengths_match_question_lists() {
        let entries = mixed_entries();
        let exam = compose(&entries, &ExamFilter::all());
        let key = AnswerKey::derive(&exam);

        assert_eq!(key.pinyin.len(), exam.len(QuestionType::Pinyin));
        assert_eq!(key.dictation.len(), exam.len(QuestionType::Dictation));
        assert_eq!(key.definition.len(), exam.len(QuestionType::Definition));
        assert_eq!(key.definition_match.len(), exam.len(QuestionType::DefinitionMatch));
        assert_eq!(key.poem_fill.len(), exam.len(QuestionType::PoemFill));
        assert_eq!(key.poem_definition.len(), exam.len(QuestionType::PoemDefinition));
    }

    #[test]
    fn empty_exam_has_empty_key() {
        let key = AnswerKey::derive(&compose(&[], &ExamFilter::all()));
        assert_eq!(key, AnswerKey::default());
    }
}
