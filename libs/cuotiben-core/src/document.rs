//! Printable exam document: a questions page and a matching answers page.

use serde::Serialize;

use crate::answer_key::{option_letter, AnswerKey};
use crate::composer::ComposedExam;
use crate::types::{MatchQuestion, PoemData, QuestionType};

/// Page break between the questions page and the answers page.
pub const PAGE_BREAK: char = '\u{000C}';

const BLANK: &str = "（　　　　　　）";
const CHOICE_BLANK: &str = "（　　）";
const FILL_BLANK: &str = "__________";
const FILL_ANSWER_GAP: &str = "  ";
const SECTION_NUMERALS: [&str; 6] = ["一", "二", "三", "四", "五", "六"];

/// Section heading for a category.
pub fn section_title(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::Pinyin => "读词语，写拼音",
        QuestionType::Dictation => "看拼音，写词语",
        QuestionType::Definition => "选择加点字的正确解释",
        QuestionType::DefinitionMatch => "字义辨析",
        QuestionType::PoemFill => "古诗文默写",
        QuestionType::PoemDefinition => "古诗文字词解释",
    }
}

/// One numbered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBlock {
    pub number: usize,
    pub stem: String,
    /// Extra lines printed under the stem (poem blanks, sub-questions).
    pub lines: Vec<String>,
    /// Lettered options, already formatted ("A. …").
    pub options: Vec<String>,
}

/// Questions of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionSection {
    pub question_type: QuestionType,
    pub heading: String,
    pub questions: Vec<QuestionBlock>,
}

/// One answer line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerLine {
    pub number: usize,
    pub text: String,
}

/// Answers of one category, numbered like the questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSection {
    pub question_type: QuestionType,
    pub heading: String,
    pub answers: Vec<AnswerLine>,
}

/// Two-page exam ready for printing. Empty categories are left out and the
/// remaining sections are numbered consecutively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamDocument {
    pub title: String,
    pub questions: Vec<QuestionSection>,
    pub answers: Vec<AnswerSection>,
}

impl ExamDocument {
    pub fn build(title: &str, exam: &ComposedExam<'_>, key: &AnswerKey) -> Self {
        let mut questions = Vec::new();
        let mut answers = Vec::new();

        for question_type in QuestionType::ALL {
            if exam.len(question_type) == 0 {
                continue;
            }
            let heading = format!(
                "{}、{}",
                SECTION_NUMERALS[questions.len()],
                section_title(question_type)
            );
            questions.push(QuestionSection {
                question_type,
                heading: heading.clone(),
                questions: question_blocks(question_type, exam),
            });
            answers.push(AnswerSection {
                question_type,
                heading,
                answers: answer_lines(question_type, key),
            });
        }

        Self {
            title: title.to_string(),
            questions,
            answers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Plain-text rendering; the two pages are separated by a form feed.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&self.title);
        out.push_str("\n\n");
        for section in &self.questions {
            out.push_str(&section.heading);
            out.push('\n');
            for q in &section.questions {
                out.push_str(&format!("{}. {}\n", q.number, q.stem));
                for line in &q.lines {
                    out.push_str("   ");
                    out.push_str(line);
                    out.push('\n');
                }
                if !q.options.is_empty() {
                    out.push_str("   ");
                    out.push_str(&q.options.join("  "));
                    out.push('\n');
                }
            }
            out.push('\n');
        }

        out.push(PAGE_BREAK);
        out.push_str(&format!("{}（答案）\n\n", self.title));
        for section in &self.answers {
            out.push_str(&section.heading);
            out.push('\n');
            for a in &section.answers {
                out.push_str(&format!("{}. {}\n", a.number, a.text));
            }
            out.push('\n');
        }

        out
    }
}

fn lettered(options: &[String]) -> Vec<String> {
    options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}. {}", option_letter(i as u8), o))
        .collect()
}

fn poem_heading(poem: &PoemData, fallback: &str) -> String {
    let title = if poem.title.is_empty() {
        fallback
    } else {
        &poem.title
    };
    match (poem.dynasty.is_empty(), poem.author.is_empty()) {
        (true, true) => format!("《{}》", title),
        (false, false) => format!("《{}》（{}·{}）", title, poem.dynasty, poem.author),
        (true, false) => format!("《{}》（{}）", title, poem.author),
        (false, true) => format!("《{}》（{}）", title, poem.dynasty),
    }
}

fn question_blocks(question_type: QuestionType, exam: &ComposedExam<'_>) -> Vec<QuestionBlock> {
    let block = |i: usize, stem: String, lines: Vec<String>, options: Vec<String>| QuestionBlock {
        number: i + 1,
        stem,
        lines,
        options,
    };

    match question_type {
        QuestionType::Pinyin => exam
            .pinyin
            .iter()
            .enumerate()
            .map(|(i, e)| block(i, format!("{}{}", e.headword, BLANK), vec![], vec![]))
            .collect(),
        QuestionType::Dictation => exam
            .dictation
            .iter()
            .enumerate()
            .map(|(i, e)| block(i, format!("{}{}", e.pronunciation, BLANK), vec![], vec![]))
            .collect(),
        QuestionType::Definition => exam
            .definition
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let stem = format!(
                    "“{}”中“{}”的意思是{}",
                    item.entry.headword, item.payload.target_char, CHOICE_BLANK
                );
                block(i, stem, vec![], lettered(&item.payload.options))
            })
            .collect(),
        QuestionType::DefinitionMatch => exam
            .definition_match
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let data = item.payload;
                let headword = &item.entry.headword;
                let target = &data.target_char;
                let lines = data
                    .context
                    .iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| format!("语境：{}", c))
                    .collect();
                match &data.question {
                    MatchQuestion::SameAsTarget(q) => block(
                        i,
                        format!(
                            "下列词语中“{}”的意思与“{}”中相同的是{}",
                            target, headword, CHOICE_BLANK
                        ),
                        lines,
                        lettered(&q.options),
                    ),
                    MatchQuestion::SynonymChoice(q) => block(
                        i,
                        format!(
                            "与“{}”中“{}”意思相近的一项是{}",
                            headword, target, CHOICE_BLANK
                        ),
                        lines,
                        lettered(&q.options),
                    ),
                    MatchQuestion::TwoWayCompare { word_a, word_b, .. } => block(
                        i,
                        format!(
                            "“{}”和“{}”中的“{}”意思相同吗？{}",
                            word_a, word_b, target, CHOICE_BLANK
                        ),
                        lines,
                        vec![],
                    ),
                }
            })
            .collect(),
        QuestionType::PoemFill => exam
            .poem_fill
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let lines = item
                    .payload
                    .fill_answers_in_line_order()
                    .into_iter()
                    .map(|a| format!("{}{}{}", a.before, FILL_BLANK, a.after))
                    .collect();
                block(i, poem_heading(item.payload, &item.entry.headword), lines, vec![])
            })
            .collect(),
        QuestionType::PoemDefinition => exam
            .poem_definition
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let lines = item
                    .payload
                    .definition_questions
                    .iter()
                    .enumerate()
                    .flat_map(|(n, q)| {
                        [
                            format!(
                                "（{}）“{}”中“{}”的意思是{}",
                                n + 1,
                                item.payload.line(q.line_index),
                                q.target_char,
                                CHOICE_BLANK
                            ),
                            format!("    {}", lettered(&q.options).join("  ")),
                        ]
                    })
                    .collect();
                block(i, poem_heading(item.payload, &item.entry.headword), lines, vec![])
            })
            .collect(),
    }
}

fn answer_lines(question_type: QuestionType, key: &AnswerKey) -> Vec<AnswerLine> {
    let texts: Vec<String> = match question_type {
        QuestionType::Pinyin | QuestionType::Dictation => {
            let pairs = if question_type == QuestionType::Pinyin {
                &key.pinyin
            } else {
                &key.dictation
            };
            pairs
                .iter()
                .map(|p| format!("{}：{}", p.prompt, p.answer))
                .collect()
        }
        QuestionType::Definition => key.definition.iter().map(|c| c.to_string()).collect(),
        QuestionType::DefinitionMatch => key.definition_match.iter().map(|a| a.to_text()).collect(),
        QuestionType::PoemFill => key
            .poem_fill
            .iter()
            .map(|blanks| blanks.join(FILL_ANSWER_GAP))
            .collect(),
        QuestionType::PoemDefinition => key
            .poem_definition
            .iter()
            .map(|letters| {
                letters
                    .iter()
                    .enumerate()
                    .map(|(n, c)| format!("（{}）{}", n + 1, c))
                    .collect::<String>()
            })
            .collect(),
    };

    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| AnswerLine { number: i + 1, text })
        .collect()
}
