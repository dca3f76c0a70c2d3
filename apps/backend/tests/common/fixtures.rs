//! Test fixtures and factory functions for creating test data.

use serde_json::json;

use cuotiben_core::{PoemAnalysis, WordAnalysis};

/// Analysis the scripted gateway returns for any word.
pub fn word_analysis(word: &str) -> WordAnalysis {
    serde_json::from_value(json!({
        "word": word,
        "pinyin": "pīn yīn",
        "definitionData": {
            "targetChar": word.chars().next().map(String::from).unwrap_or_default(),
            "options": ["意思一", "意思二", "意思三", "意思四"],
            "correctIndex": 1
        }
    }))
    .unwrap()
}

/// A short poem with one fill answer and one definition question.
pub fn poem_analysis() -> PoemAnalysis {
    serde_json::from_value(json!({
        "title": "静夜思",
        "dynasty": "唐",
        "author": "李白",
        "content": "床前明月光，疑是地上霜。举头望明月，低头思故乡。",
        "fillAnswers": [
            { "lineIndex": 1, "before": "举头望明月，", "answer": "低头思故乡", "after": "。" }
        ],
        "definitionQuestions": [
            { "lineIndex": 0, "targetChar": "疑", "options": ["怀疑", "好像", "疑问", "迟疑"], "correctIndex": 1 }
        ]
    }))
    .unwrap()
}

/// Body for POST /api/entries creating a plain word.
pub fn create_word_request(headword: &str, pinyin: &str) -> serde_json::Value {
    json!({
        "kind": "WORD",
        "headword": headword,
        "pronunciation": pinyin
    })
}

/// Body for POST /api/entries creating a word with a discrimination question.
pub fn create_compare_word_request(headword: &str, is_same: bool) -> serde_json::Value {
    json!({
        "kind": "WORD",
        "headword": headword,
        "pronunciation": "ruò wú qí shì",
        "definitionMatchData": {
            "targetChar": "若",
            "mode": "TWO_WAY_COMPARE",
            "wordA": "若无其事",
            "wordB": "欣喜若狂",
            "isSame": is_same
        }
    })
}

/// Body for POST /api/entries with an explicit creation time.
pub fn create_word_at(headword: &str, created_at: i64, status: &str) -> serde_json::Value {
    json!({
        "kind": "WORD",
        "headword": headword,
        "pronunciation": "",
        "createdAt": created_at,
        "testStatus": status
    })
}

/// Body for POST /api/entries/status.
pub fn status_request(ids: &[&str], status: &str) -> serde_json::Value {
    json!({ "ids": ids, "testStatus": status })
}

/// Body for POST /api/import/batch.
pub fn import_batch_request(words: &[&str]) -> serde_json::Value {
    json!({ "words": words })
}
