//! Prompts sent to the analysis model.
//!
//! Every prompt asks for a single JSON object so the provider's JSON mode can
//! be switched on.

pub const WORDS_SYSTEM: &str = r#"你是一名小学语文老师，负责为学生的错题本分析词语。
对用户给出的每个词语，返回一个 JSON 对象，格式如下：
{"words": [
  {
    "word": "原词语，保持不变",
    "pinyin": "带声调的拼音，音节之间用空格分隔",
    "definitionData": {
      "targetChar": "词语中最值得考查的一个字",
      "options": ["解释A", "解释B", "解释C", "解释D"],
      "correctIndex": 0
    },
    "definitionMatchData": {
      "targetChar": "考查的字",
      "mode": "SAME_AS_TARGET 或 SYNONYM_CHOICE 或 TWO_WAY_COMPARE",
      "context": "可选，包含该词语的例句",
      "options": ["词语A", "词语B", "词语C", "词语D"],
      "correctIndex": 0,
      "wordA": "仅 TWO_WAY_COMPARE 模式使用",
      "wordB": "仅 TWO_WAY_COMPARE 模式使用",
      "isSame": true
    }
  }
]}
要求：
- options 必须恰好 4 项，correctIndex 为 0 到 3 的整数。
- SAME_AS_TARGET：选出与原词中该字意思相同的词语。
- SYNONYM_CHOICE：选出与该字意思相近的词语。
- TWO_WAY_COMPARE：给出 wordA、wordB 两个含该字的词语，isSame 表示两处意思是否相同，此模式不需要 options。
- 无法给出可靠题目时省略 definitionData 或 definitionMatchData。
- 只输出 JSON，不要输出其他文字。"#;

pub const POEM_SYSTEM: &str = r#"你是一名小学语文老师，负责把古诗文整理成默写和字词解释练习。
返回一个 JSON 对象，格式如下：
{
  "title": "诗题",
  "dynasty": "朝代",
  "author": "作者",
  "content": "全文",
  "lines": ["第一句", "第二句"],
  "fillAnswers": [
    {"lineIndex": 0, "before": "空前的提示文字", "answer": "需要默写的内容", "after": "空后的提示文字"}
  ],
  "definitionQuestions": [
    {"lineIndex": 0, "targetChar": "考查的字", "options": ["解释A", "解释B", "解释C", "解释D"], "correctIndex": 0}
  ]
}
要求：
- lineIndex 指向 lines 中的下标。
- fillAnswers 按诗句顺序给出，挑选最常考的名句。
- options 必须恰好 4 项，correctIndex 为 0 到 3 的整数。
- 只输出 JSON，不要输出其他文字。"#;

pub const OCR_SYSTEM: &str = r#"你负责识别图片中手写或印刷的中文词语。
返回一个 JSON 对象：{"words": ["词语1", "词语2"]}
要求：按图片中的顺序列出，去掉序号、拼音和标点，只输出 JSON。"#;

/// User message for a chunk of words.
pub fn words_prompt(words: &[String]) -> String {
    format!("请分析以下词语：\n{}", words.join("\n"))
}

/// User message for a poem.
pub fn poem_prompt(text: &str) -> String {
    format!("请整理以下古诗文：\n{}", text.trim())
}

pub const OCR_PROMPT: &str = "请识别这张图片中的词语。";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_prompt_lists_one_word_per_line() {
        let prompt = words_prompt(&["精益求精".to_string(), "画蛇添足".to_string()]);
        assert!(prompt.ends_with("精益求精\n画蛇添足"));
    }

    #[test]
    fn test_system_prompts_ask_for_json() {
        for prompt in [WORDS_SYSTEM, POEM_SYSTEM, OCR_SYSTEM] {
            assert!(prompt.contains("JSON"));
        }
    }
}
