/*! Structured word entries.

[WordEntry] is the canonical form of a generated record. Natural language text is only derived
from it at export time (see [WordEntry::question] and [WordEntry::answer]).

Examples come in various shapes from the generator (plain strings, objects with
`yanomami`/`source` and `translation`/`english`/`spanish` fields): they are normalized into
[Example] on deserialization. An example without source text is kept as is and makes the
entry invalid, so that the generator is asked to fix it.

Datasets written before only hold the rendered text: [WordEntry::from_answer] recovers what it
can from it.
!*/
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::key::quoted_word;

lazy_static! {
    static ref MEANING: Regex = Regex::new(r"means '([^']+)'").unwrap();
    static ref GRAMMAR: Regex = Regex::new(r"It is an? ([^.\n]+)\.").unwrap();
    static ref EXAMPLE: Regex = Regex::new(r"(?m)^- (.+)\n  Translation: (.+)$").unwrap();
    static ref RELATED: Regex = Regex::new(r"(?m)^Related forms: (.+)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub source: String,
    pub translation: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExample {
    Text(String),
    Fields {
        source: Option<String>,
        yanomami: Option<String>,
        translation: Option<String>,
        english: Option<String>,
        spanish: Option<String>,
    },
}

impl From<RawExample> for Example {
    fn from(raw: RawExample) -> Self {
        match raw {
            RawExample::Text(source) => Example {
                source,
                translation: String::new(),
            },
            RawExample::Fields {
                source,
                yanomami,
                translation,
                english,
                spanish,
            } => Example {
                source: source.or(yanomami).unwrap_or_default(),
                translation: translation.or(english).or(spanish).unwrap_or_default(),
            },
        }
    }
}

/// Deserializable version of [WordEntry].
#[derive(Deserialize)]
struct WordEntrySer {
    word: String,
    translation: String,
    grammar: String,
    #[serde(default)]
    related_forms: Vec<String>,
    examples: Vec<RawExample>,
}

impl From<WordEntrySer> for WordEntry {
    fn from(e: WordEntrySer) -> Self {
        Self {
            word: e.word.trim().to_string(),
            translation: e.translation.trim().to_string(),
            grammar: e.grammar.trim().to_string(),
            related_forms: e.related_forms,
            examples: e
                .examples
                .into_iter()
                .map(Example::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WordEntrySer")]
pub struct WordEntry {
    pub word: String,
    pub translation: String,
    pub grammar: String,
    pub related_forms: Vec<String>,
    pub examples: Vec<Example>,
}

impl WordEntry {
    /// Check that required text fields are not empty.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("word", &self.word),
            ("translation", &self.translation),
            ("grammar", &self.grammar),
        ] {
            if value.is_empty() {
                return Err(format!("field `{}` is empty", name));
            }
        }
        if self.word.contains('\'') {
            return Err(format!("word {:?} contains a quote", self.word));
        }
        if let Some(idx) = self
            .examples
            .iter()
            .position(|ex| ex.source.trim().is_empty())
        {
            return Err(format!("example {} has no source text", idx + 1));
        }
        Ok(())
    }

    /// Recover an entry from an answer rendered by [WordEntry::answer].
    ///
    /// Lossy: examples without translation are not recovered, and a missing grammatical
    /// category becomes `word`. Returns `None` without a quoted word or a meaning.
    pub fn from_answer(answer: &str) -> Option<WordEntry> {
        let word = quoted_word(answer)?.trim().to_string();
        let translation = MEANING.captures(answer)?.get(1)?.as_str().trim().to_string();
        let grammar = GRAMMAR
            .captures(answer)
            .and_then(|c| c.get(1))
            .map_or("word", |m| m.as_str())
            .trim()
            .to_string();
        let examples = EXAMPLE
            .captures_iter(answer)
            .map(|c| Example {
                source: c[1].trim().to_string(),
                translation: c[2].trim().to_string(),
            })
            .collect();
        let related_forms = RELATED
            .captures(answer)
            .map(|c| c[1].split(", ").map(|f| f.trim().to_string()).collect())
            .unwrap_or_default();

        Some(WordEntry {
            word,
            translation,
            grammar,
            related_forms,
            examples,
        })
    }

    pub fn question(&self, language: &str) -> String {
        format!("What does '{}' mean in {}?", self.word, language)
    }

    pub fn answer(&self, language: &str) -> String {
        let article = match self.grammar.chars().next() {
            Some(c) if "aeiouAEIOU".contains(c) => "an",
            _ => "a",
        };
        let mut answer = format!(
            "The word '{}' in {} means '{}'. It is {} {}.",
            self.word, language, self.translation, article, self.grammar
        );

        if !self.examples.is_empty() {
            let examples = self
                .examples
                .iter()
                .map(|ex| {
                    if ex.translation.is_empty() {
                        format!("- {}", ex.source)
                    } else {
                        format!("- {}\n  Translation: {}", ex.source, ex.translation)
                    }
                })
                .join("\n\n");
            answer.push_str("\n\nHere are some examples:\n\n");
            answer.push_str(&examples);
        }

        if !self.related_forms.is_empty() {
            answer.push_str("\n\nRelated forms: ");
            answer.push_str(&self.related_forms.join(", "));
        }

        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_example_shapes() {
        let e: WordEntry = serde_json::from_str(
            r#"{
                "word": " ahë ",
                "translation": "yours",
                "grammar": "pronoun",
                "examples": [
                    "ahë pë",
                    {"yanomami": "ahë thëpë", "english": "your people"},
                    {"source": "ahë", "translation": "yours", "spanish": "tuyo"},
                    {"spanish": "sin fuente"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(e.word, "ahë");
        assert!(e.related_forms.is_empty());
        assert_eq!(
            e.examples,
            vec![
                Example {
                    source: "ahë pë".into(),
                    translation: "".into()
                },
                Example {
                    source: "ahë thëpë".into(),
                    translation: "your people".into()
                },
                Example {
                    source: "ahë".into(),
                    translation: "yours".into()
                },
                Example {
                    source: "".into(),
                    translation: "sin fuente".into()
                },
            ]
        );
        assert_eq!(e.validate(), Err("example 4 has no source text".to_string()));
    }

    #[test]
    fn missing_or_mistyped_fields() {
        assert!(serde_json::from_str::<WordEntry>(
            r#"{"word": "a", "translation": "b", "grammar": "c"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<WordEntry>(
            r#"{"word": "a", "translation": "b", "grammar": "c", "examples": "nope"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<WordEntry>(
            r#"{"word": "a", "translation": "b", "grammar": "c", "examples": [3]}"#
        )
        .is_err());
    }

    #[test]
    fn validate_empty_field() {
        let e: WordEntry = serde_json::from_str(
            r#"{"word": "ahete", "translation": "  ", "grammar": "verb", "examples": []}"#,
        )
        .unwrap();
        assert_eq!(e.validate(), Err("field `translation` is empty".to_string()));
    }

    #[test]
    fn recover_from_answer() {
        let e = WordEntry {
            word: "ahete".into(),
            translation: "to approach".into(),
            grammar: "intransitive verb".into(),
            related_forms: vec!["ahetou".into()],
            examples: vec![Example {
                source: "ahete kõi".into(),
                translation: "come closer".into(),
            }],
        };
        assert_eq!(WordEntry::from_answer(&e.answer("Yanomami")), Some(e));

        let plain = WordEntry::from_answer("The word 'hei' in Yanomami means 'this'.").unwrap();
        assert_eq!(plain.grammar, "word");
        assert!(plain.examples.is_empty());
        assert_eq!(WordEntry::from_answer("It means yours."), None);
    }

    #[test]
    fn render() {
        let e = WordEntry {
            word: "ahete".into(),
            translation: "to approach".into(),
            grammar: "intransitive verb".into(),
            related_forms: vec!["ahetou".into(), "ahetea".into()],
            examples: vec![Example {
                source: "ahete kõi".into(),
                translation: "come closer".into(),
            }],
        };
        assert_eq!(e.question("Yanomami"), "What does 'ahete' mean in Yanomami?");
        assert_eq!(
            e.answer("Yanomami"),
            "The word 'ahete' in Yanomami means 'to approach'. It is an intransitive verb.\n\n\
             Here are some examples:\n\n- ahete kõi\n  Translation: come closer\n\n\
             Related forms: ahetou, ahetea"
        );
    }
}
