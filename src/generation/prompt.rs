//! Prompts sent to the generator.
use crate::record::ResponseError;

const ENTRY_FORMAT: &str = r#"[{
  "word": "word_as_written_in_the_entry",
  "translation": "english_translation",
  "grammar": "grammatical_category",
  "related_forms": ["related_words"],
  "examples": [{"source": "example", "translation": "translation"}]
}]"#;

const GRAMMAR_CATEGORIES: &str = "Noun, Verb (Transitive), Verb (Intransitive), Adjective, \
                                  Adverb, Pronoun, Particle, Prefix, Suffix, Interjection";

#[derive(Debug, Clone)]
pub struct Prompts {
    language: String,
}

impl Prompts {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Prompt asking for entries about `candidates` found in `text`.
    pub fn unit(&self, text: &str, candidates: &[String]) -> String {
        format!(
            "You are helping create a {language} language learning dataset. \
             Given these dictionary entries:\n\n\
             {text}\n\n\
             Describe the {language} words defined above. Only use words from this list, \
             they have not been described yet: {candidates}\n\n\
             Return ONLY a JSON array, one object per word:\n\
             {format}\n\n\
             Grammar categories: {categories}.\n\
             Only use information present in the entries. \
             The word must not contain single quotes.",
            language = self.language,
            text = text,
            candidates = candidates.join(", "),
            format = ENTRY_FORMAT,
            categories = GRAMMAR_CATEGORIES,
        )
    }

    /// Prompt asking for the entry of a single `word`, given the dictionary lines mentioning it.
    pub fn word(&self, word: &str, contexts: &[String]) -> String {
        format!(
            "Translate the {language} word '{word}' based on these dictionary entries:\n\
             {contexts}\n\n\
             Return ONLY a JSON array:\n\
             {format}\n\n\
             Grammar categories: {categories}.",
            language = self.language,
            word = word,
            contexts = contexts.join("\n"),
            format = ENTRY_FORMAT,
            categories = GRAMMAR_CATEGORIES,
        )
    }

    /// Follow-up prompt asking to fix a response that could not be used.
    pub fn corrective(&self, original: &str, response: &str, error: &ResponseError) -> String {
        format!(
            "{original}\n\n\
             Your previous answer was:\n\n\
             {response}\n\n\
             It could not be used ({error}). \
             Answer again with ONLY valid JSON in the requested format, \
             without any explanation or code fences.",
            original = original,
            response = response,
            error = error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_prompt() {
        let p = Prompts::new("Yanomami");
        let prompt = p.unit("1. ahë means yours.", &["ahë".to_string(), "yours".to_string()]);
        assert!(prompt.contains("1. ahë means yours."));
        assert!(prompt.contains("ahë, yours"));
        assert!(prompt.contains("Yanomami language"));
    }

    #[test]
    fn word_prompt() {
        let p = Prompts::new("Yanomami");
        let prompt = p.word(
            "ahë",
            &["[dict:1] ahë: yours".to_string(), "[dict:7] ahë pë".to_string()],
        );
        assert!(prompt.starts_with("Translate the Yanomami word 'ahë'"));
        assert!(prompt.contains("entries:\n[dict:1] ahë: yours\n[dict:7] ahë pë\n\n"));
        assert!(prompt.contains("Grammar categories: Noun,"));
    }

    #[test]
    fn corrective_prompt() {
        let p = Prompts::new("Yanomami");
        let prompt = p.corrective(
            "original",
            "not json",
            &ResponseError::Malformed("expected value".to_string()),
        );
        assert!(prompt.starts_with("original"));
        assert!(prompt.contains("not json"));
        assert!(prompt.contains("malformed JSON: expected value"));
    }
}
