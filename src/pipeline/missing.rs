/*! Targeted generation for missing words

Words that a dataset does not describe yet (see [crate::processing::words::missing_words]) are
sent one by one to the generator, along with the source lines that mention them.

# Processing
1. Words already described by the existing dataset (if any) are left out.
1. For each remaining word, the lines of the source documents containing it are collected.
   Long lines are cut around the word. If all the lines don't fit the context budget,
   lines where the word stands as a whole token are preferred.
1. A word mentioned nowhere is skipped without calling the generator.
1. Otherwise the word prompt goes through the same corrective retries as dataset units.
1. Accepted records are merged by key and written as JSON Lines.
!*/
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::document::SourceDocument;
use crate::error::Error;
use crate::generation::{Generate, GenerationOptions, Prompts, Retry};
use crate::io::read_dataset;
use crate::io::writer::{DebugEntry, DebugLog, DebugSubject, JsonlWriter, WriterTrait};
use crate::pipeline::dataset::discover_inputs;
use crate::pipeline::outcome::{generate_records, write_merged, Outcome};
use crate::pipeline::pipeline::Pipeline;
use crate::pipeline::state::SkipReason;
use crate::processing::words::candidate_words;
use crate::record::{GeneratedRecord, KeyKind};

#[derive(Debug, Clone)]
pub struct MissingWordsConfig {
    /// word list, one word per line
    pub words: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
    /// existing dataset, whose described words are not generated again
    pub dataset: Option<PathBuf>,
    pub options: GenerationOptions,
    pub max_attempts: usize,
    pub delay: Duration,
    pub language: String,
    pub skip_log: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    /// longer lines are cut around the word
    pub max_line_chars: usize,
    /// budget for all the lines of a word
    pub max_context_chars: usize,
}

impl MissingWordsConfig {
    pub fn new(words: PathBuf, src: PathBuf, dst: PathBuf) -> Self {
        Self {
            words,
            src,
            dst,
            dataset: None,
            options: GenerationOptions::default(),
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            language: "Yanomami".to_string(),
            skip_log: None,
            debug_log: None,
            max_line_chars: 1000,
            max_context_chars: 6000,
        }
    }
}

/// A source line mentioning a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordContext {
    pub document: String,
    /// 1-based
    pub line: usize,
    pub text: String,
}

impl WordContext {
    /// true if `word` is one of the tokens of the line, not only a part of one.
    fn has_token(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        candidate_words(&self.text)
            .iter()
            .any(|w| w.to_lowercase() == word)
    }
}

impl fmt::Display for WordContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.document, self.line, self.text)
    }
}

/// Cut `line` to about `max_chars` characters around the byte offset `at`,
/// 40% before and 60% after.
fn cut_around(line: &str, at: usize, max_chars: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= max_chars {
        return line.to_string();
    }

    let at = line[..at].chars().count();
    let before = max_chars * 2 / 5;
    let start = at.saturating_sub(before);
    let end = (start + max_chars).min(chars.len());
    let start = end.saturating_sub(max_chars);

    let mut cut = String::new();
    if start > 0 {
        cut.push_str("... ");
    }
    cut.extend(&chars[start..end]);
    if end < chars.len() {
        cut.push_str(" ...");
    }
    cut
}

/// Lines of `docs` containing `word`, in document order.
pub fn word_contexts(word: &str, docs: &[SourceDocument], max_line_chars: usize) -> Vec<WordContext> {
    let mut contexts = Vec::new();
    if word.is_empty() {
        return contexts;
    }
    for doc in docs {
        let document = doc
            .path()
            .file_name()
            .map_or_else(|| doc.path().to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();
        for (idx, line) in doc.lines().iter().enumerate() {
            if let Some(at) = line.find(word) {
                contexts.push(WordContext {
                    document: document.clone(),
                    line: idx + 1,
                    text: cut_around(line, at, max_line_chars),
                });
            }
        }
    }
    contexts
}

fn context_len(contexts: &[&WordContext]) -> usize {
    contexts.iter().map(|c| c.to_string().chars().count() + 1).sum()
}

/// Keep the contexts fitting in `max_chars`, preferring those where `word` is a whole token.
/// At least one context is kept.
fn select_contexts<'a>(word: &str, contexts: &'a [WordContext], max_chars: usize) -> Vec<&'a WordContext> {
    let all: Vec<&WordContext> = contexts.iter().collect();
    if context_len(&all) <= max_chars {
        return all;
    }

    let exact: Vec<&WordContext> = all.iter().copied().filter(|c| c.has_token(word)).collect();
    let pool = if exact.is_empty() { all } else { exact };

    let mut selected = Vec::new();
    let mut len = 0;
    for context in pool {
        let n = context.to_string().chars().count() + 1;
        if !selected.is_empty() && len + n > max_chars {
            break;
        }
        len += n;
        selected.push(context);
    }
    selected
}

/// One line of the skip log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWord {
    pub word: String,
    pub attempts: usize,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingWordsSummary {
    /// words of the list
    pub nb_words: usize,
    /// words already described by the existing dataset
    pub nb_described: usize,
    pub nb_accepted: usize,
    pub nb_skipped: usize,
    pub nb_written: usize,
    /// documents that could not be read
    pub failed: Vec<PathBuf>,
}

pub struct MissingWordsPipeline<G: Generate> {
    config: MissingWordsConfig,
    generator: G,
    prompts: Prompts,
    retry: Retry,
}

impl<G: Generate> MissingWordsPipeline<G> {
    pub fn new(config: MissingWordsConfig, generator: G) -> Self {
        Self {
            prompts: Prompts::new(&config.language),
            retry: Retry::new(config.max_attempts),
            config,
            generator,
        }
    }

    pub fn config(&self) -> &MissingWordsConfig {
        &self.config
    }

    /// lowercased keys of the existing dataset
    fn described_words(&self) -> Result<HashSet<String>, Error> {
        let dataset = match &self.config.dataset {
            Some(path) => read_dataset(path)?,
            None => return Ok(HashSet::new()),
        };
        Ok(dataset
            .iter()
            .filter_map(|c| KeyKind::QuotedWord.extract(c))
            .map(|k| k.to_lowercase())
            .collect())
    }

    fn read_documents(&self, failed: &mut Vec<PathBuf>) -> Result<Vec<SourceDocument>, Error> {
        let mut docs = Vec::new();
        for path in discover_inputs(&self.config.src)? {
            match SourceDocument::from_path(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    error!("could not read {:?}: {}", path, e);
                    failed.push(path);
                }
            }
        }
        Ok(docs)
    }

    fn process_word(&self, word: &str, docs: &[SourceDocument]) -> Outcome {
        let contexts = word_contexts(word, docs, self.config.max_line_chars);
        if contexts.is_empty() {
            return Outcome::Skipped {
                reason: SkipReason::NoContext,
                detail: format!("'{}' appears in no source line", word),
                attempts: 0,
                responses: Vec::new(),
            };
        }

        let selected = select_contexts(word, &contexts, self.config.max_context_chars);
        debug!(
            "'{}': {}/{} context line(s)",
            word,
            selected.len(),
            contexts.len()
        );
        let lines: Vec<String> = selected.iter().map(ToString::to_string).collect();
        let prompt = self.prompts.word(word, &lines);
        let outcome = generate_records(
            &self.generator,
            &self.prompts,
            &self.retry,
            &self.config.options,
            &prompt,
            &format!("word '{}'", word),
        );
        if !self.config.delay.is_zero() {
            std::thread::sleep(self.config.delay);
        }
        outcome
    }
}

impl<G: Generate> Pipeline<MissingWordsSummary> for MissingWordsPipeline<G> {
    fn version() -> &'static str {
        "0.1.0"
    }

    fn run(&self) -> Result<MissingWordsSummary, Error> {
        let words: Vec<String> = std::fs::read_to_string(&self.config.words)?
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect();
        info!(
            "missing words pipeline v{}: {} word(s)",
            <Self as Pipeline<MissingWordsSummary>>::version(),
            words.len()
        );

        let mut failed = Vec::new();
        let docs = self.read_documents(&mut failed)?;
        let mut described = self.described_words()?;

        let mut skip_log = self
            .config
            .skip_log
            .as_deref()
            .map(JsonlWriter::<SkippedWord>::new)
            .transpose()?;
        let mut debug_log = self.config.debug_log.as_deref().map(DebugLog::new).transpose()?;

        let mut records: Vec<GeneratedRecord> = Vec::new();
        let mut nb_described = 0;
        let mut nb_accepted = 0;
        let mut nb_skipped = 0;

        for (idx, word) in words.iter().enumerate() {
            if described.contains(&word.to_lowercase()) {
                debug!("'{}' is already described", word);
                nb_described += 1;
                continue;
            }

            info!("[{}/{}] '{}'", idx + 1, words.len(), word);
            match self.process_word(word, &docs) {
                Outcome::Accepted {
                    records: accepted,
                    attempts,
                } => {
                    debug!(
                        "'{}': {} record(s) after {} attempt(s)",
                        word,
                        accepted.len(),
                        attempts
                    );
                    described.extend(accepted.iter().filter_map(|r| r.key()).map(str::to_lowercase));
                    nb_accepted += accepted.len();
                    records.extend(accepted);
                }
                Outcome::Skipped {
                    reason,
                    detail,
                    attempts,
                    responses,
                } => {
                    warn!("'{}': skipped after {} attempt(s): {}", word, attempts, detail);
                    nb_skipped += 1;
                    if let (Some(debug), false) = (&mut debug_log, responses.is_empty()) {
                        debug.write_single(&DebugEntry {
                            subject: DebugSubject::Word(word.clone()),
                            reason: detail.clone(),
                            responses,
                        })?;
                    }
                    if let Some(skip) = &mut skip_log {
                        skip.write_single(&SkippedWord {
                            word: word.clone(),
                            attempts,
                            reason,
                            detail,
                        })?;
                    }
                }
            }
        }

        let nb_written = write_merged(&records, &self.config.dst)?;
        if let Some(skip) = &mut skip_log {
            skip.close()?;
        }
        if let Some(debug) = &mut debug_log {
            debug.close()?;
        }

        let summary = MissingWordsSummary {
            nb_words: words.len(),
            nb_described,
            nb_accepted,
            nb_skipped,
            nb_written,
            failed,
        };
        info!(
            "done: {} accepted, {} skipped, {} already described, {} conversations written to {:?}",
            summary.nb_accepted, summary.nb_skipped, summary.nb_described, nb_written, self.config.dst
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::record::Conversation;

    fn entry(word: &str, translation: &str) -> String {
        format!(
            r#"[{{"word":"{}","translation":"{}","grammar":"noun","examples":[]}}]"#,
            word, translation
        )
    }

    fn docs() -> Vec<SourceDocument> {
        vec![
            SourceDocument::new(
                "dicts/a.txt",
                "yano: house\nyanomami: people\nhei: here\n",
            ),
            SourceDocument::new("dicts/b.txt", "yano a: a house\n"),
        ]
    }

    #[test]
    fn contexts_of_a_word() {
        let contexts = word_contexts("yano", &docs(), 1000);
        let shown: Vec<String> = contexts.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            vec![
                "[a.txt:1] yano: house",
                "[a.txt:2] yanomami: people",
                "[b.txt:1] yano a: a house",
            ]
        );
        assert!(word_contexts("hapa", &docs(), 1000).is_empty());
    }

    #[test]
    fn long_lines_are_cut_around_the_word() {
        let line = format!("{} ahë {}", "x".repeat(50), "y".repeat(50));
        let doc = SourceDocument::new("d.txt", &line);
        let contexts = word_contexts("ahë", &[doc], 20);
        let text = &contexts[0].text;
        assert!(text.starts_with("... "));
        assert!(text.ends_with(" ..."));
        assert!(text.contains("ahë"));
        assert_eq!(text.chars().count(), 20 + 8);
    }

    #[test]
    fn exact_tokens_preferred_over_budget() {
        let contexts = word_contexts("yano", &docs(), 1000);
        let selected = select_contexts("yano", &contexts, 40);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].line, 1);

        let selected = select_contexts("yano", &contexts, 1);
        assert_eq!(selected.len(), 1);
    }

    fn pipeline_dir(words: &str) -> (tempfile::TempDir, MissingWordsConfig) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("dicts");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("a.txt"), "yano: house\nhei: here\n").unwrap();
        std::fs::write(dir.path().join("words.txt"), words).unwrap();

        let mut config = MissingWordsConfig::new(
            dir.path().join("words.txt"),
            src,
            dir.path().join("out.jsonl"),
        );
        config.delay = Duration::from_millis(0);
        config.skip_log = Some(dir.path().join("skipped.jsonl"));
        (dir, config)
    }

    #[test]
    fn missing_words_are_generated() {
        let (dir, mut config) = pipeline_dir("yano\nhei\nhapa\n");
        let dataset = dir.path().join("dataset.jsonl");
        let described = Conversation::new(
            "What does 'hei' mean in Yanomami?".into(),
            "'hei' means 'here'.".into(),
        );
        std::fs::write(&dataset, serde_json::to_string(&described).unwrap()).unwrap();
        config.dataset = Some(dataset);

        let prompts = RefCell::new(Vec::new());
        let generator = |prompt: &str, _: &GenerationOptions| -> Result<String, Error> {
            prompts.borrow_mut().push(prompt.to_string());
            Ok(entry("yano", "house"))
        };
        let summary = MissingWordsPipeline::new(config.clone(), generator)
            .run()
            .unwrap();

        assert_eq!(summary.nb_words, 3);
        assert_eq!(summary.nb_described, 1);
        assert_eq!(summary.nb_accepted, 1);
        assert_eq!(summary.nb_skipped, 1);
        assert_eq!(summary.nb_written, 1);

        let prompts = prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[a.txt:1] yano: house"));
        assert!(!prompts[0].contains("hei: here"));

        let written = read_dataset(&config.dst).unwrap();
        assert_eq!(
            written[0].question(),
            Some("What does 'yano' mean in Yanomami?")
        );
        let skipped = std::fs::read_to_string(config.skip_log.unwrap()).unwrap();
        assert!(skipped.contains(r#""word":"hapa""#));
        assert!(skipped.contains(r#""reason":"no_context""#));
    }

    #[test]
    fn words_described_along_the_way_are_not_sent_again() {
        let (_dir, config) = pipeline_dir("yano\nYano\n");
        let calls = RefCell::new(0);
        let generator = |_: &str, _: &GenerationOptions| -> Result<String, Error> {
            *calls.borrow_mut() += 1;
            Ok(entry("yano", "house"))
        };
        let summary = MissingWordsPipeline::new(config, generator).run().unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(summary.nb_described, 1);
    }

    #[test]
    fn unusable_responses_end_in_the_debug_log() {
        let (dir, mut config) = pipeline_dir("hei\n");
        config.max_attempts = 2;
        config.debug_log = Some(dir.path().join("debug.txt"));
        let generator =
            |_: &str, _: &GenerationOptions| -> Result<String, Error> { Ok("no json".to_string()) };
        let summary = MissingWordsPipeline::new(config.clone(), generator)
            .run()
            .unwrap();
        assert_eq!(summary.nb_skipped, 1);
        assert_eq!(summary.nb_written, 0);

        let debug = std::fs::read_to_string(config.debug_log.unwrap()).unwrap();
        assert!(debug.contains("=== DEBUG FOR WORD 'hei' ==="));
        let skipped = std::fs::read_to_string(config.skip_log.unwrap()).unwrap();
        assert!(skipped.contains(r#""attempts":2"#));
        assert!(skipped.contains(r#""reason":"malformed""#));
    }
}
