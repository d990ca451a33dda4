/*! Reverse translations

Turns word entries into "How do you say '<meaning>' in <language>?" conversations, without any
generation involved. Entries are grouped by meaning (lowercased translation), so that every word
sharing a meaning ends up in the same answer.

```text
The pronoun 'yours' in Yanomami is 'ahë'.
The noun 'house' in Yanomami can be expressed as: 'yahi', 'yano'.
```
!*/
use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};

use crate::error::Error;
use crate::io::read_dataset;
use crate::io::writer::{JsonlWriter, WriterTrait};
use crate::record::{Conversation, Example, WordEntry};

/// maximum number of examples per reverse translation
pub const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Default)]
struct MeaningGroup {
    words: BTreeSet<String>,
    grammars: BTreeSet<String>,
    examples: Vec<Example>,
}

impl MeaningGroup {
    fn add(&mut self, entry: &WordEntry) {
        self.words.insert(entry.word.clone());
        let grammar = entry.grammar.trim().to_lowercase();
        self.grammars.insert(if grammar.is_empty() {
            "word".to_string()
        } else {
            grammar
        });
        for example in &entry.examples {
            let complete =
                !example.source.trim().is_empty() && !example.translation.trim().is_empty();
            if complete && !self.examples.contains(example) {
                self.examples.push(example.clone());
            }
        }
    }

    fn answer(&self, meaning: &str, language: &str) -> String {
        let grammar = self.grammars.iter().next().map_or("word", String::as_str);
        let mut answer = if self.words.len() == 1 {
            format!(
                "The {} '{}' in {} is '{}'.",
                grammar,
                meaning,
                language,
                self.words.iter().join("")
            )
        } else {
            let mut answer = format!(
                "The {} '{}' in {} can be expressed as: {}.",
                grammar,
                meaning,
                language,
                self.words.iter().map(|w| format!("'{}'", w)).join(", ")
            );
            if self.grammars.len() > 1 {
                answer.push_str("\n\nThese words can function as: ");
                answer.push_str(&self.grammars.iter().join(", "));
                answer.push('.');
            }
            answer
        };

        if !self.examples.is_empty() {
            answer.push_str("\n\nHere are some examples:\n\n");
            let examples = self
                .examples
                .iter()
                .take(MAX_EXAMPLES)
                .map(|ex| format!("- {}\n  In {}: {}", ex.translation, language, ex.source))
                .join("\n\n");
            answer.push_str(&examples);
        }
        answer
    }
}

/// One conversation per distinct meaning, in order of first occurrence.
///
/// Meanings containing a single quote are left out, their question would not have a
/// single quoted key.
pub fn reverse_translations<'a, I>(entries: I, language: &str) -> Vec<Conversation>
where
    I: IntoIterator<Item = &'a WordEntry>,
{
    let mut groups: IndexMap<String, MeaningGroup> = IndexMap::new();
    for entry in entries {
        let meaning = entry.translation.trim().to_lowercase();
        if meaning.is_empty() || meaning.contains('\'') {
            debug!("no reverse translation for {:?} ({:?})", entry.word, meaning);
            continue;
        }
        groups.entry(meaning).or_default().add(entry);
    }

    groups
        .iter()
        .map(|(meaning, group)| {
            Conversation::new(
                format!("How do you say '{}' in {}?", meaning, language),
                group.answer(meaning, language),
            )
        })
        .collect()
}

/// Derive the reverse translations of the dataset at `src` into `dst`.
///
/// Entries are recovered from the rendered answers, see [WordEntry::from_answer].
/// Returns the number of written conversations.
pub fn reverse_file(src: &Path, dst: &Path, language: &str) -> Result<usize, Error> {
    let conversations = read_dataset(src)?;
    let entries: Vec<WordEntry> = conversations
        .iter()
        .filter_map(|c| c.answer())
        .filter_map(WordEntry::from_answer)
        .collect();
    if entries.len() < conversations.len() {
        info!(
            "{:?}: {} answers without a recognizable entry",
            src,
            conversations.len() - entries.len()
        );
    }

    let reverse = reverse_translations(&entries, language);
    let nb_reverse = reverse.len();
    let mut writer = JsonlWriter::new(dst)?;
    writer.write(reverse)?;
    writer.close()?;
    info!(
        "{:?}: {} entries, {} reverse translations",
        src,
        entries.len(),
        nb_reverse
    );
    Ok(nb_reverse)
}
