/*! Word lists.

Candidate words are whitespace separated tokens stripped of everything that is not a letter,
a combining mark or a hyphen. Comparisons are case-insensitive: the first spelling of a word
is kept. Datasets are tokenized the same way, so hyphenated forms are looked up whole.
!*/
use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;

use crate::error::Error;
use crate::record::Conversation;

lazy_static! {
    static ref NOT_WORD: Regex = Regex::new(r"[^\p{L}\p{M}\-]").unwrap();
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|token| NOT_WORD.replace_all(token, ""))
        .map(|word| word.trim_matches('-').to_string())
        .filter(|word| !word.is_empty())
}

/// Unique candidate words of `text`, in order of first occurrence.
pub fn candidate_words(text: &str) -> Vec<String> {
    let mut words: IndexMap<String, String> = IndexMap::new();
    for word in tokens(text) {
        words.entry(word.to_lowercase()).or_insert(word);
    }
    words.into_values().collect()
}

/// Words of `words` that appear in no conversation of `dataset`.
pub fn missing_words(words: &[String], dataset: &[Conversation]) -> Vec<String> {
    let mut present = HashSet::new();
    for message in dataset.iter().flat_map(|c| &c.messages) {
        present.extend(tokens(&message.content).map(|w| w.to_lowercase()));
    }

    words
        .iter()
        .filter(|w| !present.contains(&w.to_lowercase()))
        .cloned()
        .collect()
}

/// Write the candidate words of `src` into `dst`, one per line.
pub fn words_file(src: &Path, dst: &Path) -> Result<usize, Error> {
    let words = candidate_words(&std::fs::read_to_string(src)?);
    write_lines(dst, &words)?;
    info!("{:?}: {} candidate words", src, words.len());
    Ok(words.len())
}

/// Write the words of the `words` list (one per line) that `dataset` does not mention.
pub fn missing_words_file(words: &Path, dataset: &Path, dst: &Path) -> Result<usize, Error> {
    let list: Vec<String> = std::fs::read_to_string(words)?
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect();
    let conversations = crate::io::read_dataset(dataset)?;
    let missing = missing_words(&list, &conversations);
    write_lines(dst, &missing)?;
    info!(
        "{} of {} words are missing from {:?}",
        missing.len(),
        list.len(),
        dataset
    );
    Ok(missing.len())
}

fn write_lines(dst: &Path, lines: &[String]) -> Result<(), Error> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    Ok(std::fs::write(dst, content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates() {
        let words = candidate_words("1. ahë (pron.): yours; ahë-pë\n2. ahete, v. 3 ahë");
        assert_eq!(words, vec!["ahë", "pron", "yours", "ahë-pë", "ahete", "v"]);
    }

    #[test]
    fn first_spelling_wins() {
        assert_eq!(candidate_words("Ahë ahë AHË ahete"), vec!["Ahë", "ahete"]);
    }

    #[test]
    fn combining_marks_are_kept() {
        // e + combining diaeresis
        let words = candidate_words("ahe\u{308}");
        assert_eq!(words, vec!["ahe\u{308}"]);
    }

    #[test]
    fn missing() {
        let dataset = vec![Conversation::new(
            "What does 'Ahë' mean in Yanomami?".into(),
            "It means yours.".into(),
        )];
        let words = vec!["ahë".to_string(), "ahete".to_string(), "yours".to_string()];
        assert_eq!(missing_words(&words, &dataset), vec!["ahete"]);
    }

    #[test]
    fn hyphenated_words_are_found_whole() {
        let words = candidate_words("ahë-pë: yours (plural)\nhei-hami");
        assert_eq!(words, vec!["ahë-pë", "yours", "plural", "hei-hami"]);

        let dataset = vec![Conversation::new(
            "What does 'ahë-pë' mean in Yanomami?".into(),
            "The word 'ahë-pë' in Yanomami means 'yours'. It is a pronoun, plural.".into(),
        )];
        // "hei" and "hami" alone do not count for "hei-hami"
        let dataset_with_parts = vec![Conversation::new(
            "What do 'hei' and 'hami' mean?".into(),
            "They mean this and here.".into(),
        )];
        assert_eq!(missing_words(&words, &dataset), vec!["hei-hami"]);
        assert_eq!(
            missing_words(&words, &dataset_with_parts),
            vec!["ahë-pë", "yours", "plural", "hei-hami"]
        );
    }

    #[test]
    fn files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("dict.txt");
        let dst = dir.path().join("words.txt");
        std::fs::write(&src, "ahë: yours\n\nahete: to approach\n").unwrap();
        assert_eq!(words_file(&src, &dst).unwrap(), 5);
        assert_eq!(
            std::fs::read_to_string(&dst).unwrap(),
            "ahë\nyours\nahete\nto\napproach\n"
        );
    }
}
