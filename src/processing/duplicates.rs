//! Repeated key report.
use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::error::Error;
use crate::io::read_dataset;
use crate::io::writer::{JsonlWriter, WriterTrait};
use crate::record::{Conversation, KeyKind};

/// Conversations whose key was already seen earlier in `conversations`.
/// Conversations without a key are ignored.
pub fn duplicates<'a>(conversations: &'a [Conversation], key: KeyKind) -> Vec<&'a Conversation> {
    let mut seen = HashSet::new();
    conversations
        .iter()
        .filter(|c| match key.extract(c) {
            Some(k) => !seen.insert(k),
            None => false,
        })
        .collect()
}

/// Write the repeated conversations of `src` into `dst`. Returns their number.
pub fn duplicates_file(src: &Path, dst: &Path, key: KeyKind) -> Result<usize, Error> {
    let conversations = read_dataset(src)?;
    let repeated = duplicates(&conversations, key);

    let mut writer = JsonlWriter::new(dst)?;
    for conversation in &repeated {
        writer.write_single(*conversation)?;
    }
    writer.close()?;

    info!(
        "{:?}: {} of {} conversations have an already seen key",
        src,
        repeated.len(),
        conversations.len()
    );
    Ok(repeated.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_occurrences_only() {
        let conversations = vec![
            Conversation::new("What does 'a' mean?".into(), "1".into()),
            Conversation::new("What does 'b' mean?".into(), "2".into()),
            Conversation::new("What does 'a' mean?".into(), "3".into()),
            Conversation::new("Hello?".into(), "4".into()),
            Conversation::new("What does 'a' mean?".into(), "5".into()),
        ];
        let repeated = duplicates(&conversations, KeyKind::QuotedWord);
        let answers: Vec<_> = repeated.iter().filter_map(|c| c.answer()).collect();
        assert_eq!(answers, vec!["3", "5"]);

        assert!(duplicates(&conversations, KeyKind::Question).len() == 2);
    }
}
