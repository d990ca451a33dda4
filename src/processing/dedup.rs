/*! Deduplication

Uses [runiq](https://github.com/whitfin/runiq) to drop byte-identical conversations,
keeping the first occurrence.
!*/
use std::path::Path;

use log::info;
use runiq::filters::{DigestFilter, Filter};

use crate::error::Error;
use crate::io::writer::{JsonlWriter, WriterTrait};
use crate::io::read_dataset;
use crate::record::Conversation;

/// Remove exact duplicates, preserving order. Returns the kept conversations.
pub fn dedup(conversations: Vec<Conversation>) -> Result<Vec<Conversation>, Error> {
    let mut filter = DigestFilter::default();
    let mut kept = Vec::with_capacity(conversations.len());

    for conversation in conversations {
        let serialized = serde_json::to_string(&conversation)?;
        if filter.detect(serialized.as_bytes()) {
            kept.push(conversation);
        }
    }

    Ok(kept)
}

/// Deduplicate the dataset at `src` into `dst`. Returns the number of removed conversations.
pub fn dedup_file(src: &Path, dst: &Path) -> Result<usize, Error> {
    let conversations = read_dataset(src)?;
    let nb_read = conversations.len();
    let kept = dedup(conversations)?;
    let nb_removed = nb_read - kept.len();

    let mut writer = JsonlWriter::new(dst)?;
    writer.write(kept)?;
    writer.close()?;

    info!(
        "{:?}: {} conversations, {} duplicates removed",
        src, nb_read, nb_removed
    );
    Ok(nb_removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(q: &str, a: &str) -> Conversation {
        Conversation::new(q.to_string(), a.to_string())
    }

    #[test]
    fn keeps_first_occurrences() {
        let a = conv("What does 'a' mean?", "first answer");
        let b = conv("What does 'b' mean?", "second answer");
        let a_other = conv("What does 'a' mean?", "other answer");
        let kept = dedup(vec![a.clone(), b.clone(), a.clone(), a_other.clone(), b.clone()]).unwrap();
        assert_eq!(kept, vec![a, b, a_other]);
    }

    #[test]
    fn dedup_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.jsonl");
        let dst = dir.path().join("dst.jsonl");
        let line = serde_json::to_string(&conv("What does 'a' mean?", "first answer")).unwrap();
        std::fs::write(&src, format!("{}\n{}\n", line, line)).unwrap();

        assert_eq!(dedup_file(&src, &dst).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), format!("{}\n", line));
    }
}
