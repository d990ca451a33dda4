/*! Dataset processing

Operations on generated datasets that do not involve generation:
merging by key, exact deduplication, repeated key reports, validation, word lists and
reverse translations.
!*/
pub mod dedup;
pub mod duplicates;
pub mod merge;
pub mod reverse;
pub mod validate;
pub mod words;

pub use merge::{concat_answers, merge, MergeOutcome, Merged, DEFAULT_SEPARATOR};

use std::path::Path;

use log::{info, warn};

use crate::error::Error;
use crate::io::read_dataset;
use crate::io::writer::{JsonlWriter, WriterTrait};
use crate::record::KeyKind;

/// Merge the dataset at `src` by `key` into `dst`.
///
/// Unkeyed conversations are written after the merged ones.
pub fn merge_file(src: &Path, dst: &Path, key: KeyKind, separator: &str) -> Result<(), Error> {
    let conversations = read_dataset(src)?;
    let nb_read = conversations.len();
    let outcome = merge(
        conversations,
        |c| key.extract(c),
        concat_answers(separator),
    );

    info!(
        "{:?}: {} conversations, {} keys, {} merged",
        src,
        nb_read,
        outcome.merged.len(),
        outcome.nb_collisions()
    );
    if !outcome.unkeyed.is_empty() {
        warn!("{:?}: {} conversations without a key", src, outcome.unkeyed.len());
    }

    let mut writer = JsonlWriter::new(dst)?;
    writer.write(outcome.into_records())?;
    writer.close()
}
