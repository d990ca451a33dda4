/*!
# Writers

- [JsonlWriter]: one JSON object per line. Used for datasets and the skip log.
- [DebugLog]: plain text log of raw generator responses.

Both implement [WriterTrait].
!*/
mod debuglog;
mod jsonl;
mod writertrait;

pub use debuglog::{DebugEntry, DebugLog, DebugSubject};
pub use jsonl::JsonlWriter;
pub use writertrait::WriterTrait;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Error;

/// Create (or truncate) `dst`, creating missing parent directories.
fn create_file(dst: &Path) -> Result<BufWriter<File>, Error> {
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(dst)?))
}
