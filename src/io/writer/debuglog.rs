//! Plain text log of raw responses for manual inspection.
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{create_file, WriterTrait};
use crate::error::Error;

/// What the responses were about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugSubject {
    Unit {
        document: PathBuf,
        unit: usize,
        start_line: usize,
        end_line: usize,
    },
    Word(String),
}

impl fmt::Display for DebugSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugSubject::Unit {
                document,
                unit,
                start_line,
                end_line,
            } => write!(
                f,
                "UNIT {} OF {} (lines {}-{})",
                unit,
                document.display(),
                start_line,
                end_line
            ),
            DebugSubject::Word(word) => write!(f, "WORD '{}'", word),
        }
    }
}

/// Raw responses of one failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub subject: DebugSubject,
    pub reason: String,
    pub responses: Vec<String>,
}

pub struct DebugLog {
    handle: BufWriter<File>,
}

impl WriterTrait for DebugLog {
    type Item = DebugEntry;

    fn new(dst: &Path) -> Result<Self, Error> {
        Ok(Self {
            handle: create_file(dst)?,
        })
    }

    fn write(&mut self, vals: Vec<DebugEntry>) -> Result<(), Error> {
        for val in &vals {
            self.write_single(val)?;
        }
        Ok(())
    }

    fn write_single(&mut self, entry: &DebugEntry) -> Result<(), Error> {
        writeln!(self.handle, "=== DEBUG FOR {} ===", entry.subject)?;
        writeln!(self.handle, "reason: {}", entry.reason)?;
        for (i, response) in entry.responses.iter().enumerate() {
            writeln!(self.handle, "--- attempt {} ---", i + 1)?;
            writeln!(self.handle, "{}", response)?;
        }
        writeln!(self.handle, "=== END DEBUG ===\n")?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        Ok(self.handle.flush()?)
    }
}
