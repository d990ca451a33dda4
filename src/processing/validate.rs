/*! Dataset validation.

Checks that every line of a dataset is a conversation usable for fine-tuning
(see [Conversation::validate]). Files are checked in parallel.
!*/
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Error;
use crate::io::DatasetReader;
use crate::record::Conversation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidLine {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub nb_valid: usize,
    pub invalid: Vec<InvalidLine>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

pub fn validate_file(src: &Path) -> Result<ValidationReport, Error> {
    let mut report = ValidationReport {
        path: src.to_path_buf(),
        nb_valid: 0,
        invalid: Vec::new(),
    };

    for (line, conversation) in DatasetReader::from_path(src)? {
        let checked = conversation
            .map_err(|e| e.to_string())
            .and_then(|c: Conversation| c.validate().map_err(|e| e.to_string()));
        match checked {
            Ok(()) => report.nb_valid += 1,
            Err(reason) => report.invalid.push(InvalidLine { line, reason }),
        }
    }

    if report.is_valid() {
        info!("{:?}: {} valid conversations", src, report.nb_valid);
    } else {
        warn!(
            "{:?}: {} invalid lines ({} valid)",
            src,
            report.invalid.len(),
            report.nb_valid
        );
    }
    Ok(report)
}

/// Validate several datasets in parallel. Results are in the order of `srcs`.
pub fn validate_files(srcs: &[PathBuf]) -> Vec<Result<ValidationReport, Error>> {
    srcs.par_iter().map(|src| validate_file(src)).collect()
}
