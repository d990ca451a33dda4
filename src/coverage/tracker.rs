/*! Per-document line coverage.

The tracker holds, for each tracked document, the set of line indices that were consumed by an
accepted record. A document is either untracked or tracking: [CoverageTracker::report] and
[CoverageTracker::unused_content] can be called at any time while tracking and reflect the
current state.

Blank lines are neutral: they are not counted in the total, cannot be consumed
and are never reported as unused.
!*/
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use super::policy::{CoveragePolicy, TokenOverlap};
use crate::chunking::Unit;
use crate::document::SourceDocument;
use crate::error::Error;
use crate::record::GeneratedRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub consumed_count: usize,
    pub total_lines: usize,
    pub coverage_percent: f64,
    /// inclusive `[start, end]` ranges of unused content lines, ascending
    pub unused_ranges: Vec<(usize, usize)>,
}

#[derive(Debug)]
struct DocumentCoverage {
    content: Vec<bool>,
    consumed: BTreeSet<usize>,
}

impl DocumentCoverage {
    fn new(doc: &SourceDocument) -> Self {
        Self {
            content: doc.lines().iter().map(|l| !l.trim().is_empty()).collect(),
            consumed: BTreeSet::new(),
        }
    }

    fn is_unused(&self, idx: usize) -> bool {
        self.content[idx] && !self.consumed.contains(&idx)
    }

    fn report(&self) -> CoverageReport {
        let total_lines = self.content.iter().filter(|c| **c).count();
        let consumed_count = self.consumed.len();
        let coverage_percent = if total_lines == 0 {
            100.0
        } else {
            consumed_count as f64 * 100.0 / total_lines as f64
        };

        let mut unused_ranges = Vec::new();
        let mut run_start = None;
        for idx in 0..self.content.len() {
            match (self.is_unused(idx), run_start) {
                (true, None) => run_start = Some(idx),
                (false, Some(start)) => {
                    unused_ranges.push((start, idx - 1));
                    run_start = None;
                }
                _ => (),
            }
        }
        if let Some(start) = run_start {
            unused_ranges.push((start, self.content.len() - 1));
        }

        CoverageReport {
            consumed_count,
            total_lines,
            coverage_percent,
            unused_ranges,
        }
    }
}

/// Tracks consumed lines for several documents, keyed by path.
#[derive(Debug)]
pub struct CoverageTracker<P: CoveragePolicy = TokenOverlap> {
    policy: P,
    documents: HashMap<PathBuf, DocumentCoverage>,
}

impl CoverageTracker<TokenOverlap> {
    pub fn new() -> Self {
        Self::with_policy(TokenOverlap::default())
    }
}

impl Default for CoverageTracker<TokenOverlap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CoveragePolicy> CoverageTracker<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            policy,
            documents: HashMap::new(),
        }
    }

    fn get(&self, path: &Path) -> Result<&DocumentCoverage, Error> {
        self.documents
            .get(path)
            .ok_or_else(|| Error::UntrackedDocument(path.to_path_buf()))
    }

    fn get_mut(&mut self, path: &Path) -> Result<&mut DocumentCoverage, Error> {
        self.documents
            .get_mut(path)
            .ok_or_else(|| Error::UntrackedDocument(path.to_path_buf()))
    }

    /// Start (or restart, discarding previous state) tracking `doc`.
    pub fn start_tracking(&mut self, doc: &SourceDocument) {
        self.documents
            .insert(doc.path().to_path_buf(), DocumentCoverage::new(doc));
    }

    pub fn is_tracking(&self, doc: &SourceDocument) -> bool {
        self.documents.contains_key(doc.path())
    }

    /// Mark a single line as consumed.
    ///
    /// Returns `true` if the line was not consumed before.
    /// Out of range and blank lines are ignored.
    pub fn mark_consumed(&mut self, doc: &SourceDocument, idx: usize) -> Result<bool, Error> {
        let coverage = self.get_mut(doc.path())?;
        match coverage.content.get(idx) {
            Some(true) => Ok(coverage.consumed.insert(idx)),
            Some(false) => Ok(false),
            None => {
                debug!(
                    "{:?}: ignoring out of range line {} ({} lines)",
                    doc.path(),
                    idx,
                    coverage.content.len()
                );
                Ok(false)
            }
        }
    }

    /// Mark the core lines of `unit` that the policy links to `record`.
    ///
    /// Returns the number of newly consumed lines.
    pub fn mark_from_record(
        &mut self,
        doc: &SourceDocument,
        unit: &Unit,
        record: &GeneratedRecord,
    ) -> Result<usize, Error> {
        // fail early on untracked documents
        self.get(doc.path())?;

        let key = record.key().unwrap_or_default();
        let answer = record.answer_text();
        let mut newly_marked = 0;

        for idx in unit.core_lines() {
            let consumed = doc
                .line(idx)
                .map(|line| self.policy.consumes(line, key, &answer))
                .unwrap_or(false);
            if consumed && self.mark_consumed(doc, idx)? {
                debug!("{:?}: line {} consumed by '{}'", doc.path(), idx, key);
                newly_marked += 1;
            }
        }

        Ok(newly_marked)
    }

    pub fn report(&self, doc: &SourceDocument) -> Result<CoverageReport, Error> {
        Ok(self.get(doc.path())?.report())
    }

    /// Lines that were not consumed, in document order.
    ///
    /// Runs of blank lines are collapsed into one, leading and trailing blank lines are dropped.
    pub fn unused_content(&self, doc: &SourceDocument) -> Result<String, Error> {
        let coverage = self.get(doc.path())?;
        let mut lines: Vec<&str> = Vec::new();

        for (idx, line) in doc.lines().iter().enumerate() {
            let blank = !coverage.content.get(idx).copied().unwrap_or(false);
            if blank {
                if lines.last().map_or(false, |l| !l.is_empty()) {
                    lines.push("");
                }
            } else if !coverage.consumed.contains(&idx) {
                lines.push(line);
            }
        }

        while lines.last() == Some(&"") {
            lines.pop();
        }

        Ok(lines.join("\n"))
    }

    /// Stop tracking `doc`, returning its final report.
    pub fn finish(&mut self, doc: &SourceDocument) -> Result<CoverageReport, Error> {
        let report = self.report(doc)?;
        self.documents.remove(doc.path());
        Ok(report)
    }
}
