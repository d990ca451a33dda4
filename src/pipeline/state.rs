/*! Run state.

Everything that changes while a run progresses lives in [RunState], which is owned by the caller
and threaded through the pipeline: coverage of each document, words already described,
accepted records and skipped units.
!*/
use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::chunking::Unit;
use crate::coverage::{CoveragePolicy, CoverageTracker, TokenOverlap};
use crate::document::SourceDocument;
use crate::error::Error;
use crate::processing::words::candidate_words;
use crate::record::GeneratedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// the generator failed (network, api error, timeout)
    Generation,
    /// responses were not JSON
    Malformed,
    /// responses were JSON but not usable records
    Invalid,
    /// every candidate word of the unit was already described
    NoCandidateWords,
    /// the word appears in no line of the source documents
    NoContext,
}

/// One line of the skip log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipEntry {
    pub document: PathBuf,
    pub unit: usize,
    pub start_line: usize,
    pub end_line: usize,
    /// first candidate word of the unit, if any
    pub key: Option<String>,
    pub attempts: usize,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub nb_units: usize,
    pub nb_accepted: usize,
    pub nb_skipped: usize,
}

#[derive(Debug)]
pub struct RunState<P: CoveragePolicy = TokenOverlap> {
    coverage: CoverageTracker<P>,
    used_words: HashSet<String>,
    records: Vec<GeneratedRecord>,
    skipped: Vec<SkipEntry>,
    stats: RunStats,
}

impl Default for RunState<TokenOverlap> {
    fn default() -> Self {
        Self::with_policy(TokenOverlap::default())
    }
}

impl RunState<TokenOverlap> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: CoveragePolicy> RunState<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            coverage: CoverageTracker::with_policy(policy),
            used_words: HashSet::new(),
            records: Vec::new(),
            skipped: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn coverage(&self) -> &CoverageTracker<P> {
        &self.coverage
    }

    pub fn coverage_mut(&mut self) -> &mut CoverageTracker<P> {
        &mut self.coverage
    }

    /// Mark `word` as described. Case-insensitive.
    pub fn mark_used(&mut self, word: &str) {
        self.used_words.insert(word.to_lowercase());
    }

    pub fn is_used(&self, word: &str) -> bool {
        self.used_words.contains(&word.to_lowercase())
    }

    pub fn nb_used_words(&self) -> usize {
        self.used_words.len()
    }

    /// Candidate words of `text` that were not described yet.
    pub fn unused_candidates(&self, text: &str) -> Vec<String> {
        candidate_words(text)
            .into_iter()
            .filter(|w| !self.is_used(w))
            .collect()
    }

    /// Accept a record produced from `unit`: update coverage and used words, then keep it.
    pub fn accept(
        &mut self,
        doc: &SourceDocument,
        unit: &Unit,
        record: GeneratedRecord,
    ) -> Result<(), Error> {
        self.coverage.mark_from_record(doc, unit, &record)?;
        if let Some(key) = record.key() {
            self.used_words.insert(key.to_lowercase());
        }
        self.records.push(record);
        self.stats.nb_accepted += 1;
        Ok(())
    }

    pub fn skip(&mut self, entry: SkipEntry) {
        self.skipped.push(entry);
        self.stats.nb_skipped += 1;
    }

    pub fn unit_processed(&mut self) {
        self.stats.nb_units += 1;
    }

    pub fn records(&self) -> &[GeneratedRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkipEntry] {
        &self.skipped
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Take the accepted records out of the state.
    pub fn take_records(&mut self) -> Vec<GeneratedRecord> {
        std::mem::take(&mut self.records)
    }
}
