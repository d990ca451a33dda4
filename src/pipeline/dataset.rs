//! Dataset generation pipeline
//!
//! Turns dictionary text files into a fine-tuning dataset.
//!
//! # Processing
//! 1. Input files are discovered (a single file, or every `.txt` file of a directory, sorted).
//! 1. Each document is chunked into units, and each unit is processed sequentially:
//!    the unit is skipped if all of its candidate words were already described,
//!    otherwise it is sent to the generator along with the unused candidate words.
//! 1. Responses are parsed and validated. Unusable responses are retried with a corrective prompt,
//!    up to a bounded number of attempts. Generation errors (timeouts included) are not retried.
//! 1. Accepted records update coverage and used words. Skipped units go to the skip log.
//! 1. Once every document is processed, records are merged by key and written as JSON Lines.
//!    Reverse translations can be derived from the structured records at the same time.
//!
//! A document that can't be read is reported and skipped, the run goes on with the next one.
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::chunking::{Chunker, ChunkerConfig, Unit};
use crate::coverage::CoverageReport;
use crate::document::SourceDocument;
use crate::error::Error;
use crate::generation::{Generate, GenerationOptions, Prompts, Retry};
use crate::io::writer::{DebugEntry, DebugLog, DebugSubject, JsonlWriter, WriterTrait};
use crate::pipeline::outcome::{generate_records, write_merged, Outcome};
use crate::pipeline::pipeline::Pipeline;
use crate::pipeline::state::{RunState, SkipEntry, SkipReason};
use crate::processing::reverse::reverse_translations;
use crate::record::GeneratedRecord;

/// progress is logged every `PROGRESS_EVERY` units.
const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub chunker: ChunkerConfig,
    pub options: GenerationOptions,
    pub max_attempts: usize,
    /// pause after each unit that called the generator
    pub delay: Duration,
    pub max_examples: Option<usize>,
    pub language: String,
    pub skip_log: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    pub leftover_dir: Option<PathBuf>,
    pub coverage_report: Option<PathBuf>,
    /// reverse translations (english to language) derived from the accepted entries
    pub reverse: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn new(src: PathBuf, dst: PathBuf) -> Self {
        Self {
            src,
            dst,
            chunker: ChunkerConfig::default(),
            options: GenerationOptions::default(),
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            max_examples: None,
            language: "Yanomami".to_string(),
            skip_log: None,
            debug_log: None,
            leftover_dir: None,
            coverage_report: None,
            reverse: None,
        }
    }
}

/// Coverage of one document, as written in the coverage report file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentCoverage {
    pub document: PathBuf,
    #[serde(flatten)]
    pub report: CoverageReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub nb_documents: usize,
    /// documents that could not be read
    pub failed: Vec<PathBuf>,
    pub nb_units: usize,
    pub nb_accepted: usize,
    pub nb_skipped: usize,
    /// number of lines of the output dataset, after merging
    pub nb_written: usize,
    /// number of reverse translations written, if requested
    pub nb_reverse: usize,
    pub coverage: Vec<DocumentCoverage>,
}

/// Optional run logs.
struct Logs {
    skip: Option<JsonlWriter<SkipEntry>>,
    debug: Option<DebugLog>,
}

impl Logs {
    fn new(config: &DatasetConfig) -> Result<Self, Error> {
        Ok(Self {
            skip: config.skip_log.as_deref().map(JsonlWriter::new).transpose()?,
            debug: config.debug_log.as_deref().map(DebugLog::new).transpose()?,
        })
    }

    fn close(&mut self) -> Result<(), Error> {
        if let Some(skip) = &mut self.skip {
            skip.close()?;
        }
        if let Some(debug) = &mut self.debug {
            debug.close()?;
        }
        Ok(())
    }
}

/// List input documents: `src` itself if it is a file, or every `**/*.txt` file in sorted order.
pub fn discover_inputs(src: &Path) -> Result<Vec<PathBuf>, Error> {
    if src.is_file() {
        return Ok(vec![src.to_path_buf()]);
    }
    if !src.is_dir() {
        return Err(Error::Custom(format!(
            "source {:?} is neither a file nor a directory",
            src
        )));
    }

    let pattern = src.join("**").join("*.txt");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::Custom(format!("non UTF-8 source path {:?}", src)))?;
    let mut paths = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.retain(|p| p.is_file());
    paths.sort();
    Ok(paths)
}

/// Name of the leftover file of `doc`, unique among the documents found under `src`.
///
/// `src/a/dict.txt` gives `a__dict.leftover.txt`, a single file source gives `dict.leftover.txt`.
pub fn leftover_name(src: &Path, doc: &Path) -> String {
    let relative = doc
        .strip_prefix(src)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .or_else(|| doc.file_name().map(Path::new))
        .unwrap_or(doc);
    let name = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("__");
    format!("{}.leftover.txt", name)
}

pub struct DatasetPipeline<G: Generate> {
    config: DatasetConfig,
    chunker: Chunker,
    generator: G,
    prompts: Prompts,
    retry: Retry,
}

impl<G: Generate> DatasetPipeline<G> {
    pub fn new(config: DatasetConfig, generator: G) -> Self {
        Self {
            chunker: Chunker::new(config.chunker.clone()),
            prompts: Prompts::new(&config.language),
            retry: Retry::new(config.max_attempts),
            config,
            generator,
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    fn limit_reached(&self, state: &RunState) -> bool {
        self.config
            .max_examples
            .map_or(false, |max| state.records().len() >= max)
    }

    /// Send a unit to the generator, retrying unusable responses.
    fn process_unit(&self, unit: &Unit, candidates: &[String]) -> Outcome {
        let prompt = self.prompts.unit(&unit.text(), candidates);
        generate_records(
            &self.generator,
            &self.prompts,
            &self.retry,
            &self.config.options,
            &prompt,
            &unit.label(),
        )
    }

    /// Process every unit of `doc`. The document has to be tracked already.
    fn process_document(
        &self,
        doc: &SourceDocument,
        state: &mut RunState,
        logs: &mut Logs,
    ) -> Result<(), Error> {
        for unit in self.chunker.chunk(doc) {
            if self.limit_reached(state) {
                info!("example limit reached, stopping");
                break;
            }
            state.unit_processed();

            let candidates = state.unused_candidates(unit.core());
            let outcome = if candidates.is_empty() {
                Outcome::Skipped {
                    reason: SkipReason::NoCandidateWords,
                    detail: "every candidate word was already described".to_string(),
                    attempts: 0,
                    responses: Vec::new(),
                }
            } else {
                let outcome = self.process_unit(&unit, &candidates);
                if !self.config.delay.is_zero() {
                    std::thread::sleep(self.config.delay);
                }
                outcome
            };

            match outcome {
                Outcome::Accepted {
                    mut records,
                    attempts,
                } => {
                    if let Some(max) = self.config.max_examples {
                        records.truncate(max.saturating_sub(state.records().len()));
                    }
                    debug!(
                        "{:?} {}: {} record(s) after {} attempt(s)",
                        doc.path(),
                        unit.label(),
                        records.len(),
                        attempts
                    );
                    for record in records {
                        state.accept(doc, &unit, record)?;
                    }
                }
                Outcome::Skipped {
                    reason,
                    detail,
                    attempts,
                    responses,
                } => {
                    warn!(
                        "{:?} {}: skipped after {} attempt(s): {}",
                        doc.path(),
                        unit.label(),
                        attempts,
                        detail
                    );
                    let entry = SkipEntry {
                        document: doc.path().to_path_buf(),
                        unit: unit.index(),
                        start_line: unit.start_line(),
                        end_line: unit.end_line(),
                        key: candidates.first().cloned(),
                        attempts,
                        reason,
                        detail,
                    };
                    if let Some(skip) = &mut logs.skip {
                        skip.write_single(&entry)?;
                    }
                    if let (Some(debug), false) = (&mut logs.debug, responses.is_empty()) {
                        debug.write_single(&DebugEntry {
                            subject: DebugSubject::Unit {
                                document: entry.document.clone(),
                                unit: entry.unit,
                                start_line: entry.start_line,
                                end_line: entry.end_line,
                            },
                            reason: entry.detail.clone(),
                            responses,
                        })?;
                    }
                    state.skip(entry);
                }
            }

            let stats = state.stats();
            if stats.nb_units % PROGRESS_EVERY == 0 {
                self.log_progress(doc, state)?;
            }
        }

        self.log_progress(doc, state)
    }

    fn log_progress(&self, doc: &SourceDocument, state: &RunState) -> Result<(), Error> {
        let stats = state.stats();
        let report = state.coverage().report(doc)?;
        info!(
            "{:?}: {} units, {} accepted, {} skipped, coverage {:.1}% ({}/{} lines)",
            doc.path(),
            stats.nb_units,
            stats.nb_accepted,
            stats.nb_skipped,
            report.coverage_percent,
            report.consumed_count,
            report.total_lines
        );
        Ok(())
    }

    fn write_leftover(&self, dir: &Path, doc: &SourceDocument, state: &RunState) -> Result<(), Error> {
        std::fs::create_dir_all(dir)?;
        let dst = dir.join(leftover_name(&self.config.src, doc.path()));
        let leftover = state.coverage().unused_content(doc)?;
        debug!("writing {} leftover chars to {:?}", leftover.chars().count(), dst);
        Ok(std::fs::write(dst, leftover)?)
    }

    /// Write the reverse translations of the structured records to `dst`.
    fn write_reverse(&self, dst: &Path, records: &[GeneratedRecord]) -> Result<usize, Error> {
        let entries = records.iter().filter_map(GeneratedRecord::entry);
        let conversations = reverse_translations(entries, &self.config.language);
        let nb_reverse = conversations.len();
        let mut writer = JsonlWriter::new(dst)?;
        writer.write(conversations)?;
        writer.close()?;
        info!("{} reverse translations written to {:?}", nb_reverse, dst);
        Ok(nb_reverse)
    }

    /// Run the pipeline on an existing state, so that words described in
    /// a previous pass are not described again.
    pub fn run_with_state(&self, state: &mut RunState) -> Result<RunSummary, Error> {
        let inputs = discover_inputs(&self.config.src)?;
        info!(
            "dataset pipeline v{}: {} input document(s)",
            <Self as Pipeline<RunSummary>>::version(),
            inputs.len()
        );

        let mut logs = Logs::new(&self.config)?;
        let mut failed = Vec::new();
        let mut coverage = Vec::new();

        for path in &inputs {
            if self.limit_reached(state) {
                break;
            }

            let doc = match SourceDocument::from_path(path) {
                Ok(doc) => doc,
                Err(e) => {
                    error!("could not read {:?}: {}", path, e);
                    failed.push(path.clone());
                    continue;
                }
            };

            info!("processing {:?} ({} lines)", doc.path(), doc.len());
            state.coverage_mut().start_tracking(&doc);
            self.process_document(&doc, state, &mut logs)?;

            if let Some(dir) = &self.config.leftover_dir {
                self.write_leftover(dir, &doc, state)?;
            }
            coverage.push(DocumentCoverage {
                document: doc.path().to_path_buf(),
                report: state.coverage_mut().finish(&doc)?,
            });
        }

        let records = state.take_records();
        let nb_written = write_merged(&records, &self.config.dst)?;
        let nb_reverse = match &self.config.reverse {
            Some(dst) => self.write_reverse(dst, &records)?,
            None => 0,
        };
        logs.close()?;

        if let Some(dst) = &self.config.coverage_report {
            let file = std::fs::File::create(dst)?;
            serde_json::to_writer_pretty(file, &coverage)?;
        }

        let stats = state.stats();
        let summary = RunSummary {
            nb_documents: inputs.len(),
            failed,
            nb_units: stats.nb_units,
            nb_accepted: stats.nb_accepted,
            nb_skipped: stats.nb_skipped,
            nb_written,
            nb_reverse,
            coverage,
        };
        info!(
            "done: {} units, {} accepted, {} skipped, {} conversations written to {:?}",
            summary.nb_units, summary.nb_accepted, summary.nb_skipped, nb_written, self.config.dst
        );
        Ok(summary)
    }
}

impl<G: Generate> Pipeline<RunSummary> for DatasetPipeline<G> {
    fn version() -> &'static str {
        "0.1.0"
    }

    fn run(&self) -> Result<RunSummary, Error> {
        self.run_with_state(&mut RunState::new())
    }
}
