/*! Unit production.

[Chunker] greedily packs consecutive [Entry]s into [Unit]s of bounded size.

- A unit is closed when the next entry would push its core over `max_unit_size`,
  or when it already holds `max_entries` entries.
  `min_entries` is honoured as long as the next entry fits: the size bound always wins.
- An entry larger than `max_unit_size` is always emitted alone. With `hard_split`,
  it is cut at grapheme boundaries into labelled parts that all fit.
- Each unit may carry an overlap: the text of the entries that follow it,
  truncated to `overlap * max_unit_size` characters. Overlap is context only,
  the cursor only advances past the core entries.
!*/
use std::collections::VecDeque;
use std::ops::RangeInclusive;

use log::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::entry::{entries, Delimiter, Entry};
use crate::document::SourceDocument;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerConfig {
    max_unit_size: usize,
    min_entries: usize,
    max_entries: usize,
    overlap: f64,
    target_units: Option<usize>,
    delimiter: Delimiter,
    hard_split: bool,
}

impl ChunkerConfig {
    pub fn max_unit_size(&self) -> usize {
        self.max_unit_size
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    pub fn target_units(&self) -> Option<usize> {
        self.target_units
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn hard_split(&self) -> bool {
        self.hard_split
    }

    /// number of characters available for the overlap suffix
    fn overlap_budget(&self) -> usize {
        (self.overlap * self.max_unit_size as f64).floor() as usize
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_unit_size: 1000,
            min_entries: 1,
            max_entries: 10,
            overlap: 0.0,
            target_units: None,
            delimiter: Delimiter::BlankLine,
            hard_split: false,
        }
    }
}

/// Builder for [ChunkerConfig]. Unset fields take [ChunkerConfig::default] values.
#[derive(Debug, Default, Clone)]
pub struct ChunkerConfigBuilder {
    max_unit_size: Option<usize>,
    min_entries: Option<usize>,
    max_entries: Option<usize>,
    overlap: Option<f64>,
    target_units: Option<usize>,
    delimiter: Option<Delimiter>,
    hard_split: Option<bool>,
}

impl ChunkerConfigBuilder {
    pub fn max_unit_size(&mut self, max_unit_size: usize) -> &mut Self {
        self.max_unit_size = Some(max_unit_size);
        self
    }

    pub fn min_entries(&mut self, min_entries: usize) -> &mut Self {
        self.min_entries = Some(min_entries);
        self
    }

    pub fn max_entries(&mut self, max_entries: usize) -> &mut Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn overlap(&mut self, overlap: f64) -> &mut Self {
        self.overlap = Some(overlap);
        self
    }

    pub fn target_units(&mut self, target_units: Option<usize>) -> &mut Self {
        self.target_units = target_units;
        self
    }

    pub fn delimiter(&mut self, delimiter: Delimiter) -> &mut Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn hard_split(&mut self, hard_split: bool) -> &mut Self {
        self.hard_split = Some(hard_split);
        self
    }

    pub fn build(&self) -> Result<ChunkerConfig, Error> {
        let default = ChunkerConfig::default();
        let config = ChunkerConfig {
            max_unit_size: self.max_unit_size.unwrap_or(default.max_unit_size),
            min_entries: self.min_entries.unwrap_or(default.min_entries),
            max_entries: self.max_entries.unwrap_or(default.max_entries),
            overlap: self.overlap.unwrap_or(default.overlap),
            target_units: self.target_units,
            delimiter: self.delimiter.unwrap_or(default.delimiter),
            hard_split: self.hard_split.unwrap_or(default.hard_split),
        };

        let error = if config.max_unit_size == 0 {
            Some("max unit size must be greater than 0".to_string())
        } else if !(0.0..1.0).contains(&config.overlap) {
            Some(format!("overlap must be in [0, 1), got {}", config.overlap))
        } else if config.min_entries == 0 {
            Some("min entries must be at least 1".to_string())
        } else if config.min_entries > config.max_entries {
            Some(format!(
                "min entries ({}) is greater than max entries ({})",
                config.min_entries, config.max_entries
            ))
        } else if config.target_units == Some(0) {
            Some("target unit count must be greater than 0".to_string())
        } else {
            None
        };

        match error {
            Some(e) => Err(Error::InvalidConfig(e)),
            None => Ok(config),
        }
    }
}

/// A bounded slice of a document, ready to be sent for generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    index: usize,
    core: String,
    overlap: Option<String>,
    start_line: usize,
    core_end_line: usize,
    end_line: usize,
    nb_entries: usize,
    part: Option<(usize, usize)>,
    separator: &'static str,
}

impl Unit {
    /// position of the unit in the sequence produced for its document
    pub fn index(&self) -> usize {
        self.index
    }

    /// Full text to submit: core followed by the overlap context, if any.
    pub fn text(&self) -> String {
        match &self.overlap {
            Some(overlap) => format!("{}{}{}", self.core, self.separator, overlap),
            None => self.core.clone(),
        }
    }

    /// Text of the entries this unit consumes.
    pub fn core(&self) -> &str {
        &self.core
    }

    pub fn overlap(&self) -> Option<&str> {
        self.overlap.as_deref()
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Last line of the core region.
    pub fn core_end_line(&self) -> usize {
        self.core_end_line
    }

    /// Last line covered by the unit, overlap included.
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    pub fn core_lines(&self) -> RangeInclusive<usize> {
        self.start_line..=self.core_end_line
    }

    pub fn nb_entries(&self) -> usize {
        self.nb_entries
    }

    /// `Some((k, n))` if this unit is the k-th (1-based) of n parts of a split entry.
    pub fn part(&self) -> Option<(usize, usize)> {
        self.part
    }

    /// core size in unicode codepoints
    pub fn core_size(&self) -> usize {
        self.core.chars().count()
    }

    /// Short human readable identifier, used in logs.
    pub fn label(&self) -> String {
        let mut label = format!(
            "unit {} (lines {}-{})",
            self.index, self.start_line, self.end_line
        );
        if let Some((k, n)) = self.part {
            label.push_str(&format!(" part {}/{}", k, n));
        }
        label
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Get a lazy iterator over the units of `doc`.
    ///
    /// Calling this again restarts from the first unit.
    pub fn chunk(&self, doc: &SourceDocument) -> Chunks {
        let entries = entries(doc, self.config.delimiter);
        debug!("{:?}: {} entries", doc.path(), entries.len());
        Chunks {
            config: self.config.clone(),
            entries,
            cursor: 0,
            produced: 0,
            pending: VecDeque::new(),
        }
    }
}

/// Iterator over the [Unit]s of a document. See [Chunker::chunk].
#[derive(Debug, Clone)]
pub struct Chunks {
    config: ChunkerConfig,
    entries: Vec<Entry>,
    cursor: usize,
    produced: usize,
    pending: VecDeque<Unit>,
}

impl Chunks {
    /// Overlap text built from the entries starting at the cursor,
    /// along with the last line it reaches.
    fn overlap_from_cursor(&self) -> Option<(String, usize)> {
        let mut remaining = self.config.overlap_budget();
        let separator = self.config.delimiter.separator();
        let mut text = String::new();
        let mut end_line = None;

        for (i, entry) in self.entries[self.cursor..].iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if i > 0 {
                let sep: String = separator.chars().take(remaining).collect();
                remaining -= sep.chars().count();
                text.push_str(&sep);
                if remaining == 0 {
                    break;
                }
            }
            let taken: String = entry.text().chars().take(remaining).collect();
            remaining -= taken.chars().count();
            text.push_str(&taken);
            end_line = Some(entry.end_line());
        }

        end_line.map(|end| (text, end))
    }

    /// Decide how many entries starting at the cursor go in the next unit.
    fn next_core_len(&self) -> usize {
        let max_size = self.config.max_unit_size;
        let sep_size = self.config.delimiter.separator().chars().count();
        let mut size = 0;
        let mut count = 0;

        for entry in &self.entries[self.cursor..] {
            let entry_size = entry.size();
            if count == 0 {
                count = 1;
                size = entry_size;
                if entry_size > max_size {
                    // oversized entries stand alone
                    break;
                }
                continue;
            }

            if count >= self.config.max_entries {
                break;
            }
            if size + sep_size + entry_size > max_size {
                if count < self.config.min_entries {
                    debug!(
                        "closing unit with {} entries (min {}): next entry does not fit",
                        count, self.config.min_entries
                    );
                }
                break;
            }
            size += sep_size + entry_size;
            count += 1;
        }

        count
    }

    fn split_entry(entry: &Entry, max_size: usize) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut current_size = 0;

        for grapheme in entry.text().graphemes(true) {
            let g_size = grapheme.chars().count();
            if current_size + g_size > max_size && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_size = 0;
            }
            current.push_str(grapheme);
            current_size += g_size;
        }
        if !current.is_empty() {
            parts.push(current);
        }

        parts
    }

    /// Build the next units (several if an entry is hard-split) and queue them.
    fn fill_pending(&mut self) {
        let count = self.next_core_len();
        if count == 0 {
            return;
        }

        let separator = self.config.delimiter.separator();
        let core_entries = &self.entries[self.cursor..self.cursor + count];
        let start_line = core_entries[0].start_line();
        let core_end_line = core_entries[count - 1].end_line();
        let oversized = count == 1 && core_entries[0].size() > self.config.max_unit_size;

        let cores: Vec<String> = if oversized && self.config.hard_split {
            Self::split_entry(&core_entries[0], self.config.max_unit_size)
        } else {
            vec![core_entries
                .iter()
                .map(Entry::text)
                .collect::<Vec<_>>()
                .join(separator)]
        };

        if oversized {
            debug!(
                "entry at lines {}-{} is larger than {} chars ({} part(s))",
                start_line,
                core_end_line,
                self.config.max_unit_size,
                cores.len()
            );
        }

        self.cursor += count;
        let overlap = self.overlap_from_cursor();

        let nb_parts = cores.len();
        for (k, core) in cores.into_iter().enumerate() {
            let is_last = k + 1 == nb_parts;
            let (overlap, end_line) = match (&overlap, is_last) {
                (Some((text, end)), true) => (Some(text.clone()), *end),
                _ => (None, core_end_line),
            };
            self.pending.push_back(Unit {
                index: 0,
                core,
                overlap,
                start_line,
                core_end_line,
                end_line,
                nb_entries: count,
                part: if nb_parts > 1 {
                    Some((k + 1, nb_parts))
                } else {
                    None
                },
                separator,
            });
        }
    }
}

impl Iterator for Chunks {
    type Item = Unit;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(target) = self.config.target_units {
            if self.produced >= target {
                return None;
            }
        }

        if self.pending.is_empty() {
            self.fill_pending();
        }

        let mut unit = self.pending.pop_front()?;
        unit.index = self.produced;
        self.produced += 1;
        Some(unit)
    }
}
