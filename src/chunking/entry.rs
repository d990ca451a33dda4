//! Logical entries of a source document.
//!
//! A dictionary file is a sequence of entries. How entries are separated depends on the file:
//! blank lines, numbered markers (`12. word ...`) or one entry per line.
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::SourceDocument;
use crate::error::Error;

lazy_static! {
    static ref NUMBERED_MARKER: Regex = Regex::new(r"^\s*\d+[.)]\s").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Entries are groups of lines separated by one or more blank lines.
    #[default]
    BlankLine,
    /// Entries start at lines beginning with a number followed by `.` or `)`.
    Numbered,
    /// Each non-blank line is an entry.
    Line,
}

impl Delimiter {
    /// String used to join entries (or an overlap) back together.
    pub fn separator(&self) -> &'static str {
        match self {
            Delimiter::BlankLine | Delimiter::Numbered => "\n\n",
            Delimiter::Line => "\n",
        }
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blank" | "blank-line" => Ok(Delimiter::BlankLine),
            "numbered" => Ok(Delimiter::Numbered),
            "line" => Ok(Delimiter::Line),
            other => Err(Error::InvalidConfig(format!(
                "unknown delimiter {:?} (expected blank, numbered or line)",
                other
            ))),
        }
    }
}

/// A logical entry, with the inclusive range of source lines it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    text: String,
    start_line: usize,
    end_line: usize,
}

impl Entry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// size in unicode codepoints
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}

/// Builds an entry from grouped lines, dropping blank lines.
/// Returns [None] if nothing but whitespace is left.
fn flush(group: &mut Vec<(usize, &str)>) -> Option<Entry> {
    let lines: Vec<(usize, &str)> = group
        .drain(..)
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let (first, last) = (lines.first()?.0, lines.last()?.0);
    let text = lines
        .iter()
        .map(|(_, line)| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    Some(Entry {
        text,
        start_line: first,
        end_line: last,
    })
}

/// Partition a document into its non-empty logical entries.
pub fn entries(doc: &SourceDocument, delimiter: Delimiter) -> Vec<Entry> {
    let mut ret = Vec::new();
    let mut group: Vec<(usize, &str)> = Vec::new();

    for (idx, line) in doc.lines().iter().enumerate() {
        let line = line.as_str();
        let starts_entry = match delimiter {
            Delimiter::BlankLine => line.trim().is_empty(),
            Delimiter::Numbered => NUMBERED_MARKER.is_match(line),
            Delimiter::Line => true,
        };

        if starts_entry {
            ret.extend(flush(&mut group));
        }
        group.push((idx, line));
    }
    ret.extend(flush(&mut group));

    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> SourceDocument {
        SourceDocument::new("test.txt", content)
    }

    #[test]
    fn blank_line_entries() {
        let d = doc("ahë\nyours\n\n\n  \nahete\nto approach\n");
        let e = entries(&d, Delimiter::BlankLine);
        assert_eq!(e.len(), 2);
        assert_eq!(e[0].text(), "ahë\nyours");
        assert_eq!((e[0].start_line(), e[0].end_line()), (0, 1));
        assert_eq!(e[1].text(), "ahete\nto approach");
        assert_eq!((e[1].start_line(), e[1].end_line()), (5, 6));
    }

    #[test]
    fn numbered_entries() {
        let d = doc("header\n1. ahë means yours.\n\n2. ahete means to approach.\ncontinued\n");
        let e = entries(&d, Delimiter::Numbered);
        assert_eq!(e.len(), 3);
        assert_eq!(e[0].text(), "header");
        assert_eq!(e[1].text(), "1. ahë means yours.");
        assert_eq!((e[1].start_line(), e[1].end_line()), (1, 1));
        assert_eq!(e[2].text(), "2. ahete means to approach.\ncontinued");
        assert_eq!((e[2].start_line(), e[2].end_line()), (3, 4));
    }

    #[test]
    fn line_entries_skip_blank() {
        let d = doc("a\n\n   \nb");
        let e = entries(&d, Delimiter::Line);
        assert_eq!(e.len(), 2);
        assert_eq!(e[1].start_line(), 3);
    }

    #[test]
    fn whitespace_only_document() {
        let d = doc("\n   \n\t\n");
        assert!(entries(&d, Delimiter::BlankLine).is_empty());
        assert!(entries(&d, Delimiter::Numbered).is_empty());
        assert!(entries(&d, Delimiter::Line).is_empty());
    }

    #[test]
    fn delimiter_from_str() {
        assert_eq!("numbered".parse::<Delimiter>().unwrap(), Delimiter::Numbered);
        assert!("comma".parse::<Delimiter>().is_err());
    }
}
