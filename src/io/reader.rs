/*! JSON Lines dataset reader.

[DatasetReader] iterates over the conversations of a dataset, along with their 1-based
line number. Blank lines are skipped.
!*/
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

use crate::error::Error;
use crate::record::Conversation;

#[derive(Debug)]
pub struct DatasetReader<T>
where
    T: Read,
{
    lines: Lines<BufReader<T>>,
    line_no: usize,
}

impl<T: Read> DatasetReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line_no: 0,
        }
    }
}

impl DatasetReader<File> {
    pub fn from_path(src: &Path) -> Result<Self, Error> {
        Ok(Self::new(File::open(src)?))
    }
}

impl<T> Iterator for DatasetReader<T>
where
    T: Read,
{
    type Item = (usize, Result<Conversation, Error>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some((self.line_no, Err(Error::Io(e)))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some((
                self.line_no,
                serde_json::from_str::<Conversation>(&line).map_err(Error::Serde),
            ));
        }
    }
}

/// Read a whole dataset, failing on the first unreadable line.
pub fn read_dataset(src: &Path) -> Result<Vec<Conversation>, Error> {
    DatasetReader::from_path(src)?
        .map(|(line_no, conversation)| {
            conversation.map_err(|e| Error::Custom(format!("{:?}:{}: {}", src, line_no, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    const DATA: &str = r#"{"messages":[{"role":"user","content":"What does 'ahë' mean in Yanomami?"},{"role":"assistant","content":"It means yours."}]}

{"messages": "nope"}
{"messages":[{"role":"user","content":"What does 'ahete' mean in Yanomami?"},{"role":"assistant","content":"It means to approach."}]}
"#;

    #[test]
    fn line_numbers_and_errors() {
        let items: Vec<_> = DatasetReader::new(Cursor::new(DATA)).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, 1);
        assert!(items[0].1.is_ok());
        assert_eq!(items[1].0, 3);
        assert!(items[1].1.is_err());
        assert_eq!(items[2].0, 4);
        assert_eq!(
            items[2].1.as_ref().unwrap().question(),
            Some("What does 'ahete' mean in Yanomami?")
        );
    }

    #[test]
    fn read_whole_dataset() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", DATA).unwrap();
        let err = read_dataset(f.path()).unwrap_err();
        assert!(err.to_string().contains(":3:"));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        let valid: String = DATA.lines().filter(|l| !l.contains("nope")).collect::<Vec<_>>().join("\n");
        write!(f, "{}", valid).unwrap();
        assert_eq!(read_dataset(f.path()).unwrap().len(), 2);
    }
}
