//! JSON Lines writer.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use serde::Serialize;

use super::{create_file, WriterTrait};
use crate::error::Error;

/// Writes each item as a JSON object on its own line.
pub struct JsonlWriter<T> {
    handle: BufWriter<File>,
    nb_written: usize,
    item: PhantomData<T>,
}

impl<T> JsonlWriter<T> {
    /// Number of items written so far.
    pub fn nb_written(&self) -> usize {
        self.nb_written
    }
}

impl<T: Serialize> WriterTrait for JsonlWriter<T> {
    type Item = T;

    fn new(dst: &Path) -> Result<Self, Error> {
        Ok(Self {
            handle: create_file(dst)?,
            nb_written: 0,
            item: PhantomData,
        })
    }

    fn write(&mut self, vals: Vec<T>) -> Result<(), Error> {
        for val in &vals {
            self.write_single(val)?;
        }
        Ok(())
    }

    fn write_single(&mut self, val: &T) -> Result<(), Error> {
        serde_json::to_writer(&mut self.handle, val)?;
        self.handle.write_all(b"\n")?;
        self.nb_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        Ok(self.handle.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Conversation;

    #[test]
    fn write_lines() {
        let dst = tempfile::tempdir().unwrap();
        let path = dst.path().join("out/dataset.jsonl");
        let mut w = JsonlWriter::<Conversation>::new(&path).unwrap();
        let c = Conversation::new(
            "What does 'ahë' mean in Yanomami?".to_string(),
            "It means yours.".to_string(),
        );
        w.write_single(&c).unwrap();
        w.write(vec![c.clone(), c.clone()]).unwrap();
        w.close().unwrap();
        assert_eq!(w.nb_written(), 3);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        let back: Conversation = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(back, c);
    }
}
