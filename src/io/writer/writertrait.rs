use std::path::Path;

use crate::error::Error;

pub trait WriterTrait {
    type Item;

    fn new(dst: &Path) -> Result<Self, Error>
    where
        Self: Sized;
    fn write(&mut self, vals: Vec<Self::Item>) -> Result<(), Error>;
    fn write_single(&mut self, val: &Self::Item) -> Result<(), Error>;
    /// Flush buffered content to disk.
    fn close(&mut self) -> Result<(), Error>;
}
