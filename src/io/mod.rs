/*!
# IO utilities

Reading and writing of JSON Lines datasets, and of the run logs (skip log, debug log).
!*/
pub mod reader;
pub mod writer;

pub use reader::{read_dataset, DatasetReader};
pub use writer::{DebugEntry, DebugLog, DebugSubject, JsonlWriter, WriterTrait};
