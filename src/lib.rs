/*!
# yanomami-dataset

Builds fine-tuning datasets for low-resource languages out of dictionary text files.

A source document is split into bounded [chunking::Unit]s, each unit is sent to a text
generator ([generation::Generate]) that describes the words it defines, and the resulting
records are validated, tracked against the source lines they come from ([coverage]) and
finally merged by key ([processing::merge]) into a JSON Lines dataset.

This crate can be used both as a tool (see the `yanomami-dataset` binary)
or as a lib, using a custom generator.
!*/
pub mod chunking;
pub mod cli;
pub mod coverage;
pub mod document;
pub mod error;
pub mod generation;
pub mod io;
pub mod pipeline;
pub mod processing;
pub mod record;
