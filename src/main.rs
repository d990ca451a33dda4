//! # yanomami-dataset
//!
//! Fine-tuning dataset builder for low-resource languages.
//!
//! ## Getting started
//!
//! API credentials are read from `--api-key` or `DATASET_GEN_ANTHROPIC_KEY`,
//! that can be put in a `.env.generator` (or `.env`) file in the working directory.
//!
//! ```sh
//! yanomami-dataset 0.1.0
//! fine-tuning dataset builder for low-resource languages.
//!
//! USAGE:
//!     yanomami-dataset <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     dedup                Remove identical conversations
//!     duplicates           Extract conversations whose key was already seen
//!     generate             Generate a dataset from dictionary text files
//!     help                 Prints this message or the help of the given subcommand(s)
//!     merge                Merge conversations sharing a key
//!     missing-words        List words that a dataset does not mention
//!     reverse              Derive english to language questions from a dataset
//!     translate-missing    Generate entries for a list of words, from the lines mentioning them
//!     validate             Check that datasets are usable for fine-tuning
//!     words                List the candidate words of a dictionary text
//! ```
use structopt::StructOpt;

use yanomami_dataset::cli::{self, YanomamiDataset};
use yanomami_dataset::error::Error;
use yanomami_dataset::pipeline::{DatasetPipeline, MissingWordsPipeline, Pipeline};
use yanomami_dataset::processing::{self, dedup, duplicates, reverse, validate, words};

#[macro_use]
extern crate log;

/// env files loaded before parsing arguments, in order of precedence.
const ENV_FILES: [&str; 2] = [".env.generator", ".env"];

fn run_generate(g: cli::Generate) -> Result<(), Error> {
    let config = g.dataset_config()?;
    let generator = g.generation.generator()?;
    info!("using model {} at {}", generator.model(), generator.base_url());

    let p = DatasetPipeline::new(config, generator);
    let summary = p.run()?;

    if !summary.failed.is_empty() {
        for path in &summary.failed {
            error!("failed to process {:?}", path);
        }
        return Err(Error::Custom(format!(
            "{} of {} documents could not be processed",
            summary.failed.len(),
            summary.nb_documents
        )));
    }
    Ok(())
}

fn run_translate_missing(t: cli::TranslateMissing) -> Result<(), Error> {
    let config = t.missing_words_config();
    let generator = t.generation.generator()?;
    info!("using model {} at {}", generator.model(), generator.base_url());

    let summary = MissingWordsPipeline::new(config, generator).run()?;
    for path in &summary.failed {
        warn!("could not read {:?}", path);
    }
    Ok(())
}

fn run_validate(v: cli::Validate) -> Result<(), Error> {
    let mut nb_invalid = 0;
    for (src, report) in v.src.iter().zip(validate::validate_files(&v.src)) {
        match report {
            Ok(report) if report.is_valid() => (),
            Ok(report) => {
                for line in &report.invalid {
                    warn!("{:?}:{}: {}", src, line.line, line.reason);
                }
                nb_invalid += 1;
            }
            Err(e) => {
                error!("could not validate {:?}: {}", src, e);
                nb_invalid += 1;
            }
        }
    }

    if nb_invalid > 0 {
        return Err(Error::Custom(format!(
            "{} of {} datasets are invalid",
            nb_invalid,
            v.src.len()
        )));
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    // loaded before the logger so that RUST_LOG can be set there too
    let loaded: Vec<_> = ENV_FILES
        .iter()
        .map(|file| (file, dotenv::from_filename(file)))
        .collect();

    env_logger::init();
    for (file, result) in loaded {
        match result {
            Ok(path) => debug!("loaded environment from {:?}", path),
            Err(e) => debug!("{} not loaded: {}", file, e),
        }
    }

    let opt = YanomamiDataset::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        YanomamiDataset::Generate(g) => run_generate(g)?,
        YanomamiDataset::Merge(m) => processing::merge_file(&m.src, &m.dst, m.key, &m.separator)?,
        YanomamiDataset::Dedup(d) => {
            dedup::dedup_file(&d.src, &d.dst)?;
        }
        YanomamiDataset::Duplicates(d) => {
            duplicates::duplicates_file(&d.src, &d.dst, d.key)?;
        }
        YanomamiDataset::Validate(v) => run_validate(v)?,
        YanomamiDataset::Words(w) => {
            words::words_file(&w.src, &w.dst)?;
        }
        YanomamiDataset::MissingWords(m) => {
            words::missing_words_file(&m.words, &m.dataset, &m.dst)?;
        }
        YanomamiDataset::TranslateMissing(t) => run_translate_missing(t)?,
        YanomamiDataset::Reverse(r) => {
            reverse::reverse_file(&r.src, &r.dst, &r.language)?;
        }
    };
    Ok(())
}
