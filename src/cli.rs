//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use crate::chunking::{ChunkerConfig, ChunkerConfigBuilder, Delimiter};
use crate::error::Error;
use crate::generation::{AnthropicGenerator, AnthropicGeneratorBuilder, GenerationOptions};
use crate::pipeline::{DatasetConfig, MissingWordsConfig};
use crate::record::KeyKind;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "yanomami-dataset",
    about = "fine-tuning dataset builder for low-resource languages."
)]
/// Holds every command that is callable by the `yanomami-dataset` command.
pub enum YanomamiDataset {
    #[structopt(about = "Generate a dataset from dictionary text files")]
    Generate(Generate),
    #[structopt(about = "Merge conversations sharing a key")]
    Merge(Merge),
    #[structopt(about = "Remove identical conversations")]
    Dedup(Dedup),
    #[structopt(about = "Extract conversations whose key was already seen")]
    Duplicates(Duplicates),
    #[structopt(about = "Check that datasets are usable for fine-tuning")]
    Validate(Validate),
    #[structopt(about = "List the candidate words of a dictionary text")]
    Words(Words),
    #[structopt(about = "List words that a dataset does not mention")]
    MissingWords(MissingWords),
    #[structopt(about = "Generate entries for a list of words, from the lines mentioning them")]
    TranslateMissing(TranslateMissing),
    #[structopt(about = "Derive english to language questions from a dataset")]
    Reverse(Reverse),
}

#[derive(Debug, StructOpt)]
/// Generate command and parameters.
pub struct Generate {
    #[structopt(
        parse(from_os_str),
        help = "source dictionary file, or folder of .txt files"
    )]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination dataset (JSON Lines)")]
    pub dst: PathBuf,

    #[structopt(long, default_value = "1000", help = "maximum unit size (characters)")]
    pub max_unit_size: usize,
    #[structopt(long, default_value = "1", help = "minimum number of entries per unit")]
    pub min_entries: usize,
    #[structopt(long, default_value = "10", help = "maximum number of entries per unit")]
    pub max_entries: usize,
    #[structopt(
        long,
        default_value = "0",
        help = "fraction of the unit size appended as lookahead context, in [0, 1)"
    )]
    pub overlap: f64,
    #[structopt(long, help = "stop after this many units per document")]
    pub target_units: Option<usize>,
    #[structopt(
        long,
        default_value = "blank",
        help = "entry delimiter: blank, numbered or line"
    )]
    pub delimiter: Delimiter,
    #[structopt(long, help = "split entries larger than the unit size")]
    pub hard_split: bool,

    #[structopt(long, help = "stop once this many records are accepted")]
    pub max_examples: Option<usize>,
    #[structopt(flatten)]
    pub generation: GeneratorArgs,

    #[structopt(
        long,
        parse(from_os_str),
        help = "folder where unused content of each document is written"
    )]
    pub leftover_dir: Option<PathBuf>,
    #[structopt(long, parse(from_os_str), help = "coverage report (JSON)")]
    pub coverage_report: Option<PathBuf>,
    #[structopt(
        long,
        parse(from_os_str),
        help = "also write reverse translations (JSON Lines)"
    )]
    pub reverse: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
/// Generator parameters, shared by the commands calling the generator.
pub struct GeneratorArgs {
    #[structopt(long, default_value = "1000", help = "pause between generation calls (ms)")]
    pub delay_ms: u64,
    #[structopt(long, default_value = "30", help = "generation call timeout (seconds)")]
    pub timeout_secs: u64,
    #[structopt(long, default_value = "3", help = "attempts per request on unusable responses")]
    pub max_attempts: usize,
    #[structopt(long, default_value = "1000")]
    pub max_tokens: usize,
    #[structopt(long, default_value = "0.1")]
    pub temperature: f32,

    #[structopt(long, env = "DATASET_GEN_ANTHROPIC_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[structopt(long, env = "DATASET_GEN_CLAUDE_MODEL", default_value = "claude-3-sonnet-20240229")]
    pub model: String,
    #[structopt(long, default_value = "https://api.anthropic.com/v1")]
    pub base_url: String,
    #[structopt(long, default_value = "Yanomami", help = "name of the described language")]
    pub language: String,

    #[structopt(long, parse(from_os_str), help = "skipped requests (JSON Lines)")]
    pub skip_log: Option<PathBuf>,
    #[structopt(long, parse(from_os_str), help = "raw responses of failed requests")]
    pub debug_log: Option<PathBuf>,
}

impl GeneratorArgs {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: None,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn generator(&self) -> Result<AnthropicGenerator, Error> {
        let mut builder = AnthropicGeneratorBuilder::default();
        if let Some(key) = &self.api_key {
            builder.api_key(key);
        }
        builder
            .model(&self.model)
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

impl Generate {
    pub fn chunker_config(&self) -> Result<ChunkerConfig, Error> {
        ChunkerConfigBuilder::default()
            .max_unit_size(self.max_unit_size)
            .min_entries(self.min_entries)
            .max_entries(self.max_entries)
            .overlap(self.overlap)
            .target_units(self.target_units)
            .delimiter(self.delimiter)
            .hard_split(self.hard_split)
            .build()
    }

    pub fn dataset_config(&self) -> Result<DatasetConfig, Error> {
        let mut config = DatasetConfig::new(self.src.clone(), self.dst.clone());
        config.chunker = self.chunker_config()?;
        let generation = &self.generation;
        config.options = generation.options();
        config.max_attempts = generation.max_attempts;
        config.delay = generation.delay();
        config.max_examples = self.max_examples;
        config.language = generation.language.clone();
        config.skip_log = generation.skip_log.clone();
        config.debug_log = generation.debug_log.clone();
        config.leftover_dir = self.leftover_dir.clone();
        config.coverage_report = self.coverage_report.clone();
        config.reverse = self.reverse.clone();
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
pub struct Merge {
    #[structopt(parse(from_os_str), help = "source dataset")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination dataset")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "quoted-word", help = "quoted-word or question")]
    pub key: KeyKind,
    #[structopt(long, default_value = "\n\n---\nAlternative interpretation:\n\n", help = "text put between merged answers")]
    pub separator: String,
}

#[derive(Debug, StructOpt)]
pub struct Dedup {
    #[structopt(parse(from_os_str), help = "source dataset")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination dataset")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct Duplicates {
    #[structopt(parse(from_os_str), help = "source dataset")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination of repeated conversations")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "quoted-word", help = "quoted-word or question")]
    pub key: KeyKind,
}

#[derive(Debug, StructOpt)]
pub struct Validate {
    #[structopt(parse(from_os_str), required = true, help = "datasets to check")]
    pub src: Vec<PathBuf>,
}

#[derive(Debug, StructOpt)]
pub struct Words {
    #[structopt(parse(from_os_str), help = "source dictionary text")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination word list")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct MissingWords {
    #[structopt(parse(from_os_str), help = "word list, one word per line")]
    pub words: PathBuf,
    #[structopt(parse(from_os_str), help = "dataset to search")]
    pub dataset: PathBuf,
    #[structopt(parse(from_os_str), help = "destination of missing words")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct TranslateMissing {
    #[structopt(parse(from_os_str), help = "word list, one word per line")]
    pub words: PathBuf,
    #[structopt(
        parse(from_os_str),
        help = "source dictionary file, or folder of .txt files"
    )]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination dataset (JSON Lines)")]
    pub dst: PathBuf,
    #[structopt(
        long,
        parse(from_os_str),
        help = "existing dataset, its words are not generated again"
    )]
    pub dataset: Option<PathBuf>,
    #[structopt(flatten)]
    pub generation: GeneratorArgs,
}

impl TranslateMissing {
    pub fn missing_words_config(&self) -> MissingWordsConfig {
        let mut config =
            MissingWordsConfig::new(self.words.clone(), self.src.clone(), self.dst.clone());
        let generation = &self.generation;
        config.dataset = self.dataset.clone();
        config.options = generation.options();
        config.max_attempts = generation.max_attempts;
        config.delay = generation.delay();
        config.language = generation.language.clone();
        config.skip_log = generation.skip_log.clone();
        config.debug_log = generation.debug_log.clone();
        config
    }
}

#[derive(Debug, StructOpt)]
pub struct Reverse {
    #[structopt(parse(from_os_str), help = "source dataset")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination of reverse translations")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "Yanomami", help = "name of the described language")]
    pub language: String,
}
