//! Generation with corrective retries, shared by the pipelines.
use std::path::Path;

use log::{debug, info};

use crate::error::Error;
use crate::generation::{Generate, GenerationOptions, Prompts, Retry, RetryState};
use crate::io::writer::{JsonlWriter, WriterTrait};
use crate::pipeline::state::SkipReason;
use crate::processing::{concat_answers, merge, DEFAULT_SEPARATOR};
use crate::record::{parse_response, Conversation, GeneratedRecord, KeyKind, ResponseError};

/// What happened to one generation request.
pub(crate) enum Outcome {
    Accepted {
        records: Vec<GeneratedRecord>,
        attempts: usize,
    },
    Skipped {
        reason: SkipReason,
        detail: String,
        attempts: usize,
        /// raw responses, in attempt order
        responses: Vec<String>,
    },
}

impl From<&ResponseError> for SkipReason {
    fn from(e: &ResponseError) -> Self {
        match e {
            ResponseError::Malformed(_) => SkipReason::Malformed,
            ResponseError::Invalid(_) => SkipReason::Invalid,
        }
    }
}

/// Send `prompt`, retrying unusable responses with a corrective prompt.
///
/// Generation errors end the request right away. `label` only appears in logs.
pub(crate) fn generate_records<G: Generate>(
    generator: &G,
    prompts: &Prompts,
    retry: &Retry,
    options: &GenerationOptions,
    prompt: &str,
    label: &str,
) -> Outcome {
    let mut current = prompt.to_string();
    let mut responses = Vec::new();
    let mut attempt = retry.start();

    loop {
        let n = match attempt {
            RetryState::Attempting(n) => n,
            RetryState::Success { value, attempts } => {
                return Outcome::Accepted {
                    records: value,
                    attempts,
                }
            }
            RetryState::Exhausted {
                attempts,
                last_error,
            } => {
                return Outcome::Skipped {
                    reason: SkipReason::from(&last_error),
                    detail: last_error.to_string(),
                    attempts,
                    responses,
                }
            }
        };

        debug!("{}: attempt {}/{}", label, n, retry.max_attempts());
        let raw = match generator.generate(&current, options) {
            Ok(raw) => raw,
            Err(e) => {
                return Outcome::Skipped {
                    reason: SkipReason::Generation,
                    detail: e.to_string(),
                    attempts: n,
                    responses,
                }
            }
        };

        let parsed = parse_response(&raw, prompts.language());
        if let Err(e) = &parsed {
            debug!("{}: unusable response: {}", label, e);
            current = prompts.corrective(prompt, &raw, e);
        }
        responses.push(raw);
        attempt = retry.advance(attempt, parsed);
    }
}

/// Merge `records` by quoted word and write them to `dst`. Returns the number of lines written.
pub(crate) fn write_merged(records: &[GeneratedRecord], dst: &Path) -> Result<usize, Error> {
    let conversations = records.iter().map(GeneratedRecord::to_conversation);
    let outcome = merge(
        conversations,
        |c: &Conversation| KeyKind::QuotedWord.extract(c),
        concat_answers(DEFAULT_SEPARATOR),
    );
    if outcome.nb_collisions() > 0 {
        info!("{} keys had several records, merged", outcome.nb_collisions());
    }

    let conversations = outcome.into_records();
    let nb_written = conversations.len();
    let mut writer = JsonlWriter::new(dst)?;
    writer.write(conversations)?;
    writer.close()?;
    Ok(nb_written)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const ENTRY: &str = r#"{"word":"ahë","translation":"yours","grammar":"pronoun","examples":[]}"#;

    fn run<G: Generate>(generator: &G, max_attempts: usize) -> Outcome {
        generate_records(
            generator,
            &Prompts::new("Yanomami"),
            &Retry::new(max_attempts),
            &GenerationOptions::default(),
            "describe ahë",
            "test",
        )
    }

    #[test]
    fn invalid_then_accepted() {
        let calls = Cell::new(0);
        let generator = |prompt: &str, _: &GenerationOptions| -> Result<String, Error> {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                assert_eq!(prompt, "describe ahë");
                Ok(r#"{"word":"ahë"}"#.to_string())
            } else {
                assert!(prompt.starts_with("describe ahë"));
                assert!(prompt.contains("invalid content"));
                Ok(ENTRY.to_string())
            }
        };
        match run(&generator, 3) {
            Outcome::Accepted { records, attempts } => {
                assert_eq!(attempts, 2);
                assert_eq!(records[0].key(), Some("ahë"));
            }
            Outcome::Skipped { detail, .. } => panic!("skipped: {}", detail),
        }
    }

    #[test]
    fn exhausted_keeps_every_response() {
        let generator =
            |_: &str, _: &GenerationOptions| -> Result<String, Error> { Ok("nope".to_string()) };
        match run(&generator, 2) {
            Outcome::Skipped {
                reason,
                attempts,
                responses,
                ..
            } => {
                assert_eq!(reason, SkipReason::Malformed);
                assert_eq!(attempts, 2);
                assert_eq!(responses, vec!["nope", "nope"]);
            }
            Outcome::Accepted { .. } => panic!("accepted a malformed response"),
        }
    }
}
