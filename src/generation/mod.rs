/*! Generation

The generator is an injectable dependency ([Generate]). [AnthropicGenerator] talks to the
Anthropic messages API, tests use closures.
!*/
mod anthropic;
mod generate;
mod prompt;
mod retry;

pub use anthropic::{AnthropicGenerator, AnthropicGeneratorBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use generate::{Generate, GenerationOptions};
pub use prompt::Prompts;
pub use retry::{Retry, RetryState};
