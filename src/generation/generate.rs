//! Text generation boundary.
use crate::error::Error;

/// Parameters sent along with a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: usize,
    pub temperature: f32,
    pub system: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.1,
            system: None,
        }
    }
}

/// Something that turns a prompt into generated text.
///
/// Implemented by [super::AnthropicGenerator] and by any
/// `Fn(&str, &GenerationOptions) -> Result<String, Error>`, which is handy for tests.
pub trait Generate {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Error>;
}

impl<F> Generate for F
where
    F: Fn(&str, &GenerationOptions) -> Result<String, Error>,
{
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Error> {
        self(prompt, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo<G: Generate>(g: &G) -> Result<String, Error> {
        g.generate("hello", &GenerationOptions::default())
    }

    #[test]
    fn closures_generate() {
        let g = |prompt: &str, opts: &GenerationOptions| -> Result<String, Error> {
            Ok(format!("{} {}", prompt, opts.max_tokens))
        };
        assert_eq!(echo(&g).unwrap(), "hello 1000");
    }
}
