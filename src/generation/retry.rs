/*! Bounded retry.

```text
Attempting(1) -> Success
              -> Attempting(2) -> ... -> Attempting(max) -> Success | Exhausted
```
!*/

#[derive(Debug, Clone, PartialEq)]
pub enum RetryState<T, E> {
    /// 1-based number of the attempt in progress
    Attempting(usize),
    Success { value: T, attempts: usize },
    Exhausted { attempts: usize, last_error: E },
}

impl<T, E> RetryState<T, E> {
    pub fn is_done(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }

    /// number of attempts made (or in progress)
    pub fn attempts(&self) -> usize {
        match self {
            RetryState::Attempting(n) => *n,
            RetryState::Success { attempts, .. } | RetryState::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    max_attempts: usize,
}

impl Default for Retry {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl Retry {
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn start<T, E>(&self) -> RetryState<T, E> {
        RetryState::Attempting(1)
    }

    /// Feed the outcome of the current attempt. Terminal states are returned unchanged.
    pub fn advance<T, E>(&self, state: RetryState<T, E>, outcome: Result<T, E>) -> RetryState<T, E> {
        match state {
            RetryState::Attempting(n) => match outcome {
                Ok(value) => RetryState::Success { value, attempts: n },
                Err(last_error) if n >= self.max_attempts => RetryState::Exhausted {
                    attempts: n,
                    last_error,
                },
                Err(_) => RetryState::Attempting(n + 1),
            },
            done => done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_on_second_attempt() {
        let retry = Retry::new(3);
        let state: RetryState<u8, &str> = retry.start();
        let state = retry.advance(state, Err("bad"));
        assert_eq!(state, RetryState::Attempting(2));
        let state = retry.advance(state, Ok(1));
        assert_eq!(state, RetryState::Success { value: 1, attempts: 2 });
        assert!(state.is_done());
    }

    #[test]
    fn exhausted() {
        let retry = Retry::new(3);
        let mut state: RetryState<u8, &str> = retry.start();
        for err in ["a", "b", "c"] {
            assert!(!state.is_done());
            state = retry.advance(state, Err(err));
        }
        assert_eq!(
            state,
            RetryState::Exhausted {
                attempts: 3,
                last_error: "c"
            }
        );
        // terminal states do not move
        assert_eq!(retry.advance(state.clone(), Ok(2)), state);
    }

    #[test]
    fn at_least_one_attempt() {
        let retry = Retry::new(0);
        assert_eq!(retry.max_attempts(), 1);
        let state: RetryState<u8, &str> = retry.advance(retry.start(), Err("x"));
        assert_eq!(state.attempts(), 1);
        assert!(state.is_done());
    }
}
