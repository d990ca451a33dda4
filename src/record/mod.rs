/*! Records

- [WordEntry]: structured result of a generation (canonical form).
- [GeneratedRecord]: a validated record, keyed by the quoted word of its question.
- [Conversation]: the exported fine-tuning format.
!*/
mod conversation;
mod entry;
mod generated;
pub mod key;

pub use conversation::{Conversation, Message, Role, ValidationError, MIN_CONTENT_LEN};
pub use entry::{Example, WordEntry};
pub use generated::{clean_response, parse_response, Answer, GeneratedRecord, ResponseError};
pub use key::KeyKind;
