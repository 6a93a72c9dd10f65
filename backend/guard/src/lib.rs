pub mod codec;
pub mod redact;

pub use codec::{GuardError, PayloadCodec, KEY_LENGTH};
pub use redact::redact;
