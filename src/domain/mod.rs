pub mod document;
pub mod envelope;
pub mod log_level;
pub mod normalizer;

pub use document::{CanonicalDocument, RawRecord};
pub use envelope::{EnvelopeError, decode_envelope};
pub use log_level::LogLevel;
pub use normalizer::{normalize, normalize_at};
