//! Identifier validation, logical id generation, and fingerprinting.

mod hashing;
pub mod timestamps;
pub mod validation;

pub use hashing::{fingerprint, logical_id};
pub use timestamps::{iso_timestamp, Timestamp};
pub use validation::{is_valid_action, is_valid_name, is_valid_statement_id};
