//! Profile files: per-nation category biases and excluded policy reforms, read with Arrow's CSV reader.

mod error;
pub use error::StoreError;

mod profile;
pub use profile::{ProfileStore, policy_file_name, profile_file_name};
