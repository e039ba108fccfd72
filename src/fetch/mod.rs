//! Resilient fetcher
//!
//! The single HTTP primitive shared by all adapters: bounded retries with
//! exponential backoff, a timeout per attempt, and typed failures.

mod decode;
mod error;
mod fetcher;
mod retry;

pub use error::{FetchError, FetchErrorKind};
pub use decode::{decode_text, DecodedText};
pub use fetcher::{
    build_http_client, fetch_bytes, fetch_json, fetch_text, FetchRequest, FetchedBody,
};
pub use retry::RetryPolicy;
