//! Pipeline orchestration for Docmill: wires classification, discovery,
//! extraction and chunking behind a single [`ingest`] entry point, with
//! [`HttpFetcher`] as the built-in transport. Rendering and reader-mode
//! backends are supplied by the embedding application through the capability
//! traits in `docmill-shared`.

mod http;
mod pipeline;
mod scheduler;

pub use http::HttpFetcher;
pub use pipeline::{IngestResult, ingest};
pub use scheduler::FetchScheduler;
