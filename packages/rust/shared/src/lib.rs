//! Shared types, error model, capability traits, and configuration for
//! Docmill.
//!
//! This crate is the foundation depended on by all other Docmill crates.
//! It provides:
//! - [`DocmillError`] — the unified error type
//! - Domain types ([`SiteProfile`], [`DiscoveryResult`], [`ExtractedDocument`],
//!   [`FetchOutcome`], [`Chunk`])
//! - Capability traits ([`Fetcher`], [`Renderer`], [`ReaderMode`])
//! - The progress side channel ([`ProgressReporter`], [`ProgressEvent`])
//! - Configuration ([`AppConfig`], [`IngestConfig`], config loading)

pub mod capabilities;
pub mod config;
pub mod error;
pub mod progress;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use capabilities::{
    FetchResponse, Fetcher, ReaderDocument, ReaderMode, RenderedPage, Renderer,
};
pub use config::{
    AppConfig, ChunkingConfig, DefaultsConfig, FiltersConfig, IngestConfig, LimitsConfig,
    SelectorOverrides, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DocmillError, Result};
pub use progress::{ProgressEvent, ProgressReporter, SilentProgress, Stage, UnitStatus};
pub use types::{
    Chunk, DiscoveryResult, DocumentMetadata, ExtractedDocument, FetchOutcome, RenderingMode,
    SiteProfile, WaitStrategy,
};
