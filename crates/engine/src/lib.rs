//! Orchestration crate for the taste-engine recommendation pipeline.
//!
//! Ties together `media-store` (persistence boundary), `catalog` (external
//! discovery adapters), `embedding` (the stand-in vectorizer), and
//! `scoring` (the additive candidate scorer) into the four per-media-type
//! pipelines and the orchestrator that drives full-refresh, streaming, and
//! completion-mode generation runs.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipelines;
pub mod profile;
pub mod progress;

pub use error::{EngineError, Result};
pub use orchestrator::Orchestrator;
pub use profile::{ProfileBuilder, UserTasteProfile};
pub use progress::{ProgressEvent, Step};
