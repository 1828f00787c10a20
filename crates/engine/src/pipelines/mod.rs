//! Per-media-type candidate pipelines (C6).
//!
//! Films and series share a state machine ([`screen_content`]); books and
//! short videos each have their own shape, since neither discovers against
//! a TMDB-like genre-id endpoint.

pub mod book;
pub mod counters;
pub mod screen_content;
pub mod short_video;

pub use book::{BookPipeline, BookRun};
pub use counters::GenreCounters;
pub use screen_content::{ScreenContentPipeline, ScreenContentRun};
pub use short_video::{ShortVideoPipeline, ShortVideoRun};
