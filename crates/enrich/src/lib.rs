//! Intent-driven response enrichment.
//!
//! This crate is the pipeline between the dialog engine's raw response and the
//! final reply: the dispatcher classifies a response by intent and context,
//! fans out to exactly one auxiliary fetch (spot price or document search),
//! post-processes the fetched data, and substitutes it into the templated
//! output text.
//!
//! Outbound services sit behind trait seams (`DialogClient`, `PriceFeed`,
//! `SearchBackend`) so handlers and the dispatcher are tested without a
//! network. The reqwest implementations live in `clients`.

pub mod clients;
pub mod dispatcher;
pub mod error;

mod articles;
mod price;
mod sentiment;

pub use clients::{DialogClient, PriceFeed, SearchBackend};
pub use dispatcher::{Enricher, Outcome};
pub use error::{EnrichError, PriceFeedError, UpstreamError};

/// Appended verbatim when a search-backed handler finds no documents.
pub const NO_ANSWER_FALLBACK: &str = "I cannot find an answer to your question.";
