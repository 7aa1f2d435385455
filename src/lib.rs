//! # tally-core
//!
//! A Rust library that computes, for each facilitator assigned across the
//! time-boxed blocks of a session plan, the total time allocated to them, and
//! keeps a live summary panel of those totals inside the host document.
//!
//! ## Overview
//!
//! tally-core augments an externally-owned, continuously-mutated hierarchical
//! document. It is built around a closed one-directional feedback loop with
//! four components:
//!
//! - **[`watch`]**: observes a scoped subtree of the host document and raises
//!   recompute requests; also the owning [`TallyService`] with its
//!   root-presence lifecycle
//! - **[`debounce`]**: coalesces bursts of recompute requests into a single
//!   delayed execution with last-call-wins semantics
//! - **[`extract`]**: the algorithmic heart - walks the session subtree,
//!   canonicalizes heterogeneous duration representations into minutes, and
//!   folds them into a per-facilitator [`Aggregate`]
//! - **[`project`]**: renders the aggregate as a summary panel placed
//!   idempotently at a fixed anchor in the document
//!
//! The watcher observes a different subtree than the projector writes, which
//! is the invariant that rules out recompute feedback loops.
//!
//! Supporting modules: [`dom`] models the live document tree the host owns
//! and mutates, [`schema`] is the pluggable selector layer that adapts the
//! traversal to a concrete host markup, [`event`] is the outbound event
//! stream, and [`config`] holds the TOML-backed engine configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::mpsc::channel;
//! use tally_core::{config::TallyConfig, dom::Document, watch::TallyService, TallyEvent};
//!
//! // The host owns the document and renders into it at will.
//! let doc = Document::new("body");
//!
//! let (tx, rx) = channel::<TallyEvent>();
//! let service = TallyService::new(doc.clone(), TallyConfig::default(), tx)?;
//!
//! // Once the host root marker appears in `doc`, the service extracts the
//! // per-facilitator totals, renders the panel, and keeps both fresh as the
//! // host mutates session content.
//! # drop(service);
//! # drop(rx);
//! # Ok::<(), tally_core::TallyError>(())
//! ```
//!
//! ## Extraction Without a Live Host
//!
//! [`extract::extract`] is pure with respect to the document, so aggregation
//! is testable against constructed fixtures without any watcher wiring:
//!
//! ```rust
//! use tally_core::{dom::Document, extract::extract, schema::DocSchema};
//!
//! let doc = Document::new("body");
//! let aggregate = extract(&doc, doc.root(), &DocSchema::sessionlab());
//! assert!(aggregate.is_empty());
//! ```

pub mod config;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod event;
pub mod extract;
pub mod project;
pub mod schema;
pub mod watch;

pub use error::TallyError;
pub use event::{RecomputeReason, TallyEvent};
pub use extract::{extract, Aggregate, FacilitatorEntry};
pub use schema::{DocSchema, Selector, SCHEMAS};
pub use watch::TallyService;

#[cfg(test)]
mod tests;
