//! # Provenance Client
//!
//! Async access layer for the Provenance blockchain's gRPC interface.
//!
//! The crate is built around two pieces: a cursor-paginated streaming query
//! engine ([`pagination`]) that turns any paginated list endpoint into a
//! cancellable stream of items, and a batched submission pipeline
//! ([`pipeline`], [`tx`]) that drives write intents through
//! simulate → sign → broadcast in bounded batches with per-batch error
//! reporting.
//!
//! Wire encoding, signing and address derivation are collaborator concerns,
//! reached through the traits in [`rpc`] and [`tx`].

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod fees;
pub mod pagination;
pub mod pipeline;
pub mod progress;
pub mod rpc;
pub mod sequence;
pub mod tx;
pub mod types;
