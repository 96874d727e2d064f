//! # Swiss Engine
//!
//! A Swiss-system tournament engine for chess-like games: FIDE Dutch-system
//! pairing plus FIDE-compliant tiebreaks over stored match history.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (participants, rounds, matches,
//!   tournament settings)
//! - **history**: Per-player history materialization (scores, colors,
//!   virtual-opponent scores for byes)
//! - **pairing**: The pairing engine (round-1 seeding, Dutch score-group
//!   walk, color resolution, bye assignment)
//! - **tiebreak**: Tiebreak keys, comparator, and standings
//! - **store**: Persistence contract with JSONL and in-memory backends
//! - **service**: Orchestration between store and engine
//! - **config**: Configuration loading and validation

pub mod config;
pub mod history;
pub mod models;
pub mod pairing;
pub mod service;
pub mod store;
pub mod tiebreak;

pub use models::*;
