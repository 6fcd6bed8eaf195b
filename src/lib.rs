//! # Organization Registry
//!
//! A searchable registry of organizations and their appointed office
//! bearers, built by ingesting JSON source records into SQLite.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ JSON files  │──▶│  Normalize  │──▶│   SQLite    │
//! │ (source_fs) │   │  + ingest   │   │ tables+FTS5 │
//! └─────────────┘   └─────────────┘   └──────┬──────┘
//!                                            │
//!                   ┌─────────────┐          │
//!                   │  Criteria   │──▶ Predicate ─┘
//!                   │  (filter)   │
//!                   └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Raw source shape, entities, result rows |
//! | [`normalize`] | Record cleaning and validation |
//! | [`vocab`] | Recognized category, status and nature values |
//! | [`filter`] | Criteria → predicate tree → SQL |
//! | [`source_fs`] | Import directory scanning |
//! | [`ingest`] | Batch import pipeline |
//! | [`store`] | Reads and writes against SQLite |
//! | [`search`] | Organization and director search |
//! | [`get`] | Organization detail |
//! | [`stats`] | Counts and index verification |
//! | [`progress`] | Import progress on stderr |
//! | [`error`] | Error taxonomy |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod search;
pub mod source_fs;
pub mod stats;
pub mod store;
pub mod vocab;
