//! # Tripsafe
//!
//! A travel-safety assistant that answers questions from a sectioned PDF
//! safety guide.
//!
//! The guide is converted to plain text once at startup, split into
//! sections at bracketed header lines (`[Lost Passport]`), and queried with
//! a tiered fuzzy matcher. Answers are served over a small JSON HTTP API
//! and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  PDF / text  │──▶│   Section    │──▶│  Knowledge   │
//! │   extract    │   │   indexer    │   │    base      │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ resolve
//!                         ┌────────────────────┤
//!                         ▼                    ▼
//!                    ┌──────────┐        ┌──────────┐
//!                    │   CLI    │        │   HTTP   │
//!                    │(tripsafe)│        │  /ask    │
//!                    └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tripsafe sections                      # list indexed sections
//! tripsafe ask "lost my passport"        # answer from the CLI
//! tripsafe serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`section`] | Section indexer |
//! | [`resolve`] | Tiered fuzzy query resolver |
//! | [`knowledge`] | Knowledge-base service and readiness |
//! | [`assistant`] | Chat reply composition |
//! | [`server`] | HTTP server |

pub mod assistant;
pub mod config;
pub mod extract;
pub mod knowledge;
pub mod resolve;
pub mod section;
pub mod server;
