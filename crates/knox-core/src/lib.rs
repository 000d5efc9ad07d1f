//! Core library for knox.
//!
//! Contains the credential path expression model, the credential value
//! wrapper, and the resolver that orchestrates registry lookups. This crate
//! depends on `knox-api` for the registry trait and knows nothing about
//! terminal output or command-line flags.

pub mod cpath;
pub mod credentials;
pub mod error;
pub mod value;
