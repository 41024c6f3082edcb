//! The `scholar` command-line tool.
//!
//! Ingests an arXiv metadata snapshot into a JSON-persisted in-memory index and
//! answers research queries against it through OpenAI-compatible embedding and
//! chat endpoints.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
