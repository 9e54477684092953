//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository traits) that the
//! infrastructure layer implements, plus the bot trigger-and-response
//! pipeline: mention extraction, trigger evaluation, context assembly,
//! history condensing, and agent invocation. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod agent;
pub mod context;
pub mod llm;
pub mod repository;
pub mod service;
pub mod trigger;
