//! # contact-relay
//!
//! A stateless HTTP relay that accepts website contact/questionnaire
//! form submissions and forwards them as email through a transactional
//! provider. One endpoint, no persistence, no queues, no retries:
//! validate, filter spam, optionally verify a bot challenge, compose,
//! deliver, optionally acknowledge, respond.
//!
//! ## Modules
//!
//! - `config` - environment-driven deployment configuration
//! - `submission` - wire model, schema validation, per-request metadata
//! - `verify` - bot-challenge verification seam (Turnstile)
//! - `mail` - email composition (tera templates) and provider transports
//! - `server` - axum HTTP surface and the submission pipeline
//! - `error` - crate error type
pub mod config;
pub mod error;
pub mod mail;
pub mod server;
pub mod submission;
pub mod verify;

pub use error::{Error, Result};
