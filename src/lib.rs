//! Journal entry analysis over hosted inference models.
//!
//! An authenticated HTTP endpoint (and a matching CLI) forwards entry text to
//! sentiment, emotion and summarization models, normalises their responses
//! and derives a stress score with suggestions.

pub mod analysis;
pub mod commands;
pub mod config;
pub mod server;
