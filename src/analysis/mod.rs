//! Text analysis over hosted inference models.
//!
//! The module wraps the outbound inference calls, normalises their loosely
//! shaped responses and derives sentiment, stress and suggestions from them.

/// Inference client trait and the hosted HTTP implementation.
pub mod client;
/// Response shape decoding and label/summary extraction.
pub mod normalize;
/// Sequential sentiment, emotion and summary orchestration.
pub mod pipeline;
/// Sentiment range mapping, stress score and suggestions.
pub mod scoring;

pub use client::{HfInferenceClient, InferenceClient, InferenceError, InferenceRequest};
pub use normalize::LabelScore;
pub use pipeline::{AnalysisResult, Analyzer, ModelSettings};
