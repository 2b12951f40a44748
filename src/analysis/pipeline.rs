use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::analysis::client::{InferenceClient, InferenceError, InferenceRequest};
use crate::analysis::normalize::{extract_label_score, extract_summary, fallback_summary};
use crate::analysis::scoring::{map_sentiment_to_range, stress_score, suggestions};

pub const DEFAULT_SENTIMENT_MODEL: &str = "distilbert/distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";
pub const DEFAULT_SUMMARY_MODEL: &str = "sshleifer/distilbart-cnn-12-6";

const DEFAULT_EMOTION: &str = "neutral";

/// Which models to call and how to parameterise the summary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub sentiment_model: String,
    pub emotion_model: String,
    pub summary_model: String,
    pub summary_min_length: u32,
    pub summary_max_length: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            emotion_model: DEFAULT_EMOTION_MODEL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            summary_min_length: 10,
            summary_max_length: 60,
        }
    }
}

impl ModelSettings {
    /// The three outbound requests, in call order.
    pub fn planned_requests(&self, text: &str) -> [InferenceRequest; 3] {
        [
            self.sentiment_request(text),
            self.emotion_request(text),
            self.summary_request(text),
        ]
    }

    fn sentiment_request(&self, text: &str) -> InferenceRequest {
        InferenceRequest::new(&self.sentiment_model, inputs(text))
    }

    fn emotion_request(&self, text: &str) -> InferenceRequest {
        InferenceRequest::new(&self.emotion_model, inputs(text))
    }

    fn summary_request(&self, text: &str) -> InferenceRequest {
        InferenceRequest::new(
            &self.summary_model,
            json!({
                "inputs": text,
                "parameters": {
                    "min_length": self.summary_min_length,
                    "max_length": self.summary_max_length,
                },
            }),
        )
    }
}

/// Result of one analysis, returned as the `ai` field of the response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sentiment: f64,
    pub emotion: String,
    pub emotion_score: f64,
    pub summary: String,
    pub stress_score: u8,
    pub suggestions: Vec<String>,
}

/// Runs sentiment, emotion and summary calls in sequence and scores the result.
#[derive(Debug)]
pub struct Analyzer<C> {
    client: C,
    models: ModelSettings,
}

impl<C: InferenceClient> Analyzer<C> {
    pub fn new(client: C, models: ModelSettings) -> Self {
        Self { client, models }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Sentiment and emotion failures abort; a failed summary falls back to
    /// truncated input text.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, InferenceError> {
        let sentiment = self.sentiment(text).await?;
        let (emotion, emotion_score) = self.emotion(text).await?;
        let summary = self.summary(text).await;

        let stress_score = stress_score(sentiment, &emotion);
        let suggestions = suggestions(stress_score, &emotion);
        debug!(sentiment, %emotion, stress_score, "analysis scored");

        Ok(AnalysisResult {
            sentiment,
            emotion,
            emotion_score,
            summary,
            stress_score,
            suggestions,
        })
    }

    async fn sentiment(&self, text: &str) -> Result<f64, InferenceError> {
        let raw = self.client.invoke(&self.models.sentiment_request(text)).await?;
        let pair = extract_label_score(&raw);
        Ok(map_sentiment_to_range(pair.label.as_deref(), pair.score))
    }

    async fn emotion(&self, text: &str) -> Result<(String, f64), InferenceError> {
        let raw = self.client.invoke(&self.models.emotion_request(text)).await?;
        let pair = extract_label_score(&raw);
        let label = pair.label.as_deref().unwrap_or(DEFAULT_EMOTION).to_lowercase();
        Ok((label, pair.score))
    }

    async fn summary(&self, text: &str) -> String {
        match self.client.invoke(&self.models.summary_request(text)).await {
            Ok(raw) => extract_summary(&raw, text),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "summary model failed, using fallback");
                fallback_summary(text)
            }
        }
    }
}

fn inputs(text: &str) -> Value {
    json!({ "inputs": text })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::analysis::client::{InferenceClient, InferenceError, InferenceRequest};

    /// Canned responses keyed by model id, with call recording.
    #[derive(Debug, Default)]
    pub(crate) struct FakeInference {
        responses: HashMap<String, Value>,
        failing: Vec<String>,
        calls: AtomicUsize,
        seen: Mutex<Vec<InferenceRequest>>,
    }

    impl FakeInference {
        pub(crate) fn respond(mut self, model: &str, value: Value) -> Self {
            self.responses.insert(model.to_string(), value);
            self
        }

        pub(crate) fn fail(mut self, model: &str) -> Self {
            self.failing.push(model.to_string());
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn seen(&self) -> Vec<InferenceRequest> {
            self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
        }
    }

    impl InferenceClient for FakeInference {
        async fn invoke(&self, request: &InferenceRequest) -> Result<Value, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }

            if self.failing.contains(&request.model) {
                return Err(InferenceError::RemoteError {
                    model: request.model.clone(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    payload: serde_json::json!({"error": "model unavailable"}),
                });
            }
            Ok(self
                .responses
                .get(&request.model)
                .cloned()
                .unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeInference;
    use super::*;
    use crate::analysis::scoring::{BREATHING_SUGGESTION, REFLECTION_SUGGESTION};

    fn analyzer(fake: FakeInference) -> Analyzer<FakeInference> {
        Analyzer::new(fake, ModelSettings::default())
    }

    #[tokio::test]
    async fn anger_label_scores_without_exact_match_bonus() {
        let fake = FakeInference::default()
            .respond(
                DEFAULT_SENTIMENT_MODEL,
                json!([[{"label": "NEGATIVE", "score": 0.98}, {"label": "POSITIVE", "score": 0.02}]]),
            )
            .respond(DEFAULT_EMOTION_MODEL, json!([[{"label": "anger", "score": 0.91}]]))
            .respond(DEFAULT_SUMMARY_MODEL, json!([{"summary_text": "Furious day."}]));
        let analyzer = analyzer(fake);

        let result = analyzer
            .analyze("I am furious and overwhelmed today")
            .await
            .expect("analysis should succeed");

        assert_eq!(result.sentiment, -0.98);
        assert_eq!(result.emotion, "anger");
        assert_eq!(result.emotion_score, 0.91);
        assert_eq!(result.summary, "Furious day.");
        // "anger" is not one of the exact bonus labels.
        assert_eq!(result.stress_score, 6);
        assert!(result.suggestions.is_empty());
        assert_eq!(analyzer.client().calls(), 3);
    }

    #[tokio::test]
    async fn requests_are_issued_in_order_with_summary_parameters() {
        let analyzer = analyzer(FakeInference::default());
        analyzer.analyze("hello").await.expect("analysis should succeed");

        let seen = analyzer.client().seen();
        let models: Vec<&str> = seen.iter().map(|request| request.model.as_str()).collect();
        assert_eq!(
            models,
            [DEFAULT_SENTIMENT_MODEL, DEFAULT_EMOTION_MODEL, DEFAULT_SUMMARY_MODEL]
        );
        assert_eq!(seen[0].payload, json!({"inputs": "hello"}));
        assert_eq!(
            seen[2].payload,
            json!({"inputs": "hello", "parameters": {"min_length": 10, "max_length": 60}})
        );
    }

    #[tokio::test]
    async fn missing_emotion_label_defaults_to_neutral() {
        let analyzer = analyzer(FakeInference::default());
        let result = analyzer.analyze("hello").await.expect("analysis should succeed");

        assert_eq!(result.sentiment, 0.0);
        assert_eq!(result.emotion, "neutral");
        assert_eq!(result.emotion_score, 0.0);
        assert_eq!(result.summary, "hello");
        assert_eq!(result.stress_score, 3);
        assert!(result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn summary_failure_falls_back_to_truncated_text() {
        let text = "x".repeat(250);
        let fake = FakeInference::default()
            .respond(DEFAULT_SENTIMENT_MODEL, json!([{"label": "POSITIVE", "score": 0.9}]))
            .respond(DEFAULT_EMOTION_MODEL, json!([{"label": "Joy", "score": 0.8}]))
            .fail(DEFAULT_SUMMARY_MODEL);
        let analyzer = analyzer(fake);

        let result = analyzer.analyze(&text).await.expect("summary failure is tolerated");
        assert_eq!(result.summary, format!("{}...", "x".repeat(200)));
        assert_eq!(result.emotion, "joy");
        assert_eq!(result.suggestions, vec![REFLECTION_SUGGESTION.to_string()]);
    }

    #[tokio::test]
    async fn sentiment_failure_aborts_before_other_calls() {
        let analyzer = analyzer(FakeInference::default().fail(DEFAULT_SENTIMENT_MODEL));
        let err = analyzer.analyze("hello").await.unwrap_err();

        assert_eq!(err.kind(), "remote_error");
        assert_eq!(analyzer.client().calls(), 1);
    }

    #[tokio::test]
    async fn emotion_failure_aborts_before_summary() {
        let analyzer = analyzer(FakeInference::default().fail(DEFAULT_EMOTION_MODEL));
        assert!(analyzer.analyze("hello").await.is_err());
        assert_eq!(analyzer.client().calls(), 2);
    }

    #[tokio::test]
    async fn anxious_negative_entry_gets_breathing_and_grounding() {
        let fake = FakeInference::default()
            .respond(DEFAULT_SENTIMENT_MODEL, json!([{"label": "NEGATIVE", "score": 0.9}]))
            .respond(DEFAULT_EMOTION_MODEL, json!([{"label": "anxious", "score": 0.6}]));
        let result = analyzer(fake)
            .analyze("deadline tomorrow")
            .await
            .expect("analysis should succeed");

        assert_eq!(result.stress_score, 9);
        assert_eq!(
            result.suggestions,
            vec![
                BREATHING_SUGGESTION.to_string(),
                "Try grounding: 5-4-3-2-1 exercise.".to_string(),
            ]
        );
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let result = AnalysisResult {
            sentiment: -0.5,
            emotion: "sadness".to_string(),
            emotion_score: 0.7,
            summary: "s".to_string(),
            stress_score: 5,
            suggestions: vec![],
        };
        let value = serde_json::to_value(&result).expect("result should serialize");
        assert_eq!(value["emotionScore"], json!(0.7));
        assert_eq!(value["stressScore"], json!(5));
    }
}
