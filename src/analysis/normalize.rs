use serde_json::{Map, Value};

const SUMMARY_FALLBACK_CHARS: usize = 200;

/// Shape of a classification or generation response, decoded at the boundary.
///
/// Only the first top-level element is ever inspected; for the nested shape,
/// only the first element of that inner array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInferenceResponse<'a> {
    /// Not an array, or an empty one.
    Empty,
    /// `[{...}, ...]`
    Flat(&'a Map<String, Value>),
    /// `[[{...}, ...], ...]`
    Nested(&'a Map<String, Value>),
    /// An array whose leading element is not a usable object.
    Malformed,
}

impl<'a> RawInferenceResponse<'a> {
    pub fn decode(raw: &'a Value) -> Self {
        let Some(first) = raw.as_array().and_then(|items| items.first()) else {
            return Self::Empty;
        };

        match first {
            Value::Array(inner) => match inner.first() {
                Some(Value::Object(candidate)) => Self::Nested(candidate),
                _ => Self::Malformed,
            },
            Value::Object(candidate) => Self::Flat(candidate),
            _ => Self::Malformed,
        }
    }

    /// Candidate object, whichever array shape carried it.
    pub fn candidate(self) -> Option<&'a Map<String, Value>> {
        match self {
            Self::Flat(candidate) | Self::Nested(candidate) => Some(candidate),
            Self::Empty | Self::Malformed => None,
        }
    }
}

/// Best label/score pair of a classification call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelScore {
    pub label: Option<String>,
    pub score: f64,
}

/// Extracts the leading `{label, score}` pair. Never fails: anything
/// unrecognised collapses to an absent label with score 0.
pub fn extract_label_score(raw: &Value) -> LabelScore {
    let Some(candidate) = RawInferenceResponse::decode(raw).candidate() else {
        return LabelScore::default();
    };

    let label = candidate
        .get("label")
        .and_then(Value::as_str)
        .filter(|label| !label.is_empty())
        .map(str::to_string);
    let score = candidate
        .get("score")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    LabelScore { label, score }
}

/// Extracts generated summary text, falling back to a truncated copy of
/// `original_text` when the response carries none.
pub fn extract_summary(raw: &Value, original_text: &str) -> String {
    RawInferenceResponse::decode(raw)
        .candidate()
        .and_then(|candidate| {
            ["summary_text", "generated_text"]
                .iter()
                .filter_map(|key| candidate.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| fallback_summary(original_text))
}

/// First 200 characters of `text` plus `...`, or `text` unchanged when short.
pub fn fallback_summary(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_FALLBACK_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
