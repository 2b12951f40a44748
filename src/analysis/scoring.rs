const STRESS_EMOTIONS: [&str; 3] = ["anxious", "stressed", "angry"];
const NEGATIVITY_WEIGHT: f64 = 6.0;
const EMOTION_BONUS: f64 = 3.0;
const MAX_STRESS: u8 = 10;

pub const BREATHING_SUGGESTION: &str = "Try a 5-minute breathing exercise.";
pub const GRATITUDE_SUGGESTION: &str = "Write one thing you are grateful for.";
pub const GROUNDING_SUGGESTION: &str = "Try grounding: 5-4-3-2-1 exercise.";
pub const REFLECTION_SUGGESTION: &str = "Note what went well today.";

/// Maps a sentiment classification onto `[-1, 1]`.
pub fn map_sentiment_to_range(label: Option<&str>, score: f64) -> f64 {
    let Some(label) = label else {
        return 0.0;
    };

    let label = label.to_lowercase();
    if label.contains("neg") {
        -score
    } else if label.contains("pos") {
        score
    } else if score >= 0.5 {
        score
    } else {
        0.0
    }
}

/// Stress on a 0..=10 scale from sentiment polarity and a lowercase emotion label.
///
/// The bonus applies to exact label matches only, unlike [`suggestions`],
/// which matches substrings.
pub fn stress_score(sentiment: f64, emotion: &str) -> u8 {
    let negativity = 1.0 - (sentiment + 1.0) / 2.0;
    let bonus = if STRESS_EMOTIONS.contains(&emotion) {
        EMOTION_BONUS
    } else {
        0.0
    };

    let raw = (negativity * NEGATIVITY_WEIGHT + bonus).round();
    raw.clamp(0.0, f64::from(MAX_STRESS)) as u8
}

/// Canned suggestions, in fixed evaluation order. Each rule fires independently.
pub fn suggestions(stress_score: u8, emotion: &str) -> Vec<String> {
    let rules = [
        (stress_score >= 7, BREATHING_SUGGESTION),
        (emotion.contains("sad"), GRATITUDE_SUGGESTION),
        (emotion.contains("anxious"), GROUNDING_SUGGESTION),
        (
            emotion.contains("joy") || emotion.contains("happy"),
            REFLECTION_SUGGESTION,
        ),
    ];

    rules
        .into_iter()
        .filter(|(fires, _)| *fires)
        .map(|(_, text)| text.to_string())
        .collect()
}
