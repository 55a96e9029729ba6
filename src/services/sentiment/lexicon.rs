use crate::{error::AppResult, services::sentiment::SentimentAnalyzer};

/// Multiplier applied to a sentiment word preceded by a negation
const NEGATION_FACTOR: f64 = -0.5;

/// Built-in polarity estimator that needs no network access
///
/// Scores each sentiment-bearing word from a fixed lexicon, scales it by any
/// intensifiers and flips it (at half strength) after a negation within the
/// same clause. The review's polarity is the mean over scored words, clamped
/// to [-1, 1]; a review with no scored words is neutral.
#[derive(Debug, Clone, Default)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous scoring, shared by the trait implementation
    pub fn score(&self, text: &str) -> f64 {
        // typographic apostrophes keep contractions such as "didn’t" whole
        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        let mut scores = Vec::new();

        for clause in lowered.split(|c: char| matches!(c, '.' | ',' | ';' | '!' | '?' | ':')) {
            let mut intensity = 1.0;
            let mut negated = false;

            for token in clause
                .split(|c: char| !(c.is_alphanumeric() || c == '\''))
                .filter(|t| !t.is_empty())
            {
                if is_negation(token) {
                    negated = true;
                } else if let Some(factor) = intensifier(token) {
                    intensity *= factor;
                } else if let Some(polarity) = word_polarity(token) {
                    let mut value = polarity * intensity;
                    if negated {
                        value *= NEGATION_FACTOR;
                    }
                    scores.push(value);
                    intensity = 1.0;
                    negated = false;
                }
            }
        }

        if scores.is_empty() {
            return 0.0;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

#[async_trait::async_trait]
impl SentimentAnalyzer for LexiconAnalyzer {
    async fn polarity(&self, text: &str) -> AppResult<f64> {
        Ok(self.score(text))
    }

    fn clone_for_task(&self) -> Box<dyn SentimentAnalyzer> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

fn is_negation(token: &str) -> bool {
    matches!(
        token,
        "not" | "no" | "never" | "hardly" | "barely" | "nothing" | "cannot"
    ) || token.ends_with("n't")
}

fn intensifier(token: &str) -> Option<f64> {
    let factor = match token {
        "very" | "really" | "so" | "totally" => 1.3,
        "extremely" | "incredibly" | "absolutely" => 1.5,
        "truly" => 1.2,
        "quite" => 1.1,
        "somewhat" | "slightly" => 0.7,
        _ => return None,
    };
    Some(factor)
}

fn word_polarity(token: &str) -> Option<f64> {
    let polarity = match token {
        "excellent" | "wonderful" | "perfect" | "best" | "awesome" | "delightful" => 1.0,
        "brilliant" => 0.9,
        "beautiful" | "beautifully" => 0.85,
        "great" | "masterpiece" | "happy" => 0.8,
        "good" | "loved" => 0.7,
        "amazing" | "nice" => 0.6,
        "love" | "lovely" | "interesting" | "charming" | "favorite" | "favourite" => 0.5,
        "ok" | "okay" | "better" | "gripping" => 0.5,
        "fine" | "enjoyed" | "enjoyable" | "fantastic" | "engaging" | "compelling" => 0.4,
        "fun" | "moving" | "recommend" => 0.3,
        "funny" => 0.25,
        "predictable" | "waste" => -0.2,
        "dull" | "slow" | "confusing" => -0.3,
        "weak" => -0.375,
        "poor" | "worse" => -0.4,
        "sad" | "tedious" | "mediocre" | "pointless" => -0.5,
        "disappointing" => -0.6,
        "bad" | "ugly" => -0.7,
        "disappointed" => -0.75,
        "hate" | "annoying" | "stupid" => -0.8,
        "hated" => -0.9,
        "worst" | "terrible" | "awful" | "horrible" | "boring" => -1.0,
        _ => return None,
    };
    Some(polarity)
}
