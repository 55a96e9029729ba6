//! Review sentiment analysis
//!
//! Polarity lookups are an external collaborator of the scorer. Each backend
//! implements [`SentimentAnalyzer`]; the matching pipeline resolves every
//! review it needs in one concurrent pre-pass and hands the scorer a
//! [`PolarityTable`].

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::error::AppResult;

pub mod lexicon;
pub mod remote;

pub use lexicon::LexiconAnalyzer;
pub use remote::RemoteAnalyzer;

/// Resolved polarities keyed by trimmed review text
///
/// A review without an entry could not be analysed; the scorer treats the
/// opinion as incomplete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolarityTable {
    entries: HashMap<String, f64>,
}

impl PolarityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: impl Into<String>, polarity: f64) {
        let text = text.into();
        self.entries.insert(text.trim().to_string(), polarity);
    }

    pub fn get(&self, text: &str) -> Option<f64> {
        self.entries.get(text.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PolarityTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = PolarityTable::new();
        for (text, polarity) in iter {
            table.insert(text, polarity);
        }
        table
    }
}

/// Trait for sentiment backends
///
/// `polarity` must return a value in [-1, 1]; anything else is discarded by
/// the batch lookup.
#[async_trait::async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Polarity of a single review text
    async fn polarity(&self, text: &str) -> AppResult<f64>;

    /// Resolves many review texts in parallel
    ///
    /// Texts are de-duplicated and each lookup runs in its own task under
    /// `timeout`. Failed, timed-out and out-of-range lookups are logged and
    /// left out of the table; the batch itself never fails.
    async fn polarity_batch(&self, texts: Vec<String>, timeout: Duration) -> PolarityTable {
        let unique: BTreeSet<String> = texts
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut tasks = Vec::new();

        for text in unique {
            let analyzer = self.clone_for_task();
            let task = tokio::spawn(async move {
                let result = tokio::time::timeout(timeout, analyzer.polarity(&text)).await;
                (text, result)
            });
            tasks.push(task);
        }

        let requested = tasks.len();
        let mut table = PolarityTable::new();
        let mut failures = 0;

        for task in tasks {
            match task.await {
                Ok((text, Ok(Ok(polarity)))) if (-1.0..=1.0).contains(&polarity) => {
                    table.insert(text, polarity);
                }
                Ok((_, Ok(Ok(polarity)))) => {
                    tracing::warn!(
                        polarity = polarity,
                        analyzer = self.name(),
                        "Polarity outside [-1, 1], discarding"
                    );
                    failures += 1;
                }
                Ok((_, Ok(Err(e)))) => {
                    tracing::warn!(error = %e, analyzer = self.name(), "Sentiment lookup failed");
                    failures += 1;
                }
                Ok((_, Err(_))) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        analyzer = self.name(),
                        "Sentiment lookup timed out"
                    );
                    failures += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                requested = requested,
                resolved = table.len(),
                failed = failures,
                "Partial sentiment resolution, affected opinions will be penalised"
            );
        }

        table
    }

    /// Clone analyzer for parallel task execution
    fn clone_for_task(&self) -> Box<dyn SentimentAnalyzer>;

    /// Analyzer name for logging
    fn name(&self) -> &'static str;
}
