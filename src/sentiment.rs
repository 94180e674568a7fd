//! Classification adapter: classifier abstraction + neutrality thresholding.
//!
//! The external classifier is binary (POSITIVE/NEGATIVE with a confidence in
//! `[0,1]`). [`SentimentAnalyzer`] turns that into the three-way label the
//! pipeline stores: low-confidence predictions are forced to NEUTRAL, and any
//! classifier failure degrades to a neutral fallback instead of propagating.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inputs longer than this are truncated before inference.
pub const MAX_INPUT_CHARS: usize = 512;

/// Below this confidence a binary prediction is overridden to NEUTRAL.
pub const NEUTRAL_THRESHOLD: f64 = 0.75;

/// Raw label reported when the classifier failed and the fallback was used.
pub const ERROR_RAW_LABEL: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Negative => "NEGATIVE",
        }
    }

    /// Map a raw classifier label into the three-way space.
    /// Anything unrecognized is treated as NEUTRAL.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "POSITIVE" => SentimentLabel::Positive,
            "NEGATIVE" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-way prediction as returned by a classifier backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    pub score: f64,
}

/// Final adapter output, folded into the post record by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub raw_label: String,
}

/// Classifier backend: a single text in, a binary prediction out.
/// The batch variant applies the same contract to each item independently.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<RawPrediction>;
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawPrediction>>;
    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Wraps a [`Classifier`] with truncation, neutrality thresholding, rounding
/// and the error fallback.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    classifier: DynClassifier,
}

impl SentimentAnalyzer {
    pub fn new(classifier: DynClassifier) -> Self {
        Self { classifier }
    }

    /// Analyze a single text. Never fails: classifier errors become the
    /// `{NEUTRAL, 0.5, "ERROR"}` fallback, detectable only via `raw_label`.
    pub async fn analyze(&self, text: &str) -> SentimentResult {
        let truncated = truncate_chars(text, MAX_INPUT_CHARS);
        match self.classifier.classify(truncated).await {
            Ok(raw) => apply_neutral_threshold(&raw),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %format!("{e:#}"),
                    "classification failed, using neutral fallback"
                );
                error_fallback()
            }
        }
    }

    /// Batch analysis, one result per input. A whole-batch classifier failure
    /// yields the fallback for every item.
    pub async fn analyze_batch(&self, texts: &[String]) -> Vec<SentimentResult> {
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_chars(t, MAX_INPUT_CHARS).to_string())
            .collect();
        match self.classifier.classify_batch(&truncated).await {
            Ok(raws) => raws.iter().map(apply_neutral_threshold).collect(),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %format!("{e:#}"),
                    "batch classification failed, using neutral fallback"
                );
                texts.iter().map(|_| error_fallback()).collect()
            }
        }
    }
}

fn error_fallback() -> SentimentResult {
    SentimentResult {
        sentiment: SentimentLabel::Neutral,
        confidence: 0.5,
        raw_label: ERROR_RAW_LABEL.to_string(),
    }
}

/// Neutrality threshold: below 0.75 the effective label is NEUTRAL, but the
/// reported confidence stays the classifier's raw score (not renormalized).
fn apply_neutral_threshold(raw: &RawPrediction) -> SentimentResult {
    let sentiment = if raw.score < NEUTRAL_THRESHOLD {
        SentimentLabel::Neutral
    } else {
        SentimentLabel::from_raw(&raw.label)
    };
    SentimentResult {
        sentiment,
        confidence: round4(raw.score),
        raw_label: raw.label.clone(),
    }
}

/// Round to 4 decimal digits before surfacing.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Char-boundary-safe prefix of at most `max` chars.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ------------------------------------------------------------
// Lexicon classifier (embedded, no network)
// ------------------------------------------------------------

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Local binary classifier backed by the embedded word lexicon.
///
/// Scoring sums lexicon weights over alphanumeric tokens, with a 3-token
/// negation lookback that inverts a word's sign. The summed score maps onto
/// the binary contract: non-negative is POSITIVE, negative is NEGATIVE, and
/// confidence grows with score magnitude so weak signals land under the
/// neutrality threshold.
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns (score, token count).
    pub fn score_text(text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let w = tokens[i].as_str();

            // negator within the last 1..=3 tokens inverts the sign
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

            let base = *LEXICON.get(w).unwrap_or(&0);
            if base != 0 {
                score += if negated { -base } else { base };
            }
        }

        (score, tokens.len())
    }

    fn predict(text: &str) -> RawPrediction {
        let (score, _tokens) = Self::score_text(text);
        let label = if score >= 0 { "POSITIVE" } else { "NEGATIVE" };
        let confidence = (0.5 + 0.125 * f64::from(score.unsigned_abs())).min(0.99);
        RawPrediction {
            label: label.to_string(),
            score: confidence,
        }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<RawPrediction> {
        // scoring is synchronous; keep it off the async executor
        let text = text.to_string();
        tokio::task::spawn_blocking(move || Self::predict(&text))
            .await
            .context("lexicon scoring task panicked")
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || texts.iter().map(|t| Self::predict(t)).collect())
            .await
            .context("lexicon scoring task panicked")
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn" | "wasn" | "aren" | "won" | "cannot" | "without"
    )
}

// ------------------------------------------------------------
// HTTP classifier (remote inference service)
// ------------------------------------------------------------

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    texts: &'a [String],
}

/// Remote binary classifier behind a JSON endpoint:
/// `POST {"texts": [...]}` -> `[{"label": "...", "score": ...}]`.
pub struct HttpClassifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("social-pulse-monitor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&ClassifyRequest { texts })
            .send()
            .await
            .context("classifier request failed")?
            .error_for_status()
            .context("classifier returned error status")?;

        let preds: Vec<RawPrediction> = resp
            .json()
            .await
            .context("classifier response was not valid JSON")?;
        if preds.len() != texts.len() {
            anyhow::bail!(
                "classifier returned {} predictions for {} texts",
                preds.len(),
                texts.len()
            );
        }
        Ok(preds)
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<RawPrediction> {
        let texts = vec![text.to_string()];
        let mut preds = self.request(&texts).await?;
        preds.pop().context("classifier returned an empty batch")
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        self.request(texts).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ------------------------------------------------------------
// Deterministic backends for tests and local smoke runs
// ------------------------------------------------------------

/// Always returns the same prediction. Handy for wiring tests.
pub struct FixedClassifier {
    pub label: &'static str,
    pub score: f64,
}

#[async_trait::async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<RawPrediction> {
        Ok(RawPrediction {
            label: self.label.to_string(),
            score: self.score,
        })
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawPrediction>> {
        Ok(texts
            .iter()
            .map(|_| RawPrediction {
                label: self.label.to_string(),
                score: self.score,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Always fails, exercising the neutral fallback path.
pub struct FailingClassifier;

#[async_trait::async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<RawPrediction> {
        anyhow::bail!("classifier unavailable")
    }

    async fn classify_batch(&self, _texts: &[String]) -> Result<Vec<RawPrediction>> {
        anyhow::bail!("classifier unavailable")
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(label: &'static str, score: f64) -> SentimentAnalyzer {
        SentimentAnalyzer::new(Arc::new(FixedClassifier { label, score }))
    }

    #[tokio::test]
    async fn confidence_at_threshold_keeps_raw_label() {
        let res = analyzer("POSITIVE", 0.75).analyze("so good").await;
        assert_eq!(res.sentiment, SentimentLabel::Positive);
        assert_eq!(res.confidence, 0.75);
        assert_eq!(res.raw_label, "POSITIVE");
    }

    #[tokio::test]
    async fn confidence_below_threshold_is_neutral() {
        let res = analyzer("NEGATIVE", 0.7499).analyze("hmm").await;
        assert_eq!(res.sentiment, SentimentLabel::Neutral);
        // raw confidence survives
        assert_eq!(res.confidence, 0.7499);
        assert_eq!(res.raw_label, "NEGATIVE");
    }

    #[tokio::test]
    async fn low_confidence_keeps_raw_confidence() {
        let res = analyzer("NEGATIVE", 0.6012).analyze("hmm").await;
        assert_eq!(res.sentiment, SentimentLabel::Neutral);
        assert_eq!(res.confidence, 0.6012);
    }

    #[tokio::test]
    async fn confidence_is_rounded_to_four_digits() {
        let res = analyzer("POSITIVE", 0.912345).analyze("great").await;
        assert_eq!(res.confidence, 0.9123);
    }

    #[tokio::test]
    async fn classifier_failure_becomes_neutral_fallback() {
        let a = SentimentAnalyzer::new(Arc::new(FailingClassifier));
        let res = a.analyze("anything").await;
        assert_eq!(res.sentiment, SentimentLabel::Neutral);
        assert_eq!(res.confidence, 0.5);
        assert_eq!(res.raw_label, ERROR_RAW_LABEL);
    }

    #[tokio::test]
    async fn batch_failure_falls_back_per_item() {
        let a = SentimentAnalyzer::new(Arc::new(FailingClassifier));
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let out = a.analyze_batch(&texts).await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.raw_label == ERROR_RAW_LABEL));
    }

    #[tokio::test]
    async fn repeated_analysis_is_idempotent() {
        let a = analyzer("POSITIVE", 0.92);
        let first = a.analyze("love it").await;
        let second = a.analyze("love it").await;
        assert_eq!(first.sentiment, second.sentiment);
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let long: String = "é".repeat(600);
        let cut = truncate_chars(&long, MAX_INPUT_CHARS);
        assert_eq!(cut.chars().count(), MAX_INPUT_CHARS);
        // shorter inputs pass through untouched
        assert_eq!(truncate_chars("short", MAX_INPUT_CHARS), "short");
    }

    #[test]
    fn lexicon_scores_negation() {
        let (pos, _) = LexiconClassifier::score_text("this is good");
        let (neg, _) = LexiconClassifier::score_text("this is not good");
        assert!(pos > 0);
        assert_eq!(neg, -pos);
    }

    #[tokio::test]
    async fn lexicon_strong_positive_clears_threshold() {
        let a = SentimentAnalyzer::new(Arc::new(LexiconClassifier::new()));
        let res = a.analyze("love it, simply the best").await;
        assert_eq!(res.sentiment, SentimentLabel::Positive);
        assert!(res.confidence >= NEUTRAL_THRESHOLD);
    }

    #[tokio::test]
    async fn lexicon_flat_text_stays_neutral() {
        let a = SentimentAnalyzer::new(Arc::new(LexiconClassifier::new()));
        let res = a.analyze("the car exists and has four wheels").await;
        assert_eq!(res.sentiment, SentimentLabel::Neutral);
        assert_eq!(res.confidence, 0.5);
    }
}
