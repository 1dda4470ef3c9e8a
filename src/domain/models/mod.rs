use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Raw content of one passage in a domain's document collection.
///
/// Collections mix plain strings with structured question/answer records; the
/// record keeps its raw JSON so nothing is lost when no field is usable.
#[derive(Debug, Clone, PartialEq)]
pub enum PassageContent {
    PlainText(String),
    Structured {
        question: Option<String>,
        answer: Option<String>,
        raw: Value,
    },
}

impl PassageContent {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => PassageContent::PlainText(text),
            Value::Object(ref map) => {
                let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                PassageContent::Structured {
                    question: field("question"),
                    answer: field("answer"),
                    raw: value.clone(),
                }
            }
            other => PassageContent::PlainText(other.to_string()),
        }
    }

    /// Most informative text of the passage: the answer, else the question,
    /// else the whole record rendered as JSON.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            PassageContent::PlainText(text) => Cow::Borrowed(text.as_str()),
            PassageContent::Structured {
                question,
                answer,
                raw,
            } => answer
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .or_else(|| question.as_deref().filter(|q| !q.trim().is_empty()))
                .map(Cow::Borrowed)
                .unwrap_or_else(|| Cow::Owned(raw.to_string())),
        }
    }

    /// Text fed to the lexical index; structured records are indexed whole.
    pub fn indexable_text(&self) -> Cow<'_, str> {
        match self {
            PassageContent::PlainText(text) => Cow::Borrowed(text.as_str()),
            PassageContent::Structured { raw, .. } => Cow::Owned(raw.to_string()),
        }
    }
}

impl From<&str> for PassageContent {
    fn from(value: &str) -> Self {
        PassageContent::PlainText(value.to_string())
    }
}

impl From<String> for PassageContent {
    fn from(value: String) -> Self {
        PassageContent::PlainText(value)
    }
}

impl<'de> Deserialize<'de> for PassageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(PassageContent::from_value)
    }
}

/// A passage proposed by retrieval for one query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub domain: String,
    /// Row of the passage in its domain's collection.
    pub position: usize,
    pub content: PassageContent,
    pub fused_score: f32,
    pub rerank_score: Option<f32>,
}

impl Candidate {
    pub fn new(
        domain: impl Into<String>,
        position: usize,
        content: PassageContent,
        fused_score: f32,
    ) -> Self {
        Self {
            domain: domain.into(),
            position,
            content,
            fused_score,
            rerank_score: None,
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.content.text()
    }

    /// Rerank score when present, fused score otherwise.
    pub fn score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.fused_score)
    }
}

/// Short excerpt of a ranked passage returned alongside the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub chunk: String,
    pub domain: String,
    pub score: f32,
}

impl SourceExcerpt {
    pub fn from_candidate(candidate: &Candidate, max_chars: usize) -> Self {
        Self {
            chunk: truncate_chars(&candidate.text(), max_chars).to_string(),
            domain: candidate.domain.clone(),
            score: candidate.rerank_score.unwrap_or(0.0),
        }
    }
}

/// Complete outcome of one question, degraded or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: Uuid,
    pub query: String,
    pub answer: String,
    pub domains: Vec<String>,
    pub confidence: f32,
    /// Wall-clock seconds, rounded to two decimals.
    pub processing_time: f64,
    pub is_emergency: bool,
    pub sources: Vec<SourceExcerpt>,
    pub answered_at: DateTime<Utc>,
}

impl QueryResult {
    /// Result for a query whose pipeline failed internally.
    pub fn degraded(query: impl Into<String>, answer: impl Into<String>, seconds: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            answer: answer.into(),
            domains: Vec::new(),
            confidence: 0.0,
            processing_time: round_secs(seconds),
            is_emergency: false,
            sources: Vec::new(),
            answered_at: Utc::now(),
        }
    }
}

pub fn round_secs(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_record_prefers_answer_then_question() {
        let full = PassageContent::from_value(json!({"question": "Q?", "answer": "A."}));
        assert_eq!(full.text(), "A.");

        let blank_answer = PassageContent::from_value(json!({"question": "Q?", "answer": ""}));
        assert_eq!(blank_answer.text(), "Q?");

        let neither = PassageContent::from_value(json!({"topic": "x"}));
        assert_eq!(neither.text(), r#"{"topic":"x"}"#);
    }

    #[test]
    fn deserializes_mixed_collections() {
        let docs: Vec<PassageContent> =
            serde_json::from_str(r#"["plain text", {"answer": "structured"}, 42]"#).unwrap();
        assert_eq!(docs[0], PassageContent::PlainText("plain text".into()));
        assert_eq!(docs[1].text(), "structured");
        assert_eq!(docs[2].text(), "42");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn excerpt_uses_candidate_domain_and_rerank_score() {
        let mut candidate = Candidate::new("Neurology", 3, "a".repeat(300).into(), 0.2);
        candidate.rerank_score = Some(0.9);
        let excerpt = SourceExcerpt::from_candidate(&candidate, 200);
        assert_eq!(excerpt.chunk.len(), 200);
        assert_eq!(excerpt.domain, "Neurology");
        assert_eq!(excerpt.score, 0.9);
    }
}
