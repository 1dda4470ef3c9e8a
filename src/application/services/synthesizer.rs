use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::services::{
        text::{clean_text, split_sentences, word_count},
        PipelineConfig, TextGenerator,
    },
    domain::{models::truncate_chars, Candidate, DomainError},
};

pub const EMERGENCY_MESSAGE: &str = "🚨 **EMERGENCY - SEEK IMMEDIATE MEDICAL ATTENTION**\n\n\
Please call 911 or go to the nearest emergency room immediately.\n\
⚠️ Do not delay.";

pub const INSUFFICIENT_INFORMATION_MESSAGE: &str =
    "I couldn't find enough relevant information to answer this accurately.\n\n\
⚠️ Please consult a qualified healthcare professional.";

pub const EMERGENCY_REMINDER: &str =
    "\n\n🚨 **If these symptoms occur, seek immediate medical care.**";

pub const PROFESSIONAL_DISCLAIMER: &str =
    "\n\n⚠️ Please consult a healthcare professional for personalized advice.";

/// Which branch of the answer policy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Emergency signal with low retrieval confidence; nothing was generated.
    EmergencyEscalation,
    /// No candidates survived retrieval.
    InsufficientInformation,
    Generated,
    /// Generation failed or fell below the quality gate.
    Extractive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAnswer {
    pub text: String,
    pub kind: AnswerKind,
}

/// Turns ranked passages into a grounded answer under the emergency policy.
pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    pub fn synthesize(
        &self,
        query: &str,
        candidates: &[Candidate],
        is_emergency: bool,
        confidence: f32,
    ) -> SynthesizedAnswer {
        if is_emergency && confidence < self.config.emergency_threshold {
            return SynthesizedAnswer {
                text: EMERGENCY_MESSAGE.to_string(),
                kind: AnswerKind::EmergencyEscalation,
            };
        }

        let Some(top) = candidates.first() else {
            return SynthesizedAnswer {
                text: INSUFFICIENT_INFORMATION_MESSAGE.to_string(),
                kind: AnswerKind::InsufficientInformation,
            };
        };

        let prompt = build_prompt(query, &self.build_context(candidates));
        let generated = panic::catch_unwind(AssertUnwindSafe(|| {
            self.generator.generate(&prompt, &self.config.generation)
        }))
        .unwrap_or_else(|payload| {
            Err(DomainError::generation(format!(
                "generator panicked: {}",
                panic_message(payload.as_ref())
            )))
        });

        match generated {
            Ok(raw) => {
                let answer = clean_text(&raw);
                let words = word_count(&answer);
                let (body, kind) = if words >= self.config.min_answer_words {
                    (answer, AnswerKind::Generated)
                } else {
                    info!(
                        target: "medirag::synthesis",
                        words,
                        "generated answer too short, using extractive fallback"
                    );
                    (self.extractive_fallback(top), AnswerKind::Extractive)
                };
                SynthesizedAnswer {
                    text: format!("{body}{}", self.closing_note(is_emergency, confidence)),
                    kind,
                }
            }
            // A failed backend always closes with the disclaimer, emergency or not.
            Err(err) => {
                warn!(
                    target: "medirag::synthesis",
                    generator = self.generator.id(),
                    "generation failed, using extractive fallback: {err}"
                );
                SynthesizedAnswer {
                    text: format!("{}{PROFESSIONAL_DISCLAIMER}", self.extractive_fallback(top)),
                    kind: AnswerKind::Extractive,
                }
            }
        }
    }

    /// Cleaned passages long enough to be useful, joined by blank lines and
    /// cut to the context budget.
    pub fn build_context(&self, candidates: &[Candidate]) -> String {
        let parts: Vec<String> = candidates
            .iter()
            .take(self.config.max_context_chunks)
            .map(|c| clean_text(&c.text()))
            .filter(|text| text.chars().count() > self.config.min_chunk_chars)
            .collect();
        let combined = parts.join("\n\n");
        truncate_chars(&combined, self.config.max_context_chars).to_string()
    }

    fn extractive_fallback(&self, top: &Candidate) -> String {
        let cleaned = clean_text(&top.text());
        split_sentences(&cleaned)
            .into_iter()
            .take(self.config.fallback_sentences)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn closing_note(&self, is_emergency: bool, confidence: f32) -> &'static str {
        if is_emergency && confidence >= self.config.emergency_threshold {
            EMERGENCY_REMINDER
        } else {
            PROFESSIONAL_DISCLAIMER
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are an expert medical assistant providing detailed, factual answers.\n\
Use the context to answer completely.\n\n\
Context:\n{context}\n\n\
Question: {query}\n\n\
Write a professional, structured answer including:\n\
1. Explanation and causes\n\
2. Common symptoms\n\
3. Treatment or management\n\
4. When to seek medical help\n\
End with a clear disclaimer.\n"
    )
}
