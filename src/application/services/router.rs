use tracing::{debug, info};

/// Keyword table used to route medical questions, in routing order.
const MEDICAL_KEYWORDS: [(&str, &[&str]); 5] = [
    (
        "Cancer",
        &["cancer", "tumor", "chemotherapy", "oncology", "malignant"],
    ),
    (
        "Cardiology",
        &["heart", "cardiac", "blood pressure", "artery", "cardiovascular"],
    ),
    (
        "Dermatology",
        &["skin", "rash", "eczema", "acne", "dermatitis"],
    ),
    (
        "Diabetes-Digestive-Kidney",
        &["diabetes", "kidney", "digestive", "stomach", "liver", "insulin"],
    ),
    (
        "Neurology",
        &["brain", "headache", "migraine", "seizure", "neurological", "nervous"],
    ),
];

const MEDICAL_FALLBACK: &str = "Cardiology";

/// Maps a free-text question to the domains most likely to answer it.
#[derive(Debug, Clone)]
pub struct DomainRouter {
    table: Vec<(String, Vec<String>)>,
    fallback: String,
}

impl DomainRouter {
    pub fn new<D, K>(table: impl IntoIterator<Item = (D, K)>, fallback: impl Into<String>) -> Self
    where
        D: Into<String>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let table = table
            .into_iter()
            .map(|(domain, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|k| k.as_ref().to_lowercase())
                    .collect();
                (domain.into(), keywords)
            })
            .collect();
        Self {
            table,
            fallback: fallback.into(),
        }
    }

    pub fn medical() -> Self {
        Self::new(
            MEDICAL_KEYWORDS
                .iter()
                .map(|(domain, keywords)| (*domain, keywords.iter().copied())),
            MEDICAL_FALLBACK,
        )
    }

    /// Number of the domain's keywords occurring as substrings of the query.
    fn scores(&self, query: &str) -> Vec<(&str, usize)> {
        let query = query.to_lowercase();
        self.table
            .iter()
            .map(|(domain, keywords)| {
                let hits = keywords
                    .iter()
                    .filter(|k| query.contains(k.as_str()))
                    .count();
                (domain.as_str(), hits)
            })
            .collect()
    }

    /// Every domain tied at the highest non-zero score, in table order, or
    /// the fallback domain when nothing matches.
    pub fn route(&self, query: &str) -> Vec<String> {
        let scores = self.scores(query);
        let max_score = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        debug!(target: "medirag::router", ?scores, max_score, "domain routing scores");

        let selected: Vec<String> = if max_score == 0 {
            vec![self.fallback.clone()]
        } else {
            scores
                .into_iter()
                .filter(|(_, s)| *s == max_score)
                .map(|(d, _)| d.to_string())
                .collect()
        };

        info!(target: "medirag::router", domains = ?selected, "selected domains");
        selected
    }
}

impl Default for DomainRouter {
    fn default() -> Self {
        Self::medical()
    }
}
