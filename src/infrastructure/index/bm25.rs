use ahash::AHashMap;

use crate::application::services::LexicalIndex;

/// Okapi BM25 tuning constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    /// Fraction of the mean idf given to terms whose idf would be negative.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// In-memory BM25 Okapi index over a pre-tokenised corpus.
///
/// Terms present in more than half of the corpus would get a negative idf;
/// they are floored to `epsilon * mean_idf` instead.
pub struct Bm25Index {
    params: Bm25Params,
    term_freqs: Vec<AHashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: AHashMap<String, f64>,
}

impl Bm25Index {
    pub fn new(corpus: &[Vec<String>]) -> Self {
        Self::with_params(corpus, Bm25Params::default())
    }

    pub fn with_params(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut doc_freq: AHashMap<String, u32> = AHashMap::new();
        let mut total_tokens = 0usize;

        for document in corpus {
            let mut freqs: AHashMap<String, u32> = AHashMap::new();
            for token in document {
                *freqs.entry(token.clone()).or_default() += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            total_tokens += document.len();
            doc_lens.push(document.len());
            term_freqs.push(freqs);
        }

        let corpus_size = corpus.len() as f64;
        let avg_doc_len = if corpus.is_empty() {
            0.0
        } else {
            total_tokens as f64 / corpus_size
        };

        let mut idf: AHashMap<String, f64> = AHashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0;
        let mut negative = Vec::new();
        for (term, freq) in doc_freq {
            let freq = f64::from(freq);
            let value = (corpus_size - freq + 0.5).ln() - (freq + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }

        if !idf.is_empty() {
            let floor = params.epsilon * idf_sum / idf.len() as f64;
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            params,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
        }
    }

    /// Idf weight of `term`, zero when unseen.
    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    fn score_document(&self, row: usize, query_tokens: &[String]) -> f64 {
        let Bm25Params { k1, b, .. } = self.params;
        let length_ratio = if self.avg_doc_len > 0.0 {
            self.doc_lens[row] as f64 / self.avg_doc_len
        } else {
            0.0
        };
        let freqs = &self.term_freqs[row];

        query_tokens
            .iter()
            .map(|token| {
                let tf = f64::from(freqs.get(token).copied().unwrap_or(0));
                if tf == 0.0 {
                    return 0.0;
                }
                self.idf(token) * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio))
            })
            .sum()
    }
}

impl LexicalIndex for Bm25Index {
    fn score_all(&self, query_tokens: &[String]) -> Vec<f32> {
        (0..self.term_freqs.len())
            .map(|row| self.score_document(row, query_tokens) as f32)
            .collect()
    }

    fn len(&self) -> usize {
        self.term_freqs.len()
    }
}
