//! Local keyword retriever.
//!
//! Splits the source into character-bounded chunks, ranks chunks by the
//! query's key terms (idf-weighted, with a smaller boost for terms already in
//! the keyword cache), then widens every hit with its neighbouring chunks.
//! When the query alone finds too little, a deep-search pass ranks the
//! remaining chunks by cached keywords only.
//!
//! Chunk indexes are memoised per source fingerprint; the novel is indexed
//! once per run, memory is re-indexed whenever it has grown.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use text_splitter::TextSplitter;
use tracing::{debug, trace};

use crate::config::settings::Settings;

use super::terms;
use super::{Retrieval, RetrievalError, Retriever};

/// How many chunk indexes are kept (the novel plus a few memory snapshots).
const INDEX_CACHE_CAP: usize = 4;
/// Weight of cached-keyword matches relative to query-term matches.
const CACHE_BIAS: f64 = 0.5;
const RUN_SEPARATOR: &str = "\n...\n";

/// Ranking knobs, taken from the run [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverParams {
    /// Primary hits kept per call.
    pub recall_index: usize,
    /// Chunks added on each side of every hit.
    pub neighbor_num: usize,
    /// Deep search runs when primary hits fall below this.
    pub deep_search_index: usize,
    /// Extra chunks a deep search may add.
    pub deep_search_num: usize,
    /// Maximum characters per chunk.
    pub chunk_chars: usize,
}

impl RetrieverParams {
    pub fn from_settings(settings: &Settings, chunk_chars: usize) -> Self {
        Self {
            recall_index: settings.recall_index(),
            neighbor_num: settings.neighbor_num(),
            deep_search_index: settings.deep_search_index(),
            deep_search_num: settings.deep_search_num(),
            chunk_chars,
        }
    }
}

struct IndexedChunk {
    text: String,
    term_freq: HashMap<String, u32>,
}

struct ChunkIndex {
    chunks: Vec<IndexedChunk>,
    doc_freq: HashMap<String, usize>,
}

impl ChunkIndex {
    fn build(source: &str, chunk_chars: usize) -> Self {
        let splitter = TextSplitter::new(chunk_chars);
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let chunks: Vec<IndexedChunk> = splitter
            .chunks(source)
            .filter(|t| !t.trim().is_empty())
            .map(|text| {
                let mut term_freq: HashMap<String, u32> = HashMap::new();
                for term in terms::tokenize(text) {
                    *term_freq.entry(term).or_insert(0) += 1;
                }
                for term in term_freq.keys() {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
                IndexedChunk { text: text.to_string(), term_freq }
            })
            .collect();
        Self { chunks, doc_freq }
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.chunks.len() as f64;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Sum of `(1 + ln tf) * idf` over the terms present in chunk `i`.
    fn score(&self, i: usize, query_terms: &[String]) -> f64 {
        let chunk = &self.chunks[i];
        query_terms
            .iter()
            .filter_map(|t| chunk.term_freq.get(t).map(|tf| (t, *tf)))
            .map(|(t, tf)| (1.0 + f64::from(tf).ln()) * self.idf(t))
            .sum()
    }

    fn contains_term(&self, term: &str) -> bool {
        self.doc_freq.contains_key(term)
    }
}

pub struct KeywordRetriever {
    params: RetrieverParams,
    indexes: Mutex<VecDeque<(String, Arc<ChunkIndex>)>>,
}

impl KeywordRetriever {
    pub fn new(params: RetrieverParams) -> Result<Self, RetrievalError> {
        if params.chunk_chars == 0 {
            return Err(RetrievalError::InvalidParameter("chunk_chars must be > 0".into()));
        }
        Ok(Self { params, indexes: Mutex::new(VecDeque::new()) })
    }

    fn fingerprint(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn index_for(&self, source: &str) -> Result<Arc<ChunkIndex>, RetrievalError> {
        let key = Self::fingerprint(source);
        let mut cache = self
            .indexes
            .lock()
            .map_err(|_| RetrievalError::Failed("index cache poisoned".into()))?;
        if let Some(pos) = cache.iter().position(|(k, _)| *k == key) {
            if let Some(entry) = cache.remove(pos) {
                let index = entry.1.clone();
                cache.push_front(entry);
                return Ok(index);
            }
        }

        let index = Arc::new(ChunkIndex::build(source, self.params.chunk_chars));
        debug!(chunks = index.chunks.len(), source_len = source.len(), "indexed retrieval source");
        cache.push_front((key, index.clone()));
        cache.truncate(INDEX_CACHE_CAP);
        Ok(index)
    }

    fn retrieve_now(
        &self,
        source: &str,
        query: &str,
        cached_keywords: &str,
    ) -> Result<Retrieval, RetrievalError> {
        if source.trim().is_empty() {
            return Ok(Retrieval::default());
        }

        let index = self.index_for(source)?;
        let query_terms = terms::key_terms(query);
        let cached_terms: Vec<String> = terms::key_terms(cached_keywords)
            .into_iter()
            .filter(|t| !query_terms.contains(t))
            .collect();

        let mut primary: Vec<(usize, f64)> = (0..index.chunks.len())
            .filter_map(|i| {
                let q = index.score(i, &query_terms);
                (q > 0.0).then(|| (i, q + CACHE_BIAS * index.score(i, &cached_terms)))
            })
            .collect();
        rank(&mut primary);
        primary.truncate(self.params.recall_index);

        let mut hits: BTreeSet<usize> = primary.iter().map(|(i, _)| *i).collect();

        if hits.len() < self.params.deep_search_index && !cached_terms.is_empty() {
            let mut deep: Vec<(usize, f64)> = (0..index.chunks.len())
                .filter(|i| !hits.contains(i))
                .map(|i| (i, index.score(i, &cached_terms)))
                .filter(|(_, s)| *s > 0.0)
                .collect();
            rank(&mut deep);
            deep.truncate(self.params.deep_search_num);
            trace!(added = deep.len(), "deep search pass");
            hits.extend(deep.into_iter().map(|(i, _)| i));
        }

        let last = index.chunks.len().saturating_sub(1);
        let expanded: BTreeSet<usize> = hits
            .iter()
            .flat_map(|&i| {
                let lo = i.saturating_sub(self.params.neighbor_num);
                let hi = i.saturating_add(self.params.neighbor_num).min(last);
                lo..=hi
            })
            .collect();

        let excerpt = join_runs(&index, &expanded);

        let matched: Vec<&String> = query_terms.iter().filter(|t| index.contains_term(t)).collect();
        let keywords = if matched.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&matched).unwrap_or_default()
        };

        debug!(
            hits = hits.len(),
            chunks = expanded.len(),
            excerpt_len = excerpt.len(),
            "retrieval complete"
        );
        Ok(Retrieval { excerpt, keywords })
    }
}

impl Retriever for KeywordRetriever {
    async fn retrieve(
        &self,
        source: &str,
        query: &str,
        cached_keywords: &str,
    ) -> Result<Retrieval, RetrievalError> {
        self.retrieve_now(source, query, cached_keywords)
    }
}

/// Highest score first; equal scores keep document order.
fn rank(scored: &mut [(usize, f64)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
}

/// Contiguous chunk positions are joined with a newline; gaps become `...`.
fn join_runs(index: &ChunkIndex, positions: &BTreeSet<usize>) -> String {
    let mut runs: Vec<Vec<&str>> = Vec::new();
    let mut prev: Option<usize> = None;
    for &i in positions {
        let text = index.chunks[i].text.as_str();
        let contiguous = prev.is_some_and(|p| p + 1 == i);
        prev = Some(i);
        if contiguous {
            if let Some(run) = runs.last_mut() {
                run.push(text);
                continue;
            }
        }
        runs.push(vec![text]);
    }
    runs.iter()
        .map(|run| run.join("\n"))
        .collect::<Vec<_>>()
        .join(RUN_SEPARATOR)
}
