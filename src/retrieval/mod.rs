//! Retrieval seam used by the session loop.
//!
//! The loop only ever calls [`Retriever::retrieve`] with a body of text (the
//! whole novel, or the whole accumulated memory), the active question and the
//! keyword cache so far. What comes back is an excerpt plus whatever keywords
//! the retriever pulled out along the way; the loop treats both as opaque.

pub mod keyword;
pub mod terms;

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid retrieval parameter: {0}")]
    InvalidParameter(String),
    #[error("retrieval failed: {0}")]
    Failed(String),
}

/// Result of one retrieval call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieval {
    /// Text judged relevant to the query.
    pub excerpt: String,
    /// Keywords extracted while retrieving, in the retriever's own format.
    pub keywords: String,
}

pub trait Retriever {
    /// `source` may be the full document or the full memory; `cached_keywords`
    /// may be empty on the first call.
    fn retrieve(
        &self,
        source: &str,
        query: &str,
        cached_keywords: &str,
    ) -> impl Future<Output = Result<Retrieval, RetrievalError>> + Send;
}
