//! Append-only text buffers for the agent's memory and keyword cache.

/// Text that only ever grows. Each [`append`](Self::append) adds one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendLog {
    text: String,
    segments: usize,
}

impl AppendLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, segment: &str) {
        self.text.push_str(segment);
        self.segments += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Number of appends so far, including empty ones.
    pub fn segments(&self) -> usize {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_keep_prefix() {
        let mut log = AppendLog::new();
        assert!(log.is_empty());
        log.append("Alice is a girl.");
        let before = log.as_str().to_string();
        log.append("She fell.");
        assert!(log.as_str().starts_with(&before));
        assert_eq!(log.as_str(), "Alice is a girl.She fell.");
        assert_eq!(log.segments(), 2);
    }

    #[test]
    fn empty_segment_counts_but_adds_nothing() {
        let mut log = AppendLog::new();
        log.append("");
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.segments(), 1);
    }
}
