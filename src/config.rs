use serde::{Deserialize, Serialize};

/// How bound values are referenced from a parameterized fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `@p{n}`, or `@{alias}{n}` when a table alias is given; `n` is the
    /// term's declaration order.
    #[default]
    Named,
    /// `$1`, `$2`, ... numbered over the bound values.
    Positional,
}

/// Engine configuration. Every field has a default so partial JSON works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key path delimiters. The first one joins rendered path keys.
    pub key_delimiters: Vec<String>,
    /// Materialize the source and evaluate locally when the store rejects a
    /// fragment.
    pub allow_local_fallback: bool,
    /// Worker count for the secondary key scan. `0` and `1` scan sequentially.
    pub scan_parallelism: usize,
    /// Candidate sets smaller than this are scanned sequentially.
    pub parallel_threshold: usize,
    pub placeholder: PlaceholderStyle,
}

pub const DEFAULT_DELIMITER: &str = ".";
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 500;

impl Default for Config {
    fn default() -> Self {
        Self {
            key_delimiters: vec![DEFAULT_DELIMITER.to_string(), "->".to_string(), "->>".to_string()],
            allow_local_fallback: false,
            scan_parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            placeholder: PlaceholderStyle::Named,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_delimiters = delimiters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_local_fallback(mut self, allow: bool) -> Self {
        self.allow_local_fallback = allow;
        self
    }

    pub fn with_scan_parallelism(mut self, workers: usize) -> Self {
        self.scan_parallelism = workers;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_placeholder(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = style;
        self
    }

    pub fn default_delimiter(&self) -> &str {
        self.key_delimiters
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_DELIMITER)
    }

    /// Delimiters sorted longest-first, so `->>` is never read as `->`.
    pub fn delimiters_longest_first(&self) -> Vec<&str> {
        let mut delimiters: Vec<&str> = self
            .key_delimiters
            .iter()
            .map(String::as_str)
            .filter(|d| !d.is_empty())
            .collect();
        delimiters.sort_by(|a, b| b.len().cmp(&a.len()));
        delimiters.dedup();
        delimiters
    }
}
