use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("No URL found in {0:?}")]
    NoUrlFound(String),

    #[error("Expected exactly one URL, found {count} in {input:?}")]
    MultipleUrlsFound { count: usize, input: String },

    /// 标记索引数组长度必须是 7（每个 URL 部件一个）
    #[error("Marker expects 7 indices, got {0}")]
    MalformedIndices(usize),

    #[error("Failed to compile scheme automaton: {0}")]
    SchemeAutomaton(#[from] aho_corasick::BuildError),
}

#[cfg(feature = "python")]
impl From<UrlError> for pyo3::PyErr {
    fn from(err: UrlError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
