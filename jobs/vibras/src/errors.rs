use thiserror::Error;

/// Fatal load-time failures. Any of these aborts the run before the first
/// record is mapped; skippable record conditions never surface here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lexicon line {line} is not `term<TAB>score`: {text:?}")]
    MalformedLexiconEntry { line: usize, text: String },

    #[error("region file is not a JSON object of named geometries: {0}")]
    RegionFile(#[from] serde_json::Error),

    #[error("region '{region}' has an unusable geometry: {reason}")]
    MalformedGeometry { region: String, reason: String },
}
