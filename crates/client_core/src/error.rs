use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote call failed; carries the underlying message verbatim.
    #[error("{0}")]
    Transport(String),
    #[error("no course is loaded")]
    NoCourseLoaded,
    #[error("current course has no id")]
    MissingCourseId,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl StoreError {
    pub(crate) fn transport(err: anyhow::Error) -> Self {
        Self::Transport(format!("{err:#}"))
    }
}
