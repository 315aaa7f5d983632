pub type ScenecastResult<T> = Result<T, ScenecastError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenecastError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("template param error: {0}")]
    TemplateParam(String),

    #[error("alignment mismatch: script has {expected} words but timestamps cover {actual}")]
    AlignmentMismatch { expected: usize, actual: usize },

    #[error("capture error: {0}")]
    Capture(String),

    #[error("assembly error: {0}")]
    Assembly(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn template_param(msg: impl Into<String>) -> Self {
        Self::TemplateParam(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// True for errors the capture driver is allowed to retry.
    pub fn is_transient_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }
}
