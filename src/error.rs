use thiserror::Error;

/// Reasons a model's bytes were rejected after a successful download.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("model header is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("model header is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognised glTF asset version {0:?}")]
    UnsupportedVersion(String),

    #[error("binary container is malformed: {0}")]
    Container(&'static str),

    #[error("glTF file has no scene to display")]
    MissingScene,

    #[error("glTF file requires unsupported extension {0}")]
    UnsupportedExtension(String),

    #[error("glTF document rejected: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("glTF 1.0 document references missing {kind} {id:?}")]
    MissingReference { kind: &'static str, id: String },

    #[error("object has no geometry")]
    NoGeometry,
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Object could not be loaded. HTTP error status: {status}")]
    Network { status: u16 },

    #[error("Object could not be loaded: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Object could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error loading object. {0}")]
    Format(#[from] FormatError),

    #[error("{0}")]
    Route(String),
}

impl ViewerError {
    /// Text for the status label. Format errors keep the short page wording.
    pub fn status_message(&self) -> String {
        match self {
            ViewerError::Format(_) => "Error loading object.".to_string(),
            other => other.to_string(),
        }
    }
}
