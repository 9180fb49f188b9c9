use thiserror::Error;

/// Failures of the one-shot media list fetch.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch media list: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Media list request returned HTTP {0}")]
    Status(u16),
    #[error("Media list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API response is not an array of URLs.")]
    NotAnArray,
    #[error("API response entry {0} is not a URL string.")]
    NotAString(usize),
    #[error("Media list fetch was abandoned before completing")]
    Abandoned,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Playback was rejected: {0}")]
    Rejected(String),
    #[error("No media is loaded")]
    NothingLoaded,
}

/// Runtime failures of an individual image or video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to probe {url}: {reason}")]
    Probe { url: String, reason: String },
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Decoding failed: {0}")]
    Decode(String),
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("Failed to load image {url}: {reason}")]
    Image { url: String, reason: String },
}
