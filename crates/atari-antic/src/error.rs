use thiserror::Error;

/// Save-state exchange failures.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to decode ANTIC state: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("failed to encode ANTIC state: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("ANTIC state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
