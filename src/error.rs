// Error type for the whole tool.
// Every variant states *where* things went wrong; capture failures are
// reported back to the user and never end the program.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No render surface / video device, or it has zero size.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Region with non-positive or non-finite size.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Fetching or decoding a raster failed (camera frame, data URL, file).
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Window init error: {0}")]
    WindowInit(String),

    #[error("Window update error: {0}")]
    WindowUpdate(String),

    #[error("Camera init error: {0}")]
    CameraInit(String),

    #[error("Costume not found: {0}")]
    CostumeNotFound(String),

    /// A sprite must keep at least one costume.
    #[error("Cannot delete the last costume")]
    LastCostume,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
