use thiserror::Error;

/// Failures raised while turning boundaries into a glTF asset.
///
/// `InvalidGeometry` and `SerializationFailure` abort the whole run.
/// `MissingLabel` only ever comes out of a label lookup and is swallowed by
/// the scene assembler.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no label anchors for region '{0}'")]
    MissingLabel(String),

    #[error("failed to serialize asset: {0}")]
    SerializationFailure(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<gltf::Error> for Error {
    fn from(err: gltf::Error) -> Self {
        Error::SerializationFailure(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::SerializationFailure(err.to_string())
    }
}
