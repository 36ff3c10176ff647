/// Error types for template package operations.
use crate::opc::error::OpcError;
use thiserror::Error;

/// Result type for template package operations.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Error types for template package operations.
///
/// A missing component is never an error; lookups return `None` or an empty
/// collection. Store and serializer failures are passed through unchanged.
#[derive(Error, Debug)]
pub enum PackageError {
    /// Container store error, including `DuplicatePart` and `ReadOnly`
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// A part is larger than the in-memory buffer limit
    #[error("Part {partname} is {size} bytes, larger than the {limit} byte limit")]
    SizeLimitExceeded {
        partname: String,
        size: u64,
        limit: u64,
    },

    /// Malformed or schema-incompatible structured content
    #[error("Cannot deserialize {partname}: {message}")]
    Deserialization { partname: String, message: String },

    /// A value could not be turned into text
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Flushing or releasing the container failed
    #[error("Failed to close package: {0}")]
    Disposal(#[source] OpcError),

    /// A mandatory component is missing where the package guarantees it
    #[error("Missing package component: {0}")]
    MissingComponent(&'static str),
}

impl PackageError {
    /// Whether this is the store's duplicate-part failure.
    pub fn is_duplicate_part(&self) -> bool {
        matches!(self, PackageError::Opc(OpcError::DuplicatePart(_)))
    }
}

impl From<std::io::Error> for PackageError {
    fn from(err: std::io::Error) -> Self {
        PackageError::Opc(OpcError::IoError(err))
    }
}
