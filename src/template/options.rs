/// Configuration types for template packages.
///
/// This module defines the options applied when parts are created and read.
use crate::opc::part::CompressionOption;

/// Largest part the codec buffers in memory by default (`i32::MAX` bytes).
pub const DEFAULT_MAX_PART_SIZE: u64 = i32::MAX as u64;

/// Configuration options for a template package.
///
/// # Examples
///
/// ```rust
/// use pnp_package::template::PackageOptions;
/// use pnp_package::opc::CompressionOption;
///
/// // Create with defaults
/// let options = PackageOptions::default();
///
/// // Or customize
/// let options = PackageOptions::new()
///     .with_compression(CompressionOption::Fast)
///     .with_max_part_size(64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Compression used for every part the package creates
    pub compression: CompressionOption,
    /// Parts longer than this fail to read with `SizeLimitExceeded`
    pub max_part_size: u64,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            compression: CompressionOption::Maximum,
            max_part_size: DEFAULT_MAX_PART_SIZE,
        }
    }
}

impl PackageOptions {
    /// Create a new `PackageOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression applied to newly created parts.
    #[inline]
    pub fn with_compression(mut self, compression: CompressionOption) -> Self {
        self.compression = compression;
        self
    }

    /// Set the largest part size, in bytes, that will be read into memory.
    #[inline]
    pub fn with_max_part_size(mut self, max_part_size: u64) -> Self {
        self.max_part_size = max_part_size;
        self
    }
}
