/// Open Packaging Conventions (OPC) container store.
///
/// This module provides the generic structured-container layer the template
/// package is built on:
///
/// - Package structure (parts, relationships)
/// - Content type management
/// - ZIP-based physical packaging
/// - Scoped part streams
///
/// Parts are buffered whole in memory; the package is read once on open and
/// written back in one pass on close.
pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;
pub mod stream;

// Re-export commonly used types
pub use error::OpcError;
pub use package::{OpcPackage, PackageAccess, PackageMode};
pub use packuri::PackURI;
pub use part::{CompressionOption, Part};
pub use rel::{Relationship, Relationships, TargetMode};
pub use stream::{PackageStream, PartStream, StreamMode};
