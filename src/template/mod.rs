//! Provisioning template packages.
//!
//! A template package is an OPC container holding a Manifest, its Properties
//! and FilesMap, and any number of embedded files anchored under a Files-Origin
//! part. This module layers the template semantics over the [`crate::opc`] store:
//!
//! - [`component`]: the fixed component kinds and their literals
//! - [`resolver`]: relationship-typed lookup and creation of parts
//! - [`codec`]: typed values and raw bytes in and out of parts
//! - [`files`]: the embedded file collection
//! - [`package`]: the [`TemplatePackage`] facade

pub mod codec;
pub mod component;
pub mod files;
pub mod model;
pub mod options;
pub mod package;
pub mod resolver;

pub use codec::{PartCodec, TextFormat, XmlFormat};
pub use component::ComponentKind;
pub use files::Files;
pub use model::{FileItem, FileMapEntry, FilesMap, Manifest, Properties};
pub use options::PackageOptions;
pub use package::TemplatePackage;
pub use resolver::PartResolver;
