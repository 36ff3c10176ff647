//! pnp-package - provisioning template packages for Rust
//!
//! This library reads and writes `.pnp` provisioning template packages: ZIP-based
//! Open Packaging Conventions (OPC) containers bundling a template Manifest, its
//! Properties and FilesMap, and the files the template embeds.
//!
//! # Features
//!
//! - **OPC store**: Parts, relationships, `[Content_Types].xml` and per-part compression
//! - **Typed resolution**: Components are found by relationship type, never by guessing paths
//! - **Structured parts**: Manifest, Properties and FilesMap move through serde as XML
//! - **Embedded files**: Named files grouped in folders under `/Files/`
//! - **Files or streams**: Packages open from a path or from any seekable stream
//!
//! # Example - Writing a package
//!
//! ```no_run
//! use pnp_package::opc::{PackageAccess, PackageMode};
//! use pnp_package::template::{Manifest, Properties, TemplatePackage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = TemplatePackage::open("site.pnp", PackageMode::Create, PackageAccess::ReadWrite)?;
//! pkg.set_manifest(Some(&Manifest::new("PnPProvisioningTemplate")))?;
//! pkg.set_properties(Some(&Properties {
//!     author: Some("Contoso".to_string()),
//!     ..Default::default()
//! }))?;
//! pkg.add_file("theme.css", "SiteAssets/Styles", Some(b"body { margin: 0 }"))?;
//! pkg.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading a package
//!
//! ```no_run
//! use pnp_package::opc::{PackageAccess, PackageMode};
//! use pnp_package::template::TemplatePackage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = TemplatePackage::open("site.pnp", PackageMode::Open, PackageAccess::Read)?;
//! if let Some(manifest) = pkg.manifest()? {
//!     println!("Template type: {}", manifest.kind);
//! }
//! for (name, file) in pkg.files()? {
//!     println!("{} ({} bytes) in '{}'", name, file.content.len(), file.folder);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod opc;
pub mod template;

pub use error::{PackageError, Result};
pub use template::{PackageOptions, TemplatePackage};
