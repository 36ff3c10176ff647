/// Package implementation for provisioning templates.
use crate::error::{PackageError, Result};
use crate::opc::package::{OpcPackage, PackageAccess, PackageMode};
use crate::opc::packuri::PackURI;
use crate::opc::stream::PackageStream;
use crate::template::codec::PartCodec;
use crate::template::component::ComponentKind;
use crate::template::files::Files;
use crate::template::model::{FileItem, FilesMap, Manifest, Properties};
use crate::template::options::PackageOptions;
use crate::template::resolver::PartResolver;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// A provisioning template package (`.pnp`).
///
/// This is the main entry point for working with template packages. It wraps an
/// OPC package and guarantees that the Manifest, Properties, Files-Origin and
/// FilesMap parts exist once it is open.
///
/// Reads go through part streams, so accessors take `&mut self` as well.
///
/// # Examples
///
/// ```rust,no_run
/// use pnp_package::opc::{PackageAccess, PackageMode};
/// use pnp_package::template::{Manifest, TemplatePackage};
///
/// let mut pkg = TemplatePackage::open("site.pnp", PackageMode::OpenOrCreate, PackageAccess::ReadWrite)?;
/// pkg.set_manifest(Some(&Manifest::new("PnPProvisioningTemplate")))?;
/// pkg.add_file("logo.png", "SiteAssets", Some(&[0x89, 0x50, 0x4E, 0x47]))?;
/// pkg.close()?;
/// # Ok::<(), pnp_package::error::PackageError>(())
/// ```
pub struct TemplatePackage<'s> {
    /// The underlying OPC package
    opc: OpcPackage<'s>,
    options: PackageOptions,
}

impl TemplatePackage<'static> {
    /// Open a template package file with default options.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the package file
    /// * `mode` - Whether to create, open, or either
    /// * `access` - Read-only or read-write
    pub fn open<P: AsRef<Path>>(path: P, mode: PackageMode, access: PackageAccess) -> Result<Self> {
        Self::open_with_options(path, mode, access, PackageOptions::default())
    }

    /// Open a template package file.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        mode: PackageMode,
        access: PackageAccess,
        options: PackageOptions,
    ) -> Result<Self> {
        let opc = OpcPackage::open(path, mode, access)?;
        Self::from_opc(opc, options)
    }

    /// Create an empty in-memory package, not backed by any file or stream.
    pub fn in_memory(options: PackageOptions) -> Result<Self> {
        Self::from_opc(OpcPackage::new(), options)
    }
}

impl<'s> TemplatePackage<'s> {
    /// Open a template package stored in a stream with default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pnp_package::opc::{PackageAccess, PackageMode};
    /// use pnp_package::template::TemplatePackage;
    /// use std::io::Cursor;
    ///
    /// let mut buffer = Cursor::new(Vec::new());
    /// let pkg = TemplatePackage::open_stream(&mut buffer, PackageMode::Create, PackageAccess::ReadWrite)?;
    /// pkg.close()?;
    /// assert!(!buffer.get_ref().is_empty());
    /// # Ok::<(), pnp_package::error::PackageError>(())
    /// ```
    pub fn open_stream<S: PackageStream + 's>(
        stream: S,
        mode: PackageMode,
        access: PackageAccess,
    ) -> Result<Self> {
        Self::open_stream_with_options(stream, mode, access, PackageOptions::default())
    }

    /// Open a template package stored in a stream.
    pub fn open_stream_with_options<S: PackageStream + 's>(
        stream: S,
        mode: PackageMode,
        access: PackageAccess,
        options: PackageOptions,
    ) -> Result<Self> {
        let opc = OpcPackage::open_stream(stream, mode, access)?;
        Self::from_opc(opc, options)
    }

    fn from_opc(opc: OpcPackage<'s>, options: PackageOptions) -> Result<Self> {
        let mut package = Self { opc, options };
        package.ensure_mandatory_components()?;
        Ok(package)
    }

    fn resolver(&mut self) -> PartResolver<'_, 's> {
        PartResolver::new(&mut self.opc, self.options.compression)
    }

    fn codec(&mut self) -> PartCodec<'_, 's> {
        PartCodec::new(&mut self.opc, self.options.max_part_size)
    }

    /// Make sure the Manifest, Properties, Files-Origin and FilesMap parts exist.
    ///
    /// Missing parts are created, in that order. A read-only package cannot create
    /// them and fails with `MissingComponent` instead.
    pub fn ensure_mandatory_components(&mut self) -> Result<()> {
        let writable = self.opc.access().is_writable();
        for kind in ComponentKind::MANDATORY {
            let parent = match kind.parent() {
                Some(parent_kind) => Some(
                    self.component_part(parent_kind)?
                        .ok_or(PackageError::MissingComponent(parent_kind.name()))?,
                ),
                None => None,
            };

            if writable {
                self.resolver().ensure(kind, parent.as_ref())?;
            } else if self.resolver().get_single(kind, parent.as_ref())?.is_none() {
                return Err(PackageError::MissingComponent(kind.name()));
            }
        }
        debug!(parts = self.opc.part_count(), "Mandatory components present");
        Ok(())
    }

    /// Resolve a component by walking its parent chain from the package root.
    fn component_part(&mut self, kind: ComponentKind) -> Result<Option<PackURI>> {
        let parent = match kind.parent() {
            Some(parent_kind) => match self.component_part(parent_kind)? {
                Some(parent) => Some(parent),
                None => return Ok(None),
            },
            None => None,
        };
        self.resolver().get_single(kind, parent.as_ref())
    }

    /// Resolve a component, creating it and its parents when missing.
    fn ensure_component(&mut self, kind: ComponentKind) -> Result<PackURI> {
        let parent = match kind.parent() {
            Some(parent_kind) => Some(self.ensure_component(parent_kind)?),
            None => None,
        };
        self.resolver().ensure(kind, parent.as_ref())
    }

    fn read_component<T: serde::de::DeserializeOwned>(&mut self, kind: ComponentKind) -> Result<Option<T>> {
        let part = self.component_part(kind)?;
        self.codec().read(part.as_ref())
    }

    fn write_component<T: serde::Serialize>(&mut self, kind: ComponentKind, value: Option<&T>) -> Result<()> {
        let part = self.ensure_component(kind)?;
        self.codec().write(value, &part)
    }

    /// The Manifest, or `None` when the part is missing or empty.
    pub fn manifest(&mut self) -> Result<Option<Manifest>> {
        self.read_component(ComponentKind::Manifest)
    }

    /// Store the Manifest. `None` keeps the current content.
    pub fn set_manifest(&mut self, manifest: Option<&Manifest>) -> Result<()> {
        self.write_component(ComponentKind::Manifest, manifest)
    }

    pub fn properties(&mut self) -> Result<Option<Properties>> {
        self.read_component(ComponentKind::Properties)
    }

    /// Store the template properties. `None` keeps the current content.
    pub fn set_properties(&mut self, properties: Option<&Properties>) -> Result<()> {
        self.write_component(ComponentKind::Properties, properties)
    }

    pub fn files_map(&mut self) -> Result<Option<FilesMap>> {
        self.read_component(ComponentKind::FilesMap)
    }

    /// Store the files map. `None` keeps the current content.
    pub fn set_files_map(&mut self, files_map: Option<&FilesMap>) -> Result<()> {
        self.write_component(ComponentKind::FilesMap, files_map)
    }

    #[inline]
    pub fn manifest_part(&mut self) -> Result<Option<PackURI>> {
        self.component_part(ComponentKind::Manifest)
    }

    #[inline]
    pub fn files_origin_part(&mut self) -> Result<Option<PackURI>> {
        self.component_part(ComponentKind::FilesOrigin)
    }

    /// Part names of every embedded file.
    pub fn file_parts(&mut self) -> Result<Vec<PackURI>> {
        self.file_collection().parts()
    }

    /// A view over the embedded files.
    pub fn file_collection(&mut self) -> Files<'_, 's> {
        Files::new(&mut self.opc, &self.options)
    }

    /// Embed a file as `/Files/{folder}/{name}`. See [`Files::add_file`].
    pub fn add_file(&mut self, name: &str, folder: &str, content: Option<&[u8]>) -> Result<PackURI> {
        self.file_collection().add_file(name, folder, content)
    }

    /// Remove every embedded file. See [`Files::clear_files`].
    pub fn clear_files(&mut self) -> Result<usize> {
        self.file_collection().clear_files()
    }

    /// Embedded files keyed by name. See [`Files::files`].
    pub fn files(&mut self) -> Result<HashMap<String, FileItem>> {
        self.file_collection().files()
    }

    /// Embedded files keyed by `(folder, name)`.
    pub fn files_by_location(&mut self) -> Result<BTreeMap<(String, String), FileItem>> {
        self.file_collection().files_by_location()
    }

    #[inline]
    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    /// Get the underlying OPC package.
    ///
    /// This provides access to lower-level package operations.
    #[inline]
    pub fn opc(&self) -> &OpcPackage<'s> {
        &self.opc
    }

    /// Flush buffered changes and release the package.
    ///
    /// # Errors
    /// `Disposal` when the package cannot be written back to its store
    pub fn close(self) -> Result<()> {
        let parts = self.opc.part_count();
        self.opc.close().map_err(PackageError::Disposal)?;
        info!(parts, "Template package closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::error::OpcError;
    use crate::opc::part::CompressionOption;
    use crate::opc::rel::TargetMode;
    use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

    /// A store that can be read and sought but refuses every write.
    struct FullDisk(Cursor<Vec<u8>>);

    impl Read for FullDisk {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FullDisk {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.0.seek(pos)
        }
    }

    impl PackageStream for FullDisk {
        fn set_len(&mut self, _len: u64) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_mandatory_components_after_open() {
        let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();

        assert_eq!(pkg.manifest_part().unwrap().unwrap().as_str(), "/manifest.xml");
        assert_eq!(pkg.files_origin_part().unwrap().unwrap().as_str(), "/files.origin");
        assert_eq!(
            pkg.component_part(ComponentKind::Properties).unwrap().unwrap().as_str(),
            "/ProvisioningTemplate/props.xml"
        );
        assert_eq!(
            pkg.component_part(ComponentKind::FilesMap).unwrap().unwrap().as_str(),
            "/ProvisioningTemplate/files-map.xml"
        );
        assert_eq!(pkg.opc().part_count(), 4);

        // freshly created parts are empty
        assert_eq!(pkg.manifest().unwrap(), None);
        assert_eq!(pkg.properties().unwrap(), None);
        assert!(pkg.file_parts().unwrap().is_empty());
    }

    #[test]
    fn test_mandatory_parts_use_configured_compression() {
        let options = PackageOptions::new().with_compression(CompressionOption::Fast);
        let pkg = TemplatePackage::in_memory(options).unwrap();
        assert!(pkg.opc().iter_parts().all(|p| p.compression() == CompressionOption::Fast));
    }

    #[test]
    fn test_accessor_pairs() {
        let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();

        let manifest = Manifest::new("PnPProvisioningTemplate");
        pkg.set_manifest(Some(&manifest)).unwrap();
        assert_eq!(pkg.manifest().unwrap(), Some(manifest.clone()));

        pkg.set_manifest(None).unwrap();
        assert_eq!(pkg.manifest().unwrap(), Some(manifest));

        let mut map = FilesMap::new();
        map.insert("C:/site/logo.png", "logo.png");
        pkg.set_files_map(Some(&map)).unwrap();
        assert_eq!(pkg.files_map().unwrap(), Some(map));

        let properties = Properties {
            author: Some("Contoso".to_string()),
            ..Default::default()
        };
        pkg.set_properties(Some(&properties)).unwrap();
        assert_eq!(pkg.properties().unwrap(), Some(properties));
        assert_eq!(pkg.opc().part_count(), 4);
    }

    #[test]
    fn test_incomplete_read_only_package() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut opc =
                OpcPackage::open_stream(&mut buffer, PackageMode::Create, PackageAccess::ReadWrite)
                    .unwrap();
            let manifest = PackURI::new("/manifest.xml").unwrap();
            opc.create_part(&manifest, ComponentKind::Manifest.content_type(), CompressionOption::Normal)
                .unwrap();
            opc.create_relationship(
                None,
                manifest.as_str(),
                TargetMode::Internal,
                ComponentKind::Manifest.relationship_type(),
            )
            .unwrap();
            opc.close().unwrap();
        }

        buffer.set_position(0);
        let err = TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::Read)
            .err()
            .unwrap();
        assert!(matches!(err, PackageError::MissingComponent("properties")));

        buffer.set_position(0);
        let mut pkg =
            TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::ReadWrite)
                .unwrap();
        assert!(pkg.files_origin_part().unwrap().is_some());
        assert_eq!(pkg.opc().part_count(), 4);
    }

    #[test]
    fn test_close_reports_store_failure_as_disposal() {
        let mut pkg = TemplatePackage::open_stream(
            FullDisk(Cursor::new(Vec::new())),
            PackageMode::Create,
            PackageAccess::ReadWrite,
        )
        .unwrap();
        pkg.add_file("a.txt", "", Some(b"a")).unwrap();

        let err = pkg.close().unwrap_err();
        match err {
            PackageError::Disposal(OpcError::IoError(io_err)) => {
                assert_eq!(io_err.to_string(), "disk full");
            },
            other => panic!("expected Disposal, got {:?}", other),
        }
    }

    #[test]
    fn test_dropped_package_is_flushed() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut pkg =
                TemplatePackage::open_stream(&mut buffer, PackageMode::Create, PackageAccess::ReadWrite)
                    .unwrap();
            pkg.set_manifest(Some(&Manifest::new("PnPProvisioningTemplate")))
                .unwrap();
            pkg.add_file("a.txt", "", Some(b"a")).unwrap();
        }
        assert!(!buffer.get_ref().is_empty());

        buffer.set_position(0);
        let mut pkg =
            TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::Read).unwrap();
        assert_eq!(pkg.manifest().unwrap(), Some(Manifest::new("PnPProvisioningTemplate")));
        assert_eq!(pkg.files().unwrap()["a.txt"].content, b"a");
    }

    #[test]
    fn test_read_only_open_of_empty_stream() {
        let err = TemplatePackage::open_stream(
            Cursor::new(Vec::new()),
            PackageMode::OpenOrCreate,
            PackageAccess::Read,
        )
        .err()
        .unwrap();
        assert!(matches!(err, PackageError::Opc(OpcError::ReadOnly(_))));
    }
}
