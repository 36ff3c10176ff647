/// Objects that implement reading and writing OPC packages.
///
/// This module provides the main OpcPackage type, the container store of a
/// template package: it owns the parts and the package-level relationships,
/// loads them from a file or stream and flushes them back on close.
use crate::opc::error::{OpcError, Result};
use crate::opc::packuri::{PACKAGE_URI, PackURI};
use crate::opc::part::{CompressionOption, Part};
use crate::opc::phys_pkg::PhysPkgReader;
use crate::opc::pkgreader::PackageReader;
use crate::opc::pkgwriter::PackageWriter;
use crate::opc::rel::{Relationship, Relationships, TargetMode};
use crate::opc::stream::{PackageStream, PartStream, StreamMode};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// How an existing package source is treated on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageMode {
    /// Create a new package; fail if the source already exists or holds data.
    CreateNew,
    /// Create a new package, discarding any existing content.
    Create,
    /// Open an existing package; fail if there is none.
    Open,
    /// Open the existing package, or create a new one if the source is empty.
    OpenOrCreate,
}

impl PackageMode {
    fn creates(&self) -> bool {
        !matches!(self, PackageMode::Open)
    }
}

/// What the caller may do with an opened package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAccess {
    Read,
    ReadWrite,
}

impl PackageAccess {
    #[inline]
    pub fn is_writable(&self) -> bool {
        matches!(self, PackageAccess::ReadWrite)
    }
}

/// Main API class for working with OPC packages.
///
/// OpcPackage represents an Open Packaging Convention package in memory,
/// providing access to parts, relationships, and package-level operations.
/// Parts are indexed by their case-folded partname.
///
/// Not safe for concurrent use: relationship tables are mutated in place, so all
/// access to one package must be serialized by the caller.
pub struct OpcPackage<'s> {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by case-folded partname
    parts: BTreeMap<String, Part>,

    access: PackageAccess,

    /// Where the package is flushed on close; `None` for purely in-memory packages
    backing: Option<Box<dyn PackageStream + 's>>,

    /// Unsaved changes exist
    dirty: bool,

    closed: bool,
}

impl OpcPackage<'static> {
    /// Create a new empty in-memory package.
    pub fn new() -> Self {
        Self::empty(PackageAccess::ReadWrite, None)
    }

    /// Open a package file.
    ///
    /// # Arguments
    /// * `path` - Path to the package file (conventionally `.pnp`)
    /// * `mode` - Whether to create, open, or either
    /// * `access` - Read-only or read-write
    ///
    /// # Example
    /// ```no_run
    /// use pnp_package::opc::{OpcPackage, PackageAccess, PackageMode};
    ///
    /// let pkg = OpcPackage::open("template.pnp", PackageMode::Open, PackageAccess::Read)?;
    /// println!("{} parts", pkg.part_count());
    /// # Ok::<(), pnp_package::opc::OpcError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, mode: PackageMode, access: PackageAccess) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();

        match mode {
            PackageMode::CreateNew if exists => {
                return Err(OpcError::PackageExists(path.display().to_string()));
            },
            PackageMode::Open if !exists => {
                return Err(OpcError::PackageNotFound(path.display().to_string()));
            },
            _ => {},
        }
        if mode.creates() && !exists && !access.is_writable() {
            return Err(OpcError::ReadOnly(format!(
                "cannot create {} with read-only access",
                path.display()
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(access.is_writable())
            .create(mode.creates() && access.is_writable())
            .truncate(false)
            .open(path)?;

        info!(path = %path.display(), ?mode, ?access, "Opening package file");
        Self::load(Box::new(file), mode, access)
    }
}

impl<'s> OpcPackage<'s> {
    fn empty(access: PackageAccess, backing: Option<Box<dyn PackageStream + 's>>) -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: BTreeMap::new(),
            access,
            backing,
            dirty: false,
            closed: false,
        }
    }

    /// Open a package stored in a seekable stream.
    ///
    /// With write access the stream is rewritten in full on [`OpcPackage::close`].
    pub fn open_stream<S: PackageStream + 's>(
        stream: S,
        mode: PackageMode,
        access: PackageAccess,
    ) -> Result<Self> {
        Self::load(Box::new(stream), mode, access)
    }

    /// Load a package from its backing stream according to the open mode.
    fn load(
        mut stream: Box<dyn PackageStream + 's>,
        mode: PackageMode,
        access: PackageAccess,
    ) -> Result<Self> {
        let len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        let load_existing = match mode {
            PackageMode::Create => false,
            PackageMode::CreateNew if len > 0 => {
                return Err(OpcError::PackageExists("stream already holds data".to_string()));
            },
            PackageMode::CreateNew => false,
            PackageMode::Open if len == 0 => {
                return Err(OpcError::PackageNotFound("stream is empty".to_string()));
            },
            PackageMode::Open => true,
            PackageMode::OpenOrCreate => len > 0,
        };

        if !load_existing && !access.is_writable() {
            return Err(OpcError::ReadOnly(
                "cannot create a package with read-only access".to_string(),
            ));
        }

        let mut package = if load_existing {
            let mut data = Vec::with_capacity(len as usize);
            stream.read_to_end(&mut data)?;
            let pkg_reader = PackageReader::from_phys_reader(PhysPkgReader::from_bytes(&data)?)?;
            Self::unmarshal(pkg_reader, access, Some(stream))?
        } else {
            let mut package = Self::empty(access, Some(stream));
            // a created package must reach its store even if nothing is added
            package.dirty = true;
            package
        };
        package.closed = false;

        info!(
            parts = package.part_count(),
            loaded = load_existing,
            ?access,
            "Package opened"
        );
        Ok(package)
    }

    /// Unmarshal a package from a package reader.
    ///
    /// Converts serialized parts and relationships into the in-memory object graph.
    fn unmarshal(
        pkg_reader: PackageReader,
        access: PackageAccess,
        backing: Option<Box<dyn PackageStream + 's>>,
    ) -> Result<Self> {
        let mut package = Self::empty(access, backing);
        let (pkg_srels, sparts) = pkg_reader.into_parts();

        for srel in pkg_srels {
            let target_mode = srel.target_mode();
            package
                .rels
                .add_relationship(srel.reltype, srel.target_ref, srel.r_id, target_mode);
        }

        for spart in sparts {
            let mut part = Part::new(
                spart.partname,
                spart.content_type,
                CompressionOption::default(),
                spart.blob,
            );
            for srel in spart.srels {
                let target_mode = srel.target_mode();
                part.rels_mut()
                    .add_relationship(srel.reltype, srel.target_ref, srel.r_id, target_mode);
            }
            package.parts.insert(part.partname().key(), part);
        }

        Ok(package)
    }

    #[inline]
    pub fn access(&self) -> PackageAccess {
        self.access
    }

    /// Whether there are changes not yet flushed to the backing store.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.access.is_writable() {
            Ok(())
        } else {
            Err(OpcError::ReadOnly(operation.to_string()))
        }
    }

    /// Get a part by its partname.
    pub fn part(&self, partname: &PackURI) -> Option<&Part> {
        self.parts.get(&partname.key())
    }

    /// Check if a part exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(&partname.key())
    }

    /// Get an iterator over all parts in the package, ordered by case-folded partname.
    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Get the number of parts in the package.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Get a reference to the package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Create an empty part.
    ///
    /// # Errors
    /// `DuplicatePart` if the partname is already used (compared case-insensitively),
    /// `ReadOnly` if the package was opened read-only.
    pub fn create_part(
        &mut self,
        partname: &PackURI,
        content_type: &str,
        compression: CompressionOption,
    ) -> Result<&Part> {
        self.ensure_writable("create part")?;
        let key = partname.key();
        if self.parts.contains_key(&key) {
            return Err(OpcError::DuplicatePart(partname.to_string()));
        }

        debug!(partname = %partname, content_type, ?compression, "Creating part");
        let part = Part::new(partname.clone(), content_type.to_string(), compression, Vec::new());
        self.dirty = true;
        Ok(self.parts.entry(key).or_insert(part))
    }

    /// Delete a part together with the relationships it is the source of.
    ///
    /// Relationships targeting the part are left alone. Returns whether a part was removed.
    pub fn delete_part(&mut self, partname: &PackURI) -> Result<bool> {
        self.ensure_writable("delete part")?;
        let removed = self.parts.remove(&partname.key()).is_some();
        if removed {
            debug!(partname = %partname, "Deleted part");
            self.dirty = true;
        }
        Ok(removed)
    }

    fn source_rels(&self, source: Option<&PackURI>) -> Result<&Relationships> {
        match source {
            None => Ok(&self.rels),
            Some(partname) => self
                .part(partname)
                .map(Part::rels)
                .ok_or_else(|| OpcError::PartNotFound(partname.to_string())),
        }
    }

    fn source_rels_mut(&mut self, source: Option<&PackURI>) -> Result<&mut Relationships> {
        match source {
            None => Ok(&mut self.rels),
            Some(partname) => self
                .parts
                .get_mut(&partname.key())
                .map(Part::rels_mut)
                .ok_or_else(|| OpcError::PartNotFound(partname.to_string())),
        }
    }

    /// Create a relationship from the package root (`source == None`) or a part.
    ///
    /// Internal targets must be absolute part names; they are stored as given.
    ///
    /// # Returns
    /// The new relationship ID
    pub fn create_relationship(
        &mut self,
        source: Option<&PackURI>,
        target: &str,
        target_mode: TargetMode,
        reltype: &str,
    ) -> Result<String> {
        self.ensure_writable("create relationship")?;
        if target_mode == TargetMode::Internal {
            PackURI::part_name(target).map_err(OpcError::InvalidPackUri)?;
        }

        let rels = self.source_rels_mut(source)?;
        let r_id = rels.add(reltype, target, target_mode).r_id().to_string();
        debug!(
            source = source.map_or(PACKAGE_URI, PackURI::as_str),
            target,
            reltype,
            r_id = %r_id,
            "Created relationship"
        );
        self.dirty = true;
        Ok(r_id)
    }

    /// All relationships of `reltype` from the package root or a part, in enumeration order.
    pub fn relationships_by_type(
        &self,
        source: Option<&PackURI>,
        reltype: &str,
    ) -> Result<Vec<Relationship>> {
        Ok(self.source_rels(source)?.by_type(reltype).cloned().collect())
    }

    /// Delete a relationship by ID. Returns whether one was removed.
    pub fn delete_relationship(&mut self, source: Option<&PackURI>, r_id: &str) -> Result<bool> {
        self.ensure_writable("delete relationship")?;
        let removed = self.source_rels_mut(source)?.remove(r_id).is_some();
        if removed {
            debug!(
                source = source.map_or(PACKAGE_URI, PackURI::as_str),
                r_id,
                "Deleted relationship"
            );
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Open a scoped stream on a part's content.
    ///
    /// `StreamMode::Create` truncates the part and needs write access; a stream
    /// opened on a read-only package rejects writes.
    pub fn part_stream(&mut self, partname: &PackURI, mode: StreamMode) -> Result<PartStream<'_>> {
        if mode == StreamMode::Create {
            self.ensure_writable("truncate part")?;
        }
        let writable = self.access.is_writable();
        let part = self
            .parts
            .get_mut(&partname.key())
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
        Ok(PartStream::new(part, mode, writable, &mut self.dirty))
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Write pending changes to the backing store, if there is one.
    pub fn flush(&mut self) -> Result<()> {
        if !self.access.is_writable() || !self.dirty {
            return Ok(());
        }
        let bytes = PackageWriter::to_bytes(self)?;
        if let Some(backing) = self.backing.as_mut() {
            backing.seek(SeekFrom::Start(0))?;
            backing.write_all(&bytes)?;
            backing.set_len(bytes.len() as u64)?;
            backing.flush()?;
            info!(bytes = bytes.len(), parts = self.parts.len(), "Package flushed");
        }
        self.dirty = false;
        Ok(())
    }

    /// Flush pending changes and release the backing store.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush()
    }
}

impl Default for OpcPackage<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OpcPackage<'_> {
    /// Best-effort flush of a package that was never closed; errors can only be logged.
    fn drop(&mut self) {
        if self.closed || !self.dirty || !self.access.is_writable() || self.backing.is_none() {
            return;
        }
        debug!(parts = self.parts.len(), "Package dropped without close, flushing");
        if let Err(err) = self.flush() {
            warn!(error = %err, "Flushing dropped package failed, changes discarded");
        }
    }
}
