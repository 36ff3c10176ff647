//! Relationship-typed part resolution.
//!
//! Turns "the Properties part of this manifest" into a walk over the store's
//! relationship tables, creating parts and relationships on demand.

use crate::error::Result;
use crate::opc::error::OpcError;
use crate::opc::package::OpcPackage;
use crate::opc::packuri::PackURI;
use crate::opc::part::CompressionOption;
use crate::opc::rel::{Relationship, TargetMode};
use crate::template::component::ComponentKind;
use tracing::{debug, warn};

/// Resolves parts reachable from the package root or a parent part through a
/// component's relationship type.
///
/// `parent == None` means the package root. A parent that is not in the store is
/// a `PartNotFound` error for every operation.
pub struct PartResolver<'p, 's> {
    package: &'p mut OpcPackage<'s>,
    compression: CompressionOption,
}

impl<'p, 's> PartResolver<'p, 's> {
    /// Create a resolver over a package; parts it creates use `compression`.
    pub fn new(package: &'p mut OpcPackage<'s>, compression: CompressionOption) -> Self {
        Self {
            package,
            compression,
        }
    }

    fn internal_rels(&self, kind: ComponentKind, parent: Option<&PackURI>) -> Result<Vec<Relationship>> {
        let rels = self
            .package
            .relationships_by_type(parent, kind.relationship_type())?
            .into_iter()
            .filter(|rel| rel.target_mode() == TargetMode::Internal)
            .collect();
        Ok(rels)
    }

    /// Map a relationship to the stored part it targets, if that part exists.
    fn stored_target(&self, rel: &Relationship) -> Result<Option<PackURI>> {
        let target = rel.target_partname()?;
        match self.package.part(&target) {
            Some(part) => Ok(Some(part.partname().clone())),
            None => {
                warn!(target = %target, r_id = rel.r_id(), "Relationship targets a missing part");
                Ok(None)
            },
        }
    }

    /// The part behind the first internal relationship of `kind`, in enumeration order.
    ///
    /// Further matches are ignored; multiplicity is not validated.
    pub fn get_single(&self, kind: ComponentKind, parent: Option<&PackURI>) -> Result<Option<PackURI>> {
        match self.internal_rels(kind, parent)?.first() {
            Some(rel) => self.stored_target(rel),
            None => Ok(None),
        }
    }

    /// Every part behind an internal relationship of `kind`, in enumeration order.
    ///
    /// Empty when nothing matches.
    pub fn get_all(&self, kind: ComponentKind, parent: Option<&PackURI>) -> Result<Vec<PackURI>> {
        let mut parts = Vec::new();
        for rel in self.internal_rels(kind, parent)? {
            if let Some(partname) = self.stored_target(&rel)? {
                parts.push(partname);
            }
        }
        Ok(parts)
    }

    /// The single part of `kind`, created at the kind's fixed part name if absent.
    pub fn ensure(&mut self, kind: ComponentKind, parent: Option<&PackURI>) -> Result<PackURI> {
        if let Some(partname) = self.get_single(kind, parent)? {
            return Ok(partname);
        }
        let path = kind.partname().ok_or_else(|| {
            OpcError::InvalidPackUri(format!("{} has no fixed part name", kind))
        })?;
        debug!(component = %kind, path, "Creating missing component");
        self.create_part(kind, kind.content_type(), path, parent)
    }

    /// Create a part at `path` and relate it to `parent` (or the root) with `kind`'s type.
    ///
    /// # Errors
    /// `DuplicatePart` when `path` already names a part.
    pub fn create_part(
        &mut self,
        kind: ComponentKind,
        content_type: &str,
        path: &str,
        parent: Option<&PackURI>,
    ) -> Result<PackURI> {
        let partname = PackURI::part_name(path).map_err(OpcError::InvalidPackUri)?;
        if let Some(parent) = parent {
            if !self.package.contains_part(parent) {
                return Err(OpcError::PartNotFound(parent.to_string()).into());
            }
        }

        self.package
            .create_part(&partname, content_type, self.compression)?;
        self.package.create_relationship(
            parent,
            partname.as_str(),
            TargetMode::Internal,
            kind.relationship_type(),
        )?;
        Ok(partname)
    }

    /// Delete every internal `kind` relationship from `parent` together with its target part.
    ///
    /// With `path_filter`, only relationships targeting that part are cleared. Parts
    /// are deleted first, then relationships; a failure midway leaves the package
    /// partially cleared.
    ///
    /// # Returns
    /// The number of relationships removed
    pub fn clear(
        &mut self,
        kind: ComponentKind,
        parent: Option<&PackURI>,
        path_filter: Option<&PackURI>,
    ) -> Result<usize> {
        let filter_key = path_filter.map(PackURI::key);
        let mut r_ids = Vec::new();

        for rel in self.internal_rels(kind, parent)? {
            let target = rel.target_partname()?;
            if filter_key.as_ref().is_some_and(|key| *key != target.key()) {
                continue;
            }
            self.package.delete_part(&target)?;
            r_ids.push(rel.r_id().to_string());
        }

        for r_id in &r_ids {
            self.package.delete_relationship(parent, r_id)?;
        }

        debug!(component = %kind, removed = r_ids.len(), "Cleared components");
        Ok(r_ids.len())
    }
}
