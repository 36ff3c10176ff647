//! Embedded files of a template package.
//!
//! Every file is a part under `/Files/`, related from the Files-Origin part with
//! the file relationship type.

use crate::error::Result;
use crate::opc::constants::{content_type, part_uri};
use crate::opc::package::OpcPackage;
use crate::opc::packuri::PackURI;
use crate::template::codec::PartCodec;
use crate::template::component::ComponentKind;
use crate::template::model::FileItem;
use crate::template::options::PackageOptions;
use crate::template::resolver::PartResolver;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Build the part name of an embedded file.
///
/// Leading `/` is stripped from `name`; `folder` loses its outer slashes and
/// gains a trailing one when non-empty.
pub fn file_partname(name: &str, folder: &str) -> String {
    let name = name.trim_start_matches('/');
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}{}", part_uri::FILES_DIR, name)
    } else {
        format!("{}{}/{}", part_uri::FILES_DIR, folder, name)
    }
}

/// A view over the files embedded in a package.
pub struct Files<'p, 's> {
    package: &'p mut OpcPackage<'s>,
    options: &'p PackageOptions,
}

impl<'p, 's> Files<'p, 's> {
    pub fn new(package: &'p mut OpcPackage<'s>, options: &'p PackageOptions) -> Self {
        Self { package, options }
    }

    fn resolver(&mut self) -> PartResolver<'_, 's> {
        PartResolver::new(self.package, self.options.compression)
    }

    fn codec(&mut self) -> PartCodec<'_, 's> {
        PartCodec::new(self.package, self.options.max_part_size)
    }

    /// The Files-Origin part, if the package has one.
    pub fn origin(&mut self) -> Result<Option<PackURI>> {
        let resolver = self.resolver();
        match resolver.get_single(ComponentKind::Manifest, None)? {
            Some(manifest) => resolver.get_single(ComponentKind::FilesOrigin, Some(&manifest)),
            None => Ok(None),
        }
    }

    /// Part names of every embedded file, in enumeration order.
    pub fn parts(&mut self) -> Result<Vec<PackURI>> {
        match self.origin()? {
            Some(origin) => self.resolver().get_all(ComponentKind::File, Some(&origin)),
            None => Ok(Vec::new()),
        }
    }

    /// Embed a file as `/Files/{folder}/{name}`.
    ///
    /// The Manifest and Files-Origin parts are created if missing.
    ///
    /// # Errors
    /// `DuplicatePart` when a file already lives at that path
    pub fn add_file(&mut self, name: &str, folder: &str, content: Option<&[u8]>) -> Result<PackURI> {
        let path = file_partname(name, folder);

        let mut resolver = self.resolver();
        let manifest = resolver.ensure(ComponentKind::Manifest, None)?;
        let origin = resolver.ensure(ComponentKind::FilesOrigin, Some(&manifest))?;
        let partname =
            resolver.create_part(ComponentKind::File, content_type::TEMPLATE_FILE, &path, Some(&origin))?;

        self.codec().write_bytes(&partname, content)?;
        debug!(partname = %partname, size = content.map_or(0, <[u8]>::len), "Added file");
        Ok(partname)
    }

    /// Remove every embedded file together with its relationship.
    ///
    /// The Files-Origin part itself stays.
    pub fn clear_files(&mut self) -> Result<usize> {
        match self.origin()? {
            Some(origin) => self.resolver().clear(ComponentKind::File, Some(&origin), None),
            None => Ok(0),
        }
    }

    /// Every embedded file with its content, in enumeration order.
    pub fn items(&mut self) -> Result<Vec<FileItem>> {
        let parts = self.parts()?;
        let mut codec = self.codec();
        let mut items = Vec::with_capacity(parts.len());
        for partname in parts {
            let content = codec.read_bytes(Some(&partname))?.unwrap_or_default();
            items.push(FileItem::from_partname(&partname, content));
        }
        Ok(items)
    }

    /// Embedded files keyed by name.
    ///
    /// Files with the same name in different folders collide; the one enumerated
    /// last, the most recently added, wins. Use [`Files::files_by_location`] to see
    /// all of them.
    pub fn files(&mut self) -> Result<HashMap<String, FileItem>> {
        Ok(self
            .items()?
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect())
    }

    /// Embedded files keyed by `(folder, name)`.
    pub fn files_by_location(&mut self) -> Result<BTreeMap<(String, String), FileItem>> {
        Ok(self
            .items()?
            .into_iter()
            .map(|item| ((item.folder.clone(), item.name.clone()), item))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_partname_normalization() {
        assert_eq!(file_partname("report.txt", "Sub/Dir"), "/Files/Sub/Dir/report.txt");
        assert_eq!(file_partname("/report.txt", "/Sub/Dir/"), "/Files/Sub/Dir/report.txt");
        assert_eq!(file_partname("a.txt", ""), "/Files/a.txt");
        assert_eq!(file_partname("a.txt", "/"), "/Files/a.txt");
    }

    #[test]
    fn test_add_creates_anchor_lazily() {
        let mut pkg = OpcPackage::new();
        let options = PackageOptions::default();
        let mut files = Files::new(&mut pkg, &options);

        assert_eq!(files.origin().unwrap(), None);
        assert!(files.files().unwrap().is_empty());

        let partname = files.add_file("logo.png", "img", Some(&[1, 2, 3])).unwrap();
        assert_eq!(partname.as_str(), "/Files/img/logo.png");
        assert_eq!(files.origin().unwrap().unwrap().as_str(), "/files.origin");

        let part = pkg.part(&partname).unwrap();
        assert_eq!(part.content_type(), "application/unknown");
        assert_eq!(part.blob(), &[1u8, 2, 3]);
    }

    #[test]
    fn test_name_collisions() {
        let mut pkg = OpcPackage::new();
        let options = PackageOptions::default();
        let mut files = Files::new(&mut pkg, &options);

        files.add_file("a.txt", "", Some(b"first")).unwrap();
        files.add_file("a.txt", "other", Some(b"second")).unwrap();

        let by_name = files.files().unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name["a.txt"].folder, "other");
        assert_eq!(by_name["a.txt"].content, b"second");

        let by_location = files.files_by_location().unwrap();
        assert_eq!(by_location.len(), 2);
        assert_eq!(
            by_location[&(String::new(), "a.txt".to_string())].content,
            b"first"
        );
    }

    #[test]
    fn test_duplicate_path_fails() {
        let mut pkg = OpcPackage::new();
        let options = PackageOptions::default();
        let mut files = Files::new(&mut pkg, &options);

        files.add_file("a.txt", "docs", None).unwrap();
        let err = files.add_file("A.TXT", "/docs/", None).unwrap_err();
        assert!(err.is_duplicate_part());
        assert_eq!(files.items().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_files_keeps_origin() {
        let mut pkg = OpcPackage::new();
        let options = PackageOptions::default();
        let mut files = Files::new(&mut pkg, &options);

        for name in ["a.txt", "b.txt", "c.txt"] {
            files.add_file(name, "", Some(name.as_bytes())).unwrap();
        }
        assert_eq!(files.clear_files().unwrap(), 3);
        assert!(files.files().unwrap().is_empty());
        assert_eq!(files.clear_files().unwrap(), 0);

        let origin = files.origin().unwrap().unwrap();
        assert!(pkg.contains_part(&origin));
        assert_eq!(pkg.part_count(), 2);
    }
}
