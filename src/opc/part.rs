use crate::opc::packuri::PackURI;
use crate::opc::rel::Relationships;
/// Open Packaging Convention (OPC) objects related to package parts.
///
/// Parts are the fundamental units of content in an OPC package, each with a
/// unique partname, content type, compression option and optional relationships.

/// How a part's bytes are compressed inside the ZIP container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionOption {
    NotCompressed,
    Normal,
    #[default]
    Maximum,
    Fast,
    SuperFast,
}

impl CompressionOption {
    /// Deflate level for this option, `None` when the part is stored.
    pub fn deflate_level(&self) -> Option<i64> {
        match self {
            CompressionOption::NotCompressed => None,
            CompressionOption::Normal => Some(6),
            CompressionOption::Maximum => Some(9),
            CompressionOption::Fast => Some(3),
            CompressionOption::SuperFast => Some(1),
        }
    }
}

/// A part of the package: named, typed bytes plus the relationships it is the source of.
///
/// Parts are fully buffered in memory.
#[derive(Debug, Clone)]
pub struct Part {
    /// The partname (URI) of this part
    partname: PackURI,

    /// The content type of this part
    content_type: String,

    compression: CompressionOption,

    /// The binary content of this part
    blob: Vec<u8>,

    /// Relationships from this part to other parts
    rels: Relationships,
}

impl Part {
    /// Create a new Part.
    ///
    /// # Arguments
    /// * `partname` - The partname (URI) of this part
    /// * `content_type` - The content type of this part
    /// * `compression` - Compression applied when the package is written
    /// * `blob` - The binary content of this part
    pub fn new(
        partname: PackURI,
        content_type: String,
        compression: CompressionOption,
        blob: Vec<u8>,
    ) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            compression,
            blob,
            rels,
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn compression(&self) -> CompressionOption {
        self.compression
    }

    /// Get the binary content of this part.
    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Length of the part's content in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.blob.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// Get the relationships for this part.
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Get mutable access to the relationships for this part.
    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    pub(crate) fn take_blob(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.blob)
    }

    pub(crate) fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part() {
        let partname = PackURI::new("/Files/logo.png").unwrap();
        let content = vec![0x89, 0x50, 0x4E, 0x47];
        let part = Part::new(
            partname,
            "image/png".to_string(),
            CompressionOption::NotCompressed,
            content.clone(),
        );

        assert_eq!(part.content_type(), "image/png");
        assert_eq!(part.blob(), content.as_slice());
        assert_eq!(part.len(), 4);
        assert!(part.rels().is_empty());
    }

    #[test]
    fn test_part_rels_resolve_from_part_directory() {
        let partname = PackURI::new("/ProvisioningTemplate/props.xml").unwrap();
        let mut part = Part::new(partname, "application/xml".to_string(), Default::default(), vec![]);
        part.rels_mut()
            .add("t", "../files.origin", crate::opc::rel::TargetMode::Internal);

        let rel = part.rels().iter().next().unwrap();
        assert_eq!(rel.target_partname().unwrap().as_str(), "/files.origin");
    }

    #[test]
    fn test_deflate_levels() {
        assert_eq!(CompressionOption::NotCompressed.deflate_level(), None);
        assert_eq!(CompressionOption::Maximum.deflate_level(), Some(9));
        assert_eq!(CompressionOption::default(), CompressionOption::Maximum);
    }
}
