//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading and writing of OPC packages as ZIP
//! archives. Members are fully buffered; part streaming is out of scope.

use crate::opc::error::Result;
use crate::opc::packuri::{PackURI, decode_part_path, encode_part_path};
use crate::opc::part::CompressionOption;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Physical package reader that provides access to the members of a ZIP-based OPC package.
///
/// All members are decompressed once at construction, in archive order. Member
/// names are percent-decoded, so they compare directly with [`PackURI::membername`].
pub struct PhysPkgReader {
    /// Decoded member name (no leading slash) and decompressed content, in archive order
    members: Vec<(String, Vec<u8>)>,
}

impl PhysPkgReader {
    /// Read every file member of a ZIP archive.
    ///
    /// # Arguments
    /// * `reader` - A reader that implements Read + Seek
    ///
    /// # Errors
    /// Returns an error if the data isn't a valid ZIP archive or a member
    /// cannot be decompressed.
    pub fn new<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut members = Vec::with_capacity(archive.len());

        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx)?;
            if file.is_dir() {
                continue;
            }
            let name = decode_part_path(file.name());
            // the declared size comes from the archive and is not trusted for allocation
            let mut blob = Vec::with_capacity(file.size().min(MAX_PREALLOCATION) as usize);
            file.read_to_end(&mut blob)?;
            members.push((name, blob));
        }

        Ok(Self { members })
    }

    /// Create a reader over an in-memory archive.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::new(Cursor::new(data))
    }

    /// Get the binary content for a part by its PackURI.
    ///
    /// Member names are matched ASCII case-insensitively.
    pub fn blob_for(&self, pack_uri: &PackURI) -> Option<&[u8]> {
        let membername = pack_uri.membername();
        self.members
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(membername))
            .map(|(_, blob)| blob.as_slice())
    }

    /// Check if a specific member exists in the package.
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.blob_for(pack_uri).is_some()
    }

    /// Get the number of files in the package (excluding directories).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// List all member names in the package, in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    /// Consume the reader, yielding members in archive order.
    pub fn into_members(self) -> Vec<(String, Vec<u8>)> {
        self.members
    }
}

/// Upper bound on the buffer reserved up front for one member.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Physical package writer for creating OPC packages.
///
/// Handles the low-level writing of parts to an in-memory ZIP archive.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a member with the given compression option.
    ///
    /// # Arguments
    /// * `pack_uri` - The PackURI for the part
    /// * `blob` - The binary content to write
    /// * `compression` - Stored or deflated, and at which level
    pub fn write(
        &mut self,
        pack_uri: &PackURI,
        blob: &[u8],
        compression: CompressionOption,
    ) -> Result<()> {
        let options = match compression.deflate_level() {
            Some(level) => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(level)),
            None => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        };

        self.archive
            .start_file(encode_part_path(pack_uri.membername()), options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    ///
    /// Consumes the writer and returns the complete ZIP archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.archive.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
