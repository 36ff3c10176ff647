//! Structured part codec.
//!
//! Moves typed values in and out of a part's byte stream through a text
//! serializer, and raw bytes in and out of File parts.

use crate::error::{PackageError, Result};
use crate::opc::package::OpcPackage;
use crate::opc::packuri::PackURI;
use crate::opc::stream::StreamMode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::marker::PhantomData;

/// Text serialization used for structured parts.
pub trait TextFormat {
    fn to_text<T: Serialize + ?Sized>(value: &T) -> std::result::Result<String, String>;

    fn from_text<T: DeserializeOwned>(text: &str) -> std::result::Result<T, String>;
}

/// XML through `quick-xml`'s serde support.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl TextFormat for XmlFormat {
    fn to_text<T: Serialize + ?Sized>(value: &T) -> std::result::Result<String, String> {
        quick_xml::se::to_string(value).map_err(|e| e.to_string())
    }

    fn from_text<T: DeserializeOwned>(text: &str) -> std::result::Result<T, String> {
        quick_xml::de::from_str(text).map_err(|e| e.to_string())
    }
}

/// Reads and writes whole parts of a package.
///
/// Parts are buffered in memory; reads larger than `max_part_size` fail.
pub struct PartCodec<'p, 's, F: TextFormat = XmlFormat> {
    package: &'p mut OpcPackage<'s>,
    max_part_size: u64,
    _format: PhantomData<F>,
}

impl<'p, 's> PartCodec<'p, 's, XmlFormat> {
    /// Create an XML codec over a package.
    pub fn new(package: &'p mut OpcPackage<'s>, max_part_size: u64) -> Self {
        Self::with_format(package, max_part_size)
    }
}

impl<'p, 's, F: TextFormat> PartCodec<'p, 's, F> {
    /// Create a codec using the text format `F`.
    pub fn with_format(package: &'p mut OpcPackage<'s>, max_part_size: u64) -> Self {
        Self {
            package,
            max_part_size,
            _format: PhantomData,
        }
    }

    /// Deserialize the whole content of `part`.
    ///
    /// # Returns
    /// `None` when `part` is `None` or the part is empty
    ///
    /// # Errors
    /// `Deserialization` for content that is not UTF-8 or does not match `T`
    pub fn read<T: DeserializeOwned>(&mut self, part: Option<&PackURI>) -> Result<Option<T>> {
        let Some(partname) = part else {
            return Ok(None);
        };
        let bytes = match self.read_bytes(Some(partname))? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        let text = String::from_utf8(bytes).map_err(|e| PackageError::Deserialization {
            partname: partname.to_string(),
            message: e.to_string(),
        })?;
        F::from_text(&text)
            .map(Some)
            .map_err(|message| PackageError::Deserialization {
                partname: partname.to_string(),
                message,
            })
    }

    /// Replace the content of `part` with the serialized `value`.
    ///
    /// `None` leaves the part untouched; use [`PartCodec::clear`] to empty it.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: Option<&T>, part: &PackURI) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let text = F::to_text(value).map_err(PackageError::Serialization)?;
        self.write_bytes(part, Some(text.as_bytes()))
    }

    /// Read the raw content of `part`.
    ///
    /// # Errors
    /// `SizeLimitExceeded` when the part is longer than the configured limit
    pub fn read_bytes(&mut self, part: Option<&PackURI>) -> Result<Option<Vec<u8>>> {
        let Some(partname) = part else {
            return Ok(None);
        };
        let mut stream = self.package.part_stream(partname, StreamMode::Open)?;

        let size = stream.len();
        if size > self.max_part_size {
            return Err(PackageError::SizeLimitExceeded {
                partname: partname.to_string(),
                size,
                limit: self.max_part_size,
            });
        }

        let mut data = Vec::with_capacity(size as usize);
        stream.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Overwrite the content of `part`; `None` writes empty content.
    pub fn write_bytes(&mut self, part: &PackURI, content: Option<&[u8]>) -> Result<()> {
        let mut stream = self.package.part_stream(part, StreamMode::Create)?;
        stream.write_all(content.unwrap_or_default())?;
        Ok(())
    }

    /// Truncate `part` to empty content.
    pub fn clear(&mut self, part: &PackURI) -> Result<()> {
        self.write_bytes(part, None)
    }
}
