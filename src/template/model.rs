//! Payload types stored in a template package.
//!
//! The schema is deliberately thin; these are the objects the package moves in and
//! out of its structured parts, not a full provisioning template model.

use crate::opc::constants::part_uri;
use crate::opc::packuri::PackURI;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root object of a template package, stored at `/manifest.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Manifest")]
pub struct Manifest {
    /// Kind of template the package carries
    #[serde(rename = "@Type", default)]
    pub kind: String,
}

impl Manifest {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// Descriptive properties of the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Properties")]
pub struct Properties {
    #[serde(rename = "Generator", default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,

    #[serde(rename = "Author", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// File name the template was exported from
    #[serde(rename = "TemplateFileName", default, skip_serializing_if = "Option::is_none")]
    pub template_file_name: Option<String>,

    /// Creation time, RFC 3339 on the wire
    #[serde(rename = "Created", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// One `original path -> package name` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapEntry {
    #[serde(rename = "@Key")]
    pub key: String,
    #[serde(rename = "@Value")]
    pub value: String,
}

/// Map from the original locations of embedded files to their names in the package.
///
/// Entries keep insertion order; keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "FilesMap")]
pub struct FilesMap {
    #[serde(rename = "Entry", default)]
    pub entries: Vec<FileMapEntry>,
}

impl FilesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mapping for `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.push(FileMapEntry { key, value });
                None
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An embedded file as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub name: String,
    /// Folder below `/Files/`, without leading or trailing `/`; empty at the top level
    pub folder: String,
    pub content: Vec<u8>,
}

impl FileItem {
    /// Derive name and folder from a File part's name.
    ///
    /// The `/Files/` prefix is matched case-insensitively; a part outside it keeps
    /// its whole path as folder and name.
    pub(crate) fn from_partname(partname: &PackURI, content: Vec<u8>) -> Self {
        let uri = partname.as_str();
        let prefix_len = part_uri::FILES_DIR.len();
        let relative = match uri.get(..prefix_len) {
            Some(prefix) if prefix.eq_ignore_ascii_case(part_uri::FILES_DIR) => &uri[prefix_len..],
            _ => uri.trim_start_matches('/'),
        };

        let (folder, name) = relative.rsplit_once('/').unwrap_or(("", relative));
        Self {
            name: name.to_string(),
            folder: folder.to_string(),
            content,
        }
    }

    /// `folder/name`, or just `name` at the top level.
    pub fn path(&self) -> String {
        if self.folder.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.folder, self.name)
        }
    }
}
