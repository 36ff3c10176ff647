/// Provides the PackURI value type and utilities for working with package URIs.
///
/// A PackURI represents a part name within an OPC package, following the URI format
/// defined by the Open Packaging Conventions specification.
use tracing::warn;

/// Represents a package URI, which is a partname within an OPC package.
///
/// The name is held decoded (`/Files/my report.txt`); it is percent-encoded only
/// where it meets the physical package, see [`encode_part_path`].
///
/// PackURIs always begin with a forward slash and use forward slashes as path separators,
/// following the OPC specification. They provide access to various components like
/// the base URI (directory), filename and extension.
///
/// Equality is exact string equality; the package store compares partnames through
/// [`PackURI::key`], which folds ASCII case as OPC requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/Files/logo.png")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Arguments
    /// * `uri` - The URI string, which must begin with a forward slash
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI that is valid as the name of a part.
    ///
    /// On top of [`PackURI::new`], a part name must not be the package root,
    /// must not end with a slash, and every segment must be non-empty, must not
    /// be `.` or `..` and must not end with a dot.
    pub fn part_name<S: Into<String>>(uri: S) -> Result<Self, String> {
        let pack_uri = Self::new(uri)?;
        let uri = pack_uri.as_str();

        if uri == PACKAGE_URI || uri.ends_with('/') {
            return Err(format!("'{}' is not a part name", uri));
        }
        if uri.contains(['\\', '?', '#']) {
            return Err(format!("part name '{}' contains a reserved character", uri));
        }
        for segment in uri[1..].split('/') {
            if segment.is_empty() || segment.ends_with('.') {
                return Err(format!("part name '{}' has an invalid segment", uri));
            }
        }
        if pack_uri.is_rels_part() {
            return Err(format!("part name '{}' is reserved for relationships", uri));
        }
        Ok(pack_uri)
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// This translates a relative reference (like "../styles.xml") onto a base URI
    /// (like "/word") to produce an absolute PackURI (like "/styles.xml"). A reference
    /// that already starts with a slash is taken as absolute and only normalized.
    ///
    /// # Arguments
    /// * `base_uri` - The base URI to resolve from
    /// * `relative_ref` - The relative reference to resolve
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else {
            Self::join_paths(base_uri, relative_ref)
        };
        let normalized = Self::normalize_path(&joined);
        Self::new(normalized)
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/ProvisioningTemplate" for "/ProvisioningTemplate/props.xml".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For example, "props.xml" for "/ProvisioningTemplate/props.xml".
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        if let Some(pos) = self.uri.rfind('/') {
            &self.uri[pos + 1..]
        } else {
            ""
        }
    }

    /// Get the extension portion of this PackURI.
    ///
    /// For example, "xml" for "/manifest.xml" (note: no leading period).
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        if let Some(pos) = filename.rfind('.') {
            &filename[pos + 1..]
        } else {
            ""
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// This is the form used as the Zip file membername for the package item.
    /// Returns an empty string for the package pseudo-partname "/".
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/_rels/manifest.xml.rels" for "/manifest.xml" and
    /// "/_rels/.rels" for the package itself.
    pub fn rels_uri(&self) -> Result<PackURI, String> {
        let filename = self.filename();
        let base_uri = self.base_uri();

        let rels_filename = format!("{}.rels", filename);
        let rels_uri_str = if base_uri == "/" {
            format!("/_rels/{}", rels_filename)
        } else {
            format!("{}/_rels/{}", base_uri, rels_filename)
        };

        Self::new(rels_uri_str)
    }

    /// Whether this URI names a relationships part (`.../_rels/*.rels`).
    pub fn is_rels_part(&self) -> bool {
        let base = self.base_uri();
        self.ext().eq_ignore_ascii_case("rels")
            && (base.eq_ignore_ascii_case("/_rels")
                || base.to_ascii_lowercase().ends_with("/_rels"))
    }

    /// Get the source URI a relationships part belongs to.
    ///
    /// The inverse of [`PackURI::rels_uri`]: "/_rels/.rels" yields the package
    /// pseudo-partname "/", "/dir/_rels/item.xml.rels" yields "/dir/item.xml".
    /// Returns `None` when this is not a relationships part.
    pub fn rels_source(&self) -> Option<PackURI> {
        if !self.is_rels_part() {
            return None;
        }
        let filename = self.filename();
        let source_name = &filename[..filename.len() - ".rels".len()];
        let base = self.base_uri();
        let dir = &base[..base.len() - "/_rels".len()];

        let source = if source_name.is_empty() {
            if !dir.is_empty() {
                return None;
            }
            PACKAGE_URI.to_string()
        } else {
            format!("{}/{}", dir, source_name)
        };
        Self::new(source).ok()
    }

    /// Case-folded lookup key; OPC part names compare ASCII case-insensitively.
    pub fn key(&self) -> String {
        self.uri.to_ascii_lowercase()
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Helper function to join two paths using forward slashes
    fn join_paths(base: &str, rel: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, rel)
        } else {
            format!("{}/{}", base, rel)
        }
    }

    /// Helper function to normalize a path (resolve ".." and ".")
    fn normalize_path(path: &str) -> String {
        let mut parts = Vec::new();

        for part in path.split('/') {
            match part {
                "" | "." => {
                    if parts.is_empty() {
                        // Keep leading slash
                        parts.push("");
                    }
                },
                ".." => {
                    if parts.len() > 1 {
                        parts.pop();
                    }
                },
                _ => {
                    parts.push(part);
                },
            }
        }

        if parts.is_empty() || (parts.len() == 1 && parts[0].is_empty()) {
            return "/".to_string();
        }

        parts.join("/")
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// Percent-encode a decoded part path for the physical package.
///
/// Characters that may appear raw in a URI path segment (plus `[` and `]`, which
/// `[Content_Types].xml` needs) are kept, as is the `/` separator; everything else,
/// including `%` itself and non-ASCII text, is encoded as UTF-8 octets.
pub fn encode_part_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    let mut buf = [0u8; 4];
    for ch in path.chars() {
        if ch.is_ascii_alphanumeric() || "/-._~!$&'()*+,;=:@[]".contains(ch) {
            encoded.push(ch);
        } else {
            encoded.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    encoded
}

/// Decode a percent-encoded part path read from the physical package.
///
/// A path whose escapes do not decode to UTF-8 is kept as written.
pub fn decode_part_path(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            warn!(path, error = %err, "Part path escapes are not UTF-8, keeping it encoded");
            path.to_string()
        },
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";
