/// Constant values related to the Open Packaging Convention and to the
/// provisioning template package layout.
///
/// This module contains content type URIs (like MIME-types) that specify a part's format,
/// XML namespaces, relationship types and the fixed part names used by template packages.
/// The template literals must be reproduced exactly for container compatibility.

/// Content type URIs (like MIME-types) that specify a part's format
pub mod content_type {
    // OPC core content types
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";

    // Provisioning template content types
    pub const TEMPLATE_MANIFEST: &str = "application/pnpprovisioningtemplate.manifest";
    pub const TEMPLATE_BODY: &str = "application/pnpprovisioningtemplate.body";
    pub const TEMPLATE_PROPERTIES: &str = "application/pnpprovisioningtemplate.properties";
    pub const TEMPLATE_FILES_MAP: &str = "application/pnpprovisioningtemplate.files.map";
    pub const TEMPLATE_ORIGIN: &str = "application/pnpprovisioningtemplate.origin";
    pub const TEMPLATE_FILE: &str = "application/unknown";
}

/// XML namespaces used by the package-level XML items
pub mod namespace {
    pub const OPC_CONTENT_TYPES: &str =
        "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const OPC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
}

/// Relationship target modes
pub mod target_mode {
    pub const INTERNAL: &str = "Internal";
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs
pub mod relationship_type {
    pub const TEMPLATE_MANIFEST: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/manifest";
    pub const TEMPLATE_BODY: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/body";
    pub const TEMPLATE_PROPERTIES: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/properties";
    pub const TEMPLATE_FILES_MAP: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/files.map";

    // supporting files
    pub const TEMPLATE_FILES_ORIGIN: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/files.origin";
    pub const TEMPLATE_FILE: &str =
        "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/file";
}

/// Fixed part names of a template package
pub mod part_uri {
    pub const TEMPLATE_MANIFEST: &str = "/manifest.xml";
    pub const TEMPLATE_DIR: &str = "/ProvisioningTemplate/";
    pub const TEMPLATE_PROPERTIES: &str = "/ProvisioningTemplate/props.xml";
    pub const TEMPLATE_FILES_MAP: &str = "/ProvisioningTemplate/files-map.xml";
    pub const FILES_ORIGIN: &str = "/files.origin";

    /// Namespace prefix every embedded file lives under
    pub const FILES_DIR: &str = "/Files/";
}

/// Conventional extension of template package files (the package itself is extension-agnostic)
pub const TEMPLATE_EXTENSION: &str = ".pnp";
