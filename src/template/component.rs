//! The closed set of components a template package is made of.
//!
//! Each component kind maps to its fixed relationship type, content type, part
//! name and parent component through a static dispatch table.

use crate::opc::constants::{content_type, part_uri, relationship_type};
use std::fmt;

/// A component of a template package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Manifest,
    Properties,
    FilesMap,
    FilesOrigin,
    File,
}

/// The fixed literals of one component kind.
#[derive(Debug)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub name: &'static str,
    pub relationship_type: &'static str,
    pub content_type: &'static str,
    /// Fixed part name; `None` for components stored under a computed path
    pub partname: Option<&'static str>,
    /// Component the relationship starts from; `None` for the package root
    pub parent: Option<ComponentKind>,
}

static COMPONENTS: [ComponentSpec; 5] = [
    ComponentSpec {
        kind: ComponentKind::Manifest,
        name: "manifest",
        relationship_type: relationship_type::TEMPLATE_MANIFEST,
        content_type: content_type::TEMPLATE_MANIFEST,
        partname: Some(part_uri::TEMPLATE_MANIFEST),
        parent: None,
    },
    ComponentSpec {
        kind: ComponentKind::Properties,
        name: "properties",
        relationship_type: relationship_type::TEMPLATE_PROPERTIES,
        content_type: content_type::TEMPLATE_PROPERTIES,
        partname: Some(part_uri::TEMPLATE_PROPERTIES),
        parent: Some(ComponentKind::Manifest),
    },
    ComponentSpec {
        kind: ComponentKind::FilesMap,
        name: "files map",
        relationship_type: relationship_type::TEMPLATE_FILES_MAP,
        content_type: content_type::TEMPLATE_FILES_MAP,
        partname: Some(part_uri::TEMPLATE_FILES_MAP),
        parent: Some(ComponentKind::Manifest),
    },
    ComponentSpec {
        kind: ComponentKind::FilesOrigin,
        name: "files origin",
        relationship_type: relationship_type::TEMPLATE_FILES_ORIGIN,
        content_type: content_type::TEMPLATE_ORIGIN,
        partname: Some(part_uri::FILES_ORIGIN),
        parent: Some(ComponentKind::Manifest),
    },
    ComponentSpec {
        kind: ComponentKind::File,
        name: "file",
        relationship_type: relationship_type::TEMPLATE_FILE,
        content_type: content_type::TEMPLATE_FILE,
        partname: None,
        parent: Some(ComponentKind::FilesOrigin),
    },
];

impl ComponentKind {
    /// Components every opened package is guaranteed to hold, in creation order.
    pub const MANDATORY: [ComponentKind; 4] = [
        ComponentKind::Manifest,
        ComponentKind::Properties,
        ComponentKind::FilesOrigin,
        ComponentKind::FilesMap,
    ];

    #[inline]
    pub fn spec(self) -> &'static ComponentSpec {
        &COMPONENTS[self as usize]
    }

    #[inline]
    pub fn relationship_type(self) -> &'static str {
        self.spec().relationship_type
    }

    #[inline]
    pub fn content_type(self) -> &'static str {
        self.spec().content_type
    }

    #[inline]
    pub fn partname(self) -> Option<&'static str> {
        self.spec().partname
    }

    #[inline]
    pub fn parent(self) -> Option<ComponentKind> {
        self.spec().parent
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_kind() {
        for spec in &COMPONENTS {
            assert_eq!(spec.kind.spec().kind, spec.kind);
        }
    }

    #[test]
    fn test_parents() {
        assert_eq!(ComponentKind::Manifest.parent(), None);
        assert_eq!(ComponentKind::Properties.parent(), Some(ComponentKind::Manifest));
        assert_eq!(ComponentKind::FilesMap.parent(), Some(ComponentKind::Manifest));
        assert_eq!(ComponentKind::FilesOrigin.parent(), Some(ComponentKind::Manifest));
        assert_eq!(ComponentKind::File.parent(), Some(ComponentKind::FilesOrigin));
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            ComponentKind::FilesOrigin.relationship_type(),
            "http://schemas.dev.office.com/pnp/provisioningtemplate/v1/files.origin"
        );
        assert_eq!(ComponentKind::File.content_type(), "application/unknown");
        assert_eq!(ComponentKind::Properties.partname(), Some("/ProvisioningTemplate/props.xml"));
        assert_eq!(ComponentKind::File.partname(), None);
    }
}
