//! End-to-end tests of template packages backed by files and streams.

use chrono::{TimeZone, Utc};
use pnp_package::error::PackageError;
use pnp_package::opc::{
    CompressionOption, OpcError, OpcPackage, PackURI, PackageAccess, PackageMode, TargetMode,
};
use pnp_package::template::{
    ComponentKind, FilesMap, Manifest, PackageOptions, PartCodec, Properties, TemplatePackage,
};
use proptest::prelude::*;
use std::io::{Cursor, Write};
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn sample_properties() -> Properties {
    Properties {
        generator: Some("pnp-package".to_string()),
        author: Some("Contoso".to_string()),
        template_file_name: Some("site.xml".to_string()),
        created: Some(Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap()),
    }
}

#[test]
fn fresh_package_has_mandatory_components() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("fresh.pnp");

    let mut pkg = TemplatePackage::open(&path, PackageMode::CreateNew, PackageAccess::ReadWrite)
        .expect("create package");
    assert!(pkg.manifest_part().unwrap().is_some());
    assert!(pkg.files_origin_part().unwrap().is_some());
    assert_eq!(pkg.manifest().unwrap(), None);
    assert_eq!(pkg.properties().unwrap(), None);
    assert_eq!(pkg.files_map().unwrap(), None);
    pkg.close().expect("close package");

    let err = TemplatePackage::open(&path, PackageMode::CreateNew, PackageAccess::ReadWrite)
        .err()
        .expect("second CreateNew must fail");
    assert!(matches!(err, PackageError::Opc(OpcError::PackageExists(_))));

    let mut pkg = TemplatePackage::open(&path, PackageMode::Open, PackageAccess::Read)
        .expect("reopen package");
    let kinds = [
        ComponentKind::Properties,
        ComponentKind::FilesMap,
        ComponentKind::FilesOrigin,
    ];
    let manifest = pkg.manifest_part().unwrap().expect("manifest part");
    for kind in kinds {
        let rels = pkg
            .opc()
            .relationships_by_type(Some(&manifest), kind.relationship_type())
            .unwrap();
        assert_eq!(rels.len(), 1, "{} relationship", kind);
    }
    pkg.close().expect("close read-only package");
}

#[test]
fn open_missing_file_fails() {
    let dir = tempdir().expect("create temp dir");
    let err = TemplatePackage::open(
        dir.path().join("missing.pnp"),
        PackageMode::Open,
        PackageAccess::Read,
    )
    .err()
    .expect("open must fail");
    assert!(matches!(err, PackageError::Opc(OpcError::PackageNotFound(_))));
}

#[test]
fn save_and_reopen_preserves_everything() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("site.pnp");

    let manifest = Manifest::new("PnPProvisioningTemplate");
    let properties = sample_properties();
    let mut files_map = FilesMap::new();
    files_map.insert("C:/site/report.txt", "report.txt");
    files_map.insert("C:/site/logo.png", "logo.png");

    {
        let mut pkg = TemplatePackage::open(&path, PackageMode::Create, PackageAccess::ReadWrite)
            .expect("create package");
        pkg.set_manifest(Some(&manifest)).unwrap();
        pkg.set_properties(Some(&properties)).unwrap();
        pkg.set_files_map(Some(&files_map)).unwrap();
        pkg.add_file("report.txt", "Sub/Dir", Some(b"quarterly numbers")).unwrap();
        pkg.add_file("logo.png", "", Some(&[0x89, 0x50, 0x4E, 0x47])).unwrap();
        pkg.close().expect("close package");
    }

    let mut pkg = TemplatePackage::open(&path, PackageMode::Open, PackageAccess::ReadWrite)
        .expect("reopen package");
    assert_eq!(pkg.manifest().unwrap(), Some(manifest));
    assert_eq!(pkg.properties().unwrap(), Some(properties));
    assert_eq!(pkg.files_map().unwrap(), Some(files_map));
    assert_eq!(pkg.opc().part_count(), 6);

    let files = pkg.files().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files["report.txt"].folder, "Sub/Dir");
    assert_eq!(files["report.txt"].content, b"quarterly numbers");
    assert_eq!(files["logo.png"].folder, "");

    let parts: Vec<String> = pkg
        .file_parts()
        .unwrap()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(parts, vec!["/Files/Sub/Dir/report.txt", "/Files/logo.png"]);
    pkg.close().expect("close package");
}

#[test]
fn name_collision_keeps_most_recent_file() {
    let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();
    pkg.add_file("a.txt", "", Some(b"b1")).unwrap();
    pkg.add_file("a.txt", "other", Some(b"b2")).unwrap();

    let files = pkg.files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files["a.txt"].folder, "other");
    assert_eq!(files["a.txt"].content, b"b2");
    assert_eq!(files["a.txt"].path(), "other/a.txt");

    assert_eq!(pkg.files_by_location().unwrap().len(), 2);
}

#[test]
fn clear_files_removes_parts_and_relationships() {
    let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();
    for idx in 0..5 {
        let name = format!("file{}.bin", idx);
        pkg.add_file(&name, "data", Some(name.as_bytes())).unwrap();
    }
    assert_eq!(pkg.opc().part_count(), 9);

    assert_eq!(pkg.clear_files().unwrap(), 5);
    assert!(pkg.files().unwrap().is_empty());
    assert_eq!(pkg.opc().part_count(), 4);

    let origin = pkg.files_origin_part().unwrap().expect("files origin survives");
    let rels = pkg
        .opc()
        .relationships_by_type(Some(&origin), ComponentKind::File.relationship_type())
        .unwrap();
    assert!(rels.is_empty());

    // the same paths can be used again
    pkg.add_file("file0.bin", "data", None).unwrap();
    assert_eq!(pkg.files().unwrap()["file0.bin"].content, b"");
}

#[test]
fn duplicate_file_path_is_rejected() {
    let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();
    pkg.add_file("report.txt", "docs", Some(b"one")).unwrap();
    let err = pkg.add_file("/report.txt", "/docs/", Some(b"two")).unwrap_err();
    assert!(err.is_duplicate_part());
    assert_eq!(pkg.files().unwrap()["report.txt"].content, b"one");
}

#[test]
fn read_only_package_rejects_mutation() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut pkg =
            TemplatePackage::open_stream(&mut buffer, PackageMode::Create, PackageAccess::ReadWrite)
                .expect("create package");
        pkg.set_manifest(Some(&Manifest::new("PnPProvisioningTemplate")))
            .unwrap();
        pkg.add_file("a.txt", "", Some(b"a")).unwrap();
        pkg.close().expect("close package");
    }
    let saved = buffer.get_ref().clone();

    buffer.set_position(0);
    let mut pkg = TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::Read)
        .expect("open read-only");
    assert_eq!(
        pkg.manifest().unwrap().map(|m| m.kind),
        Some("PnPProvisioningTemplate".to_string())
    );
    assert_eq!(pkg.files().unwrap()["a.txt"].content, b"a");

    let err = pkg.add_file("b.txt", "", Some(b"b")).unwrap_err();
    assert!(matches!(err, PackageError::Opc(OpcError::ReadOnly(_))));
    let err = pkg.set_manifest(Some(&Manifest::new("Other"))).unwrap_err();
    assert!(matches!(err, PackageError::Opc(OpcError::ReadOnly(_))));
    let err = pkg.clear_files().unwrap_err();
    assert!(matches!(err, PackageError::Opc(OpcError::ReadOnly(_))));

    pkg.close().expect("close read-only package");
    assert_eq!(buffer.get_ref(), &saved);
}

#[test]
fn stream_packages_honour_compression_option() {
    let payload = vec![b'x'; 64 * 1024];

    let mut stored = Cursor::new(Vec::new());
    let mut pkg = TemplatePackage::open_stream_with_options(
        &mut stored,
        PackageMode::Create,
        PackageAccess::ReadWrite,
        PackageOptions::new().with_compression(CompressionOption::NotCompressed),
    )
    .unwrap();
    pkg.add_file("big.txt", "", Some(payload.as_slice())).unwrap();
    pkg.close().unwrap();

    let mut deflated = Cursor::new(Vec::new());
    let mut pkg = TemplatePackage::open_stream(&mut deflated, PackageMode::Create, PackageAccess::ReadWrite)
        .unwrap();
    pkg.add_file("big.txt", "", Some(payload.as_slice())).unwrap();
    pkg.close().unwrap();

    assert!(stored.get_ref().len() > payload.len());
    assert!(deflated.get_ref().len() < payload.len() / 10);
}

#[test]
fn size_limit_applies_to_file_reads() {
    let options = PackageOptions::new().with_max_part_size(8);
    let mut pkg = TemplatePackage::in_memory(options).unwrap();
    pkg.add_file("small.txt", "", Some(b"12345678")).unwrap();
    assert_eq!(pkg.files().unwrap().len(), 1);

    pkg.add_file("large.txt", "", Some(b"123456789")).unwrap();
    let err = pkg.files().unwrap_err();
    assert!(matches!(
        err,
        PackageError::SizeLimitExceeded { size: 9, limit: 8, .. }
    ));
}

#[test]
fn first_internal_relationship_wins() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut opc = OpcPackage::open_stream(&mut buffer, PackageMode::Create, PackageAccess::ReadWrite)
            .unwrap();
        let reltype = ComponentKind::Manifest.relationship_type();
        opc.create_relationship(None, "https://example.com/manifest.xml", TargetMode::External, reltype)
            .unwrap();
        for path in ["/first.xml", "/second.xml"] {
            let uri = PackURI::new(path).unwrap();
            opc.create_part(&uri, ComponentKind::Manifest.content_type(), CompressionOption::Normal)
                .unwrap();
            opc.create_relationship(None, path, TargetMode::Internal, reltype)
                .unwrap();
            let mut codec = PartCodec::new(&mut opc, u64::MAX);
            codec.write(Some(&Manifest::new(path)), &uri).unwrap();
        }
        opc.close().unwrap();
    }

    buffer.set_position(0);
    let mut pkg = TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::ReadWrite)
        .unwrap();
    assert_eq!(pkg.manifest_part().unwrap().unwrap().as_str(), "/first.xml");
    assert_eq!(pkg.manifest().unwrap(), Some(Manifest::new("/first.xml")));
    // mandatory children were created under the first manifest
    assert_eq!(pkg.opc().part_count(), 5);
}

fn rels_xml(targets: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (idx, (reltype, target)) in targets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Type="{}" Target="{}" Id="R{:x}" />"#,
            reltype,
            target,
            idx + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// A package laid out the way other OPC producers write it: part names escaped in
/// ZIP entries, content type overrides and relationship targets.
fn escaped_package() -> Vec<u8> {
    let report = "/Files/Sub%20Dir/my%20report.txt";
    let resume = "/Files/r%C3%A9sum%C3%A9.txt";
    let content_types = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml" /><Default Extension="xml" ContentType="application/xml" /><Override PartName="/manifest.xml" ContentType="{}" /><Override PartName="/ProvisioningTemplate/props.xml" ContentType="{}" /><Override PartName="/ProvisioningTemplate/files-map.xml" ContentType="{}" /><Override PartName="/files.origin" ContentType="{}" /><Override PartName="{}" ContentType="{}" /><Override PartName="{}" ContentType="{}" /></Types>"#,
        ComponentKind::Manifest.content_type(),
        ComponentKind::Properties.content_type(),
        ComponentKind::FilesMap.content_type(),
        ComponentKind::FilesOrigin.content_type(),
        report,
        ComponentKind::File.content_type(),
        resume,
        ComponentKind::File.content_type(),
    );
    let members: Vec<(&str, Vec<u8>)> = vec![
        ("[Content_Types].xml", content_types.into_bytes()),
        (
            "_rels/.rels",
            rels_xml(&[(ComponentKind::Manifest.relationship_type(), "/manifest.xml")]).into_bytes(),
        ),
        ("manifest.xml", br#"<Manifest Type="PnPProvisioningTemplate"/>"#.to_vec()),
        (
            "_rels/manifest.xml.rels",
            rels_xml(&[
                (ComponentKind::Properties.relationship_type(), "/ProvisioningTemplate/props.xml"),
                (ComponentKind::FilesMap.relationship_type(), "/ProvisioningTemplate/files-map.xml"),
                (ComponentKind::FilesOrigin.relationship_type(), "/files.origin"),
            ])
            .into_bytes(),
        ),
        ("ProvisioningTemplate/props.xml", Vec::new()),
        ("ProvisioningTemplate/files-map.xml", Vec::new()),
        ("files.origin", Vec::new()),
        (
            "_rels/files.origin.rels",
            rels_xml(&[
                (ComponentKind::File.relationship_type(), report),
                (ComponentKind::File.relationship_type(), resume),
            ])
            .into_bytes(),
        ),
        ("Files/Sub%20Dir/my%20report.txt", b"quarterly".to_vec()),
        ("Files/r%C3%A9sum%C3%A9.txt", b"cv".to_vec()),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, blob) in members {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(&blob).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn escaped_part_names_are_decoded_and_written_back_escaped() {
    let mut buffer = Cursor::new(escaped_package());
    let mut pkg = TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::ReadWrite)
        .expect("open escaped package");
    assert_eq!(
        pkg.manifest().unwrap().map(|m| m.kind),
        Some("PnPProvisioningTemplate".to_string())
    );

    let files = pkg.files().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files["my report.txt"].folder, "Sub Dir");
    assert_eq!(files["my report.txt"].content, b"quarterly");
    assert_eq!(files["résumé.txt"].content, b"cv");

    pkg.add_file("new file.txt", "Sub Dir", Some(b"n")).unwrap();
    let err = pkg.add_file("my report.txt", "Sub Dir", Some(b"x")).unwrap_err();
    assert!(err.is_duplicate_part());
    pkg.close().expect("close package");

    let archive = ZipArchive::new(Cursor::new(buffer.get_ref().as_slice())).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"Files/Sub%20Dir/my%20report.txt"));
    assert!(names.contains(&"Files/Sub%20Dir/new%20file.txt"));
    assert!(names.contains(&"Files/r%C3%A9sum%C3%A9.txt"));
    assert!(names.iter().all(|name| !name.contains(' ')));

    buffer.set_position(0);
    let mut pkg = TemplatePackage::open_stream(&mut buffer, PackageMode::Open, PackageAccess::Read)
        .expect("reopen package");
    let files = pkg.files().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files["new file.txt"].path(), "Sub Dir/new file.txt");
}

/// Any printable text, markup characters and empty strings included; the XML reader
/// trims text at element edges, so edge whitespace is excluded.
fn text_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(any::<String>().prop_filter("no edge whitespace", |s| s.trim() == s))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_properties_round_trip(
        generator in text_strategy(),
        author in text_strategy(),
        template_file_name in text_strategy(),
        created in proptest::option::of(0i64..4_102_444_800i64),
    ) {
        let properties = Properties {
            generator,
            author,
            template_file_name,
            created: created.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        };

        let mut pkg = TemplatePackage::in_memory(PackageOptions::default()).unwrap();
        pkg.set_properties(Some(&properties)).unwrap();
        prop_assert_eq!(pkg.properties().unwrap(), Some(properties.clone()));

        pkg.set_properties(None).unwrap();
        prop_assert_eq!(pkg.properties().unwrap(), Some(properties));
    }
}
