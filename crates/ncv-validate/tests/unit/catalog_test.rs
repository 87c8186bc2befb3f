//! Tests for records, the in-memory catalog and record filters

use std::collections::HashSet;

use ncv_validate::{InMemoryCatalog, Record, RecordFilter, RecordSource};

use crate::test_utils::record;

#[test]
fn test_record_folder_strips_name() {
    let rock = record("SM_Rock", "StaticMesh", "/Game/Props");

    assert_eq!(rock.location_path, "/Game/Props/SM_Rock");
    assert_eq!(rock.folder(), "/Game/Props");
    assert_eq!(Record::new("Loose", "Asset", "Loose").folder(), "");
}

#[test]
fn test_in_memory_catalog_queries_by_location() {
    let catalog: InMemoryCatalog = vec![
        record("SM_Rock", "StaticMesh", "/Game/Props"),
        record("T_Rock", "Texture2D", "/Game/Props"),
        record("M_Rock", "Material", "/Game/Props"),
    ]
    .into_iter()
    .collect();

    let wanted: HashSet<String> = ["/Game/Props/M_Rock", "/Game/Props/SM_Rock", "/Game/Missing"]
        .into_iter()
        .map(String::from)
        .collect();
    let found: Vec<String> = catalog
        .records_at(&wanted)
        .into_iter()
        .map(|r| r.name)
        .collect();

    assert_eq!(found, vec!["SM_Rock", "M_Rock"]);
    assert_eq!(catalog.records().count(), 3);
}

#[test]
fn test_in_memory_catalog_edits() {
    let mut catalog = InMemoryCatalog::new(vec![record("SM_Rock", "StaticMesh", "/Game/Props")]);

    catalog.upsert(Record::new("SM_Rock", "StaticMesh", "/Game/Props/SM_Rock"));
    assert_eq!(catalog.len(), 1);

    catalog.push(record("SM_Tree", "StaticMesh", "/Game/Props"));
    assert_eq!(catalog.len(), 2);

    let removed = catalog.remove("/Game/Props/SM_Rock").unwrap();
    assert_eq!(removed.name, "SM_Rock");
    assert!(catalog.remove("/Game/Props/SM_Rock").is_none());
    assert!(!catalog.is_empty());
}

#[test]
fn test_filter_parses_plus_separated_roots() {
    let filter = RecordFilter::parse("/Game/Maps + /Game/Props+");

    assert_eq!(filter.roots, vec!["/Game/Maps", "/Game/Props"]);
    assert!(filter.accepts(&record("SM_Rock", "StaticMesh", "/Game/Props")));
    assert!(filter.accepts(&record("L_Main", "World", "/Game/Maps/Main")));
    assert!(!filter.accepts(&record("SM_Rock", "StaticMesh", "/Game/PropsOld")));
    assert!(!filter.accepts(&record("T_Sky", "Texture2D", "/Game/Sky")));
}

#[test]
fn test_empty_filter_accepts_everything() {
    let filter = RecordFilter::parse("");

    assert!(filter.is_unrestricted());
    assert!(filter.accepts(&record("T_Sky", "Texture2D", "/Game/Sky")));
}
