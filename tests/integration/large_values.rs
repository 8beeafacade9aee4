#![allow(missing_docs)]

use std::sync::Arc;

use strata::storage::{
    AllowAll, ElementKind, EngineOptions, FetchHints, InMemoryTable, MemoryVStore, Metadata,
    PropValue, PropertyFilter, TimeRange,
};
use strata::types::{Result, StrataError, Visibility};

fn table_with_store() -> (InMemoryTable, Arc<MemoryVStore>) {
    let store = Arc::new(MemoryVStore::new());
    let table = InMemoryTable::new(EngineOptions::new().loader(store.clone()));
    (table, store)
}

#[test]
fn indirect_values_resolve_on_read_and_history() -> Result<()> {
    let (table, store) = table_with_store();
    let v = table.get_or_create("doc", ElementKind::Vertex, Visibility::empty(), Some(1))?;

    let first = store.put_str("first draft", 2)?;
    let second = store.put_str("second draft", 3)?;
    for (ts, vref) in [(2, first), (3, second)] {
        v.append_add_property_value(
            "k",
            "body",
            PropValue::Ref(vref),
            Metadata::new(),
            Visibility::empty(),
            Some(ts),
        );
    }

    let current = v
        .get_property("k", "body", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .expect("present");
    assert_eq!(current.value, PropValue::from("second draft"));

    let history = v.get_historical_property_values(
        &PropertyFilter::key_name("k", "body"),
        TimeRange::all(),
        &AllowAll,
    )?;
    let values: Vec<_> = history.iter().filter_map(|h| h.value.clone()).collect();
    assert_eq!(
        values,
        vec![PropValue::from("second draft"), PropValue::from("first draft")]
    );
    assert_eq!(store.metrics().blobs_written, 2);
    Ok(())
}

#[test]
fn load_failure_only_affects_its_property() -> Result<()> {
    let (table, store) = table_with_store();
    let v = table.get_or_create("doc", ElementKind::Vertex, Visibility::empty(), Some(1))?;

    let lost = store.put_bytes(vec![7; 64], 2)?;
    v.append_add_property_value(
        "k",
        "attachment",
        PropValue::Ref(lost),
        Metadata::new(),
        Visibility::empty(),
        Some(2),
    );
    v.append_add_property_value(
        "k",
        "title",
        PropValue::from("readme"),
        Metadata::new(),
        Visibility::empty(),
        Some(3),
    );
    assert!(store.remove(lost.id));

    let results: Vec<_> = v.get_properties(FetchHints::ALL, None, &AllowAll).collect();
    assert_eq!(results.len(), 2);
    match &results[0] {
        Err(StrataError::ValueLoad { name, timestamp, .. }) => {
            assert_eq!(name, "attachment");
            assert_eq!(*timestamp, 2);
        }
        other => panic!("expected load failure, got {other:?}"),
    }
    let title = results[1].as_ref().expect("title loads");
    assert_eq!(title.value, PropValue::from("readme"));

    // A hard delete does not need the value and clears the broken property.
    let purged = v.delete_property("k", "attachment", None, &AllowAll)?;
    assert!(matches!(purged.map(|p| p.value), Some(PropValue::Ref(_))));
    assert_eq!(
        v.get_properties(FetchHints::ALL, None, &AllowAll)
            .collect::<Result<Vec<_>>>()?
            .len(),
        1
    );
    Ok(())
}
