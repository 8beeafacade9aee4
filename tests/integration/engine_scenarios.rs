#![allow(missing_docs)]

use std::sync::atomic::Ordering;
use std::sync::{Arc, Once};

use strata::primitives::clock::ManualClock;
use strata::storage::{
    AllowAll, AuthorizationSet, CounterMetrics, ElementKind, EngineConfig, EngineOptions,
    FetchHints, InMemoryTable, Metadata, PropValue, PropertyFilter, TableElement, TimeRange,
    VertexMaterializer,
};
use strata::types::{Result, Visibility};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strata=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn setup() -> (InMemoryTable, Arc<CounterMetrics>) {
    init_tracing();
    let metrics = Arc::new(CounterMetrics::default());
    let table = InMemoryTable::new(
        EngineOptions::new()
            .clock(Arc::new(ManualClock::ticking(1_000)))
            .metrics(metrics.clone()),
    );
    (table, metrics)
}

fn vertex(table: &InMemoryTable) -> Result<Arc<TableElement>> {
    table.get_or_create("v1", ElementKind::Vertex, Visibility::empty(), Some(0))
}

fn add(element: &TableElement, vis: &str, ts: i64, value: i64) {
    element.append_add_property_value(
        "k",
        "n",
        PropValue::Int(value),
        Metadata::new(),
        vis.into(),
        Some(ts),
    );
}

#[test]
fn overwrite_then_soft_delete() -> Result<()> {
    let (table, metrics) = setup();
    let v = vertex(&table)?;
    add(&v, "", 1, 5);
    add(&v, "", 2, 7);

    let current = v
        .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .expect("property present");
    assert_eq!(current.value, PropValue::Int(7));
    assert_eq!(current.timestamp, 2);

    v.append_soft_delete_property("k", "n", Visibility::empty(), Some(3));
    assert!(v
        .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .is_none());

    let history = v.get_historical_property_values(
        &PropertyFilter::identity("k", "n", Visibility::empty()),
        TimeRange::all(),
        &AllowAll,
    )?;
    let summary: Vec<_> = history
        .iter()
        .map(|h| (h.timestamp, h.is_deleted, h.value.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (3, true, Some(PropValue::Int(7))),
            (2, false, Some(PropValue::Int(7))),
            (1, false, Some(PropValue::Int(5))),
        ]
    );
    assert_eq!(metrics.history_reads.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.history_entries.load(Ordering::Relaxed), 3);
    Ok(())
}

#[test]
fn hidden_property_stays_absent_until_unhidden() -> Result<()> {
    let (table, _) = setup();
    let v = vertex(&table)?;
    let vis = Visibility::from("a");
    add(&v, "a", 1, 5);
    v.append_mark_property_hidden("k", "n", vis.clone(), "secret".into(), Some(5), &AllowAll)?;

    let reader = AuthorizationSet::new(["a", "secret"]);
    assert!(v
        .get_property("k", "n", &vis, FetchHints::ALL, None, &reader)?
        .is_none());
    let hidden = v
        .get_property("k", "n", &vis, FetchHints::ALL_INCLUDING_HIDDEN, None, &reader)?
        .expect("visible when hidden data is requested");
    assert!(hidden.is_hidden());

    // Point-in-time reads before the hide still see the value.
    assert!(v
        .get_property("k", "n", &vis, FetchHints::ALL, Some(4), &reader)?
        .is_some());

    v.append_mark_property_visible("k", "n", vis.clone(), "secret".into(), Some(6), &AllowAll)?;
    let back = v
        .get_property("k", "n", &vis, FetchHints::ALL, None, &reader)?
        .expect("property unhidden");
    assert!(!back.is_hidden());
    Ok(())
}

#[test]
fn metadata_merges_without_reviving_deleted_property() -> Result<()> {
    let (table, _) = setup();
    let v = vertex(&table)?;
    v.append_add_property_value(
        "k",
        "n",
        PropValue::from("x"),
        Metadata::new().with("source", PropValue::from("import"), Visibility::empty()),
        Visibility::empty(),
        Some(1),
    );
    v.append_add_property_metadata(
        "k",
        "n",
        Metadata::new().with("confidence", PropValue::Int(9), Visibility::empty()),
        Visibility::empty(),
        Some(2),
    );
    let p = v
        .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .expect("present");
    assert_eq!(p.metadata.len(), 2);
    assert_eq!(p.value, PropValue::from("x"));

    let bare = v
        .get_property("k", "n", &Visibility::empty(), FetchHints::PROPERTIES, None, &AllowAll)?
        .expect("present");
    assert!(bare.metadata.is_empty());

    v.append_soft_delete_property("k", "n", Visibility::empty(), Some(3));
    v.append_add_property_metadata(
        "k",
        "n",
        Metadata::new().with("late", PropValue::Int(1), Visibility::empty()),
        Visibility::empty(),
        Some(4),
    );
    assert!(v
        .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .is_none());
    Ok(())
}

#[test]
fn deletion_is_monotone_until_touched_again() -> Result<()> {
    let (table, _) = setup();
    let v = vertex(&table)?;
    v.append_soft_delete(Some(10));
    for t in [10, 11, 50, 100] {
        assert!(v.is_deleted(Some(t), &AllowAll), "deleted at {t}");
    }
    assert!(!v.is_deleted(Some(9), &AllowAll));

    v.append_element_timestamp(Some(60));
    assert!(v.is_deleted(Some(59), &AllowAll));
    assert!(!v.is_deleted(Some(60), &AllowAll));
    assert!(!v.is_deleted(None, &AllowAll));
    Ok(())
}

#[test]
fn point_in_time_materialization() -> Result<()> {
    let (table, metrics) = setup();
    let v = table.get_or_create("v2", ElementKind::Vertex, Visibility::empty(), Some(10))?;
    v.append_alter_concept_type("person", Some(10));
    add(&v, "", 12, 1);
    add(&v, "", 14, 2);
    v.append_soft_delete(Some(20));

    assert!(v
        .create_element(&VertexMaterializer, FetchHints::ALL, Some(5), &AllowAll)?
        .is_none());
    let at_13 = v
        .create_element(&VertexMaterializer, FetchHints::ALL, Some(13), &AllowAll)?
        .expect("alive at 13");
    assert_eq!(at_13.property("n").map(|p| p.value.clone()), Some(PropValue::Int(1)));
    assert_eq!(at_13.concept_type.as_deref(), Some("person"));
    assert!(v
        .create_element(&VertexMaterializer, FetchHints::ALL, None, &AllowAll)?
        .is_none());
    assert_eq!(metrics.elements_materialized.load(Ordering::Relaxed), 1);
    Ok(())
}

#[test]
fn removing_an_authorization_only_removes_results() -> Result<()> {
    let (table, _) = setup();
    let v = vertex(&table)?;
    add(&v, "", 1, 1);
    add(&v, "a", 2, 2);
    add(&v, "b", 3, 3);
    v.append_mark_property_hidden("k", "n", "b".into(), "a".into(), Some(4), &AllowAll)?;

    let full = AuthorizationSet::new(["a", "b"]);
    let names = |auth: &AuthorizationSet| -> Result<Vec<String>> {
        v.get_properties(FetchHints::ALL, None, auth)
            .map(|p| p.map(|p| p.visibility.as_str().to_owned()))
            .collect()
    };
    let all = names(&full)?;
    for label in ["a", "b"] {
        let fewer = names(&full.without(label))?;
        assert!(fewer.iter().all(|v| all.contains(v)), "{fewer:?} not within {all:?}");
    }
    assert_eq!(all, vec!["".to_owned(), "a".to_owned()]);
    Ok(())
}

#[test]
fn clock_fills_missing_timestamps_and_config_drives_it() -> Result<()> {
    let cfg = EngineConfig::from_toml_str("clock = \"manual\"\nmanual_clock_start = 500\n")?;
    let table = InMemoryTable::new(cfg.to_options());
    let v = table.get_or_create("v", ElementKind::Vertex, Visibility::empty(), None)?;
    add(&v, "", 400, 1);
    v.append_add_property_value(
        "k",
        "n",
        PropValue::Int(2),
        Metadata::new(),
        Visibility::empty(),
        None,
    );
    assert_eq!(v.first_timestamp(), Some(500));
    let p = v
        .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
        .expect("present");
    assert_eq!((p.value, p.timestamp), (PropValue::Int(2), 501));
    Ok(())
}
