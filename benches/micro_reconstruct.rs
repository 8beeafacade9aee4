#![forbid(unsafe_code)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata::storage::{
    AllowAll, ElementKind, EngineOptions, FetchHints, InMemoryTable, Metadata, PropValue,
    PropertyFilter, TableElement, TimeRange,
};
use strata::types::Visibility;

const PROPERTY_COUNT: usize = 64;
const WRITES_PER_PROPERTY: usize = 32;
const TIME_DOMAIN: i64 = 100_000;

fn micro_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/reconstruct");
    group.sample_size(40);
    let mut harness = ReconstructHarness::new(PROPERTY_COUNT, WRITES_PER_PROPERTY);

    group.throughput(Throughput::Elements(1));
    group.bench_function("get_property", |b| {
        b.iter(|| black_box(harness.get_property()));
    });

    group.throughput(Throughput::Elements(PROPERTY_COUNT as u64));
    group.bench_function("get_properties", |b| {
        b.iter(|| black_box(harness.get_properties()));
    });

    group.throughput(Throughput::Elements(1));
    group.bench_function("point_in_time", |b| {
        b.iter(|| black_box(harness.point_in_time()));
    });

    group.bench_function("history", |b| {
        b.iter(|| black_box(harness.history()));
    });

    group.finish();
}

struct ReconstructHarness {
    element: Arc<TableElement>,
    properties: usize,
    rng: ChaCha8Rng,
}

impl ReconstructHarness {
    fn new(properties: usize, writes: usize) -> Self {
        let table = InMemoryTable::new(EngineOptions::new());
        let element = table
            .get_or_create("bench", ElementKind::Vertex, Visibility::empty(), Some(0))
            .expect("element");
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for p in 0..properties {
            for _ in 0..writes {
                let ts = rng.gen_range(1..TIME_DOMAIN);
                element.append_add_property_value(
                    "k",
                    &format!("p{p}"),
                    PropValue::Int(ts),
                    Metadata::new(),
                    Visibility::empty(),
                    Some(ts),
                );
            }
        }
        Self {
            element,
            properties,
            rng,
        }
    }

    fn random_name(&mut self) -> String {
        format!("p{}", self.rng.gen_range(0..self.properties))
    }

    fn get_property(&mut self) -> bool {
        let name = self.random_name();
        self.element
            .get_property("k", &name, &Visibility::empty(), FetchHints::ALL, None, &AllowAll)
            .expect("read")
            .is_some()
    }

    fn get_properties(&mut self) -> usize {
        self.element
            .get_properties(FetchHints::ALL, None, &AllowAll)
            .filter(Result::is_ok)
            .count()
    }

    fn point_in_time(&mut self) -> bool {
        let name = self.random_name();
        let end = self.rng.gen_range(1..TIME_DOMAIN);
        self.element
            .get_property("k", &name, &Visibility::empty(), FetchHints::ALL, Some(end), &AllowAll)
            .expect("read")
            .is_some()
    }

    fn history(&mut self) -> usize {
        let name = self.random_name();
        self.element
            .get_historical_property_values(
                &PropertyFilter::key_name("k", name),
                TimeRange::all(),
                &AllowAll,
            )
            .expect("history")
            .len()
    }
}

criterion_group!(benches, micro_reconstruct);
criterion_main!(benches);
