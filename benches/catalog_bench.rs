// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use anisotime::catalog::CatalogBuilder;
use anisotime::{ComputationalMesh, Phase, PolynomialStructure, VelocityStructure};

const R: f64 = 6371.0;

fn make_builder(mesh_km: f64, max_step: f64, threads: usize) -> CatalogBuilder {
    let structure: Arc<dyn VelocityStructure> = Arc::new(PolynomialStructure::prem());
    let mesh = Arc::new(ComputationalMesh::uniform(structure.as_ref(), mesh_km).unwrap());
    CatalogBuilder::new(structure, mesh)
        .with_max_step(max_step)
        .unwrap()
        .with_threads(threads)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Thread scaling: PREM, 10 km mesh, default step.
fn bench_build_thread_scaling(c: &mut Criterion) {
    let cpus = num_cpus();
    let mut group = c.benchmark_group("build_prem_10km");
    group.sample_size(10);
    for &threads in &[1, 2, 4, 8] {
        if threads <= cpus {
            group.bench_function(format!("{}threads", threads), |b| {
                b.iter_with_setup(
                    || make_builder(10.0, 2.0, threads),
                    |builder| black_box(builder.build().unwrap()),
                );
            });
        }
    }
    group.finish();
}

/// Mesh scaling at all cores.
fn bench_build_mesh_scaling(c: &mut Criterion) {
    let cpus = num_cpus();
    let mut group = c.benchmark_group("build_prem_mesh_scaling");
    group.sample_size(10);
    for &mesh_km in &[50.0, 20.0, 10.0, 5.0] {
        group.bench_function(format!("{}km", mesh_km), |b| {
            b.iter_with_setup(
                || make_builder(mesh_km, 2.0, cpus),
                |builder| black_box(builder.build().unwrap()),
            );
        });
    }
    group.finish();
}

/// Distance search on a prebuilt catalog.
fn bench_search(c: &mut Criterion) {
    let catalog = make_builder(10.0, 2.0, num_cpus()).build().unwrap();
    let phases: Vec<Phase> = ["P", "S", "PcP", "PKIKP", "SKS", "Pdiff"]
        .iter()
        .map(|name| name.parse().unwrap())
        .collect();
    let mut group = c.benchmark_group("search_prem_10km");
    for phase in &phases {
        group.bench_function(phase.to_string(), |b| {
            b.iter(|| {
                black_box(catalog.arrivals(phase, R - 10.0, black_box(120f64.to_radians())))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build_thread_scaling,
    bench_build_mesh_scaling,
    bench_search,
);
criterion_main!(benches);
