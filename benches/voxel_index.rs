use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dsk_engine::plate_set::{ellipsoid_plate_set, PlateSetData};
use dsk_engine::query::{intercept, nearest_point};
use dsk_engine::voxel_index::build_spatial_index;
use dsk_engine::IndexConfig;
use glam::DVec3;

const MARS_RADII: (f64, f64, f64) = (3396.19, 3396.19, 3376.20);

fn mars(nlon: usize, nlat: usize) -> PlateSetData {
    let (a, b, c) = MARS_RADII;
    ellipsoid_plate_set(a, b, c, nlon, nlat).expect("ellipsoid tessellation")
}

/// Capacities for models past the default limits (~130k plates)
fn large_model_config() -> IndexConfig {
    IndexConfig {
        work_size: 20_000_000,
        voxel_pointer_capacity: 5_000_000,
        voxel_list_capacity: 25_000_000,
        integer_capacity: 50_000_000,
        ..IndexConfig::default()
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_spatial_index");
    let cases = [
        (20, 10, IndexConfig::default()),
        (100, 50, IndexConfig::default()),
        (360, 180, large_model_config()),
    ];
    for (nlon, nlat, config) in cases {
        let plates = mars(nlon, nlat);
        assert!(
            build_spatial_index(&plates, &config).is_ok(),
            "{}x{} model must build before timing",
            nlon,
            nlat
        );
        group.bench_with_input(
            BenchmarkId::from_parameter(plates.plates.len()),
            &plates,
            |b, plates| b.iter(|| build_spatial_index(black_box(plates), &config)),
        );
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let plates = mars(360, 180);
    let index = build_spatial_index(&plates, &large_model_config()).expect("spatial index");

    let vertex = DVec3::new(10_000.0, 2_000.0, 1_500.0);
    let direction = DVec3::new(-1.0, -0.15, -0.1);
    c.bench_function("intercept", |b| {
        b.iter(|| intercept(&plates, &index, black_box(vertex), black_box(direction)))
    });

    let point = DVec3::new(4_000.0, -1_000.0, 2_500.0);
    c.bench_function("nearest_point", |b| {
        b.iter(|| nearest_point(&plates, &index, black_box(point)))
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
