use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hicvis_core::geometry::clip_ring;
use hicvis_core::{Bounds, ClipRegion, Histogram, Point, Polygon, Transform};

/// Hexagonal cells on a grid, some straddling the view edge.
fn generate_cells(count: usize) -> Vec<Polygon> {
    let side = (count as f64).sqrt().ceil() as usize;
    let mut cells = Vec::with_capacity(count);

    for i in 0..count {
        let cx = (i % side) as f64 * 10.0 - 20.0;
        let cy = (i / side) as f64 * 10.0 - 20.0;
        let points = (0..6)
            .map(|k| {
                let a = k as f64 * std::f64::consts::PI / 3.0;
                Point::new(cx + 6.0 * a.cos(), cy + 6.0 * a.sin())
            })
            .collect();
        cells.push(Polygon {
            points,
            area: 93.5,
            clipped: i % 17 == 0,
            centroid: Point::new(cx, cy),
            data_point: Point::new(cx, cy),
        });
    }
    cells
}

fn bench_rectangle_clip(c: &mut Criterion) {
    let cells = generate_cells(10_000);
    let region = ClipRegion::rectangle(&Bounds::new(0.0, 800.0, 0.0, 800.0));

    c.bench_function("clip_rectangle_10k", |b| {
        b.iter(|| {
            let kept = cells
                .iter()
                .map(|p| clip_ring(black_box(&p.points), &region))
                .filter(|r| r.len() >= 3)
                .count();
            black_box(kept)
        })
    });
}

fn bench_diagonal_clip(c: &mut Criterion) {
    let mut group = c.benchmark_group("clip_diagonal");

    for count in [1_000usize, 10_000, 50_000] {
        let cells = generate_cells(count);
        let region = ClipRegion::diagonal(&Bounds::new(0.0, 2000.0, 0.0, 2000.0));
        group.bench_with_input(BenchmarkId::from_parameter(count), &cells, |b, cells| {
            b.iter(|| {
                for p in cells {
                    black_box(p.clip(&region));
                    black_box(p.mirrored().clip(&region));
                }
            })
        });
    }

    group.finish();
}

fn bench_area_histogram(c: &mut Criterion) {
    let cells = generate_cells(50_000);
    c.bench_function("area_histogram_50k", |b| {
        b.iter(|| {
            let h = Histogram::build(
                cells.iter().filter(|p| !p.clipped).map(|p| p.area),
                black_box(700),
                Transform::Ln,
            );
            black_box(h)
        })
    });
}

criterion_group!(benches, bench_rectangle_clip, bench_diagonal_clip, bench_area_histogram);
criterion_main!(benches);
