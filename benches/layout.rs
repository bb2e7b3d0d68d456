use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sankey_layout::layout::{Accessors, LayoutParams, NodeSort, Orientation, compute_sankey_layout};
use sankey_layout::parser::parse_sankey;
use std::hint::black_box;

/// `layers` columns of `width` nodes; every node feeds the next column's
/// node at the same row, plus `cross_links` diagonal links per column.
fn dense_sankey_source(layers: usize, width: usize, cross_links: usize) -> String {
    let mut out = String::from("sankey-beta\n");
    for layer in 0..layers.saturating_sub(1) {
        for row in 0..width {
            let value = 5 + (row * 7 + layer * 3) % 40;
            out.push_str(&format!("L{layer}N{row},L{}N{row},{value}\n", layer + 1));
        }
        for k in 0..cross_links.min(width * width) {
            let (from, to) = (k % width, (k / width + k + 1) % width);
            if from == to {
                continue;
            }
            out.push_str(&format!("L{layer}N{from},L{}N{to},{}\n", layer + 1, 1 + k % 9));
        }
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (layers, width, cross) in [(4usize, 8usize, 8usize), (8, 20, 40), (12, 40, 120)] {
        let name = format!("sankey_{layers}x{width}_{cross}");
        let input = dense_sankey_source(layers, width, cross);
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let parsed = parse_sankey(black_box(data)).expect("parse failed");
                black_box(parsed.data.links.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let accessors = Accessors::default();
    let horizontal = LayoutParams::default();
    let vertical = LayoutParams {
        orientation: Orientation::Vertical,
        spacing_increase: 2.0,
        ..LayoutParams::default()
    };
    let input_order = LayoutParams {
        node_sort: NodeSort::InputOrder,
        ..LayoutParams::default()
    };

    for (layers, width, cross) in [(4usize, 8usize, 8usize), (8, 20, 40), (12, 40, 120)] {
        let name = format!("sankey_{layers}x{width}_{cross}");
        let parsed = parse_sankey(&dense_sankey_source(layers, width, cross)).expect("parse failed");
        for (mode, params) in [
            ("horizontal", &horizontal),
            ("vertical", &vertical),
            ("input_order", &input_order),
        ] {
            group.bench_with_input(BenchmarkId::new(mode, &name), &parsed.data, |b, data| {
                b.iter(|| {
                    let layout = compute_sankey_layout(black_box(data), params, &accessors)
                        .expect("layout failed");
                    black_box(layout.nodes.len());
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_layout);
criterion_main!(benches);
