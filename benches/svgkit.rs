//! SvgKit scene assembly benchmarks
//!
//! Run with: cargo bench -p svgkit-bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use svgkit_bench::{generate_filtered, generate_nested, generate_shapes};
use svgkit_dom::Document;
use svgkit_svg::{assemble, extract_transforms, parse_length, Axis, Viewport};

fn xml_parsing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml_parsing");

    for count in [100, 1000] {
        let svg = generate_shapes(count);
        group.throughput(Throughput::Bytes(svg.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", count), &svg, |b, svg| {
            b.iter(|| Document::parse_xml(svg))
        });
    }

    group.finish();
}

fn assembly_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");

    for count in [100, 1000, 5000] {
        let doc = Document::parse_xml(&generate_shapes(count)).expect("fixture parses");
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("shapes", count), &doc, |b, doc| {
            b.iter(|| assemble(doc))
        });
    }

    // Deep cascade
    let doc = Document::parse_xml(&generate_nested(200)).expect("fixture parses");
    group.bench_function("nested_200", |b| b.iter(|| assemble(&doc)));

    // Filter graphs on every instance
    let doc = Document::parse_xml(&generate_filtered(500)).expect("fixture parses");
    group.bench_function("filtered_use_500", |b| b.iter(|| assemble(&doc)));

    group.finish();
}

fn value_parsing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("values");
    let viewport = Viewport::new(800.0, 600.0);

    group.bench_function("lengths", |b| {
        b.iter(|| {
            ["12", "1.5em", "25%", "3in", "-0", "10vmin"]
                .iter()
                .map(|s| parse_length(s, Axis::Diagonal, &viewport))
                .sum::<f32>()
        })
    });

    group.bench_function("transforms", |b| {
        b.iter(|| extract_transforms("translate(10, 20) rotate(45 5 5) scale(2, 2) skewX(10)", &viewport))
    });

    group.finish();
}

criterion_group!(
    benches,
    xml_parsing_benchmarks,
    assembly_benchmarks,
    value_parsing_benchmarks
);
criterion_main!(benches);
