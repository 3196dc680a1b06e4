use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sekisho_core::analysis::AnalysisEngine;
use sekisho_core::config::{Config, Settings};
use sekisho_core::exports::ExportMapRegistry;
use sekisho_core::fs::MemoryFileSystem;
use sekisho_core::parser::ParsedFile;

const ROOT: &str = "/bench/src";

/// `m0.js` re-exports everything from `m1.js`, and so on; only the last module
/// declares `target`.
fn export_star_chain(fs: &MemoryFileSystem, length: usize) -> PathBuf {
    for i in 0..length {
        let content = if i + 1 == length {
            "export const target = 1;\nexport default target;\n".to_string()
        } else {
            format!("export const own{i} = {i};\nexport * from './m{next}.js';\n", next = i + 1)
        };
        fs.write(format!("{ROOT}/m{i}.js"), content);
    }
    PathBuf::from(format!("{ROOT}/m0.js"))
}

/// A barrel exporting `width` leaf modules of 20 names each.
fn wide_barrel(fs: &MemoryFileSystem, width: usize) -> PathBuf {
    let mut index = String::new();
    for i in 0..width {
        let mut leaf = String::new();
        for j in 0..20 {
            leaf.push_str(&format!("export function fn{i}_{j}() {{ return {j}; }}\n"));
        }
        fs.write(format!("{ROOT}/leaf{i}.js"), leaf);
        index.push_str(&format!("export * from './leaf{i}.js';\n"));
    }
    fs.write(format!("{ROOT}/index.js"), index);
    PathBuf::from(format!("{ROOT}/index.js"))
}

fn registry_over(fs: Rc<MemoryFileSystem>) -> ExportMapRegistry {
    ExportMapRegistry::with_file_system(Settings::default(), fs)
}

fn bench_deep_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_lookup");

    for length in [2, 10, 50] {
        let fs = Rc::new(MemoryFileSystem::new());
        let entry = export_star_chain(&fs, length);
        let registry = registry_over(fs);
        let Some(head) = registry.load(&entry) else {
            panic!("chain head should load");
        };

        group.bench_with_input(BenchmarkId::new("export_star_chain", length), &length, |b, _| {
            b.iter(|| black_box(head.has_deep(black_box("target"), &registry).found))
        });
        group.bench_with_input(BenchmarkId::new("missing_name", length), &length, |b, _| {
            b.iter(|| black_box(head.has_deep(black_box("absent"), &registry).found))
        });
    }

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    let fs = Rc::new(MemoryFileSystem::new());
    let index = wide_barrel(&fs, 25);
    group.throughput(Throughput::Elements(25));

    group.bench_function("cold_all_exports", |b| {
        b.iter(|| {
            let registry = registry_over(Rc::clone(&fs));
            let map = registry.load(&index);
            black_box(map.map(|map| map.all_exports(&registry).len()))
        })
    });

    let warm = registry_over(Rc::clone(&fs));
    warm.load(&index);
    group.bench_function("cached_load", |b| {
        b.iter(|| black_box(warm.load(black_box(Path::new(&index)))))
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let fs = Rc::new(MemoryFileSystem::new());
    wide_barrel(&fs, 10);
    export_star_chain(&fs, 10);

    let mut code = String::from("import * as chain from './m0.js';\nimport target from './m9.js';\n");
    for i in 0..10 {
        code.push_str(&format!("import {{ fn{i}_0, fn{i}_19 }} from './index.js';\n"));
    }
    code.push_str("export const total = chain.target + target;\n");
    let file = ParsedFile::from_source(&format!("{ROOT}/main.js"), &code);

    let config = Config::default();
    let engine = AnalysisEngine::with_exports(&config, registry_over(Rc::clone(&fs)));
    group.bench_function("import_rules_warm_cache", |b| {
        b.iter(|| black_box(engine.analyze(black_box(&file))))
    });

    group.bench_function("import_rules_cold_cache", |b| {
        b.iter(|| {
            engine.clear_cache();
            black_box(engine.analyze(black_box(&file)))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_deep_lookup, bench_registry, bench_analysis);
criterion_main!(benches);
