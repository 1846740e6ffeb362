//! Performance benchmarks for the walk-sort-handoff pipeline
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gitidx::backend::{BackendConfig, CodeIndex, TreeId};
use gitidx::config::RepoSpec;
use gitidx::index::sort::locality_sort;
use gitidx::index::{FileRecord, GitIndexer, WalkBatch};
use gitidx::metrics::Metrics;
use gitidx::score::{PathScorer, Scorer};
use gitidx::store::{MemoryRepo, MemoryStore, ObjectId, TreeSpec};
use std::path::Path;
use std::sync::Arc;

/// `count` repositories with a few dozen files spread over nested directories
fn create_benchmark_repos(count: usize) -> (MemoryStore, Vec<RepoSpec>) {
    let mut store = MemoryStore::new();
    let mut repos = Vec::with_capacity(count);

    for r in 0..count {
        let mut spec = TreeSpec::new().file("README.md", format!("repo {}\n", r));
        for d in 0..4 {
            for f in 0..8 {
                let content = format!(
                    "// repo {r} dir {d} file {f}\nfn function_{f}() {{\n    let x = {f} * 2;\n}}\n"
                );
                spec = spec.file(&format!("src/mod{}/file_{}.rs", d, f), content);
            }
            spec = spec.file(&format!("tests/mod{}_test.rs", d), "#[test]\nfn t() {}\n");
        }

        let mut repo = MemoryRepo::new();
        repo.commit_tree("refs/heads/main", &spec);
        let path = format!("/bench/repo{}", r);
        store.insert(path.as_str(), repo);
        repos.push(RepoSpec::new(path, format!("repo{}", r)).revisions(["main"]));
    }

    (store, repos)
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for count in [8, 64, 256] {
        let (store, repos) = create_benchmark_repos(count);
        let scorer = PathScorer::default();

        group.bench_with_input(BenchmarkId::new("index", count), &repos, |b, repos| {
            b.iter(|| {
                let metrics = Metrics::new();
                let mut index = CodeIndex::new(BackendConfig::default());
                let summary = GitIndexer::new(&store, &scorer, &metrics)
                    .silent(true)
                    .index(black_box(repos), &mut index)
                    .unwrap();
                black_box(summary)
            })
        });

        group.bench_with_input(BenchmarkId::new("plan", count), &repos, |b, repos| {
            let backend = CodeIndex::default();
            b.iter(|| {
                let metrics = Metrics::new();
                let batch = GitIndexer::new(&store, &scorer, &metrics)
                    .silent(true)
                    .plan(black_box(repos), &backend)
                    .unwrap();
                black_box(batch.file_count())
            })
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let scorer = PathScorer::default();
    let mut batch: WalkBatch<()> = WalkBatch::new();
    let repo = batch.add_repo(());
    let repo_path: Arc<Path> = Arc::from(Path::new("/bench/repo"));

    let files: Vec<FileRecord> = (0..100_000)
        .map(|i| {
            let path = match i % 4 {
                0 => format!("file_{}.rs", i),
                1 => format!("src/a/file_{}.rs", i),
                2 => format!("vendor/lib/file_{}.c", i),
                _ => format!("src/file_{}_test.go", i),
            };
            FileRecord {
                tree: TreeId(0),
                repo_path: repo_path.clone(),
                score: scorer.score(&path),
                path,
                repo,
                blob: ObjectId::default(),
            }
        })
        .collect();

    c.bench_function("locality_sort_100k", |b| {
        b.iter_batched(
            || files.clone(),
            |mut files| {
                locality_sort(&mut files);
                files
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_scoring(c: &mut Criterion) {
    let scorer = PathScorer::default();
    let paths = [
        "README.md",
        "src/index/walker.rs",
        "third_party/zlib/contrib/minizip/unzip.c",
        "web/static/js/app.min.js",
        "pkg/server/handler_test.go",
    ];

    c.bench_function("path_score", |b| {
        b.iter(|| {
            paths
                .iter()
                .map(|p| scorer.score(black_box(p)))
                .sum::<i32>()
        })
    });
}

criterion_group!(benches, bench_pipeline, bench_sort, bench_scoring);
criterion_main!(benches);
