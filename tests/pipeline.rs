//! End-to-end runs of the pipeline against real git repositories.

mod fixtures;

use fixtures::{add_branch, bare_repo, repo_with_submodule, work_repo};
use gitidx::IndexError;
use gitidx::backend::{BackendConfig, CodeIndex, IndexMeta, write_index};
use gitidx::config::{RepoSpec, WalkOptions};
use gitidx::index::GitIndexer;
use gitidx::metrics::Metrics;
use gitidx::score::PathScorer;
use gitidx::store::GitStore;
use tempfile::TempDir;

fn run(repos: &[RepoSpec], options: WalkOptions) -> Result<(CodeIndex, Metrics), IndexError> {
    let store = GitStore::new();
    let scorer = PathScorer::default();
    let metrics = Metrics::new();
    let mut index = CodeIndex::new(BackendConfig::default());
    GitIndexer::new(&store, &scorer, &metrics)
        .options(options)
        .silent(true)
        .index(repos, &mut index)?;
    Ok((index, metrics))
}

fn tree_and_path(index: &CodeIndex) -> Vec<(String, String)> {
    let trees = index.trees();
    index
        .files()
        .iter()
        .map(|f| (trees[f.tree.0 as usize].name.clone(), f.path.clone()))
        .collect()
}

#[test]
fn test_many_repositories_in_score_order() {
    let root = TempDir::new().unwrap();
    let mut repos = Vec::new();
    for i in 0..40 {
        let name = format!("repo{:02}", i);
        let path = root.path().join(format!("{}.git", name));
        let readme = format!("{} readme\n", name);
        let main = format!("// {}\nfn main() {{}}\n", name);
        let test = format!("// {}\n#[test]\nfn works() {{}}\n", name);
        bare_repo(
            &path,
            &[
                ("README.md", &readme),
                ("src/main.rs", &main),
                ("tests/main_test.rs", &test),
            ],
        );
        repos.push(RepoSpec::new(path, name));
    }

    let (index, metrics) = run(&repos, WalkOptions::default()).unwrap();

    assert_eq!(index.files().len(), 120);
    assert_eq!(index.trees().len(), 40);
    assert_eq!(metrics.get("walk.repos"), Some(40));

    let paths = tree_and_path(&index);
    assert!(paths[..40].iter().all(|(_, p)| p == "README.md"));
    assert!(paths[40..80].iter().all(|(_, p)| p == "src/main.rs"));
    assert!(paths[80..].iter().all(|(_, p)| p == "tests/main_test.rs"));

    // Every blob was read through the handle of the repository it came from
    let trees = index.trees();
    for file in index.files() {
        let name = &trees[file.tree.0 as usize].name;
        let content = String::from_utf8(index.content(file.content).unwrap().to_vec()).unwrap();
        assert!(content.contains(name.as_str()), "{} not in {:?}", name, content);
    }
}

#[test]
fn test_revisions_and_versions() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("app.git");
    bare_repo(&path, &[("lib.rs", "pub fn a() {}\n"), ("LICENSE", "MIT\n")]);
    let dev = add_branch(&path, "dev", &[("lib.rs", "pub fn b() {}\n"), ("LICENSE", "MIT\n")]);

    let repos = vec![RepoSpec::new(&path, "app").revisions(["main", "ghost", "dev"])];
    let options = WalkOptions {
        revparse: true,
        ..WalkOptions::default()
    };
    let (index, metrics) = run(&repos, options).unwrap();

    let trees = index.trees();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[1].version, dev.to_string());
    assert_eq!(metrics.get("walk.revisions_skipped"), Some(1));

    assert_eq!(index.files().len(), 4);
    // Both revisions carry the same LICENSE
    assert_eq!(index.content_count(), 3);
    assert_eq!(index.stats().files_deduplicated, 1);
}

#[test]
fn test_order_root_hint() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("mono.git");
    bare_repo(
        &path,
        &[
            ("alpha/a.c", "a"),
            ("beta/b.c", "b"),
            ("gamma/c.c", "c"),
            ("gamma/alpha/d.c", "d"),
        ],
    );

    let repos = vec![RepoSpec::new(&path, "mono").order_root("gamma beta")];
    let (index, _) = run(&repos, WalkOptions::default()).unwrap();

    let paths: Vec<_> = index.files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["gamma/c.c", "beta/b.c", "alpha/a.c", "gamma/alpha/d.c"]
    );
}

#[test]
fn test_submodule_contents_indexed() {
    let root = TempDir::new().unwrap();
    let top = root.path().join("top");
    let sub_commit = work_repo(&top.join("vendor/lib"), &[("src/x.c", "int x;\n")]);
    repo_with_submodule(&top, &[("main.c", "int main;\n")], "lib", "vendor/lib", sub_commit);

    let repos = vec![RepoSpec::new(&top, "top").walk_submodules(true)];
    let (index, metrics) = run(&repos, WalkOptions::default()).unwrap();

    let files = tree_and_path(&index);
    assert!(files.contains(&("top".to_string(), "main.c".to_string())));
    assert!(files.contains(&("lib".to_string(), "src/x.c".to_string())));
    assert_eq!(metrics.get("walk.submodules"), Some(1));

    let lib = index.trees().into_iter().find(|t| t.name == "lib").unwrap();
    assert_eq!(lib.version, sub_commit.to_string());
    assert!(lib.metadata.is_empty());
}

#[test]
fn test_submodule_in_bare_repository_is_skipped() {
    let root = TempDir::new().unwrap();
    let top = root.path().join("top.git");

    // A gitlink in a bare repository has no working tree to resolve its name
    let repo = git2::Repository::init_bare(&top).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    let pinned = git2::Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
    let tree = fixtures::write_tree(
        &repo,
        &[
            ("main.c", fixtures::Node::File("int main;\n")),
            ("lib", fixtures::Node::Gitlink(pinned)),
        ],
    );
    fixtures::commit(&repo, "refs/heads/main", tree);

    let repos = vec![RepoSpec::new(&top, "top").walk_submodules(true)];
    let (index, metrics) = run(&repos, WalkOptions::default()).unwrap();

    assert_eq!(tree_and_path(&index), vec![("top".to_string(), "main.c".to_string())]);
    assert_eq!(metrics.get("walk.submodules_skipped"), Some(1));
}

#[test]
fn test_missing_repository_aborts_run() {
    let root = TempDir::new().unwrap();
    let good = root.path().join("good.git");
    bare_repo(&good, &[("a", "a")]);

    let repos = vec![
        RepoSpec::new(&good, "good"),
        RepoSpec::new(root.path().join("missing.git"), "missing"),
    ];
    let err = run(&repos, WalkOptions::default()).unwrap_err();

    assert!(matches!(err, IndexError::OpenRepository { .. }));
    let store_err = err.store_error().unwrap();
    assert!(!store_err.message.is_empty());
}

#[test]
fn test_written_index_round_trips_metadata() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("small.git");
    bare_repo(&path, &[("a.txt", "hello\n"), ("b.txt", "world\n")]);

    let (index, _) = run(&[RepoSpec::new(&path, "small")], WalkOptions::default()).unwrap();
    let out = root.path().join("out");
    let written = write_index(&index, "small", &out).unwrap();
    let loaded = IndexMeta::load(&out).unwrap();

    assert_eq!(written, loaded);
    assert_eq!(loaded.file_count, 2);
    assert_eq!(loaded.tree_count, 1);
}
