//! Git repositories built on disk for integration tests.
#![allow(dead_code)]

use git2::{Oid, Repository, Signature};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const BLOB: i32 = 0o100644;
const TREE: i32 = 0o040000;
const GITLINK: i32 = 0o160000;

/// One tree entry to write: a file with content or a submodule pin
pub enum Node<'a> {
    File(&'a str),
    Gitlink(Oid),
}

/// Write a tree from `(path, node)` pairs, creating directories from `/`
pub fn write_tree(repo: &Repository, entries: &[(&str, Node<'_>)]) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    let mut dirs: BTreeMap<&str, Vec<(&str, Node<'_>)>> = BTreeMap::new();

    for (path, node) in entries {
        match path.split_once('/') {
            Some((dir, rest)) => {
                let node = match node {
                    Node::File(content) => Node::File(*content),
                    Node::Gitlink(oid) => Node::Gitlink(*oid),
                };
                dirs.entry(dir).or_default().push((rest, node));
            }
            None => match node {
                Node::File(content) => {
                    let blob = repo.blob(content.as_bytes()).unwrap();
                    builder.insert(*path, blob, BLOB).unwrap();
                }
                Node::Gitlink(oid) => {
                    builder.insert(*path, *oid, GITLINK).unwrap();
                }
            },
        }
    }

    for (dir, sub) in dirs {
        let oid = write_tree(repo, &sub);
        builder.insert(dir, oid, TREE).unwrap();
    }
    builder.write().unwrap()
}

/// Commit `tree` onto `refname` and return the commit id
pub fn commit(repo: &Repository, refname: &str, tree: Oid) -> Oid {
    let tree = repo.find_tree(tree).unwrap();
    let sig = Signature::now("indexer", "indexer@example.com").unwrap();
    let parent = repo
        .find_reference(refname)
        .ok()
        .and_then(|r| r.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some(refname), &sig, &sig, "commit", &tree, &parents)
        .unwrap()
}

fn files<'a>(files: &[(&'a str, &'a str)]) -> Vec<(&'a str, Node<'a>)> {
    files
        .iter()
        .map(|&(path, content)| (path, Node::File(content)))
        .collect()
}

/// Bare repository at `path` with `files` committed on `main` (also HEAD)
pub fn bare_repo(path: &Path, contents: &[(&str, &str)]) -> Oid {
    let repo = Repository::init_bare(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    let tree = write_tree(&repo, &files(contents));
    commit(&repo, "refs/heads/main", tree)
}

/// Add a commit with `contents` on `branch` of an existing repository
pub fn add_branch(path: &Path, branch: &str, contents: &[(&str, &str)]) -> Oid {
    let repo = Repository::open(path).unwrap();
    let tree = write_tree(&repo, &files(contents));
    commit(&repo, &format!("refs/heads/{}", branch), tree)
}

/// Working-tree repository at `path` whose `main` pins `sub_path` at `sub_commit`,
/// with the matching `.gitmodules` both committed and checked out
pub fn repo_with_submodule(
    path: &Path,
    contents: &[(&str, &str)],
    sub_name: &str,
    sub_path: &str,
    sub_commit: Oid,
) -> Oid {
    let repo = Repository::init(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();

    let gitmodules = format!(
        "[submodule \"{}\"]\n\tpath = {}\n\turl = ../{}\n",
        sub_name, sub_path, sub_name
    );
    fs::write(path.join(".gitmodules"), &gitmodules).unwrap();

    let mut entries = files(contents);
    entries.push((".gitmodules", Node::File(&gitmodules)));
    entries.push((sub_path, Node::Gitlink(sub_commit)));
    let tree = write_tree(&repo, &entries);
    commit(&repo, "refs/heads/main", tree)
}

/// Working-tree repository at `path` with `files` committed on `main`
pub fn work_repo(path: &Path, contents: &[(&str, &str)]) -> Oid {
    fs::create_dir_all(path).unwrap();
    let repo = Repository::init(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    let tree = write_tree(&repo, &files(contents));
    commit(&repo, "refs/heads/main", tree)
}

/// Write a JSON index config naming `repos` as `(path, name)` pairs
pub fn write_config(dir: &Path, name: &str, repos: &[(PathBuf, &str)]) -> PathBuf {
    let repos: Vec<_> = repos
        .iter()
        .map(|(path, repo)| {
            serde_json::json!({
                "path": path,
                "name": repo,
                "revisions": ["HEAD"],
            })
        })
        .collect();
    let config = serde_json::json!({ "name": name, "repositories": repos });
    let path = dir.join("index.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}
