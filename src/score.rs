//! Path scoring.
//!
//! A score is an integer priority assigned to a file from its path alone;
//! higher scores are handed to the backend first. The pipeline accepts any
//! [`Scorer`], including plain closures. [`PathScorer`] is the default, driven
//! by configurable [`ScoringRules`]:
//! - directory depth
//! - low-priority directories (tests, vendored code)
//! - test-like file names
//! - generated or minified file suffixes

use serde::{Deserialize, Serialize};

/// Assigns a priority to a path. Must be pure and callable from any worker.
pub trait Scorer: Sync {
    fn score(&self, path: &str) -> i32;
}

impl<F> Scorer for F
where
    F: Fn(&str) -> i32 + Sync,
{
    fn score(&self, path: &str) -> i32 {
        self(path)
    }
}

/// Configurable rules for [`PathScorer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Score of a top-level file with no penalties
    pub base: i32,
    /// Penalty per directory level
    pub depth_penalty: i32,
    /// Cap on the total depth penalty
    pub max_depth_penalty: i32,
    /// Directory names that mark low-priority subtrees
    pub low_priority_dirs: Vec<String>,
    /// Penalty applied once when any directory component is low-priority
    pub low_priority_penalty: i32,
    /// File-name fragments marking tests (`_test.`, `.spec.`)
    pub test_markers: Vec<String>,
    pub test_penalty: i32,
    /// File-name suffixes of generated or minified output
    pub generated_suffixes: Vec<String>,
    pub generated_penalty: i32,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base: 100,
            depth_penalty: 1,
            max_depth_penalty: 10,
            low_priority_dirs: strings(&[
                "test",
                "tests",
                "testdata",
                "__tests__",
                "spec",
                "fixtures",
                "vendor",
                "third_party",
                "thirdparty",
                "external",
                "node_modules",
            ]),
            low_priority_penalty: 20,
            test_markers: strings(&["_test.", ".test.", ".spec.", "test_"]),
            test_penalty: 10,
            generated_suffixes: strings(&[
                ".min.js",
                ".min.css",
                ".map",
                ".pb.go",
                "_pb2.py",
                ".pb.h",
                ".pb.cc",
                ".lock",
                ".snap",
                ".svg",
            ]),
            generated_penalty: 40,
        }
    }
}

/// Default rule-based scorer
#[derive(Debug, Clone, Default)]
pub struct PathScorer {
    rules: ScoringRules,
}

impl PathScorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Number of directories above the file
    pub fn path_depth(path: &str) -> usize {
        path.split('/')
            .filter(|c| !c.is_empty())
            .count()
            .saturating_sub(1)
    }

    fn depth_penalty(&self, depth: usize) -> i32 {
        let depth = i32::try_from(depth).unwrap_or(i32::MAX);
        depth
            .saturating_mul(self.rules.depth_penalty)
            .min(self.rules.max_depth_penalty)
    }

    fn in_low_priority_dir(&self, path: &str) -> bool {
        let mut components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        components.pop();
        components.iter().any(|dir| {
            self.rules
                .low_priority_dirs
                .iter()
                .any(|low| low.eq_ignore_ascii_case(dir))
        })
    }
}

impl Scorer for PathScorer {
    fn score(&self, path: &str) -> i32 {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
        let mut score = self.rules.base;

        score -= self.depth_penalty(Self::path_depth(path));

        if self.in_low_priority_dir(path) {
            score -= self.rules.low_priority_penalty;
        }

        if self.rules.test_markers.iter().any(|m| file_name.contains(m.as_str())) {
            score -= self.rules.test_penalty;
        }

        if self
            .rules
            .generated_suffixes
            .iter()
            .any(|s| file_name.ends_with(s.as_str()))
        {
            score -= self.rules.generated_penalty;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_depth() {
        assert_eq!(PathScorer::path_depth("main.rs"), 0);
        assert_eq!(PathScorer::path_depth("src/main.rs"), 1);
        assert_eq!(PathScorer::path_depth("vendor/lib/src/x.c"), 3);
    }

    #[test]
    fn test_shallow_beats_deep() {
        let scorer = PathScorer::default();
        assert!(scorer.score("main.rs") > scorer.score("src/a/b/main.rs"));
    }

    #[test]
    fn test_depth_penalty_is_capped() {
        let scorer = PathScorer::default();
        let deep = "a/b/c/d/e/f/g/h/i/j/k/l/m/n/o/file.c";
        let deeper = "a/b/c/d/e/f/g/h/i/j/k/l/m/n/o/p/q/r/file.c";
        assert_eq!(scorer.score(deep), scorer.score(deeper));
        assert_eq!(scorer.score(deep), 100 - 10);
    }

    #[test]
    fn test_low_priority_dirs() {
        let scorer = PathScorer::default();
        assert!(scorer.score("src/lib/x.c") > scorer.score("vendor/lib/x.c"));
        assert!(scorer.score("src/parser.go") > scorer.score("src/testdata/parser.go"));
        // Only directories count, not the file name itself
        assert_eq!(scorer.score("src/vendor"), scorer.score("src/other"));
    }

    #[test]
    fn test_tests_and_generated_files() {
        let scorer = PathScorer::default();
        assert!(scorer.score("pkg/server.go") > scorer.score("pkg/server_test.go"));
        assert!(scorer.score("web/app.js") > scorer.score("web/app.min.js"));
        assert!(scorer.score("api/api.go") > scorer.score("api/api.pb.go"));
    }

    #[test]
    fn test_custom_rules() {
        let scorer = PathScorer::new(ScoringRules {
            base: 0,
            depth_penalty: 5,
            max_depth_penalty: 100,
            ..ScoringRules::default()
        });
        assert_eq!(scorer.score("a/b/c.rs"), -10);
    }

    #[test]
    fn test_closure_scorer() {
        let scorer = |path: &str| path.len() as i32;
        assert_eq!(Scorer::score(&scorer, "abcd"), 4);
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rules: ScoringRules = serde_json::from_str(r#"{"base": 50}"#).unwrap();
        assert_eq!(rules.base, 50);
        assert_eq!(rules.depth_penalty, 1);
        assert!(rules.low_priority_dirs.contains(&"vendor".to_string()));
    }
}
