#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};

use drive_curator_core::config::{CategorySpec, TaxonomyConfig};
use drive_curator_core::operator::{Operator, ReviewDecision};
use drive_curator_core::remote::{MoveRequest, RemoteEntry, RemoteError, RemoteFs};
use drive_curator_core::storage::models::{
    Candidate, ClassificationRecord, ClassificationStatus, FileRecord,
};
use drive_curator_core::storage::Database;
use drive_curator_core::taxonomy::Taxonomy;

pub fn make_file(fsid: i64, path: &str, size: i64, hash: &str, mtime: i64) -> FileRecord {
    FileRecord::new(fsid, path, size, false, hash, mtime)
}

pub fn make_dir(fsid: i64, path: &str) -> FileRecord {
    FileRecord::new(fsid, path, 0, true, "", 0)
}

pub fn category(
    name: &str,
    keywords: &[&str],
    frozen: bool,
    children: Vec<CategorySpec>,
) -> CategorySpec {
    CategorySpec {
        name: name.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        frozen,
        children,
    }
}

/// A small target tree shared by most tests.
pub fn sample_taxonomy() -> Taxonomy {
    Taxonomy::from_config(&TaxonomyConfig {
        categories: vec![
            category(
                "Health",
                &[],
                false,
                vec![
                    category("Fitness", &["fitness", "workout"], false, vec![]),
                    category("Nutrition", &["nutrition", "diet"], false, vec![]),
                ],
            ),
            category(
                "Media",
                &[],
                false,
                vec![category("Photography", &["photography"], false, vec![])],
            ),
            category("Vault", &["vault"], true, vec![]),
        ],
    })
}

pub fn pending(source: &str, target: &str, confidence: f64) -> ClassificationRecord {
    ClassificationRecord {
        source_path: source.to_string(),
        target_path: target.to_string(),
        confidence,
        rule_name: "directory_mapping".to_string(),
        reason: String::new(),
        alternatives: Vec::<Candidate>::new(),
        file_count: 1,
        total_size: 100,
        status: ClassificationStatus::Pending,
    }
}

pub fn classification_status(db: &Database, source: &str) -> ClassificationStatus {
    db.classifications(None, None)
        .unwrap()
        .into_iter()
        .find(|c| c.source_path == source)
        .map(|c| c.status)
        .unwrap_or_else(|| panic!("no classification for {}", source))
}

/// In-memory remote tree with real move semantics: moving a directory
/// rewrites every descendant path, so chained moves and rollbacks behave
/// like the provider. Failure injection covers batch outages and
/// per-path delete errors.
pub struct MockRemote {
    pub paths: RefCell<BTreeSet<String>>,
    /// When set, any delete call with more than one item fails outright,
    /// forcing the per-item fallback.
    pub fail_multi_item_deletes: Cell<bool>,
    /// Deleting any of these paths always fails.
    pub poison_paths: RefCell<BTreeSet<String>>,
    /// Every remote call, for asserting call shapes.
    pub calls: RefCell<Vec<String>>,
}

impl MockRemote {
    pub fn new(initial: &[&str]) -> Self {
        Self {
            paths: RefCell::new(initial.iter().map(|s| s.to_string()).collect()),
            fail_multi_item_deletes: Cell::new(false),
            poison_paths: RefCell::new(BTreeSet::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.borrow().contains(path)
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.paths.borrow().clone()
    }

    pub fn poison(&self, path: &str) {
        self.poison_paths.borrow_mut().insert(path.to_string());
    }
}

impl RemoteFs for MockRemote {
    fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        Ok(self
            .paths
            .borrow()
            .iter()
            .filter(|p| {
                p.starts_with(&prefix) && !p[prefix.len()..].contains('/')
            })
            .map(|p| RemoteEntry {
                fsid: 0,
                path: p.clone(),
                size: 0,
                is_dir: false,
                content_hash: String::new(),
                server_mtime: 0,
            })
            .collect())
    }

    fn create_directory(&self, path: &str) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(format!("mkdir {}", path));
        let mut paths = self.paths.borrow_mut();
        if paths.contains(path) {
            return Err(RemoteError::AlreadyExists(path.to_string()));
        }
        paths.insert(path.to_string());
        Ok(())
    }

    fn move_or_rename(&self, requests: &[MoveRequest]) -> Result<(), RemoteError> {
        for request in requests {
            self.calls
                .borrow_mut()
                .push(format!("move {} -> {}", request.path, request.final_path()));
            let mut paths = self.paths.borrow_mut();
            let source = &request.path;
            let prefix = format!("{}/", source);
            let affected: Vec<String> = paths
                .iter()
                .filter(|p| *p == source || p.starts_with(&prefix))
                .cloned()
                .collect();
            if affected.is_empty() {
                return Err(RemoteError::NotFound(source.clone()));
            }
            let new_base = request.final_path();
            for old in affected {
                paths.remove(&old);
                paths.insert(format!("{}{}", new_base, &old[source.len()..]));
            }
        }
        Ok(())
    }

    fn delete_batch(&self, to_delete: &[String]) -> Result<(), RemoteError> {
        self.calls
            .borrow_mut()
            .push(format!("delete {}", to_delete.len()));
        if self.fail_multi_item_deletes.get() && to_delete.len() > 1 {
            return Err(RemoteError::Transport("simulated batch outage".to_string()));
        }
        for path in to_delete {
            if self.poison_paths.borrow().contains(path) {
                return Err(RemoteError::Api {
                    code: 2,
                    message: format!("cannot delete {}", path),
                });
            }
        }
        let mut paths = self.paths.borrow_mut();
        for path in to_delete {
            let prefix = format!("{}/", path);
            let affected: Vec<String> = paths
                .iter()
                .filter(|p| *p == path || p.starts_with(&prefix))
                .cloned()
                .collect();
            for p in affected {
                paths.remove(&p);
            }
        }
        Ok(())
    }
}

/// Plays back a fixed decision sequence; runs out as Quit.
pub struct ScriptedOperator {
    pub confirm_answer: bool,
    decisions: RefCell<VecDeque<ReviewDecision>>,
}

impl ScriptedOperator {
    pub fn new(confirm_answer: bool, decisions: &[ReviewDecision]) -> Self {
        Self {
            confirm_answer,
            decisions: RefCell::new(decisions.iter().copied().collect()),
        }
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&self, _prompt: &str) -> bool {
        self.confirm_answer
    }

    fn review(
        &self,
        _item: &ClassificationRecord,
        _position: usize,
        _total: usize,
    ) -> ReviewDecision {
        self.decisions
            .borrow_mut()
            .pop_front()
            .unwrap_or(ReviewDecision::Quit)
    }
}
