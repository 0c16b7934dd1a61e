//! Scratch and canonical file names, and the rename that promotes one to the other.
//!
//! Every worker writes under names keyed by its own identity, so two workers running
//! the same task never touch each other's files. Only an accepted completion renames
//! scratch output to the canonical name.

use log::{trace, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{TaskId, TaskKind, WorkerId};

pub fn map_scratch(task: TaskId, reduce: usize, worker: WorkerId) -> String {
    format!("mr-{}-{}-{}", task, reduce, worker)
}

pub fn map_output(task: TaskId, reduce: usize) -> String {
    format!("mr-{}-{}", task, reduce)
}

pub fn reduce_scratch(task: TaskId, worker: WorkerId) -> String {
    format!("mr-out-{}-{}", task, worker)
}

pub fn reduce_output(task: TaskId) -> String {
    format!("mr-out-{}", task)
}

/// (scratch, canonical) pairs a completed task promotes.
fn renames(kind: TaskKind, task: TaskId, worker: WorkerId, nreduce: usize) -> Vec<(String, String)> {
    match kind {
        TaskKind::Map => (0..nreduce)
            .map(|r| (map_scratch(task, r, worker), map_output(task, r)))
            .collect(),
        TaskKind::Reduce => vec![(reduce_scratch(task, worker), reduce_output(task))],
    }
}

/// Renames the scratch output of `worker` for `task` to its canonical names in `dir`.
///
/// Returns the canonical paths that were written. A missing scratch file is logged
/// and skipped; the remaining partitions are still promoted.
pub fn commit(
    dir: &Path,
    kind: TaskKind,
    task: TaskId,
    worker: WorkerId,
    nreduce: usize,
) -> Vec<PathBuf> {
    let mut committed = Vec::new();
    for (from, to) in renames(kind, task, worker, nreduce) {
        let (from, to) = (dir.join(from), dir.join(to));
        match fs::rename(&from, &to) {
            Ok(()) => {
                trace!("commit {:?} -> {:?}", from, to);
                committed.push(to);
            }
            Err(e) => warn!("commit {:?} -> {:?} failed: {}", from, to, e),
        }
    }
    committed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn names() {
        assert_eq!(map_scratch(1, 2, 3), "mr-1-2-3");
        assert_eq!(map_output(1, 2), "mr-1-2");
        assert_eq!(reduce_scratch(4, 9), "mr-out-4-9");
        assert_eq!(reduce_output(4), "mr-out-4");
    }

    #[test]
    fn map_commit_promotes_every_partition() {
        let dir = TempDir::new().unwrap();
        for r in 0..3 {
            fs::write(dir.path().join(map_scratch(0, r, 7)), format!("p{}", r)).unwrap();
        }
        // Another worker's copy of the same task stays where it is.
        fs::write(dir.path().join(map_scratch(0, 0, 8)), "other").unwrap();

        let out = commit(dir.path(), TaskKind::Map, 0, 7, 3);
        assert_eq!(out.len(), 3);
        for r in 0..3 {
            let s = fs::read_to_string(dir.path().join(map_output(0, r))).unwrap();
            assert_eq!(s, format!("p{}", r));
            assert!(!dir.path().join(map_scratch(0, r, 7)).exists());
        }
        assert!(dir.path().join(map_scratch(0, 0, 8)).exists());
    }

    #[test]
    fn reduce_commit_renames_one_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(reduce_scratch(2, 5)), "a 1\n").unwrap();

        let out = commit(dir.path(), TaskKind::Reduce, 2, 5, 10);
        assert_eq!(out, vec![dir.path().join("mr-out-2")]);
        assert_eq!(fs::read_to_string(&out[0]).unwrap(), "a 1\n");
    }

    #[test]
    fn missing_scratch_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(map_scratch(3, 1, 0)), "").unwrap();

        let out = commit(dir.path(), TaskKind::Map, 3, 0, 2);
        assert_eq!(out, vec![dir.path().join(map_output(3, 1))]);
        assert!(!dir.path().join(map_output(3, 0)).exists());
    }
}
