use std::collections::BTreeMap;
use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use fnv::FnvHasher;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use tarpc::{client, context, tokio_serde::formats::Json};

use crate::commit::{map_output, map_scratch, reduce_scratch};
use crate::{AskRequest, Assignment, ServiceClient, TaskId, WorkerId};

pub type MapFn = fn(&Path, &str) -> Vec<(String, String)>;
pub type ReduceFn = fn(&str, &[String]) -> String;

/// One line of an intermediate file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Reduce bucket of `key`, for positive `nreduce`. Identical on every worker, so equal keys
/// meet in one reduce task.
pub fn partition(key: &str, nreduce: usize) -> usize {
    let mut hasher = FnvHasher::default();
    hasher.write(key.as_bytes());
    (hasher.finish() & 0x7fff_ffff) as usize % nreduce
}

pub struct Worker {
    /// Directory shared with the coordinator.
    pub dir: PathBuf,
    /// Coordinator address.
    pub server: String,
    /// Pause before asking again when no task is waiting.
    pub idle: Duration,
    pub map: MapFn,
    pub reduce: ReduceFn,
}

impl Worker {
    /// Asks for tasks and runs them until the coordinator says the job is done.
    ///
    /// Any failure ends the loop; the unfinished task is recovered when its lease expires.
    pub async fn launch(&self) -> Result<()> {
        let transport = tarpc::serde_transport::tcp::connect(&self.server, Json::default)
            .await
            .with_context(|| format!("dial coordinator {}", self.server))?;
        let client = ServiceClient::new(client::Config::default(), transport).spawn();

        let mut req = AskRequest::default();
        loop {
            let reply = client
                .ask_for_task(context::current(), req.clone())
                .await
                .context("ask_for_task")?;
            let worker = reply.worker;
            req = AskRequest {
                previous: reply.task(),
                worker: Some(worker),
            };

            match reply.assignment {
                Assignment::Map {
                    id,
                    source,
                    nreduce,
                    ..
                } => {
                    info!("worker {}: map {} ({:?})", worker, id, source);
                    let (dir, map) = (self.dir.clone(), self.map);
                    tokio::task::spawn_blocking(move || {
                        run_map(&dir, map, id, &source, nreduce, worker)
                    })
                    .await??;
                }
                Assignment::Reduce { id, nmap, .. } => {
                    info!("worker {}: reduce {}", worker, id);
                    let (dir, reduce) = (self.dir.clone(), self.reduce);
                    tokio::task::spawn_blocking(move || run_reduce(&dir, reduce, id, nmap, worker))
                        .await??;
                }
                Assignment::Wait => {
                    trace!("worker {}: nothing to do", worker);
                    tokio::time::sleep(self.idle).await;
                }
                Assignment::Exit => {
                    info!("worker {}: job done, exiting", worker);
                    return Ok(());
                }
            }
        }
    }
}

/// Writes `contents` so that `path` is either absent or complete.
fn write_scratch(path: &Path, contents: &str) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(contents.as_bytes()))
        .with_context(|| format!("write {:?}", path))?;
    trace!("wrote {:?}", path);
    Ok(())
}

/// Runs `map` over `source` and writes one scratch file per reduce bucket, empty ones included.
pub(crate) fn run_map(
    dir: &Path,
    map: MapFn,
    id: TaskId,
    source: &Path,
    nreduce: usize,
    worker: WorkerId,
) -> Result<()> {
    let contents =
        fs::read_to_string(source).with_context(|| format!("read input {:?}", source))?;
    if nreduce == 0 {
        return Ok(());
    }

    let mut buckets = vec![String::new(); nreduce];
    for (key, value) in map(source, &contents) {
        let r = partition(&key, nreduce);
        let line = serde_json::to_string(&KeyValue { key, value })?;
        buckets[r].push_str(&line);
        buckets[r].push('\n');
    }
    for (r, bucket) in buckets.iter().enumerate() {
        write_scratch(&dir.join(map_scratch(id, r, worker)), bucket)?;
    }
    Ok(())
}

/// Groups the committed output of every map task for bucket `id` by key and reduces it.
pub(crate) fn run_reduce(
    dir: &Path,
    reduce: ReduceFn,
    id: TaskId,
    nmap: usize,
    worker: WorkerId,
) -> Result<()> {
    let mut groups = BTreeMap::<String, Vec<String>>::new();
    for m in 0..nmap {
        let path = dir.join(map_output(m, id));
        let file = File::open(&path).with_context(|| format!("open intermediate {:?}", path))?;
        for line in BufReader::new(file).lines() {
            let kv: KeyValue = serde_json::from_str(&line?)
                .with_context(|| format!("malformed intermediate {:?}", path))?;
            groups.entry(kv.key).or_default().push(kv.value);
        }
    }

    let mut out = String::new();
    for (key, values) in groups.iter() {
        out.push_str(&format!("{} {}\n", key, reduce(key, values)));
    }
    write_scratch(&dir.join(reduce_scratch(id, worker)), &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::wc;
    use crate::commit::{commit, reduce_output};
    use crate::TaskKind;
    use tempfile::TempDir;

    #[test]
    fn partition_is_stable() {
        for key in ["a", "the", "Gutenberg", ""] {
            let r = partition(key, 10);
            assert!(r < 10);
            assert_eq!(r, partition(key, 10));
        }
        assert_eq!(partition("anything", 1), 0);
    }

    #[test]
    fn map_writes_every_bucket() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "a b a").unwrap();

        run_map(dir.path(), wc::map, 0, &input, 4, 3).unwrap();
        let mut lines = Vec::new();
        for r in 0..4 {
            let s = fs::read_to_string(dir.path().join(map_scratch(0, r, 3))).unwrap();
            for l in s.lines() {
                let kv: KeyValue = serde_json::from_str(l).unwrap();
                assert_eq!(partition(&kv.key, 4), r);
                lines.push(kv.key);
            }
        }
        lines.sort();
        assert_eq!(lines, vec!["a", "a", "b"]);
    }

    #[test]
    fn missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let err = run_map(dir.path(), wc::map, 0, &dir.path().join("nope"), 2, 0);
        assert!(err.is_err());
    }

    #[test]
    fn reduce_reads_committed_buckets_of_every_map() {
        let dir = TempDir::new().unwrap();
        let inputs = ["x y x", "y z x"];
        for (m, text) in inputs.iter().enumerate() {
            let input = dir.path().join(format!("in-{}.txt", m));
            fs::write(&input, text).unwrap();
            run_map(dir.path(), wc::map, m, &input, 1, 9).unwrap();
            commit(dir.path(), TaskKind::Map, m, 9, 1);
        }

        run_reduce(dir.path(), wc::reduce, 0, inputs.len(), 4).unwrap();
        commit(dir.path(), TaskKind::Reduce, 0, 4, 1);
        let out = fs::read_to_string(dir.path().join(reduce_output(0))).unwrap();
        assert_eq!(out, "x 3\ny 2\nz 1\n");
    }

    #[test]
    fn reduce_without_intermediate_fails() {
        let dir = TempDir::new().unwrap();
        assert!(run_reduce(dir.path(), wc::reduce, 0, 1, 0).is_err());
    }
}
