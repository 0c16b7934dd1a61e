use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::commit;
use crate::{AskReply, AskRequest, Assignment, Task, TaskKind, TaskList, TaskRef, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Mapping,
    Reducing,
    Done,
}

/// Everything the coordinator knows. Callers serialize access with one lock.
#[derive(Debug)]
pub struct State {
    phase: Phase,
    nmap: usize,
    nreduce: usize,
    next_worker: WorkerId,
    dir: PathBuf,

    waiting: TaskList,
    running: TaskList,
    finished: TaskList,
}

impl State {
    /// One map task per input file, all waiting.
    pub fn new(files: Vec<PathBuf>, nreduce: usize, dir: impl Into<PathBuf>) -> Self {
        let mut waiting = TaskList::new();
        let nmap = files.len();
        for (id, file) in files.into_iter().enumerate() {
            waiting.push_back(Task::map(id, file));
        }
        State {
            phase: Phase::Mapping,
            nmap,
            nreduce,
            next_worker: 0,
            dir: dir.into(),
            waiting,
            running: TaskList::new(),
            finished: TaskList::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn nmap(&self) -> usize {
        self.nmap
    }

    pub fn nreduce(&self) -> usize {
        self.nreduce
    }

    pub fn waiting(&self) -> &TaskList {
        &self.waiting
    }

    pub fn running(&self) -> &TaskList {
        &self.running
    }

    pub fn finished(&self) -> &TaskList {
        &self.finished
    }

    pub fn ask_for_task(&mut self, req: AskRequest, now: Instant) -> AskReply {
        let worker = match req.worker {
            Some(w) => w,
            None => {
                let w = self.next_worker;
                self.next_worker += 1;
                info!("new worker {}", w);
                w
            }
        };

        if let Some(prev) = req.previous {
            self.complete(prev, worker, now);
        }
        self.advance();

        let assignment = match self.waiting.pop_front() {
            Some(mut task) => {
                task.owner = Some(worker);
                task.leased_at = Some(now);
                let assignment = self.assignment(&task);
                debug!("lease {:?} to worker {}", task.key(), worker);
                self.running.push_back(task);
                assignment
            }
            None if self.done() => Assignment::Exit,
            None => Assignment::Wait,
        };
        AskReply { worker, assignment }
    }

    /// Requeues every running task whose lease is older than `timeout`.
    pub fn sweep(&mut self, now: Instant, timeout: Duration) -> usize {
        let expired = self.running.take_expired(now, timeout);
        let n = expired.len();
        for mut task in expired {
            warn!(
                "lease of {:?} by worker {:?} expired, requeued",
                task.key(),
                task.owner
            );
            task.owner = None;
            task.leased_at = None;
            self.waiting.push_back(task);
        }
        n
    }

    // A report is accepted only from the current owner; anything else is stale.
    fn complete(&mut self, key: TaskRef, worker: WorkerId, now: Instant) {
        match self.running.get(key) {
            Some(task) if task.owner == Some(worker) => {}
            _ => {
                debug!("ignore stale report of {:?} from worker {}", key, worker);
                return;
            }
        }
        if let Some(mut task) = self.running.remove(key) {
            task.finished_at = Some(now);
            commit::commit(&self.dir, task.kind, task.id, worker, self.nreduce);
            info!("{:?} done by worker {}", key, worker);
            self.finished.push_back(task);
        }
    }

    fn advance(&mut self) {
        while self.waiting.is_empty() && self.running.is_empty() {
            match self.phase {
                Phase::Mapping => {
                    info!("map phase done, {} reduce tasks", self.nreduce);
                    self.phase = Phase::Reducing;
                    for id in 0..self.nreduce {
                        self.waiting.push_back(Task::reduce(id));
                    }
                }
                Phase::Reducing => {
                    info!("reduce phase done");
                    self.phase = Phase::Done;
                }
                Phase::Done => break,
            }
        }
    }

    fn assignment(&self, task: &Task) -> Assignment {
        match task.kind {
            TaskKind::Map => Assignment::Map {
                id: task.id,
                source: task.source.clone().unwrap_or_default(),
                nmap: self.nmap,
                nreduce: self.nreduce,
            },
            TaskKind::Reduce => Assignment::Reduce {
                id: task.id,
                nmap: self.nmap,
                nreduce: self.nreduce,
            },
        }
    }
}
