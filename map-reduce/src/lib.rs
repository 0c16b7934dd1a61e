use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod app;
pub mod commit;
pub mod config;
mod coordinator;
mod server;
mod task;
mod worker;

pub use config::Config;
pub use coordinator::{Phase, State};
pub use server::Coordinator;
pub use task::{Task, TaskId, TaskKind, TaskList, TaskRef, WorkerId};
pub use worker::{partition, KeyValue, MapFn, ReduceFn, Worker};

#[tarpc::service]
pub trait Service {
    /// Reports completion of `req.previous` (if any) and hands out the next assignment.
    async fn ask_for_task(req: AskRequest) -> AskReply;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskRequest {
    /// The task the caller just finished, `None` on first contact or after `Wait`.
    pub previous: Option<TaskRef>,
    /// `None` until the coordinator has issued an identity.
    pub worker: Option<WorkerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Assignment {
    Map {
        id: TaskId,
        source: PathBuf,
        nmap: usize,
        nreduce: usize,
    },
    Reduce {
        id: TaskId,
        nmap: usize,
        nreduce: usize,
    },
    /// Nothing waiting right now; remaining work is leased to other workers.
    Wait,
    /// The job is done.
    Exit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskReply {
    pub worker: WorkerId,
    pub assignment: Assignment,
}

impl AskReply {
    /// The task this reply leases to the caller, to be reported on the next call.
    pub fn task(&self) -> Option<TaskRef> {
        match self.assignment {
            Assignment::Map { id, .. } => Some(TaskRef::map(id)),
            Assignment::Reduce { id, .. } => Some(TaskRef::reduce(id)),
            Assignment::Wait | Assignment::Exit => None,
        }
    }
}
