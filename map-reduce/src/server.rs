use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::{future, prelude::*};
use log::{info, trace};
use tarpc::{
    context,
    server::{self, Channel},
    tokio_serde::formats::Json,
};
use tokio::task::JoinHandle;

use crate::{AskReply, AskRequest, Config, Service, State};

/// The coordinator service. Clones share one state behind one lock.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: Config,
    state: Arc<Mutex<State>>,
}

impl Service for Coordinator {
    async fn ask_for_task(self, _: context::Context, req: AskRequest) -> AskReply {
        trace!("ask_for_task {:?}", req);
        self.state().ask_for_task(req, Instant::now())
    }
}

impl Coordinator {
    pub fn new(config: Config, files: Vec<PathBuf>) -> Self {
        let state = State::new(files, config.nreduce, config.dir.clone());
        Coordinator {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    // The state is consistent after every call, so a panicked holder leaves nothing half done.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn done(&self) -> bool {
        self.state().done()
    }

    /// Binds the RPC listener and serves it in the background. Returns the bound address.
    pub async fn listen(&self) -> std::io::Result<SocketAddr> {
        let addr = SocketAddrV4::new(Ipv4Addr::LOCALHOST, self.config.port);
        let mut listener = tarpc::serde_transport::tcp::listen(&addr, Json::default).await?;
        listener.config_mut().max_frame_length(usize::MAX);
        let local = listener.local_addr();
        info!("coordinator listening on {}", local);

        let coordinator = self.clone();
        tokio::spawn(
            listener
                // Ignore accept errors.
                .filter_map(|r| future::ready(r.ok()))
                .map(server::BaseChannel::with_defaults)
                .map(move |channel| {
                    channel
                        .execute(coordinator.clone().serve())
                        .for_each(|response| async move {
                            tokio::spawn(response);
                        })
                })
                // Max 100 concurrent connections.
                .buffer_unordered(100)
                .for_each(|_| async {}),
        );
        Ok(local)
    }

    /// Sweeps expired leases every `sweep_period` until the job is done.
    pub fn spawn_lease_monitor(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(coordinator.config.sweep_period);
            loop {
                interval.tick().await;
                let mut state = coordinator.state();
                if state.done() {
                    break;
                }
                state.sweep(Instant::now(), coordinator.config.lease_timeout);
            }
            trace!("lease monitor stopped");
        })
    }

    /// Serves and starts the lease monitor.
    pub async fn launch(&self) -> std::io::Result<SocketAddr> {
        let addr = self.listen().await?;
        self.spawn_lease_monitor();
        Ok(addr)
    }
}
