use std::path::PathBuf;
use std::process;
use std::time::Duration;

use log::error;
use structopt::StructOpt;

use lease_mr::{app, Worker};

#[derive(StructOpt, Debug)]
#[structopt(name = env!("CARGO_PKG_NAME"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opt {
    /// Coordinator address, e.g. 127.0.0.1:9999
    #[structopt(short, long)]
    server: String,

    /// Directory for intermediate and output files, shared with the coordinator
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Application to run: wc or indexer
    #[structopt(short, long, default_value = "wc")]
    app: String,

    /// Milliseconds to wait before asking again when no task is available
    #[structopt(long, default_value = "500")]
    idle: u64,
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let (map, reduce) = match app::by_name(&opt.app) {
        Some(app) => app,
        None => {
            error!("unknown application {:?}", opt.app);
            process::exit(2);
        }
    };
    let w = Worker {
        dir: opt.dir,
        server: opt.server,
        idle: Duration::from_millis(opt.idle),
        map,
        reduce,
    };
    if let Err(e) = w.launch().await {
        error!("worker failed: {:#}", e);
        process::exit(1);
    }
}
