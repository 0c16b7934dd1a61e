use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

use lease_mr::{Config, Coordinator};

#[derive(StructOpt, Debug)]
#[structopt(name = env!("CARGO_PKG_NAME"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opt {
    /// Port to start coordinator server
    #[structopt(short, long)]
    port: u16,

    /// Directory for intermediate and output files, shared with workers
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Seconds a worker may hold a task before it is handed to another one
    #[structopt(long, default_value = "5")]
    lease_timeout: u64,

    /// Milliseconds between sweeps for expired leases
    #[structopt(long, default_value = "1000")]
    sweep_period: u64,

    #[structopt(long, default_value = "10")]
    nreduce: usize,

    /// Files to process, one map task each
    #[structopt(name = "FILE", parse(from_os_str))]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let config = Config {
        port: opt.port,
        dir: opt.dir,
        nreduce: opt.nreduce,
        lease_timeout: Duration::from_secs(opt.lease_timeout),
        sweep_period: Duration::from_millis(opt.sweep_period),
    };
    let c = Coordinator::new(config, opt.files);
    c.launch().await?;
    while !c.done() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    log::info!("job done");
    // Linger so idle workers hear Exit instead of a closed connection.
    tokio::time::sleep(Duration::from_secs(2)).await;
    Ok(())
}
