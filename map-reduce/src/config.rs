use std::path::PathBuf;
use std::time::Duration;

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to serve on; 0 picks a free one.
    pub port: u16,
    /// Directory shared with the workers, holding scratch and committed files.
    pub dir: PathBuf,
    pub nreduce: usize,
    /// A task leased longer than this is handed to another worker.
    pub lease_timeout: Duration,
    /// How often the lease monitor sweeps running tasks.
    pub sweep_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 0,
            dir: PathBuf::from("."),
            nreduce: 10,
            lease_timeout: Duration::from_secs(5),
            sweep_period: Duration::from_secs(1),
        }
    }
}
