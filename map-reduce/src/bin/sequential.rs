use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use log::trace;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{fs, io::Write};
use structopt::StructOpt;

use lease_mr::commit::reduce_output;
use lease_mr::{app, partition};

/// Runs a job in one process, writing the same `mr-out-*` files a distributed run commits.
#[derive(StructOpt, Debug)]
#[structopt(name = env!("CARGO_PKG_NAME"), version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opt {
    /// Files to process
    #[structopt(name = "FILE", parse(from_os_str))]
    files: Vec<PathBuf>,

    /// Output directory
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Application to run: wc or indexer
    #[structopt(short, long, default_value = "wc")]
    app: String,

    #[structopt(long, default_value = "10")]
    nreduce: usize,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let (map, reduce) =
        app::by_name(&opt.app).with_context(|| format!("unknown application {:?}", opt.app))?;
    anyhow::ensure!(opt.nreduce > 0, "--nreduce must be positive");

    let mut groups = BTreeMap::<String, Vec<String>>::new();
    for fname in opt.files.iter() {
        let contents =
            fs::read_to_string(fname).with_context(|| format!("read input {:?}", fname))?;
        for (k, v) in map(fname, &contents) {
            groups.entry(k).or_default().push(v);
        }
    }

    let mut outputs = vec![String::new(); opt.nreduce];
    for (k, vs) in groups.iter() {
        let out = &mut outputs[partition(k, opt.nreduce)];
        out.push_str(&format!("{} {}\n", k, reduce(k, vs)));
    }
    for (r, out) in outputs.iter().enumerate() {
        let path = opt.dir.join(reduce_output(r));
        AtomicFile::new(&path, AllowOverwrite)
            .write(|f| f.write_all(out.as_bytes()))
            .with_context(|| format!("write {:?}", path))?;
        trace!("output {:?}", path);
    }
    Ok(())
}
