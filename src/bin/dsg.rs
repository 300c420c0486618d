//! Thin CLI driver over `dsg_core`, for manual smoke-testing only: just
//! enough surface to invoke the engine end to end (`init`, `clone`,
//! `sync`, `status`). Not a reimplementation of a full command-line
//! surface — no interactive prompts, no progress bars, no blame/log
//! browsing.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use dsg_core::backend::{HardlinkFs, SnapshotBackend};
use dsg_core::scanner::IgnorePolicy;
use dsg_core::transport::LocalTransport;
use dsg_core::transaction::Transaction;

/// dsg - data-snapshot synchronization engine (smoke-test driver)
#[derive(Parser, Debug)]
#[command(name = "dsg")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new repository at `--root`, backed by `--remote`.
    Init {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        remote: PathBuf,
        #[arg(long)]
        user_id: String,
    },
    /// Download an existing remote repository into an empty `--root`.
    Clone {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        remote: PathBuf,
        #[arg(long)]
        user_id: String,
    },
    /// Run a sync transaction between `--root` and `--remote`.
    Sync {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        remote: PathBuf,
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "sync")]
        message: String,
        #[arg(long)]
        auto_normalize: bool,
    },
    /// Print the local cache manifest's snapshot metadata, if any.
    Status {
        #[arg(long)]
        root: PathBuf,
    },
}

fn run_sync(root: PathBuf, remote: PathBuf, user_id: String, message: &str, auto_normalize: bool) -> Result<(), String> {
    let backend = HardlinkFs::new(&remote);
    if backend.list_snapshots().map_err(|e| e.to_string())?.is_empty() {
        backend.create_dataset().map_err(|e| e.to_string())?;
    }

    let mut txn = Transaction::new(&root, ".dsg", user_id, backend, LocalTransport::new(), false);
    let outcome = txn
        .run(IgnorePolicy::default(), None, message, auto_normalize, &|| false)
        .map_err(|e| e.to_string())?;

    match outcome.snapshot_id {
        Some(id) => println!("committed snapshot {id}"),
        None => println!("nothing to sync"),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Init { root, remote, user_id } => {
            std::fs::create_dir_all(&root).map_err(|e| e.to_string()).and_then(|_| {
                run_sync(root, remote, user_id, "genesis snapshot", false)
            })
        }
        Command::Clone { root, remote, user_id } => {
            std::fs::create_dir_all(&root).map_err(|e| e.to_string()).and_then(|_| {
                run_sync(root, remote, user_id, "clone", false)
            })
        }
        Command::Sync { root, remote, user_id, message, auto_normalize } => {
            run_sync(root, remote, user_id, &message, auto_normalize)
        }
        Command::Status { root } => {
            let path = root.join(".dsg").join("last-sync.json");
            match dsg_core::manifest::Manifest::read_from_file(&path) {
                Ok(manifest) => {
                    match manifest.metadata() {
                        Some(meta) => println!(
                            "snapshot {} ({} entries, message: {})",
                            meta.snapshot_id, meta.entry_count, meta.snapshot_message
                        ),
                        None => println!("no snapshot metadata recorded"),
                    }
                    Ok(())
                }
                Err(_) => {
                    println!("no local cache manifest found; run init or clone first");
                    Ok(())
                }
            }
        }
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}
