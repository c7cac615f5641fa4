//! Command-line interface.

use std::path::PathBuf;

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use p2pstore_chunkstore::{
    BlockBodies, ChunkHash, ChunkInfo, ChunkStore, ChunkStoreArgs, chunk_path, routing_id,
};
use p2pstore_storage_redb::RedbDatastore;
use tracing::info;

/// Database file name inside the data directory.
const DB_FILE: &str = "chunks.redb";

/// p2pstore - local chunk store of a p2p block distribution node
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Data directory holding the chunk database.
    #[arg(long, global = true, default_value = "./p2pstore", value_name = "DIR")]
    pub(crate) datadir: PathBuf,

    /// Chunk store configuration
    #[command(flatten)]
    pub(crate) store_args: ChunkStoreArgs,

    /// Logging configuration
    #[command(flatten)]
    pub(crate) log_args: LogArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Logging configuration
#[derive(Debug, Args, Clone)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "p2pstore_chunkstore=debug").
    #[arg(long = "log.filter", global = true, value_name = "DIRECTIVE")]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub(crate) json: bool,
}

/// Chunk store commands
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Store a chunk
    Add(AddArgs),

    /// Print a chunk's block bodies
    Get(HashArg),

    /// Refresh a chunk's freshness time
    Update(UpdateArgs),

    /// Remove a chunk
    Delete(HashArg),

    /// List locally indexed chunks
    List,

    /// Evict every expired chunk
    Sweep,

    /// Show the storage path and DHT routing id of a chunk
    Route(HashArg),
}

/// A chunk hash argument.
#[derive(Debug, Args)]
pub(crate) struct HashArg {
    /// Chunk hash, hex encoded
    pub(crate) hash: ChunkHash,
}

/// Arguments of `add`.
#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Chunk hash, hex encoded
    pub(crate) hash: ChunkHash,

    /// First block height in the chunk
    #[arg(long)]
    pub(crate) start: u64,

    /// Last block height in the chunk
    #[arg(long)]
    pub(crate) end: u64,

    /// Block body, hex encoded; repeat once per block
    #[arg(long = "body", value_name = "HEX", value_parser = parse_hex_body)]
    pub(crate) bodies: Vec<Bytes>,
}

/// Arguments of `update`.
#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Chunk hash, hex encoded
    pub(crate) hash: ChunkHash,

    /// First block height, used only if the chunk is not indexed
    #[arg(long, default_value_t = 0)]
    pub(crate) start: u64,

    /// Last block height, used only if the chunk is not indexed
    #[arg(long, default_value_t = 0)]
    pub(crate) end: u64,
}

fn parse_hex_body(s: &str) -> Result<Bytes, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map(Bytes::from)
}

impl Cli {
    /// Execute the subcommand.
    pub(crate) fn run(self) -> Result<()> {
        match self.command {
            Commands::Add(ref args) => {
                let store = self.open_store()?;
                let info = ChunkInfo::new(args.hash.clone(), args.start, args.end);
                let outcome = store.add(&info, BlockBodies::from(args.bodies.clone()))?;
                println!("{} {:?}", info.hash, outcome);
            }
            Commands::Get(HashArg { ref hash }) => {
                let lookup = self.open_store()?.get(hash)?;
                if lookup.is_expired() {
                    println!("# expired, evicted");
                }
                for body in lookup.into_bodies().iter() {
                    println!("{}", hex::encode(body));
                }
            }
            Commands::Update(ref args) => {
                let store = self.open_store()?;
                let info = store
                    .index()
                    .get(store.datastore(), &args.hash)?
                    .unwrap_or_else(|| ChunkInfo::new(args.hash.clone(), args.start, args.end));
                let outcome = store.update(&info)?;
                println!("{} {:?}", info.hash, outcome);
            }
            Commands::Delete(HashArg { ref hash }) => {
                self.open_store()?.delete(hash)?;
                println!("{hash} deleted");
            }
            Commands::List => {
                for info in self.open_store()?.local_chunks()? {
                    println!("{} {}..={}", info.hash, info.start, info.end);
                }
            }
            Commands::Sweep => {
                let report = self.open_store()?.sweep_expired()?;
                println!(
                    "scanned {} expired {} dangling {} corrupt {}",
                    report.scanned, report.expired, report.dangling, report.corrupt
                );
            }
            Commands::Route(HashArg { ref hash }) => {
                let routing = self.store_args.routing_params();
                println!("path       {}", chunk_path(hash));
                println!("routing id {}", routing_id(hash));
                println!("alpha      {}", routing.alpha);
                println!("backup     {}", routing.backup);
            }
        }

        Ok(())
    }

    /// Open the redb-backed chunk store in the data directory.
    fn open_store(&self) -> Result<ChunkStore<RedbDatastore>> {
        std::fs::create_dir_all(&self.datadir)
            .wrap_err_with(|| format!("creating {}", self.datadir.display()))?;
        let db_path = self.datadir.join(DB_FILE);
        let db = RedbDatastore::open(&db_path)
            .wrap_err_with(|| format!("opening {}", db_path.display()))?;

        let store = ChunkStore::new(db, self.store_args.store_config());
        info!(path = %db_path.display(), config = ?store.config(), "Opened chunk store");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "p2pstore",
            "--datadir",
            "/tmp/x",
            "add",
            "0xab12",
            "--start",
            "1",
            "--end",
            "2",
            "--body",
            "0x0102",
            "--body",
            "ff",
        ])
        .unwrap();

        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.hash.to_hex(), "ab12");
        assert_eq!(args.bodies, vec![Bytes::from_static(&[1, 2]), Bytes::from_static(&[0xff])]);
        assert_eq!(cli.datadir, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_expiry_flag() {
        let cli =
            Cli::try_parse_from(["p2pstore", "--chunkstore.expiry-secs", "60", "list"]).unwrap();
        assert_eq!(cli.store_args.store_config().expiry.as_secs(), 60);
    }
}
