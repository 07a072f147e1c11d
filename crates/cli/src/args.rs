use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use mangrove_sdk::{DEFAULT_PAGE_SIZE, DEFAULT_RETAINED_SNAPSHOTS};

pub(crate) const DEFAULT_RPC_PROVIDER: &str = "https://arb1.arbitrum.io/rpc";
pub(crate) const DEFAULT_RPC_THROTTLING: u32 = 15;

#[derive(Parser, Debug)]
#[command(name = "mangrove-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to
    #[arg(long, global = true, default_value_t = DEFAULT_RPC_PROVIDER.to_string() )]
    pub rpc: String,

    /// RPC throttling (req/sec) [default: 15 for default RPC provider and
    /// none for custom]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Order book contract address [default: Arbitrum deployment]
    #[arg(long, global = true)]
    pub mangrove: Option<Address>,

    /// Reader contract address [default: Arbitrum deployment]
    #[arg(long, global = true)]
    pub reader: Option<Address>,

    /// Multicall3 contract address [default: canonical deployment]
    #[arg(long, global = true)]
    pub multicall: Option<Address>,

    /// Block number to fetch state at or start tracing from [default: latest
    /// block]
    #[arg(long, global = true)]
    pub block: Option<u64>,

    /// Number of blocks to trace or show [default: unlimited, until terminated
    /// by (Ctrl+C)]
    #[arg(long, global = true)]
    pub num_blocks: Option<u64>,

    /// Token the taker gives (inbound token of the offers)
    #[arg(long, global = true)]
    pub src: Option<Address>,

    /// Token the taker receives (outbound token of the offers)
    #[arg(long, global = true)]
    pub dest: Option<Address>,

    /// Tick spacing of the market
    #[arg(long, global = true, default_value_t = 1)]
    pub tick_spacing: u64,

    /// Number of offers requested by the initial read
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Number of snapshots retained by the pool
    #[arg(long, global = true, default_value_t = DEFAULT_RETAINED_SNAPSHOTS)]
    pub retained_snapshots: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the book of a market at a particular block height
    Snapshot,
    /// Fetch an initial book, then trace all events of the market, then print
    /// the final book
    Trace,
    /// Show live book of a market
    Book {
        /// Number of tick levels to display (0 = all)
        #[arg(short, long, default_value_t = 10)]
        depth: usize,
    },
}
