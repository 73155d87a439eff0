use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dai_types::{ArchiveId, ArchiveReason, Visibility};

#[derive(Parser)]
#[command(
    name = "dai",
    about = "Digital asset inventory -- find every file and link a site uses, and archive them",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Site snapshot (JSON)
    #[arg(long, global = true, default_value = "site.json")]
    pub site: PathBuf,

    /// Inventory and archive state (JSON)
    #[arg(long, global = true, default_value = "dai-state.json")]
    pub state: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Name recorded on archive actions
    #[arg(long, global = true, default_value = "cli")]
    pub actor: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild the inventory from the site snapshot
    Scan(ScanArgs),
    /// Show the live inventory generation and archive totals
    Status,
    /// Show where an asset is used
    Usage(UsageArgs),
    /// List references from detached or deleted content
    Orphans,
    /// Manage archive records
    Archive(ArchiveArgs),
    /// Write the archive audit CSV
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Abort the scan after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct UsageArgs {
    /// Asset id, storage URI, site path, or URL
    pub asset: String,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArchiveArgs {
    #[command(subcommand)]
    pub action: ArchiveAction,
}

/// Target record plus the version the action is based on.
#[derive(Args)]
pub struct RecordArgs {
    pub id: ArchiveId,
    /// Expected record version; the current one if omitted
    #[arg(long)]
    pub version: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ManualKindArg {
    Page,
    External,
}

#[derive(Subcommand)]
pub enum ArchiveAction {
    /// Queue a file asset for archiving
    Queue {
        /// Asset id, storage URI, site path, or URL
        asset: String,
        #[arg(long, default_value = "reference")]
        reason: ArchiveReason,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Archive a queued record
    Execute {
        #[command(flatten)]
        record: RecordArgs,
        #[arg(long, default_value = "public")]
        visibility: Visibility,
    },
    /// Switch between public and admin visibility
    Toggle(RecordArgs),
    /// Withdraw an archived record
    Unarchive(RecordArgs),
    /// Record that the archived file was deleted
    Delete(RecordArgs),
    /// Remove a queued or archived entry
    Remove(RecordArgs),
    /// Archive a page or external URL directly
    Manual {
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long, value_enum, default_value = "external")]
        kind: ManualKindArg,
        #[arg(long, default_value = "public")]
        visibility: Visibility,
        #[arg(long, default_value = "reference")]
        reason: ArchiveReason,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Edit a manual entry
    Edit {
        #[command(flatten)]
        record: RecordArgs,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Append a note
    Note { id: ArchiveId, text: String },
    /// Compare an archived file against its checksum
    Check(RecordArgs),
    /// Show one record
    Show { id: ArchiveId },
    /// List every record
    List,
}
