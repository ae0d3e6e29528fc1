//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use falcon_core::{CloudRegion, SensorType};

/// Falcon - resolve the sensor image a cluster component should run
#[derive(Parser, Debug)]
#[command(name = "falcon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to falcon-runtime.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Falcon cloud region (us-1, us-2, eu-1, us-gov-1, us-gov-2)
    #[arg(long, global = true)]
    pub cloud: Option<CloudRegion>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Options shared by every command that talks to Falcon
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config: self.config.clone(),
            cloud: self.cloud,
        }
    }
}

/// Configuration-related flags, detached from the parsed command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<Utf8PathBuf>,
    pub cloud: Option<CloudRegion>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Resolve the image tag a sensor should run
    Resolve(ResolveArgs),

    /// List the tags published for a sensor type
    Tags(TagsArgs),

    /// Resolve an update policy to the sensor version it pins
    Policy(PolicyArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Sensor type (node, sidecar, regioned-sidecar, admission, image-analyzer)
    pub sensor: SensorType,

    /// Explicit sensor version prefix (e.g. 7.10)
    #[arg(long)]
    pub version: Option<String>,

    /// Name of the sensor update policy to follow
    #[arg(long)]
    pub update_policy: Option<String>,

    /// Tag recorded by the previous reconciliation
    #[arg(long)]
    pub observed_tag: Option<String>,

    /// Always resolve again, even when the observed tag still matches
    #[arg(long)]
    pub auto_update: bool,

    /// Node architecture for per-architecture policy versions (default: host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Tags command
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Sensor type (node, sidecar, regioned-sidecar, admission, image-analyzer)
    pub sensor: SensorType,

    /// Only show tags eligible for the sensor type
    #[arg(long)]
    pub eligible: bool,

    /// Only show eligible tags starting with this version prefix (implies --eligible)
    #[arg(long)]
    pub version: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Policy command
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Update policy name
    pub name: String,

    /// Node architecture (default: host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
