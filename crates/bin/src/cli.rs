//! CLI argument definitions for the Roster binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

/// Roster account and certificate tool
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Roster: manage stored accounts and trusted server certificates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage stored accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// Print the SHA-256 fingerprint of a DER-encoded certificate
    Fingerprint(FingerprintArgs),
    /// Show the effective session settings
    Settings(SettingsArgs),
}

/// Location of the credential store file
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Path to the credential store JSON file
    #[arg(short, long, default_value = "roster.json", env = "ROSTER_STORE")]
    pub store: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    /// List stored accounts
    List(ListArgs),
    /// Store an account, replacing any with the same identity
    Add(AddArgs),
    /// Remove a stored account
    Remove(RemoveArgs),
    /// Trust a certificate fingerprint for a stored account
    Trust(TrustArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Homeserver URL
    #[arg(long)]
    pub homeserver: Url,

    /// Account user id
    #[arg(long, requires = "access_token")]
    pub user_id: Option<String>,

    /// Access token for the account
    #[arg(long, requires = "user_id")]
    pub access_token: Option<String>,

    /// Device id; enables end-to-end encryption for the account
    #[arg(long, requires = "user_id")]
    pub device_id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Account user id
    #[arg(long)]
    pub user_id: String,
}

#[derive(clap::Args, Debug)]
pub struct TrustArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Account user id
    #[arg(long)]
    pub user_id: String,

    /// SHA-256 fingerprint in hex, colons allowed
    #[arg(long)]
    pub fingerprint: String,
}

#[derive(clap::Args, Debug)]
pub struct FingerprintArgs {
    /// DER-encoded certificate file
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    /// Path to the settings JSON file; defaults apply when unset
    #[arg(long, env = "ROSTER_SETTINGS")]
    pub settings: Option<PathBuf>,
}
