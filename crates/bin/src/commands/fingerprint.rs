//! Certificate fingerprint command.

use roster::Fingerprint;

use crate::cli::FingerprintArgs;

/// Run the fingerprint command
pub async fn run(args: &FingerprintArgs) -> Result<(), Box<dyn std::error::Error>> {
    let der = tokio::fs::read(&args.file).await?;
    println!("{}", Fingerprint::sha256_of(&der));
    Ok(())
}
