//! Stored account commands.

use roster::{
    ConnectionConfig, Credentials, Fingerprint, HashType, Identity,
    credentials::{CredentialStore, InMemoryCredentials},
};

use crate::cli::{AddArgs, ListArgs, RemoveArgs, TrustArgs};

async fn find(
    store: &InMemoryCredentials,
    user_id: &str,
) -> Result<Option<ConnectionConfig>, Box<dyn std::error::Error>> {
    let identity = Identity::new(user_id);
    Ok(store
        .list()
        .await?
        .into_iter()
        .find(|config| config.identity() == Some(&identity)))
}

/// Longest homeserver shown in the accounts table before it is cut.
const HOMESERVER_WIDTH: usize = 32;

/// Hex characters of a trusted fingerprint shown in the accounts table.
const FINGERPRINT_PREFIX: usize = 8;

/// One row of the accounts table.
struct AccountRow {
    identity: String,
    homeserver: String,
    device: String,
    trusted: String,
}

impl AccountRow {
    fn from_config(config: &ConnectionConfig) -> Self {
        let credentials = config.credentials.as_ref();
        Self {
            identity: credentials.map_or_else(|| "-".to_string(), |c| c.user_id.to_string()),
            homeserver: truncate(config.homeserver.as_str(), HOMESERVER_WIDTH),
            device: credentials
                .and_then(|c| c.device_id.clone())
                .unwrap_or_else(|| "-".to_string()),
            trusted: trusted_summary(&config.allowed_fingerprints),
        }
    }
}

/// Cut `value` to `width` characters, marking the cut with `~`.
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

/// First trusted fingerprint as a short hex prefix, plus how many more there are.
fn trusted_summary(fingerprints: &[Fingerprint]) -> String {
    let Some(first) = fingerprints.first() else {
        return "-".to_string();
    };
    let hex = first.to_hex();
    let prefix: String = hex.chars().take(FINGERPRINT_PREFIX).collect();
    match fingerprints.len() - 1 {
        0 => prefix,
        more => format!("{prefix} (+{more})"),
    }
}

/// Render account rows as aligned lines, header first.
fn render_accounts(rows: &[AccountRow]) -> Vec<String> {
    let widths = rows.iter().fold([8, 10, 6], |[i, h, d], row| {
        [
            i.max(row.identity.chars().count()),
            h.max(row.homeserver.chars().count()),
            d.max(row.device.chars().count()),
        ]
    });
    let line = |identity: &str, homeserver: &str, device: &str, trusted: &str| {
        format!(
            "{identity:<iw$}  {homeserver:<hw$}  {device:<dw$}  {trusted}",
            iw = widths[0],
            hw = widths[1],
            dw = widths[2],
        )
        .trim_end()
        .to_string()
    };

    std::iter::once(line("IDENTITY", "HOMESERVER", "DEVICE", "TRUSTED"))
        .chain(
            rows.iter()
                .map(|row| line(&row.identity, &row.homeserver, &row.device, &row.trusted)),
        )
        .collect()
}

/// Run the `accounts list` command
pub async fn list(args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryCredentials::load_from_file(&args.store.store).await?;
    let configs = store.list().await?;

    if args.json {
        let entries: Vec<_> = configs
            .iter()
            .map(|config| {
                serde_json::json!({
                    "identity": config.identity().map(Identity::as_str),
                    "homeserver": config.homeserver.as_str(),
                    "device_id": config.credentials.as_ref().and_then(|c| c.device_id.as_deref()),
                    "allowed_fingerprints": config
                        .allowed_fingerprints
                        .iter()
                        .map(Fingerprint::to_hex)
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string(&entries)?);
        return Ok(());
    }

    if configs.is_empty() {
        println!("No stored accounts.");
        return Ok(());
    }
    let rows: Vec<AccountRow> = configs.iter().map(AccountRow::from_config).collect();
    for line in render_accounts(&rows) {
        println!("{line}");
    }
    Ok(())
}

/// Run the `accounts add` command
pub async fn add(args: &AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryCredentials::open(&args.store.store).await?;

    let mut config = ConnectionConfig::new(args.homeserver.clone());
    if let (Some(user_id), Some(token)) = (&args.user_id, &args.access_token) {
        let mut credentials = Credentials::new(user_id.as_str(), token.as_str());
        if let Some(device_id) = &args.device_id {
            credentials = credentials.with_device_id(device_id.as_str());
        }
        config = config.with_credentials(credentials);
    }

    store.add(&config).await?;
    match config.identity() {
        Some(identity) => println!("Stored account {identity}"),
        None => println!("Stored homeserver {}", config.homeserver),
    }
    Ok(())
}

/// Run the `accounts remove` command
pub async fn remove(args: &RemoveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryCredentials::open(&args.store.store).await?;

    match find(&store, &args.user_id).await? {
        Some(config) => {
            store.remove(&config).await?;
            println!("Removed account {}", args.user_id);
        }
        None => println!("No stored account {}", args.user_id),
    }
    Ok(())
}

/// Run the `accounts trust` command
pub async fn trust(args: &TrustArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fingerprint = Fingerprint::from_hex(HashType::Sha256, &args.fingerprint)?;
    let store = InMemoryCredentials::open(&args.store.store).await?;

    let Some(mut config) = find(&store, &args.user_id).await? else {
        return Err(format!("No stored account {}", args.user_id).into());
    };
    if config.allow(fingerprint.clone()) {
        store.replace(&config).await?;
        println!("Trusted {fingerprint} for {}", args.user_id);
    } else {
        println!("{fingerprint} is already trusted for {}", args.user_id);
    }
    Ok(())
}
