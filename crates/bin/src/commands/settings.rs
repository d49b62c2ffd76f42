//! Settings command - shows the options sessions are opened with.

use roster::RosterSettings;

use crate::cli::SettingsArgs;

/// Run the settings command
pub async fn run(args: &SettingsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &args.settings {
        Some(path) => RosterSettings::load_from_file(path).await?,
        None => RosterSettings::default(),
    };

    println!("Local file encryption: {}", settings.enable_local_file_encryption);
    println!("Lazy loading:          {}", settings.lazy_loading);
    println!("Data save mode:        {}", settings.data_save_mode);
    Ok(())
}
