use anyhow::Result;

use asset_manager::{App, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().inspect_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("\nSettings are read from config.toml (or the file named by ASSET_MANAGER_CONFIG),");
        eprintln!("for example:");
        eprintln!("\napi_base_url = \"http://localhost:8500/api/v1\"");
    })?;

    // Logging is initialized in App::run()
    App::new(settings).run().await?;

    Ok(())
}
