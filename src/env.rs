use std::path::Path;

use tracing::{info, warn};

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
    let profile_env = if profile == "production" {
        "config/prod.env"
    } else {
        "config/dev.env"
    };

    for path in ["config/common.env", profile_env, ".secrets.env"] {
        if !Path::new(path).exists() {
            warn!("Environment file {} not found, skipping", path);
            continue;
        }
        dotenvy::from_filename_override(path)?;
        info!("Loaded environment from: {}", path);
    }

    Ok(())
}
