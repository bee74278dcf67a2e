//! CLI command implementations

use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;

use crate::api;
use crate::cli::{info, print_user_table, success, warn, OutputFormat};
use crate::config::{self, Config};

/// Initialize a new gatehouse.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new("gatehouse.toml");

    if config_path.exists() {
        warn("gatehouse.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created gatehouse.toml");
    info("Edit the user directory and run 'gatehouse serve' to start the server");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(host: &str, port: u16) -> Result<()> {
    let config = config::load_config()?;

    if config.users.is_empty() {
        warn("No users configured; the private and restricted tiers will deny everything");
    }

    api::run_server(config, host, port).await?;
    Ok(())
}

/// Hash a password for a user directory entry
pub async fn hash_password(password: &str) -> Result<()> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    println!("{}", hash);
    Ok(())
}

/// List configured users
pub async fn users(format: OutputFormat) -> Result<()> {
    let config = config::load_config()?;

    match format {
        OutputFormat::Table => {
            print_user_table(&config);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&user_rows(&config))?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&user_rows(&config))?;
            println!("{}", yaml);
        }
    }

    Ok(())
}

/// User entries with the password field stripped
fn user_rows(config: &Config) -> Vec<BTreeMap<String, String>> {
    config
        .users
        .iter()
        .map(|user| {
            let mut row = BTreeMap::new();
            row.insert("id".to_string(), user.id.clone());
            for (name, value) in &user.fields {
                if name != &config.auth.password_field {
                    row.insert(name.clone(), value.clone());
                }
            }
            row
        })
        .collect()
}
