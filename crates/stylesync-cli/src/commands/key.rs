//! API key management

use super::load_config;
use anyhow::Result;
use clap::Subcommand;
use stylesync_studio::providers::{available_providers, create_provider};
use stylesync_studio::{ProviderStatus, StyleSyncConfig};

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Store an API key in the global config
    Set {
        /// The API key
        key: String,

        /// Provider the key belongs to
        #[arg(long, default_value = "gemini")]
        provider: String,
    },

    /// Show which providers have a usable key
    Status,
}

pub fn run(cmd: KeyCommands) -> Result<()> {
    match cmd {
        KeyCommands::Set { key, provider } => run_set(&key, &provider),
        KeyCommands::Status => run_status(),
    }
}

fn run_set(key: &str, provider: &str) -> Result<()> {
    if key.trim().is_empty() {
        anyhow::bail!("API key is empty");
    }
    let path = StyleSyncConfig::save_api_key(provider, key)?;
    println!("Saved {} key ({}) to {}", provider, mask_key(key), path.display());
    Ok(())
}

fn run_status() -> Result<()> {
    let config = load_config();
    println!("Default provider: {}", config.default_provider());

    for name in available_providers() {
        let key = config
            .api_key(name)
            .map(mask_key)
            .unwrap_or_else(|| "-".to_string());
        let status = match create_provider(name, &config) {
            Ok(provider) => match provider.health_check() {
                ProviderStatus::Available => "available".to_string(),
                ProviderStatus::NoApiKey => "no API key".to_string(),
                ProviderStatus::Unavailable(reason) => format!("unavailable: {}", reason),
            },
            Err(e) => e.to_string(),
        };
        println!("  {:<8} key {:<14} {}", name, key, status);
    }
    Ok(())
}

/// First and last four characters, the rest hidden
fn mask_key(key: &str) -> String {
    let key = key.trim();
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSyExample1234"), "AIza...1234");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("  AIzaSyExample1234\n"), "AIza...1234");
    }
}
