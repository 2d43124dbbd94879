use crate::content::FieldPolicy;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "mysecret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `memory://` or `file://<dir>`.
    pub store_url: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// Overrides the `http://<Host>` prefix of upload URLs.
    pub base_url: Option<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub field_policy: FieldPolicy,
    pub bcrypt_cost: u32,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid u16")?;

        let store_url = env::var("STORE_URL").unwrap_or_else(|_| "file://./data".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set; falling back to the built-in development secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "1800".to_string())
            .parse::<u64>()
            .context("TOKEN_TTL_SECS must be a valid u64")?;

        let base_url = env::var("BASE_URL").ok().filter(|url| !url.is_empty());

        let upload_dir =
            PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (100 * 1024 * 1024).to_string())
            .parse::<u64>()
            .context("MAX_UPLOAD_BYTES must be a valid u64")?;

        let field_policy = env::var("CMS_FIELD_POLICY")
            .unwrap_or_else(|_| "strict".to_string())
            .parse::<FieldPolicy>()
            .map_err(|err| anyhow::anyhow!("CMS_FIELD_POLICY: {err}"))?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse::<u32>()
            .context("BCRYPT_COST must be a valid u32")?;
        if !(4..=31).contains(&bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between 4 and 31");
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            store_url,
            jwt_secret,
            token_ttl_secs,
            base_url,
            upload_dir,
            max_upload_bytes,
            field_policy,
            bcrypt_cost,
            cors_allowed_origins,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }
}
