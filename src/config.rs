// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_ACCOUNTS_PATH: &str = "DIGEST_ACCOUNTS_PATH";

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub bearer_token: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Full startup configuration. Construction fails before any side effect
/// when a credential is missing or the account list is empty.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub accounts: Vec<String>,
    pub per_account_cap: u32,
    pub lookback_days: i64,
    pub max_posts: usize,
    pub max_post_chars: usize,
    pub store_path: PathBuf,
    pub feed: FeedConfig,
    pub gemini: GeminiConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let accounts = load_accounts_default()?;
        if accounts.is_empty() {
            bail!("tracked account list is empty; nothing to sweep");
        }

        Ok(Self {
            accounts,
            per_account_cap: env_parse("DIGEST_PER_ACCOUNT_CAP", 5)?,
            lookback_days: env_parse("DIGEST_LOOKBACK_DAYS", 2)?,
            max_posts: env_parse("DIGEST_MAX_POSTS", 50)?,
            max_post_chars: env_parse("DIGEST_MAX_POST_CHARS", 500)?,
            store_path: std::env::var("DIGEST_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/store.json")),
            feed: FeedConfig {
                bearer_token: require("TWITTER_BEARER_TOKEN")?,
            },
            gemini: GeminiConfig {
                api_key: require("GEMINI_API_KEY")?,
                model: std::env::var("GEMINI_MODEL").ok(),
            },
            smtp: SmtpConfig {
                host: require("SMTP_HOST")?,
                user: require("SMTP_USER")?,
                pass: require("SMTP_PASS")?,
                from: require("DIGEST_EMAIL_FROM")?,
            },
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("{name} missing"))
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v.parse().with_context(|| format!("invalid {name}")),
        Err(_) => Ok(default),
    }
}

/// Load the tracked-account list from an explicit path. TOML or JSON.
pub fn load_accounts_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading accounts from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_accounts(&content, ext.as_str())
}

/// Load the account list using env var + fallbacks:
/// 1) $DIGEST_ACCOUNTS_PATH
/// 2) config/accounts.toml
/// 3) config/accounts.json
pub fn load_accounts_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_ACCOUNTS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_accounts_from(&pb);
        } else {
            return Err(anyhow!("DIGEST_ACCOUNTS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/accounts.toml");
    if toml_p.exists() {
        return load_accounts_from(&toml_p);
    }
    let json_p = PathBuf::from("config/accounts.json");
    if json_p.exists() {
        return load_accounts_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_accounts(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    let try_toml = hint_ext == "toml" || s.contains("accounts");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported accounts format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlAccounts {
        accounts: Vec<String>,
    }
    let v: TomlAccounts = toml::from_str(s)?;
    Ok(clean_list(v.accounts))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop a leading `@`, drop empties, dedup.
fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim().trim_start_matches('@');
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
