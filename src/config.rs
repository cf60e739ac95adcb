use crate::time_utils::{normalize_timezone, Timezone};
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::PathBuf;

pub const MAX_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub session_key: Vec<u8>,
    pub store_path: PathBuf,
    pub timezone: Timezone,
    pub timezone_name: String,
    pub window_days: i64,
    pub demo_seed: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let session_key_b64 = get("SESSION_KEY").ok_or_else(|| anyhow!("SESSION_KEY missing"))?;
        let session_key = general_purpose::STANDARD
            .decode(session_key_b64.trim())
            .context("SESSION_KEY must be base64")?;
        if session_key.len() < 32 {
            bail!("SESSION_KEY must decode to at least 32 bytes");
        }

        let store_path = get("PULSE_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/pulsecheck.json"));

        let timezone_name = match get("PULSE_TIMEZONE") {
            Some(raw) => normalize_timezone(&raw)
                .ok_or_else(|| anyhow!("PULSE_TIMEZONE {raw:?} is not a known timezone"))?,
            None => "UTC".to_string(),
        };
        let timezone = Timezone::parse(&timezone_name)
            .ok_or_else(|| anyhow!("PULSE_TIMEZONE {timezone_name:?} is not a known timezone"))?;

        let window_days = match get("PULSE_WINDOW_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context("PULSE_WINDOW_DAYS must be an integer")?,
            None => 7,
        };
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            bail!("PULSE_WINDOW_DAYS must be between 1 and {MAX_WINDOW_DAYS}");
        }

        let demo_seed = match get("PULSE_DEMO_SEED") {
            Some(raw) => raw.trim().parse::<u64>().context("PULSE_DEMO_SEED must be an unsigned integer")?,
            None => 42,
        };

        Ok(Self {
            bind_addr,
            session_key,
            store_path,
            timezone,
            timezone_name,
            window_days,
            demo_seed,
        })
    }
}
