use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use chrono::FixedOffset;
use dotenvy::dotenv;

use crate::attendance::service::AttendanceSettings;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_reports_per_min: u32,

    /// Minutes east of UTC in which business days are defined.
    pub business_utc_offset_minutes: i32,
    pub parallel_threshold: usize,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            rate_reports_per_min: parse_or("RATE_REPORTS_PER_MIN", 600)?,
            business_utc_offset_minutes: parse_or("BUSINESS_UTC_OFFSET_MINUTES", 420)?, // UTC+07:00
            parallel_threshold: parse_or("PARALLEL_THRESHOLD", 64)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        };
        config.business_offset()?;
        Ok(config)
    }

    pub fn business_offset(&self) -> anyhow::Result<FixedOffset> {
        let minutes = self.business_utc_offset_minutes;
        if minutes.abs() > 1439 {
            bail!("BUSINESS_UTC_OFFSET_MINUTES must be within ±1439, got {minutes}");
        }
        FixedOffset::east_opt(minutes * 60)
            .with_context(|| format!("invalid business UTC offset {minutes}"))
    }

    pub fn attendance_settings(&self) -> anyhow::Result<AttendanceSettings> {
        Ok(AttendanceSettings {
            business_offset: self.business_offset()?,
            parallel_threshold: self.parallel_threshold,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(offset: i32) -> Config {
        Config {
            database_url: "mysql://localhost/attendance".to_string(),
            server_addr: "127.0.0.1:8080".to_string(),
            api_prefix: "/api".to_string(),
            rate_reports_per_min: 600,
            business_utc_offset_minutes: offset,
            parallel_threshold: 64,
            log_dir: "logs".to_string(),
        }
    }

    #[test]
    fn default_offset_is_indochina_time() {
        let offset = config(420).business_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn negative_offsets_are_allowed() {
        let settings = config(-300).attendance_settings().unwrap();
        assert_eq!(settings.business_offset.local_minus_utc(), -5 * 3600);
        assert_eq!(settings.parallel_threshold, 64);
    }

    #[test]
    fn offsets_beyond_a_day_are_rejected() {
        assert!(config(1440).business_offset().is_err());
        assert!(config(-1440).business_offset().is_err());
    }
}
