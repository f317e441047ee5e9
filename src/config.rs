use anyhow::Context;

use crate::trend::{TrendThresholds, DEFAULT_STABILITY_BAND};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Settings read from the environment. Command-line flags override them.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub stability_band: f64,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {value}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let stability_band = match lookup("ANALYTICS_STABILITY_BAND") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("ANALYTICS_STABILITY_BAND is not a number: {value}"))?,
            None => DEFAULT_STABILITY_BAND,
        };
        TrendThresholds::new(stability_band).context("ANALYTICS_STABILITY_BAND is out of range")?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections,
            stability_band,
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }

    pub fn thresholds(&self, band_override: Option<f64>) -> crate::Result<TrendThresholds> {
        TrendThresholds::new(band_override.unwrap_or(self.stability_band))
    }
}
