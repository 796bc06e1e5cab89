//! Compiled-in settings and client credential loading.

use eyre::Context;
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// The first year a report file is written for.
pub const FIRST_REPORT_YEAR: i16 = 2014;

/// Currency that revenue is reported in.
pub const REPORT_CURRENCY: &str = "GBP";

/// Report files are named `<prefix><year>.csv`.
pub const REPORT_FILE_PREFIX: &str = "YouTubeRevenueReportWoS";

/// OAuth client credentials as downloaded from the Google Cloud console.
pub const CLIENT_SECRETS_PATH: &str = "client_secrets.json";

/// Where the OAuth token is kept between runs.
pub const TOKEN_CACHE_PATH: &str = "tokens.json";

/// What a run produces and where it puts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub first_year: i16,
    /// Inclusive.
    pub last_year: i16,
    /// ISO 4217 code, e.g. `GBP`.
    pub currency: String,
    pub output_dir: PathBuf,
}

impl ReportSettings {
    /// Every year from [`FIRST_REPORT_YEAR`] through the current one, in the working directory.
    pub fn current() -> Self {
        Self {
            first_year: FIRST_REPORT_YEAR,
            last_year: jiff::Zoned::now().year(),
            currency: REPORT_CURRENCY.to_string(),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn years(&self) -> RangeInclusive<i16> {
        self.first_year..=self.last_year
    }

    pub fn report_path(&self, year: i16) -> PathBuf {
        self.output_dir
            .join(format!("{REPORT_FILE_PREFIX}{year}.csv"))
    }
}

/// The OAuth client an installed application authenticates as.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// Google's `client_secrets.json` layout for desktop ("installed") applications.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: ClientSecrets,
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse installed application client secrets")?;
        Ok(file.installed)
    }

    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read OAuth client secrets from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("load {}", path.display()))
    }
}
