//! Yearly YouTube revenue reports, per playlist, as CSV.
//!
//! For every year from [`config::FIRST_REPORT_YEAR`] through the current one, the
//! authenticated user's default channel is looked up, its playlists are walked in title order,
//! and the monthly estimated revenue of each non-empty playlist's videos is fetched from the
//! YouTube Analytics API. Each playlist's table is printed to the console and appended to that
//! year's CSV file.

use crate::config::ClientSecrets;
use crate::oauth::OAuthManager;
use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use std::path::Path;
use std::sync::Arc;

pub mod aggregate;
pub mod collect;
pub mod config;
pub mod oauth;
pub mod render;
pub mod report;
pub mod youtube_api;

#[cfg(test)]
pub(crate) mod mock;

/// Reads the token cached at `path`, if there is one.
pub async fn load_cached_token(path: &Path) -> eyre::Result<Option<BasicTokenResponse>> {
    if !tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("check for {}", path.display()))?
    {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let token = serde_json::from_str(&json)
        .with_context(|| format!("parse cached token in {}", path.display()))?;
    Ok(Some(token))
}

/// Writes `token` to `path` so that the next run can skip the browser flow.
pub async fn save_token(path: &Path, token: &BasicTokenResponse) -> eyre::Result<()> {
    let json = serde_json::to_string(token).context("serialize token")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("write {}", path.display()))
}

/// Builds an authenticated client, reusing the token cached at `token_cache` when possible.
///
/// A cached token is always refreshed first. If there is none, or it can no longer be
/// refreshed, the user goes through the browser authorization flow. The cache is not
/// updated here; persist [`YouTubeClient::token`] with [`save_token`] once done with the
/// client, since it may have been refreshed in the meantime.
pub async fn setup_youtube_client(
    secrets: ClientSecrets,
    token_cache: &Path,
) -> eyre::Result<YouTubeClient> {
    let oauth_manager = OAuthManager::new(secrets);

    let token = match load_cached_token(token_cache).await? {
        Some(token) => {
            tracing::info!("refreshing cached token");
            let mut token = TimeBoundAccessToken::expired(token);
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh cached token")?
            {
                token
            } else {
                tracing::warn!("cached token refresh failed, getting new token via full OAuth");
                TimeBoundAccessToken::new(
                    oauth_manager
                        .authenticate()
                        .await
                        .context("authorize user to YouTube")?,
                )
            }
        }
        None => {
            tracing::info!("no cached token, starting OAuth flow");
            TimeBoundAccessToken::new(
                oauth_manager
                    .authenticate()
                    .await
                    .context("authorize user to YouTube")?,
            )
        }
    };

    let http_client = reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("build HTTP client")?;

    Ok(YouTubeClient::new(token, Arc::new(oauth_manager), http_client))
}
