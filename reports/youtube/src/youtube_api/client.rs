//! Authenticated HTTP access to the YouTube Data and Analytics APIs.

use crate::oauth::OAuthManager;
use crate::youtube_api::{
    AnalyticsApi, DataApi,
    analytics::{QueryResponse, ReportQuery},
    channels::Channel,
    playlists::{Playlist, PlaylistItem},
    types::{ListResponse, PageRequest},
};
use eyre::Context;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

const CHANNELS_URL: &str = "https://www.googleapis.com/youtube/v3/channels";
const PLAYLISTS_URL: &str = "https://www.googleapis.com/youtube/v3/playlists";
const PLAYLIST_ITEMS_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";
const REPORTS_URL: &str = "https://youtubeanalytics.googleapis.com/v2/reports";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    /// The current OAuth2 token
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Creates a token that is already considered expired, forcing a refresh before first use.
    ///
    /// This is what tokens loaded from the on-disk cache start out as.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Creates a token whose expiry is computed from its `expires_in` field.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually leaves the refresh token out of refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Current time + `expires_in` minus a five minute buffer, or 55 minutes if the token does
    /// not say.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        if let Some(expires_in) = token.expires_in() {
            now + expires_in.saturating_sub(Duration::from_secs(300))
        } else {
            now + Duration::from_secs(3300)
        }
    }
}

/// Client for the YouTube Data API v3 and the YouTube Analytics API v2.
///
/// Both APIs accept the same OAuth2 access token, so one client serves as both the
/// [`DataApi`] and the [`AnalyticsApi`]. Expired access tokens are refreshed before a request
/// is sent. Requests are never retried.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
        }
    }

    /// Returns a clone of the underlying OAuth2 token, e.g. for persisting it.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self))]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if SystemTime::now() >= token.expires_at {
            tracing::debug!("access token expired, attempting refresh");
            if !token.refresh(&self.oauth_manager).await? {
                tracing::error!("access token refresh failed, client is unusable");
                eyre::bail!("Unable to refresh expired access token");
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated GET request and parses the JSON response body.
    ///
    /// Non-success status codes become errors carrying the status and the response text.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn get_json<T>(&self, url: &str, query_params: &[(&str, &str)]) -> eyre::Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let access_token = self.fresh_access_token().await?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .query(query_params)
            .send()
            .await
            .with_context(|| format!("send GET request to YouTube API: {}", url))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::eyre!(
                "YouTube API GET {} failed with status {}: {}",
                url,
                status_code,
                error_text
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("parse YouTube API response from {} as JSON", url))
    }

    async fn list_internal<T>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        page: PageRequest,
    ) -> eyre::Result<ListResponse<T>>
    where
        T: DeserializeOwned + Send,
    {
        let max_results_string = page.max_results.to_string();
        let mut query_params = params.to_vec();
        query_params.push(("maxResults", max_results_string.as_str()));

        if let Some(ref token) = page.page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let list: ListResponse<T> = self.get_json(url, &query_params).await?;

        tracing::debug!(
            url,
            returned_items = list.items.len(),
            has_next_page = list.next_page_token.is_some(),
            "fetched page"
        );

        Ok(list)
    }
}

impl DataApi for YouTubeClient {
    #[instrument(skip(self))]
    async fn list_my_channels_page(
        &self,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<Channel>> {
        let params = [
            ("part", "id,snippet"),
            ("mine", "true"),
            ("fields", "items(id,snippet/title),nextPageToken"),
        ];
        self.list_internal(CHANNELS_URL, &params, page)
            .await
            .context("list channels")
    }

    #[instrument(skip(self))]
    async fn list_playlists_page(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<Playlist>> {
        let params = [
            ("part", "id,snippet"),
            ("channelId", channel_id),
            ("fields", "items(id,snippet/title),nextPageToken"),
        ];
        self.list_internal(PLAYLISTS_URL, &params, page)
            .await
            .with_context(|| format!("list playlists of channel {channel_id}"))
    }

    #[instrument(skip(self))]
    async fn list_playlist_items_page(
        &self,
        playlist_id: &str,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<PlaylistItem>> {
        let params = [
            ("part", "id,contentDetails"),
            ("playlistId", playlist_id),
            ("fields", "items(id,contentDetails/videoId),nextPageToken"),
        ];
        self.list_internal(PLAYLIST_ITEMS_URL, &params, page)
            .await
            .with_context(|| format!("list items of playlist {playlist_id}"))
    }
}

impl AnalyticsApi for YouTubeClient {
    #[instrument(skip(self, query), fields(ids = %query.ids, filters = ?query.filters))]
    async fn query_report(&self, query: &ReportQuery) -> eyre::Result<QueryResponse> {
        let params = query.query_params();
        let query_params: Vec<(&str, &str)> = params
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();

        let response: QueryResponse = self
            .get_json(REPORTS_URL, &query_params)
            .await
            .context("query YouTube Analytics report")?;

        tracing::debug!(
            columns = response.column_headers.len(),
            rows = response.rows.as_ref().map_or(0, Vec::len),
            "fetched report"
        );

        Ok(response)
    }
}
