//! Clients for the YouTube Data API v3 and the YouTube Analytics API v2.
//!
//! The rest of the crate only talks to YouTube through the [`DataApi`] and [`AnalyticsApi`]
//! traits. [`YouTubeClient`] implements both over HTTP; tests use an in-memory backend.
//!
//! # Pagination
//!
//! List endpoints return at most [`types::MAX_PAGE_SIZE`] items per call along with an opaque
//! `nextPageToken`. [`DataApi`] exposes single pages, and [`PagedStream`] turns a page fetcher
//! into a stream over every item:
//!
//! ```rust,no_run
//! use youtube_revenue_report::youtube_api::{DataApi, PagedStream, collect_all};
//!
//! # async fn example(api: &impl DataApi) -> eyre::Result<()> {
//! let channels = collect_all(PagedStream::new(50, |page| api.list_my_channels_page(page))).await?;
//! for channel in channels {
//!     println!("{} ({})", channel.snippet.title, channel.id);
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;

pub mod analytics;
pub mod channels;
pub mod client;
pub mod playlists;
pub mod types;

pub use analytics::{Cell, ColumnHeader, DataType, QueryResponse, Report, ReportQuery};
pub use channels::{Channel, ChannelSnippet};
pub use client::{TimeBoundAccessToken, YouTubeClient};
pub use playlists::{Playlist, PlaylistItem, PlaylistItemContentDetails, PlaylistSnippet};
pub use types::{ListResponse, MAX_PAGE_SIZE, PageRequest, PagedStream, collect_all};

/// Single-page access to the YouTube Data API list endpoints.
///
/// Every request projects its results down to the members the report needs.
pub trait DataApi: Sync {
    /// One page of `channels.list` with `mine=true`.
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    fn list_my_channels_page(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = eyre::Result<ListResponse<Channel>>> + Send;

    /// One page of `playlists.list` for the given channel.
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    fn list_playlists_page(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> impl Future<Output = eyre::Result<ListResponse<Playlist>>> + Send;

    /// One page of `playlistItems.list` for the given playlist.
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    fn list_playlist_items_page(
        &self,
        playlist_id: &str,
        page: PageRequest,
    ) -> impl Future<Output = eyre::Result<ListResponse<PlaylistItem>>> + Send;
}

/// Access to the YouTube Analytics API report endpoint.
pub trait AnalyticsApi: Sync {
    /// Runs a single `reports.query` call.
    ///
    /// <https://developers.google.com/youtube/analytics/reference/reports/query>
    fn query_report(
        &self,
        query: &ReportQuery,
    ) -> impl Future<Output = eyre::Result<QueryResponse>> + Send;
}
