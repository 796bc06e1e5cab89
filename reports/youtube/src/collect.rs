//! Gathering complete resource lists from the paginated YouTube Data API.

use crate::youtube_api::{Channel, DataApi, MAX_PAGE_SIZE, PagedStream, Playlist, collect_all};
use eyre::Context;
use tracing::instrument;

/// The authenticated user's default channel, which is the first one YouTube lists.
#[instrument(skip(api))]
pub async fn default_channel(api: &impl DataApi) -> eyre::Result<Channel> {
    let channels = collect_all(PagedStream::new(MAX_PAGE_SIZE, |page| {
        api.list_my_channels_page(page)
    }))
    .await
    .context("list channels of the authenticated user")?;

    let channel = channels
        .into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("no channel found for the authenticated user"))?;
    tracing::debug!(channel_id = %channel.id, title = %channel.title(), "resolved default channel");
    Ok(channel)
}

/// Every playlist of a channel, in the order the API returns them.
///
/// Use [`sort_by_title`] before walking them.
#[instrument(skip(api))]
pub async fn list_playlists(api: &impl DataApi, channel_id: &str) -> eyre::Result<Vec<Playlist>> {
    let playlists = collect_all(PagedStream::new(MAX_PAGE_SIZE, |page| {
        api.list_playlists_page(channel_id, page)
    }))
    .await
    .with_context(|| format!("collect playlists of channel {channel_id}"))?;

    tracing::debug!(count = playlists.len(), "collected playlists");
    Ok(playlists)
}

/// Orders playlists by title, case-sensitively. Equal titles keep their API order.
pub fn sort_by_title(playlists: &mut [Playlist]) {
    playlists.sort_by(|a, b| a.title().cmp(b.title()));
}

/// The ids of the videos in a playlist, in playlist order.
#[instrument(skip(api))]
pub async fn list_video_ids(api: &impl DataApi, playlist_id: &str) -> eyre::Result<Vec<String>> {
    let items = collect_all(PagedStream::new(MAX_PAGE_SIZE, |page| {
        api.list_playlist_items_page(playlist_id, page)
    }))
    .await
    .with_context(|| format!("collect items of playlist {playlist_id}"))?;

    Ok(items
        .into_iter()
        .map(|item| item.content_details.video_id)
        .collect())
}
