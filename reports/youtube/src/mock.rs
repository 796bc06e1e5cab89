//! In-memory YouTube backend for tests.
//!
//! Serves channels, playlists, playlist items and monthly revenue from fixtures, paginates list
//! endpoints with opaque page tokens the way YouTube does, and records every call so tests can
//! check what was requested and in which order.

use crate::youtube_api::{
    AnalyticsApi, Channel, ChannelSnippet, DataApi, ListResponse, PageRequest, Playlist,
    PlaylistItem, PlaylistItemContentDetails, PlaylistSnippet, QueryResponse, ReportQuery,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Channels {
        page_token: Option<String>,
    },
    Playlists {
        channel_id: String,
        page_token: Option<String>,
    },
    PlaylistItems {
        playlist_id: String,
        page_token: Option<String>,
    },
    Report(ReportQuery),
}

#[derive(Debug, Default)]
pub struct MockYouTube {
    channels: Vec<Channel>,
    playlists: HashMap<String, Vec<Playlist>>,
    items: HashMap<String, Vec<PlaylistItem>>,
    /// video id -> month (`YYYY-MM`) -> revenue
    revenue: HashMap<String, BTreeMap<String, f64>>,
    failing_playlists: HashSet<String>,
    failing_reports: bool,
    calls: Mutex<Vec<Call>>,
}

impl MockYouTube {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, id: &str, title: &str) -> Self {
        self.channels.push(Channel {
            id: id.to_string(),
            snippet: ChannelSnippet {
                title: title.to_string(),
            },
        });
        self
    }

    /// Adds a playlist to a channel's listing, after the ones added before it.
    pub fn with_playlist(
        mut self,
        channel_id: &str,
        playlist_id: &str,
        title: &str,
        video_ids: &[&str],
    ) -> Self {
        self.playlists
            .entry(channel_id.to_string())
            .or_default()
            .push(Playlist {
                id: playlist_id.to_string(),
                snippet: PlaylistSnippet {
                    title: title.to_string(),
                },
            });
        let items = video_ids
            .iter()
            .enumerate()
            .map(|(i, video_id)| PlaylistItem {
                id: format!("{playlist_id}.{i}"),
                content_details: PlaylistItemContentDetails {
                    video_id: video_id.to_string(),
                },
            })
            .collect();
        self.items.insert(playlist_id.to_string(), items);
        self
    }

    pub fn with_revenue(mut self, video_id: &str, month: &str, amount: f64) -> Self {
        self.revenue
            .entry(video_id.to_string())
            .or_default()
            .insert(month.to_string(), amount);
        self
    }

    pub fn failing_playlist_items(mut self, playlist_id: &str) -> Self {
        self.failing_playlists.insert(playlist_id.to_string());
        self
    }

    pub fn failing_reports(mut self) -> Self {
        self.failing_reports = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn paginate<T: Clone>(all: &[T], page: &PageRequest) -> eyre::Result<ListResponse<T>> {
    let start = match page.page_token.as_deref() {
        None => 0,
        Some(token) => token
            .strip_prefix("CAUQ-")
            .and_then(|offset| offset.parse().ok())
            .ok_or_else(|| eyre::eyre!("400 invalid page token {token:?}"))?,
    };
    let end = (start + page.max_results as usize).min(all.len());
    Ok(ListResponse {
        items: all[start.min(end)..end].iter().cloned().collect(),
        next_page_token: (end < all.len()).then(|| format!("CAUQ-{end}")),
    })
}

impl DataApi for MockYouTube {
    async fn list_my_channels_page(
        &self,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<Channel>> {
        self.record(Call::Channels {
            page_token: page.page_token.clone(),
        });
        paginate(&self.channels, &page)
    }

    async fn list_playlists_page(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<Playlist>> {
        self.record(Call::Playlists {
            channel_id: channel_id.to_string(),
            page_token: page.page_token.clone(),
        });
        let playlists = self.playlists.get(channel_id);
        paginate(playlists.map_or(&[][..], Vec::as_slice), &page)
    }

    async fn list_playlist_items_page(
        &self,
        playlist_id: &str,
        page: PageRequest,
    ) -> eyre::Result<ListResponse<PlaylistItem>> {
        self.record(Call::PlaylistItems {
            playlist_id: playlist_id.to_string(),
            page_token: page.page_token.clone(),
        });
        if self.failing_playlists.contains(playlist_id) {
            eyre::bail!("YouTube API GET playlistItems failed with status 404 Not Found");
        }
        let items = self
            .items
            .get(playlist_id)
            .ok_or_else(|| eyre::eyre!("404 playlist {playlist_id} not found"))?;
        paginate(items, &page)
    }
}

impl AnalyticsApi for MockYouTube {
    async fn query_report(&self, query: &ReportQuery) -> eyre::Result<QueryResponse> {
        self.record(Call::Report(query.clone()));
        if self.failing_reports {
            eyre::bail!("YouTube API GET reports failed with status 403 Forbidden");
        }

        let video_ids = query
            .filters
            .as_deref()
            .and_then(|filters| filters.strip_prefix("video=="))
            .map(|ids| ids.split(',').collect::<Vec<_>>())
            .unwrap_or_default();
        let year = format!("{}-", query.start_date.year());

        let mut by_month: BTreeMap<&str, f64> = BTreeMap::new();
        for video_id in video_ids {
            for (month, amount) in self.revenue.get(video_id).into_iter().flatten() {
                if month.starts_with(&year) {
                    *by_month.entry(month.as_str()).or_default() += amount;
                }
            }
        }

        let rows: Vec<Vec<serde_json::Value>> = by_month
            .into_iter()
            .map(|(month, amount)| vec![month.into(), amount.into()])
            .collect();
        let rows = (!rows.is_empty()).then_some(rows);
        let response = serde_json::json!({
            "kind": "youtubeAnalytics#resultTable",
            "columnHeaders": [
                {"name": "month", "columnType": "DIMENSION", "dataType": "STRING"},
                {"name": "estimatedRevenue", "columnType": "METRIC", "dataType": "FLOAT"}
            ],
            "rows": rows,
        });
        Ok(serde_json::from_value(response)?)
    }
}
