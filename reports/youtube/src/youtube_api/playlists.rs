//! YouTube Playlists and PlaylistItems API types.

use serde::Deserialize;

/// A `playlist` resource represents a YouTube playlist owned by a channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playlist {
    /// The ID that YouTube uses to uniquely identify the playlist.
    pub id: String,
    /// Basic details about the playlist.
    pub snippet: PlaylistSnippet,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistSnippet {
    /// The playlist's title.
    pub title: String,
}

impl Playlist {
    pub fn title(&self) -> &str {
        &self.snippet.title
    }
}

/// A `playlistItem` resource identifies a video included in a playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistItem {
    /// The ID that YouTube uses to uniquely identify the playlist item.
    ///
    /// This is _not_ the video ID.
    pub id: String,
    #[serde(rename = "contentDetails")]
    pub content_details: PlaylistItemContentDetails,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#contentDetails>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistItemContentDetails {
    /// The ID that YouTube uses to uniquely identify the video in the playlist.
    #[serde(rename = "videoId")]
    pub video_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::types::ListResponse;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_projected_playlist_items_page() {
        let json = r#"{
            "nextPageToken": "EAAaBlBUOkNESQ",
            "items": [
                {"id": "UExhYmMuMDE", "contentDetails": {"videoId": "dQw4w9WgXcQ"}},
                {"id": "UExhYmMuMDI", "contentDetails": {"videoId": "9bZkp7q19f0"}}
            ]
        }"#;
        let page: ListResponse<PlaylistItem> = serde_json::from_str(json).unwrap();
        assert_eq!(
            page.items
                .iter()
                .map(|item| item.content_details.video_id.as_str())
                .collect::<Vec<_>>(),
            vec!["dQw4w9WgXcQ", "9bZkp7q19f0"]
        );
        assert_eq!(page.next_page_token.as_deref(), Some("EAAaBlBUOkNESQ"));
    }

    #[test]
    fn parses_projected_playlists_page() {
        let json = r#"{"items": [{"id": "PL1", "snippet": {"title": "Tutorials"}}]}"#;
        let page: ListResponse<Playlist> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].title(), "Tutorials");
        assert_eq!(page.next_page_token, None);
    }
}
