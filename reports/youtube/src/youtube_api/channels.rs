//! YouTube Channels API types.

use serde::Deserialize;

/// A `channel` resource contains information about a YouTube channel.
///
/// Only the members selected by the `items(id,snippet/title)` projection are modelled.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    /// Contains basic details about the channel.
    pub snippet: ChannelSnippet,
}

/// The snippet object contains basic details about the channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: String,
}

impl Channel {
    pub fn title(&self) -> &str {
        &self.snippet.title
    }
}
