//! Requesting revenue reports from the YouTube Analytics API.

use crate::youtube_api::{AnalyticsApi, Channel, Report, ReportQuery};
use eyre::Context;
use tracing::instrument;

/// Monthly estimated revenue of the given videos of `channel` for one calendar year.
///
/// This is a single request. Aggregate queries return at most one row per month, so there is
/// nothing to paginate. A report without rows is not an error.
#[instrument(skip(api, channel, video_ids), fields(channel_id = %channel.id, videos = video_ids.len()))]
pub async fn request_revenue_report(
    api: &impl AnalyticsApi,
    channel: &Channel,
    video_ids: &[String],
    year: i16,
    currency: &str,
) -> eyre::Result<Report> {
    let query = ReportQuery::monthly_revenue(&channel.id, video_ids, year, currency)?;
    let response = api
        .query_report(&query)
        .await
        .with_context(|| format!("request {year} revenue report"))?;

    let report = Report::from(response);
    tracing::debug!(rows = report.rows.len(), "received revenue report");
    Ok(report)
}
