//! Walking a channel's playlists year by year and writing the yearly report files.

use crate::collect::{default_channel, list_playlists, list_video_ids, sort_by_title};
use crate::config::ReportSettings;
use crate::render::{write_console_table, write_csv_section};
use crate::report::request_revenue_report;
use crate::youtube_api::{AnalyticsApi, DataApi};
use eyre::Context;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Writes one revenue report file per year in `settings`.
///
/// Progress and the per-playlist tables are printed to `console`; the report files only
/// receive the CSV sections. The first error aborts the run.
pub async fn run(
    data: &impl DataApi,
    analytics: &impl AnalyticsApi,
    settings: &ReportSettings,
    console: &mut impl Write,
) -> eyre::Result<()> {
    for year in settings.years() {
        tracing::info!(year, "generating revenue report");
        write_year(data, analytics, settings, year, console)
            .await
            .with_context(|| format!("generate {year} revenue report"))?;
    }
    Ok(())
}

async fn write_year(
    data: &impl DataApi,
    analytics: &impl AnalyticsApi,
    settings: &ReportSettings,
    year: i16,
    console: &mut impl Write,
) -> eyre::Result<()> {
    let path = settings.report_path(year);
    // Dropping the BufWriter flushes whatever was written, so a failed year still leaves a
    // (truncated) file behind.
    let file = File::create(&path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut report_file = BufWriter::new(file);

    let channel = default_channel(data).await?;
    writeln!(
        console,
        "Default Channel: {} ( {} )\n",
        channel.title(),
        channel.id
    )?;

    let mut playlists = list_playlists(data, &channel.id).await?;
    sort_by_title(&mut playlists);

    let revenue_title = format!("revenue {}", settings.currency);
    for playlist in &playlists {
        let video_ids = list_video_ids(data, &playlist.id).await?;
        let playlist_info = format!(
            "playlist: {}, videos: {}",
            playlist.title(),
            video_ids.len()
        );
        writeln!(console, "{playlist_info}")?;

        if video_ids.is_empty() {
            tracing::info!(playlist_id = %playlist.id, title = %playlist.title(), "skipping empty playlist");
            writeln!(console, "ignoring empty playlist: {playlist_info}")?;
            continue;
        }

        let report =
            request_revenue_report(analytics, &channel, &video_ids, year, &settings.currency)
                .await
                .with_context(|| format!("report on playlist {}", playlist.title()))?;
        write_console_table(console, &report)?;
        write_csv_section(
            &mut report_file,
            &playlist_info,
            &["month", revenue_title.as_str()],
            &report,
        )
        .with_context(|| format!("write to {}", path.display()))?;
    }

    report_file
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    tracing::info!(year, path = %path.display(), playlists = playlists.len(), "wrote revenue report");
    Ok(())
}
