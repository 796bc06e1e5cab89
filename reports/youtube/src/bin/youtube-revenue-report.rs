use eyre::Context;
use std::io::IsTerminal;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_revenue_report::config::{
    CLIENT_SECRETS_PATH, ClientSecrets, ReportSettings, TOKEN_CACHE_PATH,
};
use youtube_revenue_report::{aggregate, save_token, setup_youtube_client};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // stdout is reserved for the reports themselves
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let token_cache = Path::new(TOKEN_CACHE_PATH);
    let secrets = ClientSecrets::load(Path::new(CLIENT_SECRETS_PATH)).await?;
    let yt = setup_youtube_client(secrets, token_cache)
        .await
        .context("set up YouTube client")?;

    let settings = ReportSettings::current();
    tracing::info!(
        first_year = settings.first_year,
        last_year = settings.last_year,
        currency = %settings.currency,
        "writing revenue reports"
    );

    let mut stdout = std::io::stdout().lock();
    let result = aggregate::run(&yt, &yt, &settings, &mut stdout).await;

    // the token may have been refreshed during the run, so save it even if the run failed
    let saved = save_token(token_cache, &yt.token().await).await;
    result?;
    saved
}
