use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use sse_announcements::cli::Cli;
use sse_announcements::config::Config;
use sse_announcements::{downloader, storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "sse_announcements=info,sse_ann=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "sse-ann.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    let request = cli.into_request(&config, chrono::Local::now().naive_local());

    println!("--- Job parameters ---");
    println!("Security code: {}", request.security_code);
    println!("Date range: {} to {}", request.start_date, request.end_date);
    if !request.title_filter.is_empty() {
        println!("Title keyword: {}", request.title_filter);
    }
    println!("Output directory: {}", storage::display_path(&request.target_dir));
    println!("----------------------");

    info!("Starting download for security code: {}", request.security_code);

    match downloader::download_documents(&request, &config).await {
        Ok(summary) => {
            info!(
                "Downloaded {} of {} announcements ({} failed)",
                summary.succeeded, summary.announcements, summary.failed
            );
            println!(
                "\nAll tasks complete: {} periods, {} announcements, {} downloaded, {} failed.",
                summary.ranges, summary.announcements, summary.succeeded, summary.failed
            );
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            Err(e)
        }
    }
}
