//! Copy a text column from one database into another, page by page.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use subflow::rowcopy::{RowCopyConfig, RowCopyJob};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Source database URL (mysql://..., sqlite://...)
    #[arg(long, env = "ROW_COPY_SOURCE_URL")]
    source_url: String,

    /// Target database URL
    #[arg(long, env = "ROW_COPY_TARGET_URL")]
    target_url: String,

    /// Table present in both databases
    #[arg(long, default_value = "course_content_transcripts")]
    table: String,

    #[arg(long, default_value = "id")]
    id_column: String,

    #[arg(long, default_value = "text")]
    text_column: String,

    /// First id to copy (inclusive)
    #[arg(long, default_value_t = 81036)]
    start_id: i64,

    #[arg(long, default_value_t = 1000)]
    page_size: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .init();

    let config = RowCopyConfig {
        source_url: args.source_url,
        target_url: args.target_url,
        table: args.table,
        id_column: args.id_column,
        text_column: args.text_column,
        start_id: args.start_id,
        page_size: args.page_size,
    };

    info!("Copying {}.{} from id {}", config.table, config.text_column, config.start_id);

    let job = RowCopyJob::connect(config).await?;
    match job.run().await {
        Ok(report) => info!("Copied {} rows in {} pages", report.rows, report.pages),
        Err(e) => error!("Row copy aborted: {}", e),
    }

    Ok(())
}
