//! Ingest a documentation site from the command line and print chunk stats.
//!
//! ```sh
//! cargo run --example ingest_demo -- https://docs.example.com
//! ```

use docmill_core::{HttpFetcher, ingest};
use docmill_shared::{AppConfig, IngestConfig, SilentProgress, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docmill=info".into()),
        )
        .init();

    let base_url = std::env::args()
        .nth(1)
        .ok_or("usage: ingest_demo <base-url>")?;

    let app_config = load_config().unwrap_or_else(|_| AppConfig::default());
    let config = IngestConfig::from_app_config(&base_url, &app_config);

    let fetcher = HttpFetcher::new(config.timeout_ms)?;
    let result = ingest(&config, &fetcher, None, None, &SilentProgress).await?;

    println!("site mode:  {}", result.profile.rendering_mode);
    println!("discovered: {}", result.discovered_count);
    println!("extracted:  {} ok, {} failed", result.success_count, result.failure_count);
    println!("chunks:     {}", result.chunks.len());

    for chunk in result.chunks.iter().take(3) {
        let section = chunk.section_title.as_deref().unwrap_or("-");
        println!(
            "  [{}] {} / {} ({} tokens)",
            chunk.ordinal_index, chunk.title, section, chunk.estimated_token_count
        );
    }
    if !result.errors.is_empty() {
        eprintln!("errors:");
        for (url, error) in &result.errors {
            eprintln!("  {url}: {error}");
        }
    }

    Ok(())
}
