use sitemap_kit_core::CATEGORIES;
use sitemap_kit_fetcher::ContentSource;

use super::{ConfigArgs, content_source};

/// Fetch every category uncached and report what validation would drop.
pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let source = content_source(&config)?;

    println!("Validating content at: {}", config.api.base_url);

    let mut failed = 0;
    let mut dropped = 0;
    for category in CATEGORIES {
        match source.fetch_category(category).await {
            Ok(fetched) => {
                let report = &fetched.report;
                println!(
                    "✓ {} ({}): {} valid, {} rejected",
                    category.name,
                    category.key,
                    report.accepted,
                    report.dropped()
                );
                for rejection in &report.rejected {
                    println!("    item {}: {}", rejection.index, rejection.reason);
                }
                dropped += report.dropped();
            }
            Err(err) => {
                println!("✗ {} ({}): {}", category.name, category.key, err);
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "{} categories checked, {} failed, {} items rejected",
        CATEGORIES.len(),
        failed,
        dropped
    );

    if failed > 0 {
        anyhow::bail!("{} categories could not be fetched", failed);
    }

    Ok(())
}
