use anyhow::{Context, Result};
use sitemap_kit_core::{ROBOTS_FILE, SITEMAP_FILE};
use sitemap_kit_generator::{GenerationReport, SitemapOutput, render_robots};
use std::path::PathBuf;

use super::{ConfigArgs, build_assembler};

/// Generate sitemap files into the public directory
pub async fn run(args: ConfigArgs, output: Option<PathBuf>, write_robots: bool) -> Result<()> {
    let mut config = args.resolve()?;
    if let Some(output) = output {
        config.site.public_dir = output;
    }

    println!("🗺️  Generating sitemap...");
    println!("   Site: {}", config.site.base_url);
    println!("   API: {}", config.api.base_url);
    println!("   Output: {}", config.site.public_dir.display());
    println!();

    let assembler = build_assembler(&config)?;
    let assembly = assembler
        .assemble()
        .await
        .context("Failed to write split sitemap")?;

    print_report(&assembly.report);

    match &assembly.output {
        SitemapOutput::Complete(entries) => {
            let path = assembler
                .writer()
                .write_sitemap_file(entries, SITEMAP_FILE)
                .await
                .context("Failed to write sitemap.xml")?;
            println!("   ✓ Wrote {} URLs to {}", entries.len(), path.display());
        }
        SitemapOutput::Split(index) => {
            println!(
                "   ✓ Split {} URLs into {} files plus index",
                assembly.report.total_urls,
                index.len()
            );
        }
    }

    if write_robots {
        let robots = render_robots(assembler.base_url(), assembly.output.is_split());
        let path = assembler
            .writer()
            .write_text_file(ROBOTS_FILE, &robots)
            .await
            .context("Failed to write robots.txt")?;
        println!("   ✓ Wrote {}", path.display());
    }

    println!();
    println!("✅ Sitemap complete!");

    Ok(())
}

fn print_report(report: &GenerationReport) {
    println!("📦 Categories:");
    for category in &report.categories {
        let dropped = if category.dropped > 0 {
            format!(", {} dropped", category.dropped)
        } else {
            String::new()
        };
        println!(
            "   {:<14} {:>6} items ({}{})",
            category.key,
            category.items,
            category.source.as_str(),
            dropped
        );
    }
    println!();
    println!("   Static routes: {}", report.static_entries);
    println!("   Dynamic routes: {}", report.dynamic_entries);
    if report.duplicate_entries > 0 || report.invalid_entries > 0 {
        println!(
            "   ⚠ Removed {} duplicate and {} malformed entries",
            report.duplicate_entries, report.invalid_entries
        );
    }
    println!();
}
