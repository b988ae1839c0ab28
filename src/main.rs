mod archive;
mod db;
mod fetcher;
mod parser;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use url::Url;

use parser::context::RunContext;

#[derive(Parser)]
#[command(name = "gtm_scraper", about = "GTM store locator scraper")]
struct Cli {
    /// Base directory for gzip page snapshots
    #[arg(long, default_value = "data/page_source")]
    archive_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Fetch the locator page, archive it, and store the raw HTML
    Fetch,
    /// Extract and normalize store records from fetched pages
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + process in one pipeline
    Run,
    /// Show fetch/processing statistics
    Stats,
    /// Stored records overview table
    Overview {
        /// Filter by city
        #[arg(short, long)]
        city: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let site_url = Url::parse(fetcher::LOCATOR_URL)?;
    let ctx = RunContext::new(
        cli.archive_dir.clone(),
        &site_url,
        chrono::Local::now().date_naive(),
    );

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            println!("Schema ready.");
            Ok(())
        }
        Commands::Fetch => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let page_id = fetcher::fetch_and_store(&conn, &ctx).await?;
            println!("Fetched locator page (page_data id {}).", page_id);
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let (saved, skipped) = process_pages(&conn, &pages, &ctx)?;
            println!("Saved {} store records ({} skipped).", saved, skipped);
            Ok(())
        }
        Commands::Run => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            fetcher::fetch_and_store(&conn, &ctx).await?;
            let pages = db::fetch_unprocessed(&conn, None)?;
            if pages.is_empty() {
                println!("Nothing to process.");
                return Ok(());
            }
            let (saved, skipped) = process_pages(&conn, &pages, &ctx)?;
            println!("Saved {} store records ({} skipped).", saved, skipped);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Pages fetched:   {}", s.pages);
            println!("  with HTML:     {}", s.fetched_ok);
            println!("  with errors:   {}", s.errors);
            println!("Pages processed: {}", s.processed);
            println!("Store records:   {}", s.stores);
            Ok(())
        }
        Commands::Overview { city, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, city.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No stores found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<30} | {:<16} | {:>2} | {:<5} | {:<14}",
                "#", "Store", "Street", "City", "St", "Zip", "Phone"
            );
            println!("{}", "-".repeat(115));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<30} | {:<16} | {:>2} | {:<5} | {:<14}",
                    i + 1,
                    truncate(&r.name, 28),
                    truncate(&r.street, 30),
                    truncate(&r.city, 16),
                    r.state,
                    r.zip_code,
                    r.phone
                );
            }

            let with_hours: Vec<_> = rows.iter().filter(|r| !r.open_hours.is_empty()).collect();
            if !with_hours.is_empty() {
                println!("\n--- Hours ---");
                for r in &with_hours {
                    println!("  {}: {}", truncate(&r.name, 28), r.open_hours);
                }
            }

            println!("\n{} stores", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::PageData],
    ctx: &RunContext,
) -> Result<(usize, usize)> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")?
            .progress_chars("=> "),
    );

    let mut saved = 0;
    let mut skipped = 0;

    for chunk in pages.chunks(100) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|page| parser::process_page(page, ctx))
            .collect();

        let mut rows = Vec::new();
        for result in results {
            skipped += result.skipped;
            rows.extend(result.rows);
        }
        saved += rows.len();
        db::save_stores(conn, &rows)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok((saved, skipped))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
