use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::header;
use rusqlite::Connection;
use tracing::{info, warn};
use url::Url;

use crate::archive;
use crate::db::{self, FetchRow};
use crate::parser::context::RunContext;

pub const LOCATOR_URL: &str = "https://www.gtmstores.com/locations/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
                      image/avif,image/webp,image/apng,*/*;q=0.8";

pub struct FetchedPage {
    pub url: String,
    pub body: Vec<u8>,
    pub html: String,
    pub status: u16,
    pub latency_ms: i64,
}

/// Plain GET of the locator page with a browser-like header set. No retries;
/// a failed fetch is recorded and reported, not re-attempted.
pub async fn fetch_locator_page(client: &reqwest::Client) -> Result<FetchedPage> {
    let start = Instant::now();
    let response = client
        .get(LOCATOR_URL)
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, ACCEPT)
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .header(header::CACHE_CONTROL, "no-cache")
        .send()
        .await
        .context("requesting locator page")?;

    let status = response.status().as_u16();
    let body = response.bytes().await.context("reading response body")?.to_vec();
    let latency_ms = start.elapsed().as_millis() as i64;
    let html = String::from_utf8_lossy(&body).into_owned();

    Ok(FetchedPage {
        url: LOCATOR_URL.to_string(),
        body,
        html,
        status,
        latency_ms,
    })
}

/// Fetch the locator page, write the gzip snapshot, and record the page in
/// the DB. Returns the new page_data row id. On fetch failure an error row is
/// stored before the error propagates.
pub async fn fetch_and_store(conn: &Connection, ctx: &RunContext) -> Result<i64> {
    let client = reqwest::Client::new();

    let page = match fetch_locator_page(&client).await {
        Ok(page) => page,
        Err(e) => {
            warn!("fetch failed: {e:#}");
            db::insert_page(
                conn,
                &FetchRow {
                    url: LOCATOR_URL.to_string(),
                    html: None,
                    status: None,
                    error: Some(format!("{e:#}")),
                    latency_ms: None,
                    pagesave_path: None,
                },
            )?;
            return Err(e);
        }
    };

    let source_url = Url::parse(&page.url)?;
    let content_id = archive::generate_id(&source_url);
    let snapshot = archive::archive_path(
        &ctx.base_dir,
        &ctx.date_folder(),
        &ctx.site_folder,
        &content_id,
    );
    archive::save_snapshot(&snapshot, &page.body)?;
    info!(
        "fetched {} ({} bytes, HTTP {}, {} ms); snapshot {}",
        page.url,
        page.body.len(),
        page.status,
        page.latency_ms,
        snapshot.display()
    );

    let page_id = db::insert_page(
        conn,
        &FetchRow {
            url: page.url,
            html: Some(page.html),
            status: Some(page.status as i32),
            error: None,
            latency_ms: Some(page.latency_ms),
            pagesave_path: Some(snapshot.display().to_string()),
        },
    )?;
    Ok(page_id)
}
