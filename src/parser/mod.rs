pub mod context;
pub mod extract;
pub mod normalize;

use tracing::warn;
use url::Url;

use crate::db::{PageData, StoreRow};
use context::RunContext;

pub struct PageRecords {
    pub rows: Vec<StoreRow>,
    pub skipped: usize,
}

/// Two-pass pipeline: HTML → raw store blocks → normalized records.
/// A block with a malformed address is logged and skipped; everything else
/// degrades to sentinel values rather than being dropped.
pub fn process_page(page: &PageData, ctx: &RunContext) -> PageRecords {
    let source_url = match Url::parse(&page.url) {
        Ok(u) => u,
        Err(e) => {
            warn!("page {} has unparseable url {:?}: {e}", page.id, page.url);
            return PageRecords {
                rows: Vec::new(),
                skipped: 0,
            };
        }
    };

    let blocks = extract::extract(&page.html);
    let mut rows = Vec::with_capacity(blocks.len());
    let mut skipped = 0;

    for block in &blocks {
        match normalize::normalize(block, &source_url, page.id, ctx) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    "skipping store {:?} on page {}: {e}",
                    block.name_text.as_deref().unwrap_or("unnamed"),
                    page.id
                );
                skipped += 1;
            }
        }
    }

    PageRecords { rows, skipped }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{archive_path, generate_id};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn test_ctx() -> RunContext {
        RunContext::new(
            PathBuf::from("data/page_source"),
            &Url::parse("https://www.gtmstores.com/locations/").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    fn fixture_page() -> PageData {
        PageData {
            id: 1,
            url: "https://www.gtmstores.com/locations/".to_string(),
            html: std::fs::read_to_string("tests/fixtures/locations.html").unwrap(),
        }
    }

    #[test]
    fn fixture_end_to_end() {
        let ctx = test_ctx();
        let result = process_page(&fixture_page(), &ctx);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.skipped, 0);

        let r = &result.rows[0];
        assert_eq!(r.store_no, "N/A");
        assert_eq!(r.name, "GTM Store #1 – Santee");
        assert_eq!(r.latitude, "N/A");
        assert_eq!(r.longitude, "N/A");
        assert_eq!(r.street, "1234 Mission Gorge Rd");
        assert_eq!(r.city, "Santee");
        assert_eq!(r.state, "CA");
        assert_eq!(r.zip_code, "92071");
        assert_eq!(r.county, "N/A");
        assert_eq!(r.phone, "(619) 448-1000");
        assert_eq!(
            r.open_hours,
            "Monday: 10:00-21:00 | Tuesday: 10:00-21:00 | Wednesday: 10:00-21:00 | \
             Thursday: 10:00-21:00 | Friday: 10:00-21:00 | Saturday: 10:00-20:00 | \
             Sunday: 10:00-19:00"
        );
        assert_eq!(r.url, "https://www.gtmstores.com/locations/");
        assert_eq!(r.provider, "GTM Original");
        assert_eq!(r.category, "Apparel And Accessory Stores");
        assert_eq!(r.updated_date, "15-01-2025");
        assert_eq!(r.country, "USA");
        assert_eq!(r.status, "Open");
        assert!(r.direction_url.starts_with("https://www.google.com/maps/"));

        // pagesave_path must agree with archive_path over the same id
        let url = Url::parse(&r.url).unwrap();
        let expected = archive_path(
            &ctx.base_dir,
            &ctx.date_folder(),
            &ctx.site_folder,
            &generate_id(&url),
        );
        assert_eq!(r.pagesave_path, expected.display().to_string());
        assert_eq!(
            r.pagesave_path,
            "data/page_source/15_01_2025/www_gtmstores_com/38cdda31.html.gz"
        );
    }

    #[test]
    fn sparse_block_gets_sentinels() {
        let result = process_page(&fixture_page(), &test_ctx());
        let r = &result.rows[1];
        // Second fixture block has no heading, no maps link, no schedule text
        assert_eq!(r.name, "N/A");
        assert_eq!(r.direction_url, "N/A");
        assert_eq!(r.open_hours, "");
        assert_eq!(r.city, "El Cajon");
    }

    #[test]
    fn malformed_address_is_skipped_not_defaulted() {
        let page = PageData {
            id: 7,
            url: "https://www.gtmstores.com/locations/".to_string(),
            html: r#"
                <div data-id="9f8d33b">
                  <div>
                    <h2 class="elementor-heading-title">Broken Store</h2>
                    <div data-widget_type="text-editor.default">
                      <p>No commas here at all</p>
                    </div>
                  </div>
                </div>"#
                .to_string(),
        };
        let result = process_page(&page, &test_ctx());
        assert!(result.rows.is_empty());
        assert_eq!(result.skipped, 1);
    }
}
