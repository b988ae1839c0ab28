use std::path::PathBuf;

use chrono::NaiveDate;
use url::Url;

/// Placeholder for fields the source never provides (coordinates, county, ...).
/// Missing optional page elements use the same sentinel so the record schema
/// never carries nulls.
pub const NA: &str = "N/A";

// Source constants for this chain.
pub const PROVIDER: &str = "GTM Original";
pub const CATEGORY: &str = "Apparel And Accessory Stores";
pub const COUNTRY: &str = "USA";
pub const STATUS: &str = "Open";

/// Per-run configuration injected into the pipeline. Carries the archive
/// layout and the "current" date so normalization never reads the wall clock.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub base_dir: PathBuf,
    pub site_folder: String,
    pub today: NaiveDate,
}

impl RunContext {
    pub fn new(base_dir: PathBuf, site_url: &Url, today: NaiveDate) -> Self {
        let site_folder = site_url.host_str().unwrap_or_default().replace('.', "_");
        Self {
            base_dir,
            site_folder,
            today,
        }
    }

    /// Date segment of the archive path: DD_MM_YYYY.
    pub fn date_folder(&self) -> String {
        self.today.format("%d_%m_%Y").to_string()
    }

    /// `updated_date` record value: DD-MM-YYYY.
    pub fn updated_date(&self) -> String {
        self.today.format("%d-%m-%Y").to_string()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RunContext {
        RunContext::new(
            PathBuf::from("data/page_source"),
            &Url::parse("https://www.gtmstores.com/locations/").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    #[test]
    fn site_folder_from_host() {
        assert_eq!(ctx().site_folder, "www_gtmstores_com");
    }

    #[test]
    fn date_formats() {
        let c = ctx();
        assert_eq!(c.date_folder(), "15_01_2025");
        assert_eq!(c.updated_date(), "15-01-2025");
    }
}
