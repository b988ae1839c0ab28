use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::archive::{archive_path, generate_id};
use crate::db::StoreRow;
use crate::parser::context::{RunContext, CATEGORY, COUNTRY, NA, PROVIDER, STATUS};
use crate::parser::extract::RawBlock;

static MON_FRI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Monday thru Friday: (\d{1,2})(am|pm) – (\d{1,2})(am|pm)").unwrap());
static SATURDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Saturday: (\d{1,2})(am|pm) – (\d{1,2})(am|pm)").unwrap());
static SUNDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Sunday: (\d{1,2})(am|pm) – (\d{1,2})(am|pm)").unwrap());

const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Malformed structured-location input. Fatal for the record: downstream
/// consumers depend on street/city/state/zip, so these are never defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("address has {got} comma-separated segment(s), need at least 3")]
    TooFewSegments { got: usize },
    #[error("last address segment {segment:?} is not \"STATE ZIP\"")]
    BadStateZip { segment: String },
}

/// Replace any whitespace run (incl. newlines) with one space and trim.
/// Idempotent.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the locator's free-text hours into "Day: HH:MM-HH:MM" tokens joined
/// by " | ". Recognizes exactly three page wordings (en dash between times):
/// "Monday thru Friday: Ham – Hpm", "Saturday: ...", "Sunday: ...".
/// Unmatched patterns are simply absent from the output; never an error.
pub fn parse_schedule(raw: &str) -> String {
    let mut tokens = Vec::new();

    if let Some(caps) = MON_FRI_RE.captures(raw) {
        let start = to_24h(&caps[1], &caps[2]);
        let end = to_24h(&caps[3], &caps[4]);
        for day in WEEKDAYS {
            tokens.push(format!("{day}: {start}-{end}"));
        }
    }
    if let Some(caps) = SATURDAY_RE.captures(raw) {
        tokens.push(format!("Saturday: {}-{}", to_24h(&caps[1], &caps[2]), to_24h(&caps[3], &caps[4])));
    }
    if let Some(caps) = SUNDAY_RE.captures(raw) {
        tokens.push(format!("Sunday: {}-{}", to_24h(&caps[1], &caps[2]), to_24h(&caps[3], &caps[4])));
    }

    tokens.join(" | ")
}

/// 12-hour on-the-hour token to HH:MM. 12am → 00:00, 12pm → 12:00.
/// Meridiem is resolved here, per token; the joined schedule string is never
/// post-processed.
fn to_24h(hour: &str, meridiem: &str) -> String {
    // Captured as \d{1,2}, always parses.
    let hour: u32 = hour.parse().unwrap_or(0);
    let hour = match (meridiem, hour) {
        ("am", 12) => 0,
        ("pm", h) if h != 12 => h + 12,
        (_, h) => h,
    };
    format!("{hour:02}:00")
}

/// Split "street[, street...], city, STATE ZIP" into its four parts.
/// The street may itself contain commas; the last two segments are strict.
pub fn split_address(line: &str) -> Result<(String, String, String, String), FormatError> {
    let segments: Vec<&str> = line.split(',').map(str::trim).collect();
    if segments.len() < 3 {
        return Err(FormatError::TooFewSegments { got: segments.len() });
    }

    let state_zip = segments[segments.len() - 1];
    let mut parts = state_zip.split_whitespace();
    let (state, zip) = match (parts.next(), parts.next(), parts.next()) {
        (Some(state), Some(zip), None) => (state, zip),
        _ => {
            return Err(FormatError::BadStateZip {
                segment: state_zip.to_string(),
            })
        }
    };

    let city = segments[segments.len() - 2].to_string();
    let street = segments[..segments.len() - 2].join(", ");
    Ok((street, city, state.to_string(), zip.to_string()))
}

/// Turn one extracted block into a full 19-field record. Total except for the
/// address split: a malformed address is a FormatError the host decides how
/// to handle. Unavailable fields get the NA sentinel, uniformly.
pub fn normalize(
    block: &RawBlock,
    source_url: &Url,
    page_id: i64,
    ctx: &RunContext,
) -> Result<StoreRow, FormatError> {
    let name = block
        .name_text
        .as_deref()
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NA.to_string());

    // Positional paragraph layout from the page: 0-1 address, 2 phone,
    // 4-6 hours (3 is the "Store Hours:" label).
    let address_line = block.paragraph_texts[..block.paragraph_texts.len().min(2)]
        .iter()
        .map(|p| collapse_whitespace(p))
        .collect::<Vec<_>>()
        .join(", ");
    let (street, city, state, zip_code) = split_address(&address_line)?;

    let phone = block
        .paragraph_texts
        .get(2)
        .map(|p| collapse_whitespace(p))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NA.to_string());

    let hours_raw = block
        .paragraph_texts
        .iter()
        .skip(4)
        .take(3)
        .map(|p| collapse_whitespace(p))
        .collect::<Vec<_>>()
        .join(" ");
    let open_hours = parse_schedule(&hours_raw);

    let direction_url = block
        .map_link
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NA.to_string());

    let content_id = generate_id(source_url);
    let pagesave_path = archive_path(
        &ctx.base_dir,
        &ctx.date_folder(),
        &ctx.site_folder,
        &content_id,
    )
    .display()
    .to_string();

    Ok(StoreRow {
        page_id,
        store_no: NA.to_string(),
        name,
        latitude: NA.to_string(),
        longitude: NA.to_string(),
        street,
        city,
        state,
        zip_code,
        county: NA.to_string(),
        phone,
        open_hours,
        url: source_url.as_str().to_string(),
        provider: PROVIDER.to_string(),
        category: CATEGORY.to_string(),
        updated_date: ctx.updated_date(),
        country: COUNTRY.to_string(),
        status: STATUS.to_string(),
        direction_url,
        pagesave_path,
    })
}

// ── Tests ──
