use anyhow::Result;
use rusqlite::Connection;

const DB_PATH: &str = "data/gtm.sqlite";

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS page_data (
            id            INTEGER PRIMARY KEY,
            url           TEXT NOT NULL,
            html          TEXT,
            status        INTEGER,
            error         TEXT,
            latency_ms    INTEGER,
            pagesave_path TEXT,
            fetched_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stores (
            id            INTEGER PRIMARY KEY,
            page_id       INTEGER NOT NULL REFERENCES page_data(id),
            store_no      TEXT NOT NULL DEFAULT 'N/A',
            name          TEXT NOT NULL DEFAULT 'N/A',
            latitude      TEXT NOT NULL DEFAULT 'N/A',
            longitude     TEXT NOT NULL DEFAULT 'N/A',
            street        TEXT NOT NULL DEFAULT 'N/A',
            city          TEXT NOT NULL DEFAULT 'N/A',
            state         TEXT NOT NULL DEFAULT 'N/A',
            zip_code      TEXT NOT NULL DEFAULT 'N/A',
            county        TEXT NOT NULL DEFAULT 'N/A',
            phone         TEXT NOT NULL DEFAULT 'N/A',
            open_hours    TEXT NOT NULL DEFAULT 'N/A',
            url           TEXT NOT NULL DEFAULT 'N/A',
            provider      TEXT NOT NULL DEFAULT 'N/A',
            category      TEXT NOT NULL DEFAULT 'N/A',
            updated_date  TEXT NOT NULL DEFAULT 'N/A',
            country       TEXT NOT NULL DEFAULT 'N/A',
            status        TEXT NOT NULL DEFAULT 'N/A',
            direction_url TEXT NOT NULL DEFAULT 'N/A',
            pagesave_path TEXT NOT NULL DEFAULT 'N/A',
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_stores_page ON stores(page_id);
        CREATE INDEX IF NOT EXISTS idx_stores_city ON stores(city);
        ",
    )?;
    Ok(())
}

// ── Fetching ──

pub struct FetchRow {
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
    pub pagesave_path: Option<String>,
}

pub fn insert_page(conn: &Connection, row: &FetchRow) -> Result<i64> {
    conn.execute(
        "INSERT INTO page_data (url, html, status, error, latency_ms, pagesave_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            row.url, row.html, row.status, row.error, row.latency_ms, row.pagesave_path,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Processing ──

pub struct PageData {
    pub id: i64,
    pub url: String,
    pub html: String,
}

/// Pages with stored HTML that have no extracted store rows yet.
pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<PageData>> {
    let sql = format!(
        "SELECT pd.id, pd.url, pd.html
         FROM page_data pd
         LEFT JOIN stores s ON s.page_id = pd.id
         WHERE pd.html IS NOT NULL AND s.page_id IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PageData {
                id: row.get(0)?,
                url: row.get(1)?,
                html: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Store records ──

/// The normalized output unit: the fixed 19-field locator schema plus the
/// source page reference. Every field is always present; 'N/A' marks values
/// the source does not provide.
pub struct StoreRow {
    pub page_id: i64,
    pub store_no: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub county: String,
    pub phone: String,
    pub open_hours: String,
    pub url: String,
    pub provider: String,
    pub category: String,
    pub updated_date: String,
    pub country: String,
    pub status: String,
    pub direction_url: String,
    pub pagesave_path: String,
}

pub fn save_stores(conn: &Connection, rows: &[StoreRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO stores
             (page_id, store_no, name, latitude, longitude, street, city, state,
              zip_code, county, phone, open_hours, url, provider, category,
              updated_date, country, status, direction_url, pagesave_path)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.page_id, r.store_no, r.name, r.latitude, r.longitude, r.street,
                r.city, r.state, r.zip_code, r.county, r.phone, r.open_hours,
                r.url, r.provider, r.category, r.updated_date, r.country,
                r.status, r.direction_url, r.pagesave_path,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub open_hours: String,
}

pub fn fetch_overview(
    conn: &Connection,
    city: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(c) = city {
        conditions.push(format!("city = ?{}", params.len() + 1));
        params.push(Box::new(c.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT name, street, city, state, zip_code, phone, open_hours
         FROM stores{}
         ORDER BY city, name
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                name: row.get(0)?,
                street: row.get(1)?,
                city: row.get(2)?,
                state: row.get(3)?,
                zip_code: row.get(4)?,
                phone: row.get(5)?,
                open_hours: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub pages: usize,
    pub fetched_ok: usize,
    pub errors: usize,
    pub processed: usize,
    pub stores: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let fetched_ok: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE html IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let processed: usize = conn.query_row(
        "SELECT COUNT(DISTINCT page_id) FROM stores",
        [],
        |r| r.get(0),
    )?;
    let stores: usize = conn.query_row("SELECT COUNT(*) FROM stores", [], |r| r.get(0))?;
    Ok(Stats {
        pages,
        fetched_ok,
        errors,
        processed,
        stores,
    })
}
