//! Materials record store.
//!
//! One SQLite file (`materials.db`) with a single `materials` table, keyed by
//! the business identifier `mat_id`. Uses parameterized queries exclusively;
//! multi-statement operations run inside a transaction.

use crate::error::{Error, Result};
use crate::ident;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Namespace prefix for material identifiers (`MAT-<n>`)
pub const MAT_PREFIX: &str = "MAT";

/// Fixed name of the materials registry file
pub const MATERIALS_DB: &str = "materials.db";

/// Display format for `price_date`
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const COLUMNS: &str = "mat_id, trade, material_name, currency, price, unit, vendor, \
                       vendor_phone, vendor_email, vendor_location, price_date, comment";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").unwrap();
}

/// One priced line item from one vendor for one trade/material combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub mat_id: String,
    pub trade: String,
    pub material_name: String,
    pub currency: String,
    pub price: f64,
    pub unit: String,
    pub vendor: String,
    pub vendor_phone: String,
    pub vendor_email: String,
    pub vendor_location: String,
    pub price_date: String,
    #[serde(default)]
    pub comment: String,
}

/// Mutable fields of a material record, i.e. everything except `mat_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialFields {
    pub trade: String,
    pub material_name: String,
    pub currency: String,
    pub price: f64,
    pub unit: String,
    pub vendor: String,
    pub vendor_phone: String,
    pub vendor_email: String,
    pub vendor_location: String,
    pub price_date: String,
    #[serde(default)]
    pub comment: String,
}

impl MaterialRecord {
    fn from_fields(mat_id: String, fields: &MaterialFields) -> Self {
        MaterialRecord {
            mat_id,
            trade: fields.trade.clone(),
            material_name: fields.material_name.clone(),
            currency: fields.currency.clone(),
            price: fields.price,
            unit: fields.unit.clone(),
            vendor: fields.vendor.clone(),
            vendor_phone: fields.vendor_phone.clone(),
            vendor_email: fields.vendor_email.clone(),
            vendor_location: fields.vendor_location.clone(),
            price_date: fields.price_date.clone(),
            comment: fields.comment.clone(),
        }
    }

    /// The mutable part of this record.
    pub fn fields(&self) -> MaterialFields {
        MaterialFields {
            trade: self.trade.clone(),
            material_name: self.material_name.clone(),
            currency: self.currency.clone(),
            price: self.price,
            unit: self.unit.clone(),
            vendor: self.vendor.clone(),
            vendor_phone: self.vendor_phone.clone(),
            vendor_email: self.vendor_email.clone(),
            vendor_location: self.vendor_location.clone(),
            price_date: self.price_date.clone(),
            comment: self.comment.clone(),
        }
    }
}

/// Opens (or creates) the materials registry in `data_dir`.
pub fn open(data_dir: &Path) -> Result<Connection> {
    let conn = Connection::open(data_dir.join(MATERIALS_DB))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the `materials` table if it does not already exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY,
            mat_id TEXT UNIQUE NOT NULL,
            trade TEXT NOT NULL,
            material_name TEXT NOT NULL,
            currency TEXT NOT NULL,
            price REAL NOT NULL,
            unit TEXT NOT NULL,
            vendor TEXT NOT NULL,
            vendor_phone TEXT NOT NULL,
            vendor_email TEXT NOT NULL,
            vendor_location TEXT NOT NULL,
            price_date TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_materials_name ON materials(material_name);
        CREATE INDEX IF NOT EXISTS idx_materials_vendor ON materials(vendor);",
    )?;
    Ok(())
}

/// Parses a price string, tolerating thousands separators (`1,250.00`).
pub fn parse_price(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().replace(',', "");
    let price: f64 = cleaned
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a valid price", raw)))?;
    if !price.is_finite() || price < 0.0 {
        return Err(Error::Validation(format!(
            "price must be a non-negative number, got '{}'",
            raw
        )));
    }
    Ok(price)
}

pub(crate) fn validate_phone(label: &str, phone: &str) -> Result<()> {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(format!(
            "{} must contain digits only, got '{}'",
            label, phone
        )));
    }
    Ok(())
}

pub(crate) fn validate_email(label: &str, email: &str) -> Result<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(Error::Validation(format!(
            "{} '{}' is not a valid email address",
            label, email
        )));
    }
    Ok(())
}

/// Validates the mutable fields of a material record.
///
/// Everything except `comment` is required. The price must be non-negative,
/// the vendor phone numeric-only, the email of the usual `local@domain.tld`
/// shape, the currency a 3-letter code and the date a real `DD/MM/YYYY` date.
pub fn validate_fields(fields: &MaterialFields) -> Result<()> {
    let required = [
        ("trade", fields.trade.as_str()),
        ("material name", fields.material_name.as_str()),
        ("currency", fields.currency.as_str()),
        ("unit", fields.unit.as_str()),
        ("vendor", fields.vendor.as_str()),
        ("vendor phone", fields.vendor_phone.as_str()),
        ("vendor email", fields.vendor_email.as_str()),
        ("vendor location", fields.vendor_location.as_str()),
        ("price date", fields.price_date.as_str()),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} must not be empty", label)));
        }
    }

    if !fields.price.is_finite() || fields.price < 0.0 {
        return Err(Error::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    if fields.currency.len() != 3 || !fields.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Validation(format!(
            "currency must be a 3-letter code, got '{}'",
            fields.currency
        )));
    }
    validate_phone("vendor phone", &fields.vendor_phone)?;
    validate_email("vendor email", &fields.vendor_email)?;
    if NaiveDate::parse_from_str(&fields.price_date, DATE_FORMAT).is_err() {
        return Err(Error::Validation(format!(
            "price date '{}' is not a valid DD/MM/YYYY date",
            fields.price_date
        )));
    }
    Ok(())
}

/// Allocates the next free `MAT-<n>` identifier.
///
/// Gaps left by deletions are reused before the range grows.
pub fn next_mat_id(conn: &Connection) -> Result<String> {
    let mut stmt = conn.prepare("SELECT mat_id FROM materials WHERE mat_id LIKE 'MAT-%'")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ident::format_id(
        MAT_PREFIX,
        ident::next_free_id(&ids, MAT_PREFIX),
    ))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub(crate) fn insert_record(conn: &Connection, record: &MaterialRecord) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO materials (mat_id, trade, material_name, currency, price, unit, vendor,
                                vendor_phone, vendor_email, vendor_location, price_date, comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.mat_id,
            record.trade,
            record.material_name,
            record.currency,
            record.price,
            record.unit,
            record.vendor,
            record.vendor_phone,
            record.vendor_email,
            record.vendor_location,
            record.price_date,
            record.comment,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(Error::DuplicateKey(record.mat_id.clone())),
        Err(e) => Err(e.into()),
    }
}

/// Adds a new material; the `mat_id` is allocated by the store.
///
/// Returns the allocated identifier. On validation failure nothing is
/// written.
pub fn add_material(conn: &mut Connection, fields: &MaterialFields) -> Result<String> {
    validate_fields(fields)?;
    let tx = conn.transaction()?;
    let mat_id = next_mat_id(&tx)?;
    insert_record(&tx, &MaterialRecord::from_fields(mat_id.clone(), fields))?;
    tx.commit()?;
    log::info!("Added material {} ({})", mat_id, fields.material_name);
    Ok(mat_id)
}

/// Inserts a record under a caller-provided identifier (spreadsheet import).
pub fn insert_with_id(conn: &Connection, mat_id: &str, fields: &MaterialFields) -> Result<()> {
    validate_fields(fields)?;
    if mat_id.trim().is_empty() {
        return Err(Error::Validation("mat id must not be empty".to_string()));
    }
    insert_record(conn, &MaterialRecord::from_fields(mat_id.to_string(), fields))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MaterialRecord> {
    Ok(MaterialRecord {
        mat_id: row.get(0)?,
        trade: row.get(1)?,
        material_name: row.get(2)?,
        currency: row.get(3)?,
        price: row.get(4)?,
        unit: row.get(5)?,
        vendor: row.get(6)?,
        vendor_phone: row.get(7)?,
        vendor_email: row.get(8)?,
        vendor_location: row.get(9)?,
        price_date: row.get(10)?,
        comment: row.get(11)?,
    })
}

/// Looks up a single record by its identifier.
pub fn get_material(conn: &Connection, mat_id: &str) -> Result<MaterialRecord> {
    let sql = format!("SELECT {} FROM materials WHERE mat_id = ?1", COLUMNS);
    conn.query_row(&sql, params![mat_id], row_to_record)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("material {}", mat_id)))
}

/// Returns true when a record with this identifier exists.
pub fn material_exists(conn: &Connection, mat_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM materials WHERE mat_id = ?1",
        params![mat_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Overwrites all mutable fields of an existing record.
///
/// The `mat_id` itself is immutable.
pub fn update_material(conn: &Connection, mat_id: &str, fields: &MaterialFields) -> Result<()> {
    validate_fields(fields)?;
    let changed = conn.execute(
        "UPDATE materials
         SET trade = ?1, material_name = ?2, currency = ?3, price = ?4, unit = ?5, vendor = ?6,
             vendor_phone = ?7, vendor_email = ?8, vendor_location = ?9, price_date = ?10,
             comment = ?11
         WHERE mat_id = ?12",
        params![
            fields.trade,
            fields.material_name,
            fields.currency,
            fields.price,
            fields.unit,
            fields.vendor,
            fields.vendor_phone,
            fields.vendor_email,
            fields.vendor_location,
            fields.price_date,
            fields.comment,
            mat_id,
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("material {}", mat_id)));
    }
    log::info!("Updated material {}", mat_id);
    Ok(())
}

/// Removes a record irreversibly. The caller confirms before calling.
pub fn delete_material(conn: &Connection, mat_id: &str) -> Result<()> {
    let removed = conn.execute("DELETE FROM materials WHERE mat_id = ?1", params![mat_id])?;
    if removed == 0 {
        return Err(Error::NotFound(format!("material {}", mat_id)));
    }
    log::info!("Deleted material {}", mat_id);
    Ok(())
}

/// Copies a record into a new one with a freshly allocated identifier.
///
/// Returns the new `mat_id`.
pub fn duplicate_material(conn: &mut Connection, mat_id: &str) -> Result<String> {
    let tx = conn.transaction()?;
    let source = get_material(&tx, mat_id)?;
    let new_id = next_mat_id(&tx)?;
    insert_record(&tx, &MaterialRecord::from_fields(new_id.clone(), &source.fields()))?;
    tx.commit()?;
    log::info!("Duplicated material {} as {}", mat_id, new_id);
    Ok(new_id)
}

/// All records in store order.
pub fn list_materials(conn: &Connection) -> Result<Vec<MaterialRecord>> {
    let sql = format!("SELECT {} FROM materials ORDER BY id", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Which columns a substring search matches against.
///
/// The field set is caller-configurable; the default mirrors the main search
/// bar (trade, material name and vendor).
#[derive(Debug, Clone, Copy)]
pub struct SearchFields {
    pub mat_id: bool,
    pub trade: bool,
    pub material_name: bool,
    pub vendor: bool,
}

impl Default for SearchFields {
    fn default() -> Self {
        SearchFields {
            mat_id: false,
            trade: true,
            material_name: true,
            vendor: true,
        }
    }
}

/// Case-insensitive substring search over the configured fields.
///
/// Results come back in store order.
pub fn search_materials(
    conn: &Connection,
    term: &str,
    fields: &SearchFields,
) -> Result<Vec<MaterialRecord>> {
    let mut clauses = Vec::new();
    if fields.mat_id {
        clauses.push("LOWER(mat_id) LIKE ?1");
    }
    if fields.trade {
        clauses.push("LOWER(trade) LIKE ?1");
    }
    if fields.material_name {
        clauses.push("LOWER(material_name) LIKE ?1");
    }
    if fields.vendor {
        clauses.push("LOWER(vendor) LIKE ?1");
    }
    if clauses.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", term.to_lowercase());
    let sql = format!(
        "SELECT {} FROM materials WHERE {} ORDER BY id",
        COLUMNS,
        clauses.join(" OR ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![pattern], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Sort key for material listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    MatId,
    Trade,
    MaterialName,
    Price,
    Vendor,
}

fn mat_id_key<'a>(mat_id: &'a str) -> (u32, &'a str) {
    // Malformed ids sort after well-formed ones.
    (
        ident::suffix_of(mat_id, MAT_PREFIX).unwrap_or(u32::MAX),
        mat_id,
    )
}

/// All records ordered ascending by the given key.
///
/// `MatId` is numeric-aware: `MAT-2` sorts before `MAT-10`.
pub fn sort_materials(conn: &Connection, key: SortKey) -> Result<Vec<MaterialRecord>> {
    if key == SortKey::MatId {
        let mut records = list_materials(conn)?;
        records.sort_by(|a, b| mat_id_key(&a.mat_id).cmp(&mat_id_key(&b.mat_id)));
        return Ok(records);
    }

    let column = match key {
        SortKey::Trade => "trade",
        SortKey::MaterialName => "material_name",
        SortKey::Price => "price",
        SortKey::Vendor => "vendor",
        SortKey::MatId => unreachable!(),
    };
    let sql = format!("SELECT {} FROM materials ORDER BY {} ASC", COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Vendor price comparison for one material name.
#[derive(Debug, Clone, Serialize)]
pub struct PriceComparison {
    pub material_name: String,
    /// Matching records, cheapest first
    pub records: Vec<MaterialRecord>,
    /// Shared currency, when all records agree on one
    pub currency: Option<String>,
    /// Arithmetic mean of the prices; only computed for a shared currency
    pub average_price: Option<f64>,
}

/// Collects all records sharing `material_name` for vendor comparison.
///
/// Fails with [`Error::NothingToCompare`] when fewer than two records match.
/// The average is only computed when every record uses the same currency.
pub fn compare_prices(conn: &Connection, material_name: &str) -> Result<PriceComparison> {
    let sql = format!("SELECT {} FROM materials WHERE material_name = ?1", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut records = stmt
        .query_map(params![material_name], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if records.len() < 2 {
        return Err(Error::NothingToCompare(material_name.to_string()));
    }

    records.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));

    let mut currencies: Vec<&str> = records.iter().map(|r| r.currency.as_str()).collect();
    currencies.sort_unstable();
    currencies.dedup();

    let (currency, average_price) = if currencies.len() == 1 {
        let avg = records.iter().map(|r| r.price).sum::<f64>() / records.len() as f64;
        (Some(currencies[0].to_string()), Some(avg))
    } else {
        (None, None)
    };

    Ok(PriceComparison {
        material_name: material_name.to_string(),
        records,
        currency,
        average_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an in-memory store for testing
    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn cement(vendor: &str, price: f64) -> MaterialFields {
        MaterialFields {
            trade: "Masonry".to_string(),
            material_name: "Cement".to_string(),
            currency: "GHS".to_string(),
            price,
            unit: "bag".to_string(),
            vendor: vendor.to_string(),
            vendor_phone: "0541193598".to_string(),
            vendor_email: format!("{}@example.com", vendor.to_lowercase()),
            vendor_location: "Accra".to_string(),
            price_date: "01/01/2024".to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut conn = test_db();
        assert_eq!(add_material(&mut conn, &cement("Alpha", 85.0)).unwrap(), "MAT-1");
        assert_eq!(add_material(&mut conn, &cement("Beta", 90.0)).unwrap(), "MAT-2");
    }

    #[test]
    fn add_reuses_gaps_from_deletions() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();
        add_material(&mut conn, &cement("Beta", 90.0)).unwrap();
        add_material(&mut conn, &cement("Gamma", 95.0)).unwrap();

        delete_material(&conn, "MAT-2").unwrap();
        assert_eq!(add_material(&mut conn, &cement("Delta", 80.0)).unwrap(), "MAT-2");
        // Gap now filled; next allocation extends the range
        assert_eq!(add_material(&mut conn, &cement("Epsilon", 70.0)).unwrap(), "MAT-4");
    }

    #[test]
    fn add_rejects_empty_required_field() {
        let mut conn = test_db();
        let mut fields = cement("Alpha", 85.0);
        fields.trade = String::new();
        let err = add_material(&mut conn, &fields).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(list_materials(&conn).unwrap().is_empty());
    }

    #[test]
    fn add_rejects_bad_phone_email_price_and_date() {
        let mut conn = test_db();

        let mut fields = cement("Alpha", 85.0);
        fields.vendor_phone = "054-119-3598".to_string();
        assert!(matches!(add_material(&mut conn, &fields), Err(Error::Validation(_))));

        let mut fields = cement("Alpha", 85.0);
        fields.vendor_email = "not-an-email".to_string();
        assert!(matches!(add_material(&mut conn, &fields), Err(Error::Validation(_))));

        let mut fields = cement("Alpha", 85.0);
        fields.price = -1.0;
        assert!(matches!(add_material(&mut conn, &fields), Err(Error::Validation(_))));

        let mut fields = cement("Alpha", 85.0);
        fields.price_date = "31/13/2024".to_string();
        assert!(matches!(add_material(&mut conn, &fields), Err(Error::Validation(_))));

        assert!(list_materials(&conn).unwrap().is_empty());
    }

    #[test]
    fn parse_price_handles_separators() {
        assert!((parse_price("1,250.50").unwrap() - 1250.5).abs() < 1e-9);
        assert!((parse_price("85").unwrap() - 85.0).abs() < 1e-9);
        assert!(matches!(parse_price("abc"), Err(Error::Validation(_))));
        assert!(matches!(parse_price("-5"), Err(Error::Validation(_))));
    }

    #[test]
    fn update_round_trips_and_keeps_mat_id() {
        let mut conn = test_db();
        let mat_id = add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();

        let mut fields = cement("Beta", 99.5);
        fields.comment = "new supplier".to_string();
        update_material(&conn, &mat_id, &fields).unwrap();

        let record = get_material(&conn, &mat_id).unwrap();
        assert_eq!(record.mat_id, mat_id);
        assert_eq!(record.fields(), fields);
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let conn = test_db();
        let err = update_material(&conn, "MAT-99", &cement("Alpha", 85.0)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn delete_then_read_fails_and_double_delete_fails() {
        let mut conn = test_db();
        let mat_id = add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();

        delete_material(&conn, &mat_id).unwrap();
        assert!(matches!(get_material(&conn, &mat_id), Err(Error::NotFound(_))));
        assert!(matches!(delete_material(&conn, &mat_id), Err(Error::NotFound(_))));
    }

    #[test]
    fn duplicate_copies_everything_but_the_id() {
        let mut conn = test_db();
        let mat_id = add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();

        let new_id = duplicate_material(&mut conn, &mat_id).unwrap();
        assert_ne!(new_id, mat_id);

        let source = get_material(&conn, &mat_id).unwrap();
        let copy = get_material(&conn, &new_id).unwrap();
        assert_eq!(source.fields(), copy.fields());
    }

    #[test]
    fn duplicate_missing_record_is_not_found() {
        let mut conn = test_db();
        assert!(matches!(
            duplicate_material(&mut conn, "MAT-1"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn insert_with_id_rejects_duplicates() {
        let conn = test_db();
        insert_with_id(&conn, "MAT-7", &cement("Alpha", 85.0)).unwrap();
        let err = insert_with_id(&conn, "MAT-7", &cement("Beta", 90.0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(id) if id == "MAT-7"));
    }

    #[test]
    fn search_matches_default_fields_case_insensitively() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();
        let mut rebar = cement("SteelCo", 120.0);
        rebar.material_name = "Rebar 12mm".to_string();
        rebar.trade = "Structural".to_string();
        add_material(&mut conn, &rebar).unwrap();

        let hits = search_materials(&conn, "CEM", &SearchFields::default()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].material_name, "Cement");

        let hits = search_materials(&conn, "steelco", &SearchFields::default()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].vendor, "SteelCo");
    }

    #[test]
    fn search_can_include_mat_id() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();

        let off = search_materials(&conn, "mat-1", &SearchFields::default()).unwrap();
        assert!(off.is_empty());

        let fields = SearchFields {
            mat_id: true,
            ..SearchFields::default()
        };
        let on = search_materials(&conn, "mat-1", &fields).unwrap();
        assert_eq!(on.len(), 1);
    }

    #[test]
    fn sort_by_mat_id_is_numeric_aware() {
        let conn = test_db();
        for n in [1, 2, 10] {
            let mut record = MaterialRecord::from_fields(format!("MAT-{}", n), &cement("Alpha", 85.0));
            record.price += n as f64;
            insert_record(&conn, &record).unwrap();
        }

        let sorted = sort_materials(&conn, SortKey::MatId).unwrap();
        let ids: Vec<&str> = sorted.iter().map(|r| r.mat_id.as_str()).collect();
        assert_eq!(ids, ["MAT-1", "MAT-2", "MAT-10"]);
    }

    #[test]
    fn sort_by_price_ascends() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 90.0)).unwrap();
        add_material(&mut conn, &cement("Beta", 70.0)).unwrap();
        add_material(&mut conn, &cement("Gamma", 80.0)).unwrap();

        let sorted = sort_materials(&conn, SortKey::Price).unwrap();
        let prices: Vec<f64> = sorted.iter().map(|r| r.price).collect();
        assert_eq!(prices, [70.0, 80.0, 90.0]);
    }

    #[test]
    fn compare_requires_two_records() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();
        assert!(matches!(
            compare_prices(&conn, "Cement"),
            Err(Error::NothingToCompare(_))
        ));
    }

    #[test]
    fn compare_averages_a_shared_currency() {
        let mut conn = test_db();
        let mut a = cement("Alpha", 85.0);
        a.price_date = "01/01/2024".to_string();
        let mut b = cement("Beta", 95.0);
        b.price_date = "02/01/2024".to_string();
        let mut c = cement("Gamma", 90.0);
        c.price_date = "01/01/2024".to_string();
        add_material(&mut conn, &a).unwrap();
        add_material(&mut conn, &b).unwrap();
        add_material(&mut conn, &c).unwrap();

        let comparison = compare_prices(&conn, "Cement").unwrap();
        assert_eq!(comparison.records.len(), 3);
        assert_eq!(comparison.currency.as_deref(), Some("GHS"));
        assert!((comparison.average_price.unwrap() - 90.0).abs() < 1e-9);
        // Cheapest first
        assert_eq!(comparison.records[0].vendor, "Alpha");
    }

    #[test]
    fn compare_skips_average_on_mixed_currencies() {
        let mut conn = test_db();
        add_material(&mut conn, &cement("Alpha", 85.0)).unwrap();
        let mut usd = cement("Beta", 7.0);
        usd.currency = "USD".to_string();
        add_material(&mut conn, &usd).unwrap();

        let comparison = compare_prices(&conn, "Cement").unwrap();
        assert_eq!(comparison.records.len(), 2);
        assert!(comparison.currency.is_none());
        assert!(comparison.average_price.is_none());
    }
}
