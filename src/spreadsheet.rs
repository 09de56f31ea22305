//! Spreadsheet import/export for the materials registry.
//!
//! Columns are fixed and match the material fields minus the surrogate id:
//! `Mat ID, Trade, Material, Currency, Price, Unit, Vendor, Phone, Email,
//! Location, Price Date, Comment`. Import validates every row and reports a
//! per-row outcome instead of failing wholesale.

use crate::error::{Error, Result};
use crate::materials::{self, MaterialFields, MaterialRecord};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected header row, in order.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    "Mat ID", "Trade", "Material", "Currency", "Price", "Unit", "Vendor", "Phone", "Email",
    "Location", "Price Date", "Comment",
];

#[derive(Debug, Serialize, Deserialize)]
struct SpreadsheetRow {
    #[serde(rename = "Mat ID")]
    mat_id: String,
    #[serde(rename = "Trade")]
    trade: String,
    #[serde(rename = "Material")]
    material: String,
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Unit")]
    unit: String,
    #[serde(rename = "Vendor")]
    vendor: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Price Date")]
    price_date: String,
    #[serde(rename = "Comment")]
    comment: String,
}

impl SpreadsheetRow {
    fn from_record(record: &MaterialRecord) -> Self {
        SpreadsheetRow {
            mat_id: record.mat_id.clone(),
            trade: record.trade.clone(),
            material: record.material_name.clone(),
            currency: record.currency.clone(),
            // Two-decimal display formatting; full precision lives in the store
            price: format!("{:.2}", record.price),
            unit: record.unit.clone(),
            vendor: record.vendor.clone(),
            phone: record.vendor_phone.clone(),
            email: record.vendor_email.clone(),
            location: record.vendor_location.clone(),
            price_date: record.price_date.clone(),
            comment: record.comment.clone(),
        }
    }
}

/// How rows whose `Mat ID` already exists are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateMode {
    /// Overwrite the existing record with the row's fields
    Update,
    /// Leave the existing record alone; re-insert the row under a fresh id
    Skip,
}

/// Per-row outcome of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Mat IDs inserted as-is (not previously present)
    pub inserted: Vec<String>,
    /// Mat IDs whose existing record was overwritten
    pub updated: Vec<String>,
    /// Duplicate Mat IDs re-inserted under a fresh id: (spreadsheet id, new id)
    pub reinserted: Vec<(String, String)>,
    /// Rows that failed validation: (line number, reason)
    pub invalid: Vec<(usize, String)>,
}

/// Writes the current record set to a CSV spreadsheet.
pub fn export_csv(conn: &Connection, path: &Path) -> Result<()> {
    let records = materials::list_materials(conn)?;
    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.serialize(SpreadsheetRow::from_record(record))?;
    }
    writer.flush()?;
    log::info!("Exported {} material(s) to {}", records.len(), path.display());
    Ok(())
}

fn row_fields(row: &SpreadsheetRow) -> Result<MaterialFields> {
    Ok(MaterialFields {
        trade: row.trade.clone(),
        material_name: row.material.clone(),
        currency: row.currency.clone(),
        price: materials::parse_price(&row.price)?,
        unit: row.unit.clone(),
        vendor: row.vendor.clone(),
        vendor_phone: row.phone.clone(),
        vendor_email: row.email.clone(),
        vendor_location: row.location.clone(),
        price_date: row.price_date.clone(),
        comment: row.comment.clone(),
    })
}

/// Reads a CSV spreadsheet into the registry.
///
/// Missing columns abort the import before any mutation. Each data row is
/// validated like a manual add; invalid rows are reported and skipped. Rows
/// with a known `Mat ID` follow `mode`: overwrite in `Update` mode, or keep
/// the existing record and re-insert the row under a freshly allocated id in
/// `Skip` mode.
pub fn import_csv(
    conn: &mut Connection,
    path: &Path,
    mode: DuplicateMode,
) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .copied()
        .filter(|expected| !headers.iter().any(|h| h == *expected))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "spreadsheet is missing the following columns: {}",
            missing.join(", ")
        )));
    }

    let mut report = ImportReport::default();

    for (index, result) in reader.deserialize::<SpreadsheetRow>().enumerate() {
        // +2 adjusts for the header and 1-based spreadsheet line numbers
        let line = index + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Line {}: unreadable row: {}", line, e);
                report.invalid.push((line, e.to_string()));
                continue;
            }
        };

        if row.mat_id.trim().is_empty() {
            report.invalid.push((line, "Mat ID must not be empty".to_string()));
            continue;
        }

        let fields = match row_fields(&row).and_then(|fields| {
            materials::validate_fields(&fields)?;
            Ok(fields)
        }) {
            Ok(fields) => fields,
            Err(e) => {
                log::warn!("Line {}: {}", line, e);
                report.invalid.push((line, e.to_string()));
                continue;
            }
        };

        if materials::material_exists(conn, &row.mat_id)? {
            match mode {
                DuplicateMode::Update => {
                    materials::update_material(conn, &row.mat_id, &fields)?;
                    report.updated.push(row.mat_id);
                }
                DuplicateMode::Skip => {
                    let new_id = materials::add_material(conn, &fields)?;
                    report.reinserted.push((row.mat_id, new_id));
                }
            }
        } else {
            materials::insert_with_id(conn, &row.mat_id, &fields)?;
            report.inserted.push(row.mat_id);
        }
    }

    log::info!(
        "Import complete: {} inserted, {} updated, {} reinserted, {} invalid",
        report.inserted.len(),
        report.updated.len(),
        report.reinserted.len(),
        report.invalid.len()
    );
    Ok(report)
}
