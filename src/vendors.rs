//! Vendor projection over the materials store.
//!
//! Vendors have no table of their own: they are the distinct vendor tuples
//! observed across material records, joined on the vendor name. Edits and
//! deletes translate into bulk statements against `materials`.

use crate::error::{Error, Result};
use crate::materials;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashSet;

/// One vendor as derived from the materials table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vendor {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub location: String,
}

/// Distinct vendors in store order; the first record per vendor name wins.
pub fn list_vendors(conn: &Connection) -> Result<Vec<Vendor>> {
    let mut stmt = conn.prepare(
        "SELECT vendor, vendor_phone, vendor_email, vendor_location FROM materials ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Vendor {
                name: row.get(0)?,
                phone: row.get(1)?,
                email: row.get(2)?,
                location: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Vendor>>>()?;

    let mut seen = HashSet::new();
    let mut vendors = Vec::new();
    for vendor in rows {
        if seen.insert(vendor.name.clone()) {
            vendors.push(vendor);
        }
    }
    Ok(vendors)
}

/// How many material records reference this vendor.
///
/// Shown to the caller before a cascading delete is confirmed.
pub fn material_count_for_vendor(conn: &Connection, name: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM materials WHERE vendor = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Rewrites the vendor details on every material referencing `old_name`.
///
/// Returns the number of records touched; fails with NotFound when the
/// vendor is unknown.
pub fn update_vendor(conn: &Connection, old_name: &str, details: &Vendor) -> Result<usize> {
    if details.name.trim().is_empty() {
        return Err(Error::Validation("vendor name must not be empty".to_string()));
    }
    materials::validate_phone("vendor phone", &details.phone)?;
    materials::validate_email("vendor email", &details.email)?;

    let changed = conn.execute(
        "UPDATE materials
         SET vendor = ?1, vendor_phone = ?2, vendor_email = ?3, vendor_location = ?4
         WHERE vendor = ?5",
        params![details.name, details.phone, details.email, details.location, old_name],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("vendor {}", old_name)));
    }
    log::info!("Updated vendor '{}' on {} material(s)", old_name, changed);
    Ok(changed)
}

/// Deletes every material referencing this vendor.
///
/// Destructive and cascading; the caller must confirm against the pre-count
/// from [`material_count_for_vendor`] first. Returns the rows removed.
pub fn delete_vendor(conn: &Connection, name: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM materials WHERE vendor = ?1", params![name])?;
    if removed == 0 {
        return Err(Error::NotFound(format!("vendor {}", name)));
    }
    log::info!("Deleted vendor '{}' and {} material(s)", name, removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{add_material, get_material, list_materials, MaterialFields};

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        materials::init_schema(&conn).unwrap();
        conn
    }

    fn fields(vendor: &str, material: &str) -> MaterialFields {
        MaterialFields {
            trade: "Masonry".to_string(),
            material_name: material.to_string(),
            currency: "GHS".to_string(),
            price: 85.0,
            unit: "bag".to_string(),
            vendor: vendor.to_string(),
            vendor_phone: "0241234567".to_string(),
            vendor_email: format!("sales@{}.com", vendor.to_lowercase()),
            vendor_location: "Kumasi".to_string(),
            price_date: "05/03/2024".to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn list_deduplicates_by_vendor_name() {
        let mut conn = test_db();
        add_material(&mut conn, &fields("Alpha", "Cement")).unwrap();
        add_material(&mut conn, &fields("Alpha", "Sand")).unwrap();
        add_material(&mut conn, &fields("Beta", "Cement")).unwrap();

        let vendors = list_vendors(&conn).unwrap();
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[0].name, "Alpha");
        assert_eq!(vendors[1].name, "Beta");
    }

    #[test]
    fn update_rewrites_all_matching_materials() {
        let mut conn = test_db();
        let a = add_material(&mut conn, &fields("Alpha", "Cement")).unwrap();
        let b = add_material(&mut conn, &fields("Alpha", "Sand")).unwrap();
        let other = add_material(&mut conn, &fields("Beta", "Cement")).unwrap();

        let details = Vendor {
            name: "Alpha Ltd".to_string(),
            phone: "0209999999".to_string(),
            email: "info@alphaltd.com".to_string(),
            location: "Tema".to_string(),
        };
        assert_eq!(update_vendor(&conn, "Alpha", &details).unwrap(), 2);

        for mat_id in [&a, &b] {
            let record = get_material(&conn, mat_id).unwrap();
            assert_eq!(record.vendor, "Alpha Ltd");
            assert_eq!(record.vendor_phone, "0209999999");
            assert_eq!(record.vendor_location, "Tema");
        }
        assert_eq!(get_material(&conn, &other).unwrap().vendor, "Beta");
    }

    #[test]
    fn update_unknown_vendor_is_not_found() {
        let conn = test_db();
        let details = Vendor {
            name: "Ghost".to_string(),
            phone: "0200000000".to_string(),
            email: "ghost@example.com".to_string(),
            location: "Nowhere".to_string(),
        };
        assert!(matches!(
            update_vendor(&conn, "Ghost", &details),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn delete_cascades_to_all_materials() {
        let mut conn = test_db();
        add_material(&mut conn, &fields("Alpha", "Cement")).unwrap();
        add_material(&mut conn, &fields("Alpha", "Sand")).unwrap();
        let kept = add_material(&mut conn, &fields("Beta", "Cement")).unwrap();

        assert_eq!(material_count_for_vendor(&conn, "Alpha").unwrap(), 2);
        assert_eq!(delete_vendor(&conn, "Alpha").unwrap(), 2);

        let remaining = list_materials(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].mat_id, kept);

        assert!(matches!(delete_vendor(&conn, "Alpha"), Err(Error::NotFound(_))));
    }
}
