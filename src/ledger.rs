//! Per-job allocation ledgers.
//!
//! Each job owns its own SQLite file named `Job-ID-<id>_<name>.db` holding
//! one `assigned_materials` table. Allocation copies the material record as
//! it stands; later edits to the source never propagate into a ledger.

use crate::error::{Error, Result};
use crate::materials::{self, MaterialRecord};
use crate::registry::{self, Job};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const LEDGER_COLUMNS: &str = "mat_id, trade, material_name, currency, price, unit, vendor, \
                              vendor_phone, vendor_email, vendor_location, price_date, comment";

/// Ledger file name for a job, e.g. `Job-ID-3_Tema_Warehouse.db`.
pub fn ledger_file_name(job: &Job) -> String {
    format!("Job-ID-{}_{}.db", job.job_id, job.job_name.replace(' ', "_"))
}

/// Full path of a job's ledger file under `data_dir`.
pub fn ledger_path(data_dir: &Path, job: &Job) -> PathBuf {
    data_dir.join(ledger_file_name(job))
}

/// Opens (or creates) a job's allocation ledger.
pub fn open_ledger(data_dir: &Path, job: &Job) -> Result<Connection> {
    let conn = Connection::open(ledger_path(data_dir, job))?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS assigned_materials (
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
        );",
    )?;
    Ok(conn)
}

/// Copies a material into the default job's ledger.
///
/// Fails with [`Error::NoDefaultJob`] when no default job is set and with
/// [`Error::NotFound`] when the material does not exist. A material already
/// allocated to the job is skipped silently; the return value tells whether a
/// row was actually inserted.
pub fn allocate_to_default_job(
    materials_conn: &Connection,
    jobs_conn: &Connection,
    data_dir: &Path,
    mat_id: &str,
) -> Result<bool> {
    let job = registry::default_job(jobs_conn)?.ok_or(Error::NoDefaultJob)?;
    let record = materials::get_material(materials_conn, mat_id)?;

    let ledger = open_ledger(data_dir, &job)?;
    let inserted = ledger.execute(
        "INSERT OR IGNORE INTO assigned_materials
             (mat_id, trade, material_name, currency, price, unit, vendor,
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
    )? > 0;

    if inserted {
        log::info!("Allocated {} to job {}", mat_id, job.job_name);
    } else {
        log::info!("{} already allocated to job {}, skipping", mat_id, job.job_name);
    }
    Ok(inserted)
}

/// All materials allocated to a job, in allocation order.
pub fn list_allocations(data_dir: &Path, job: &Job) -> Result<Vec<MaterialRecord>> {
    let ledger = open_ledger(data_dir, job)?;
    let sql = format!("SELECT {} FROM assigned_materials ORDER BY id", LEDGER_COLUMNS);
    let mut stmt = ledger.prepare(&sql)?;
    let records = stmt
        .query_map([], |row| {
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
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Removes one allocation from a job's ledger.
pub fn remove_allocation(data_dir: &Path, job: &Job, mat_id: &str) -> Result<()> {
    let ledger = open_ledger(data_dir, job)?;
    let removed = ledger.execute(
        "DELETE FROM assigned_materials WHERE mat_id = ?1",
        params![mat_id],
    )?;
    if removed == 0 {
        return Err(Error::NotFound(format!(
            "allocation {} in job {}",
            mat_id, job.job_name
        )));
    }
    log::info!("Removed allocation {} from job {}", mat_id, job.job_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{add_material, update_material, MaterialFields};
    use crate::registry::{add_job, set_default_job, JobFields};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Connection, Connection) {
        let dir = TempDir::new().unwrap();
        let materials_conn = Connection::open_in_memory().unwrap();
        materials::init_schema(&materials_conn).unwrap();
        let jobs_conn = Connection::open_in_memory().unwrap();
        registry::init_jobs_schema(&jobs_conn).unwrap();
        (dir, materials_conn, jobs_conn)
    }

    fn cement() -> MaterialFields {
        MaterialFields {
            trade: "Masonry".to_string(),
            material_name: "Cement".to_string(),
            currency: "GHS".to_string(),
            price: 85.0,
            unit: "bag".to_string(),
            vendor: "Alpha".to_string(),
            vendor_phone: "0541193598".to_string(),
            vendor_email: "alpha@example.com".to_string(),
            vendor_location: "Accra".to_string(),
            price_date: "01/01/2024".to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn allocate_without_default_job_fails() {
        let (dir, mut materials_conn, jobs_conn) = setup();
        let mat_id = add_material(&mut materials_conn, &cement()).unwrap();

        let err =
            allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), &mat_id).unwrap_err();
        assert!(matches!(err, Error::NoDefaultJob));
    }

    #[test]
    fn allocate_missing_material_is_not_found() {
        let (dir, materials_conn, mut jobs_conn) = setup();
        let job = add_job(
            &mut jobs_conn,
            &JobFields {
                job_name: "Tema Warehouse".to_string(),
                client: "Client".to_string(),
                location: "Tema".to_string(),
            },
        )
        .unwrap();
        set_default_job(&mut jobs_conn, job.job_id).unwrap();

        let err =
            allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), "MAT-9").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn allocate_is_idempotent_per_mat_id() {
        let (dir, mut materials_conn, mut jobs_conn) = setup();
        let mat_id = add_material(&mut materials_conn, &cement()).unwrap();
        let job = add_job(
            &mut jobs_conn,
            &JobFields {
                job_name: "Tema Warehouse".to_string(),
                client: "Client".to_string(),
                location: "Tema".to_string(),
            },
        )
        .unwrap();
        set_default_job(&mut jobs_conn, job.job_id).unwrap();

        assert!(allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), &mat_id).unwrap());
        assert!(!allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), &mat_id).unwrap());

        let job = registry::get_job(&jobs_conn, job.job_id).unwrap();
        assert_eq!(list_allocations(dir.path(), &job).unwrap().len(), 1);
    }

    #[test]
    fn allocation_is_a_snapshot_not_a_reference() {
        let (dir, mut materials_conn, mut jobs_conn) = setup();
        let mat_id = add_material(&mut materials_conn, &cement()).unwrap();
        let job = add_job(
            &mut jobs_conn,
            &JobFields {
                job_name: "Tema Warehouse".to_string(),
                client: "Client".to_string(),
                location: "Tema".to_string(),
            },
        )
        .unwrap();
        set_default_job(&mut jobs_conn, job.job_id).unwrap();
        allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), &mat_id).unwrap();

        // Raise the source price after allocation
        let mut fields = cement();
        fields.price = 120.0;
        update_material(&materials_conn, &mat_id, &fields).unwrap();

        let job = registry::get_job(&jobs_conn, job.job_id).unwrap();
        let allocations = list_allocations(dir.path(), &job).unwrap();
        assert!((allocations[0].price - 85.0).abs() < 1e-9);
    }

    #[test]
    fn remove_allocation_and_double_remove() {
        let (dir, mut materials_conn, mut jobs_conn) = setup();
        let mat_id = add_material(&mut materials_conn, &cement()).unwrap();
        let job = add_job(
            &mut jobs_conn,
            &JobFields {
                job_name: "Tema Warehouse".to_string(),
                client: "Client".to_string(),
                location: "Tema".to_string(),
            },
        )
        .unwrap();
        set_default_job(&mut jobs_conn, job.job_id).unwrap();
        allocate_to_default_job(&materials_conn, &jobs_conn, dir.path(), &mat_id).unwrap();

        let job = registry::get_job(&jobs_conn, job.job_id).unwrap();
        remove_allocation(dir.path(), &job, &mat_id).unwrap();
        assert!(list_allocations(dir.path(), &job).unwrap().is_empty());
        assert!(matches!(
            remove_allocation(dir.path(), &job, &mat_id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn ledger_file_name_replaces_spaces() {
        let job = Job {
            job_id: 3,
            job_code: "Job-3".to_string(),
            job_name: "Tema Warehouse Extension".to_string(),
            client: "Client".to_string(),
            location: "Tema".to_string(),
            is_default: true,
        };
        assert_eq!(ledger_file_name(&job), "Job-ID-3_Tema_Warehouse_Extension.db");
    }
}
