//! Full-registry snapshot document.
//!
//! One JSON object keyed by table name, each value an ordered sequence of
//! records in fixed schema field order. The same document backs on-disk
//! backups and the remote sync payload. Files are written to a temporary
//! sibling and renamed into place, so readers never see partial output.

use crate::error::Result;
use crate::materials::{self, MaterialRecord};
use crate::registry::{self, Job, UserProfile};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fixed name of the snapshot document
pub const SNAPSHOT_FILE: &str = "materials-data.json";

/// The serialized registry set.
///
/// Field order within each record follows the table schema, so repeated
/// exports of the same data are byte-identical and diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Serializes every registry into one snapshot document.
pub fn export_all(
    materials_conn: &Connection,
    users_conn: &Connection,
    jobs_conn: &Connection,
) -> Result<Snapshot> {
    Ok(Snapshot {
        materials: materials::list_materials(materials_conn)?,
        users: registry::list_users(users_conn)?,
        jobs: registry::list_jobs(jobs_conn)?,
    })
}

/// Writes `bytes` to `path` atomically (temp file + rename).
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Writes a snapshot document to disk.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    write_atomic(path, json.as_bytes())?;
    log::info!(
        "Wrote snapshot ({} materials, {} users, {} jobs) to {}",
        snapshot.materials.len(),
        snapshot.users.len(),
        snapshot.jobs.len(),
        path.display()
    );
    Ok(())
}

/// Reads a snapshot document from disk.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Loads a snapshot into the registries: update by key, insert when absent.
///
/// Records already present (matched on `mat_id` / `user_code` / `job_code`)
/// are overwritten; new ones are inserted. Importing an exported snapshot
/// into empty registries and re-exporting yields the original document.
pub fn import_all(
    snapshot: &Snapshot,
    materials_conn: &mut Connection,
    users_conn: &mut Connection,
    jobs_conn: &mut Connection,
) -> Result<()> {
    import_materials(snapshot, materials_conn)?;
    import_users(snapshot, users_conn)?;
    import_jobs(snapshot, jobs_conn)?;
    log::info!(
        "Imported snapshot ({} materials, {} users, {} jobs)",
        snapshot.materials.len(),
        snapshot.users.len(),
        snapshot.jobs.len()
    );
    Ok(())
}

fn import_materials(snapshot: &Snapshot, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for record in &snapshot.materials {
        let changed = tx.execute(
            "UPDATE materials
             SET trade = ?1, material_name = ?2, currency = ?3, price = ?4, unit = ?5,
                 vendor = ?6, vendor_phone = ?7, vendor_email = ?8, vendor_location = ?9,
                 price_date = ?10, comment = ?11
             WHERE mat_id = ?12",
            params![
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
                record.mat_id,
            ],
        )?;
        if changed == 0 {
            materials::insert_record(&tx, record)?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn import_users(snapshot: &Snapshot, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for user in &snapshot.users {
        let changed = tx.execute(
            "UPDATE users
             SET name = ?1, company = ?2, position = ?3, phone = ?4, email = ?5, is_default = ?6
             WHERE user_code = ?7",
            params![
                user.name,
                user.company,
                user.position,
                user.phone,
                user.email,
                user.is_default as i64,
                user.user_code,
            ],
        )?;
        if changed == 0 {
            tx.execute(
                "INSERT INTO users (user_id, user_code, name, company, position, phone, email, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.user_id,
                    user.user_code,
                    user.name,
                    user.company,
                    user.position,
                    user.phone,
                    user.email,
                    user.is_default as i64,
                ],
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn import_jobs(snapshot: &Snapshot, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for job in &snapshot.jobs {
        let changed = tx.execute(
            "UPDATE jobs SET job_name = ?1, client = ?2, location = ?3, is_default = ?4
             WHERE job_code = ?5",
            params![
                job.job_name,
                job.client,
                job.location,
                job.is_default as i64,
                job.job_code,
            ],
        )?;
        if changed == 0 {
            tx.execute(
                "INSERT INTO jobs (job_id, job_code, job_name, client, location, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    job.job_id,
                    job.job_code,
                    job.job_name,
                    job.client,
                    job.location,
                    job.is_default as i64,
                ],
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}
