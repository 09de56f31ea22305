//! User and job registries.
//!
//! Each registry lives in its own SQLite file (`users.db`, `jobs.db`) with a
//! single table. Codes are allocated in the `User-<n>` / `Job-<n>` namespace
//! with the same gap-filling allocator as material ids; at most one row per
//! registry carries the default flag.

use crate::error::{Error, Result};
use crate::ident;
use crate::materials::{validate_email, validate_phone};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const USER_PREFIX: &str = "User";
pub const JOB_PREFIX: &str = "Job";

/// Fixed name of the users registry file
pub const USERS_DB: &str = "users.db";
/// Fixed name of the jobs registry file
pub const JOBS_DB: &str = "jobs.db";

// ── Users ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub user_code: String,
    pub name: String,
    pub company: String,
    pub position: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Mutable fields of a user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    pub company: String,
    pub position: String,
    pub phone: String,
    pub email: String,
}

/// Opens (or creates) the users registry in `data_dir`.
pub fn open_users(data_dir: &Path) -> Result<Connection> {
    let conn = Connection::open(data_dir.join(USERS_DB))?;
    init_users_schema(&conn)?;
    Ok(conn)
}

pub fn init_users_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            user_code TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            company TEXT NOT NULL,
            position TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0
        );",
    )?;
    Ok(())
}

fn validate_user(fields: &UserFields) -> Result<()> {
    let required = [
        ("name", fields.name.as_str()),
        ("company", fields.company.as_str()),
        ("position", fields.position.as_str()),
        ("phone", fields.phone.as_str()),
        ("email", fields.email.as_str()),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} must not be empty", label)));
        }
    }
    validate_phone("phone", &fields.phone)?;
    validate_email("email", &fields.email)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        user_code: row.get(1)?,
        name: row.get(2)?,
        company: row.get(3)?,
        position: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        is_default: row.get::<_, i64>(7)? != 0,
    })
}

const USER_COLUMNS: &str =
    "user_id, user_code, name, company, position, phone, email, is_default";

fn next_code(conn: &Connection, table: &str, column: &str, prefix: &str) -> Result<String> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} LIKE '{}-%'",
        column, table, column, prefix
    );
    let mut stmt = conn.prepare(&sql)?;
    let codes = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ident::format_id(prefix, ident::next_free_id(&codes, prefix)))
}

/// Adds a user; the `User-<n>` code is allocated by the registry.
pub fn add_user(conn: &mut Connection, fields: &UserFields) -> Result<UserProfile> {
    validate_user(fields)?;
    let tx = conn.transaction()?;
    let user_code = next_code(&tx, "users", "user_code", USER_PREFIX)?;
    tx.execute(
        "INSERT INTO users (user_code, name, company, position, phone, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_code,
            fields.name,
            fields.company,
            fields.position,
            fields.phone,
            fields.email,
        ],
    )?;
    let user_id = tx.last_insert_rowid();
    tx.commit()?;
    log::info!("Added user {} ({})", user_code, fields.name);
    Ok(UserProfile {
        user_id,
        user_code,
        name: fields.name.clone(),
        company: fields.company.clone(),
        position: fields.position.clone(),
        phone: fields.phone.clone(),
        email: fields.email.clone(),
        is_default: false,
    })
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserProfile>> {
    let sql = format!("SELECT {} FROM users ORDER BY user_id", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<UserProfile> {
    let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
    conn.query_row(&sql, params![user_id], user_from_row)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
}

/// Overwrites a user's mutable fields; the code is immutable.
pub fn update_user(conn: &Connection, user_id: i64, fields: &UserFields) -> Result<()> {
    validate_user(fields)?;
    let changed = conn.execute(
        "UPDATE users SET name = ?1, company = ?2, position = ?3, phone = ?4, email = ?5
         WHERE user_id = ?6",
        params![
            fields.name,
            fields.company,
            fields.position,
            fields.phone,
            fields.email,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, user_id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    if removed == 0 {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }
    log::info!("Deleted user {}", user_id);
    Ok(())
}

/// Makes `user_id` the single default user.
///
/// Clearing the previous default and setting the new one happen in one
/// transaction, so exactly one row carries the flag afterwards.
pub fn set_default_user(conn: &mut Connection, user_id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let exists: i64 = tx.query_row(
        "SELECT COUNT(*) FROM users WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }
    tx.execute("UPDATE users SET is_default = 0 WHERE is_default = 1", [])?;
    tx.execute(
        "UPDATE users SET is_default = 1 WHERE user_id = ?1",
        params![user_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// The current default user, if any.
pub fn default_user(conn: &Connection) -> Result<Option<UserProfile>> {
    let sql = format!(
        "SELECT {} FROM users WHERE is_default = 1 LIMIT 1",
        USER_COLUMNS
    );
    Ok(conn.query_row(&sql, [], user_from_row).optional()?)
}

// ── Jobs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: i64,
    pub job_code: String,
    pub job_name: String,
    pub client: String,
    pub location: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Mutable fields of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFields {
    pub job_name: String,
    pub client: String,
    pub location: String,
}

/// Opens (or creates) the jobs registry in `data_dir`.
pub fn open_jobs(data_dir: &Path) -> Result<Connection> {
    let conn = Connection::open(data_dir.join(JOBS_DB))?;
    init_jobs_schema(&conn)?;
    Ok(conn)
}

pub fn init_jobs_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jobs (
            job_id INTEGER PRIMARY KEY,
            job_code TEXT UNIQUE NOT NULL,
            job_name TEXT NOT NULL,
            client TEXT NOT NULL,
            location TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0
        );",
    )?;
    Ok(())
}

fn validate_job(fields: &JobFields) -> Result<()> {
    let required = [
        ("job name", fields.job_name.as_str()),
        ("client", fields.client.as_str()),
        ("location", fields.location.as_str()),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} must not be empty", label)));
        }
    }
    Ok(())
}

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        job_id: row.get(0)?,
        job_code: row.get(1)?,
        job_name: row.get(2)?,
        client: row.get(3)?,
        location: row.get(4)?,
        is_default: row.get::<_, i64>(5)? != 0,
    })
}

const JOB_COLUMNS: &str = "job_id, job_code, job_name, client, location, is_default";

/// Adds a job; the `Job-<n>` code is allocated by the registry.
pub fn add_job(conn: &mut Connection, fields: &JobFields) -> Result<Job> {
    validate_job(fields)?;
    let tx = conn.transaction()?;
    let job_code = next_code(&tx, "jobs", "job_code", JOB_PREFIX)?;
    tx.execute(
        "INSERT INTO jobs (job_code, job_name, client, location) VALUES (?1, ?2, ?3, ?4)",
        params![job_code, fields.job_name, fields.client, fields.location],
    )?;
    let job_id = tx.last_insert_rowid();
    tx.commit()?;
    log::info!("Added job {} ({})", job_code, fields.job_name);
    Ok(Job {
        job_id,
        job_code,
        job_name: fields.job_name.clone(),
        client: fields.client.clone(),
        location: fields.location.clone(),
        is_default: false,
    })
}

pub fn list_jobs(conn: &Connection) -> Result<Vec<Job>> {
    let sql = format!("SELECT {} FROM jobs ORDER BY job_id", JOB_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let jobs = stmt
        .query_map([], job_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(jobs)
}

pub fn get_job(conn: &Connection, job_id: i64) -> Result<Job> {
    let sql = format!("SELECT {} FROM jobs WHERE job_id = ?1", JOB_COLUMNS);
    conn.query_row(&sql, params![job_id], job_from_row)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))
}

/// Overwrites a job's mutable fields; the code is immutable.
pub fn update_job(conn: &Connection, job_id: i64, fields: &JobFields) -> Result<()> {
    validate_job(fields)?;
    let changed = conn.execute(
        "UPDATE jobs SET job_name = ?1, client = ?2, location = ?3 WHERE job_id = ?4",
        params![fields.job_name, fields.client, fields.location, job_id],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("job {}", job_id)));
    }
    Ok(())
}

pub fn delete_job(conn: &Connection, job_id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM jobs WHERE job_id = ?1", params![job_id])?;
    if removed == 0 {
        return Err(Error::NotFound(format!("job {}", job_id)));
    }
    log::info!("Deleted job {}", job_id);
    Ok(())
}

/// Makes `job_id` the single default job.
pub fn set_default_job(conn: &mut Connection, job_id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let exists: i64 = tx.query_row(
        "SELECT COUNT(*) FROM jobs WHERE job_id = ?1",
        params![job_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(Error::NotFound(format!("job {}", job_id)));
    }
    tx.execute("UPDATE jobs SET is_default = 0 WHERE is_default = 1", [])?;
    tx.execute(
        "UPDATE jobs SET is_default = 1 WHERE job_id = ?1",
        params![job_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// The current default job, if any.
pub fn default_job(conn: &Connection) -> Result<Option<Job>> {
    let sql = format!("SELECT {} FROM jobs WHERE is_default = 1 LIMIT 1", JOB_COLUMNS);
    Ok(conn.query_row(&sql, [], job_from_row).optional()?)
}
