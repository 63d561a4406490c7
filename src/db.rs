// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Bunkbook", "bunkbook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("bunkbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS residents(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL UNIQUE,
        room TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- One row per calendar day; the collector upserts on date.
    CREATE TABLE IF NOT EXISTS occupancy_history(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL UNIQUE,
        total_beds INTEGER NOT NULL,
        occupied_beds INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS fee_invoices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resident_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        due_date TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'PENDING' CHECK(status IN ('PENDING','PARTIAL','PAID')),
        issued_at TEXT NOT NULL,
        FOREIGN KEY(resident_id) REFERENCES residents(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_fee_invoices_issued ON fee_invoices(issued_at);
    CREATE INDEX IF NOT EXISTS idx_fee_invoices_due ON fee_invoices(due_date);

    -- Append-only; no UPDATE/DELETE path exists for payments.
    CREATE TABLE IF NOT EXISTS payments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        method TEXT NOT NULL,
        reference TEXT,
        paid_at TEXT NOT NULL,
        FOREIGN KEY(invoice_id) REFERENCES fee_invoices(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_payments_paid_at ON payments(paid_at);
    CREATE INDEX IF NOT EXISTS idx_payments_invoice ON payments(invoice_id);
    "#,
    )?;
    Ok(())
}
