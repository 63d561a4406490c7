// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::check_sample;
use crate::models::OccupancySample;
use crate::utils::parse_date;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::{Connection, params};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("occupancy", sub)) => import_occupancy(conn, sub),
        _ => Ok(()),
    }
}

/// Bulk-load occupancy history from a CSV with columns
/// date,total_beds,occupied_beds. The whole file loads in one transaction;
/// any bad row rolls back everything.
fn import_occupancy(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut imported = 0usize;

    for result in rdr.records() {
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?.trim().to_string();
        let total_raw = rec.get(1).context("total_beds missing")?.trim().to_string();
        let occupied_raw = rec
            .get(2)
            .context("occupied_beds missing")?
            .trim()
            .to_string();

        let date = parse_date(&date_raw)
            .with_context(|| format!("Invalid occupancy date '{}'", date_raw))?;
        let total_beds: i64 = total_raw
            .parse()
            .with_context(|| format!("Invalid total_beds '{}' on {}", total_raw, date_raw))?;
        let occupied_beds: i64 = occupied_raw
            .parse()
            .with_context(|| format!("Invalid occupied_beds '{}' on {}", occupied_raw, date_raw))?;

        check_sample(&OccupancySample {
            date,
            total_beds,
            occupied_beds,
        })?;

        tx.execute(
            "INSERT INTO occupancy_history(date, total_beds, occupied_beds) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET total_beds=excluded.total_beds,
                                             occupied_beds=excluded.occupied_beds",
            params![date.to_string(), total_beds, occupied_beds],
        )?;
        imported += 1;
    }
    tx.commit()?;
    println!("Imported {} occupancy samples from {}", imported, path);
    Ok(())
}
