// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::check_sample;
use crate::models::OccupancySample;
use crate::utils::{maybe_print_json, parse_date, pretty_table, today};
use anyhow::Result;
use chrono::Duration;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("record", sub)) => record(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn record(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };
    let total_beds = *sub.get_one::<i64>("total-beds").unwrap();
    let occupied_beds = *sub.get_one::<i64>("occupied-beds").unwrap();

    let sample = OccupancySample {
        date,
        total_beds,
        occupied_beds,
    };
    check_sample(&sample)?;

    // Re-recording a day replaces it; the history keeps one row per date.
    conn.execute(
        "INSERT INTO occupancy_history(date, total_beds, occupied_beds) VALUES (?1, ?2, ?3)
         ON CONFLICT(date) DO UPDATE SET total_beds=excluded.total_beds,
                                         occupied_beds=excluded.occupied_beds",
        params![date.to_string(), total_beds, occupied_beds],
    )?;
    println!(
        "Recorded occupancy for {}: {}/{} beds",
        date, occupied_beds, total_beds
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let days: usize = *sub.get_one::<usize>("days").unwrap_or(&30);

    let data = load_window(conn, days)?;

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                let rate = if s.total_beds > 0 {
                    format!("{:.1}%", 100.0 * s.occupied_beds as f64 / s.total_beds as f64)
                } else {
                    "-".to_string()
                };
                vec![
                    s.date.to_string(),
                    s.total_beds.to_string(),
                    s.occupied_beds.to_string(),
                    rate,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Total Beds", "Occupied", "Rate"], rows)
        );
    }
    Ok(())
}

/// Samples from the trailing `days` window, ascending by date.
pub fn load_window(conn: &Connection, days: usize) -> Result<Vec<OccupancySample>> {
    let cutoff = today() - Duration::days(days as i64);
    let mut stmt = conn.prepare(
        "SELECT date, total_beds, occupied_beds FROM occupancy_history
         WHERE date>=?1 ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(params![cutoff.to_string()], |r| {
        Ok(OccupancySample {
            date: r.get(0)?,
            total_beds: r.get(1)?,
            occupied_beds: r.get(2)?,
        })
    })?;

    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
