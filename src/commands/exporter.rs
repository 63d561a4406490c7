// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{parse_date, today};
use anyhow::Result;
use chrono::Duration;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fees", sub)) => export_fees(conn, sub),
        Some(("occupancy", sub)) => export_occupancy(conn, sub),
        _ => Ok(()),
    }
}

fn export_fees(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let to = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };
    let from = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s.trim())?,
        None => to - Duration::days(30),
    };
    let series = ledger::fees_time_series(conn, from, to)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "total_invoiced", "total_paid"])?;
            for day in &series {
                wtr.write_record([
                    day.date.to_string(),
                    day.total_invoiced.to_string(),
                    day.total_paid.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&series)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported fee series to {}", out);
    Ok(())
}

fn export_occupancy(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT date, total_beds, occupied_beds FROM occupancy_history ORDER BY date",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "total_beds", "occupied_beds"])?;
            for row in rows {
                let (date, total, occupied) = row?;
                wtr.write_record([date, total.to_string(), occupied.to_string()])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (date, total, occupied) = row?;
                items.push(json!({
                    "date": date, "total_beds": total, "occupied_beds": occupied
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported occupancy history to {}", out);
    Ok(())
}
