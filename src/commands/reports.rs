// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::occupancy::load_window;
use crate::utils::{get_currency, maybe_print_json, parse_date, pretty_table, today};
use crate::{analytics, ledger};
use anyhow::Result;
use chrono::Duration;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;

const DEFAULT_WINDOW_DAYS: usize = 30;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fees", sub)) => fees(conn, sub)?,
        Some(("forecast", sub)) => forecast(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn fees(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let to = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };
    let from = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s.trim())?,
        None => to - Duration::days(DEFAULT_WINDOW_DAYS as i64),
    };

    let series = ledger::fees_time_series(conn, from, to)?;

    if !maybe_print_json(json_flag, jsonl_flag, &series)? {
        let rows: Vec<Vec<String>> = series
            .iter()
            .map(|d| {
                vec![
                    d.date.to_string(),
                    format!("{:.2}", d.total_invoiced),
                    format!("{:.2}", d.total_paid),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Invoiced", "Paid"], rows));
    }
    Ok(())
}

fn forecast(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let days: usize = *sub.get_one::<usize>("days").unwrap_or(&DEFAULT_WINDOW_DAYS);

    let samples = load_window(conn, days)?;
    let result = analytics::forecast_occupancy(&samples)?;

    if !maybe_print_json(json_flag, jsonl_flag, &result)? {
        let rows: Vec<Vec<String>> = result
            .forecast
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    format!("{:.1}%", p.predicted_occupancy_rate),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Predicted Occupancy"], rows));
        println!(
            "{} days of history, moving average {:.1}%, trend {} (slope {:.2}/day)",
            result.metadata.historical_days,
            result.metadata.moving_average,
            result.metadata.trend.as_str(),
            result.metadata.trend_slope
        );
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let total_residents: i64 = conn.query_row("SELECT COUNT(*) FROM residents", [], |r| r.get(0))?;

    let latest = load_window(conn, DEFAULT_WINDOW_DAYS)?.into_iter().next_back();
    let (latest_date, occupancy_rate) = match latest {
        Some(s) if s.total_beds > 0 => (
            Some(s.date),
            Some((100.0 * s.occupied_beds as f64 / s.total_beds as f64 * 10.0).round() / 10.0),
        ),
        _ => (None, None),
    };

    // Outstanding balance over every invoice not yet PAID.
    let open = crate::commands::invoices::query_rows(conn, None, None)?;
    let mut open_invoices = 0i64;
    let mut outstanding = Decimal::ZERO;
    let mut collected = Decimal::ZERO;
    for row in &open {
        collected += row.paid;
        if row.status != crate::models::InvoiceStatus::Paid {
            open_invoices += 1;
            outstanding += row.remaining;
        }
    }

    let payload = json!({
        "totalResidents": total_residents,
        "latestOccupancyDate": latest_date.map(|d| d.to_string()),
        "occupancyRatePercent": occupancy_rate,
        "openInvoices": open_invoices,
        "outstanding": outstanding,
        "collected": collected,
    });

    if !maybe_print_json(json_flag, jsonl_flag, &payload)? {
        let ccy = get_currency(conn)?;
        let rows = vec![
            vec!["Residents".to_string(), total_residents.to_string()],
            vec![
                "Latest occupancy".to_string(),
                match (latest_date, occupancy_rate) {
                    (Some(d), Some(rate)) => format!("{:.1}% on {}", rate, d),
                    _ => "no samples".to_string(),
                },
            ],
            vec!["Open invoices".to_string(), open_invoices.to_string()],
            vec![
                "Outstanding".to_string(),
                format!("{} {:.2}", ccy, outstanding),
            ],
            vec!["Collected".to_string(), format!("{} {:.2}", ccy, collected)],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}
