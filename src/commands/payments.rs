// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{
    fmt_money, get_currency, maybe_print_json, parse_date, parse_decimal, pretty_table, today,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let invoice_id = *sub.get_one::<i64>("invoice").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let method = sub.get_one::<String>("method").unwrap().trim().to_string();
    let reference = sub
        .get_one::<String>("reference")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    let paid_at = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };

    let recorded = ledger::record_payment(conn, invoice_id, amount, &method, reference, paid_at)?;

    let ccy = get_currency(conn)?;
    println!(
        "Recorded payment of {} against invoice #{} (status {}, remaining {})",
        fmt_money(&recorded.payment.amount, &ccy),
        invoice_id,
        recorded.invoice.status.as_str(),
        fmt_money(&recorded.remaining, &ccy)
    );
    Ok(())
}

#[derive(Serialize)]
struct PaymentRow {
    id: i64,
    invoice_id: i64,
    amount: String,
    method: String,
    reference: String,
    paid_at: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql = String::from(
        "SELECT id, invoice_id, amount, method, reference, paid_at FROM payments WHERE 1=1",
    );
    let invoice = sub.get_one::<i64>("invoice").copied();
    if invoice.is_some() {
        sql.push_str(" AND invoice_id=?1");
    }
    sql.push_str(" ORDER BY paid_at, id");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match invoice {
        Some(id) => stmt.query(rusqlite::params![id])?,
        None => stmt.query([])?,
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let reference: Option<String> = r.get(4)?;
        data.push(PaymentRow {
            id: r.get(0)?,
            invoice_id: r.get(1)?,
            amount: r.get(2)?,
            method: r.get(3)?,
            reference: reference.unwrap_or_default(),
            paid_at: r.get(5)?,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.invoice_id.to_string(),
                    p.amount.clone(),
                    p.method.clone(),
                    p.reference.clone(),
                    p.paid_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Invoice", "Amount", "Method", "Reference", "Paid At"],
                rows,
            )
        );
    }
    Ok(())
}
