// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::InvoiceStatus;
use crate::utils::{
    fmt_money, get_currency, id_for_resident, maybe_print_json, parse_date, parse_decimal,
    pretty_table, today,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let resident = sub.get_one::<String>("resident").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Invoice amount must be positive, got {}", amount));
    }
    let due = parse_date(sub.get_one::<String>("due").unwrap().trim())?;
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let issued = match sub.get_one::<String>("issued") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };

    let resident_id = id_for_resident(conn, resident)?;
    conn.execute(
        "INSERT INTO fee_invoices(resident_id, amount, due_date, description, status, issued_at)
         VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5)",
        params![
            resident_id,
            amount.to_string(),
            due.to_string(),
            description,
            issued.to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();
    println!(
        "Issued invoice #{} to {}: {} due {}",
        id,
        resident,
        fmt_money(&amount, &get_currency(conn)?),
        due
    );
    Ok(())
}

#[derive(Serialize)]
pub struct InvoiceRow {
    pub id: i64,
    pub resident: String,
    pub amount: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub status: InvoiceStatus,
    pub due_date: String,
    pub issued_at: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let status = sub
        .get_one::<String>("status")
        .map(|s| s.trim().to_uppercase());
    if let Some(ref s) = status {
        if InvoiceStatus::parse(s).is_none() {
            return Err(anyhow!(
                "Unknown status '{}' (use PENDING|PARTIAL|PAID)",
                s
            ));
        }
    }
    let resident = sub.get_one::<String>("resident").map(|s| s.trim());

    let data = query_rows(conn, status.as_deref(), resident)?;

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.resident.clone(),
                    format!("{:.2}", r.amount),
                    format!("{:.2}", r.paid),
                    format!("{:.2}", r.remaining),
                    r.status.as_str().to_string(),
                    r.due_date.clone(),
                    r.issued_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Resident", "Amount", "Paid", "Remaining", "Status", "Due", "Issued"],
                rows,
            )
        );
    }
    Ok(())
}

pub fn query_rows(
    conn: &Connection,
    status: Option<&str>,
    resident: Option<&str>,
) -> Result<Vec<InvoiceRow>> {
    let mut sql = String::from(
        "SELECT i.id, r.full_name, i.amount, i.status, i.due_date, i.issued_at
         FROM fee_invoices i JOIN residents r ON i.resident_id=r.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(s) = status {
        sql.push_str(" AND i.status=?");
        params_vec.push(s.into());
    }
    if let Some(name) = resident {
        sql.push_str(" AND r.full_name=?");
        params_vec.push(name.into());
    }
    sql.push_str(" ORDER BY i.due_date ASC, i.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let resident: String = r.get(1)?;
        let amount_s: String = r.get(2)?;
        let status_s: String = r.get(3)?;
        let due_date: String = r.get(4)?;
        let issued_at: String = r.get(5)?;

        let amount = Decimal::from_str_exact(&amount_s)
            .map_err(|_| anyhow!("Invalid stored amount '{}' for invoice {}", amount_s, id))?;
        let paid = paid_total(conn, id)?;
        data.push(InvoiceRow {
            id,
            resident,
            amount,
            paid,
            remaining: amount - paid,
            status: InvoiceStatus::parse(&status_s).unwrap_or(InvoiceStatus::Pending),
            due_date,
            issued_at,
        });
    }
    Ok(data)
}

fn paid_total(conn: &Connection, invoice_id: i64) -> Result<Decimal> {
    let payments = ledger::load_payments(conn, invoice_id)?;
    Ok(payments.iter().map(|p| p.amount).sum())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let id = *sub.get_one::<i64>("id").unwrap();

    let invoice = ledger::load_invoice(conn, id)?
        .ok_or_else(|| anyhow!("Invoice {} not found", id))?;
    let payments = ledger::load_payments(conn, id)?;
    let paid: Decimal = payments.iter().map(|p| p.amount).sum();

    #[derive(Serialize)]
    struct InvoiceDetail {
        invoice: crate::models::Invoice,
        payments: Vec<crate::models::Payment>,
        paid: Decimal,
        remaining: Decimal,
    }
    let detail = InvoiceDetail {
        remaining: invoice.amount - paid,
        paid,
        invoice,
        payments,
    };

    if !maybe_print_json(json_flag, jsonl_flag, &detail)? {
        let ccy = get_currency(conn)?;
        println!(
            "Invoice #{}: {} due {} (issued {}, status {})",
            detail.invoice.id,
            fmt_money(&detail.invoice.amount, &ccy),
            detail.invoice.due_date,
            detail.invoice.issued_at,
            detail.invoice.status.as_str()
        );
        if let Some(ref d) = detail.invoice.description {
            println!("  {}", d);
        }
        let rows: Vec<Vec<String>> = detail
            .payments
            .iter()
            .map(|p| {
                vec![
                    p.paid_at.to_string(),
                    format!("{:.2}", p.amount),
                    p.method.clone(),
                    p.reference.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Paid At", "Amount", "Method", "Reference"], rows)
        );
        println!(
            "Paid {} / remaining {}",
            fmt_money(&detail.paid, &ccy),
            fmt_money(&detail.remaining, &ccy)
        );
    }
    Ok(())
}
