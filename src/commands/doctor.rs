// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, derive_status};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Occupancy samples that cannot yield a rate
    let mut stmt = conn.prepare(
        "SELECT date, total_beds, occupied_beds FROM occupancy_history
         WHERE total_beds<=0 OR occupied_beds<0 OR occupied_beds>total_beds
         ORDER BY date",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let d: String = r.get(0)?;
        let total: i64 = r.get(1)?;
        let occupied: i64 = r.get(2)?;
        rows.push(vec![
            "invalid_occupancy_sample".into(),
            format!("{} {}/{}", d, occupied, total),
        ]);
    }

    // 2) Ledger invariant: sum(payments) <= invoice.amount; and the stored
    //    status must match the derived one
    let mut stmt2 = conn.prepare("SELECT id, amount, status FROM fee_invoices ORDER BY id")?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let status_s: String = r.get(2)?;

        let Ok(amount) = Decimal::from_str_exact(&amount_s) else {
            rows.push(vec![
                "corrupt_invoice_amount".into(),
                format!("invoice {} amount '{}'", id, amount_s),
            ]);
            continue;
        };
        let paid: Decimal = ledger::load_payments(conn, id)?
            .iter()
            .map(|p| p.amount)
            .sum();

        if paid > amount {
            rows.push(vec![
                "overpaid_invoice".into(),
                format!("invoice {} paid {} of {}", id, paid, amount),
            ]);
        }
        let derived = derive_status(amount, paid);
        if derived.as_str() != status_s {
            rows.push(vec![
                "status_drift".into(),
                format!("invoice {} stored {} derived {}", id, status_s, derived.as_str()),
            ]);
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
