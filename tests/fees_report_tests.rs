// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use bunkbook::ledger;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE fee_invoices(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resident_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            due_date TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING',
            issued_at TEXT NOT NULL
        );
        CREATE TABLE payments(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            invoice_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            method TEXT NOT NULL,
            reference TEXT,
            paid_at TEXT NOT NULL
        );
    "#,
    )
    .unwrap();
    conn
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn insert_invoice(conn: &Connection, amount: &str, issued_at: &str) -> i64 {
    conn.execute(
        "INSERT INTO fee_invoices(resident_id, amount, due_date, status, issued_at)
         VALUES(1, ?1, '2024-02-01', 'PENDING', ?2)",
        params![amount, issued_at],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn insert_payment(conn: &Connection, invoice_id: i64, amount: &str, paid_at: &str) {
    conn.execute(
        "INSERT INTO payments(invoice_id, amount, method, paid_at) VALUES(?1, ?2, 'CASH', ?3)",
        params![invoice_id, amount, paid_at],
    )
    .unwrap();
}

#[test]
fn invoice_and_payment_land_in_separate_day_buckets() {
    let conn = setup();
    let id = insert_invoice(&conn, "1000", "2024-01-01");
    insert_payment(&conn, id, "1000", "2024-01-03");

    let series =
        ledger::fees_time_series(&conn, day("2024-01-01"), day("2024-01-31")).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, day("2024-01-01"));
    assert_eq!(series[0].total_invoiced, dec("1000"));
    assert_eq!(series[0].total_paid, Decimal::ZERO);
    assert_eq!(series[1].date, day("2024-01-03"));
    assert_eq!(series[1].total_invoiced, Decimal::ZERO);
    assert_eq!(series[1].total_paid, dec("1000"));
}

#[test]
fn same_day_amounts_accumulate_into_one_bucket() {
    let conn = setup();
    insert_invoice(&conn, "3000", "2024-01-05");
    let second = insert_invoice(&conn, "5000", "2024-01-05");
    insert_payment(&conn, second, "2000", "2024-01-05");
    insert_payment(&conn, second, "1500", "2024-01-05");

    let series =
        ledger::fees_time_series(&conn, day("2024-01-01"), day("2024-01-31")).unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].total_invoiced, dec("8000"));
    assert_eq!(series[0].total_paid, dec("3500"));
}

#[test]
fn payment_outside_range_is_still_bucketed_on_its_own_day() {
    // The invoice qualifies by issuance date; its payment keeps its own
    // paid_at bucket even past the queried end.
    let conn = setup();
    let id = insert_invoice(&conn, "1000", "2024-01-20");
    insert_payment(&conn, id, "400", "2024-02-10");

    let series =
        ledger::fees_time_series(&conn, day("2024-01-01"), day("2024-01-31")).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[1].date, day("2024-02-10"));
    assert_eq!(series[1].total_paid, dec("400"));
}

#[test]
fn invoices_issued_outside_range_are_excluded_with_their_payments() {
    let conn = setup();
    let outside = insert_invoice(&conn, "9000", "2023-12-31");
    insert_payment(&conn, outside, "9000", "2024-01-10");
    insert_invoice(&conn, "1000", "2024-01-02");

    let series =
        ledger::fees_time_series(&conn, day("2024-01-01"), day("2024-01-31")).unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].date, day("2024-01-02"));
    assert_eq!(series[0].total_invoiced, dec("1000"));
    assert_eq!(series[0].total_paid, Decimal::ZERO);
}

#[test]
fn series_is_ascending_by_date() {
    let conn = setup();
    insert_invoice(&conn, "100", "2024-01-09");
    insert_invoice(&conn, "100", "2024-01-03");
    insert_invoice(&conn, "100", "2024-01-06");

    let series =
        ledger::fees_time_series(&conn, day("2024-01-01"), day("2024-01-31")).unwrap();

    let dates: Vec<_> = series.iter().map(|d| d.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(dates.len(), 3);
}

#[test]
fn empty_range_yields_empty_series() {
    let conn = setup();
    insert_invoice(&conn, "100", "2024-01-09");

    let series =
        ledger::fees_time_series(&conn, day("2024-03-01"), day("2024-03-31")).unwrap();
    assert!(series.is_empty());
}
