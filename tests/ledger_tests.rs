// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use bunkbook::ledger::{self, LedgerError};
use bunkbook::models::InvoiceStatus;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE residents(id INTEGER PRIMARY KEY AUTOINCREMENT, full_name TEXT NOT NULL UNIQUE, room TEXT, created_at TEXT);
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
    conn.execute("INSERT INTO residents(full_name) VALUES('Asha Rao')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO fee_invoices(resident_id, amount, due_date, status, issued_at)
         VALUES(1, '1000', '2025-06-15', 'PENDING', '2025-06-01')",
        [],
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

#[test]
fn partial_payment_then_overpay_then_exact_payoff() {
    let mut conn = setup();

    let first = ledger::record_payment(&mut conn, 1, dec("400"), "UPI", None, day("2025-06-02"))
        .unwrap();
    assert_eq!(first.invoice.status, InvoiceStatus::Partial);
    assert_eq!(first.remaining, dec("600"));
    assert_eq!(first.payment.amount, dec("400"));

    let err = ledger::record_payment(&mut conn, 1, dec("601"), "UPI", None, day("2025-06-03"))
        .unwrap_err();
    match err {
        LedgerError::BalanceExceeded { remaining } => assert_eq!(remaining, dec("600")),
        other => panic!("unexpected error: {other}"),
    }

    let last = ledger::record_payment(&mut conn, 1, dec("600"), "CASH", None, day("2025-06-04"))
        .unwrap();
    assert_eq!(last.invoice.status, InvoiceStatus::Paid);
    assert_eq!(last.remaining, Decimal::ZERO);
    assert_eq!(last.payments.len(), 2);
}

#[test]
fn paid_invoice_rejects_further_payments_with_zero_remaining() {
    let mut conn = setup();
    ledger::record_payment(&mut conn, 1, dec("1000"), "BANK", None, day("2025-06-02")).unwrap();

    let err = ledger::record_payment(&mut conn, 1, dec("0.01"), "BANK", None, day("2025-06-03"))
        .unwrap_err();
    match err {
        LedgerError::BalanceExceeded { remaining } => assert_eq!(remaining, Decimal::ZERO),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_invoice_is_a_typed_failure() {
    let mut conn = setup();
    let err = ledger::record_payment(&mut conn, 42, dec("10"), "CASH", None, day("2025-06-02"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvoiceNotFound(42)));
}

#[test]
fn non_positive_amounts_are_rejected() {
    let mut conn = setup();
    for bad in ["0", "-5"] {
        let err =
            ledger::record_payment(&mut conn, 1, dec(bad), "CASH", None, day("2025-06-02"))
                .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveAmount(_)));
    }
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM payments", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn rejected_payment_leaves_no_partial_effect() {
    let mut conn = setup();
    ledger::record_payment(&mut conn, 1, dec("400"), "UPI", None, day("2025-06-02")).unwrap();

    ledger::record_payment(&mut conn, 1, dec("601"), "UPI", None, day("2025-06-03")).unwrap_err();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM payments", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    let status: String = conn
        .query_row("SELECT status FROM fee_invoices WHERE id=1", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(status, "PARTIAL");
}

#[test]
fn recorded_payment_is_persisted_with_reference() {
    let mut conn = setup();
    let recorded = ledger::record_payment(
        &mut conn,
        1,
        dec("250.50"),
        "UPI",
        Some("TXN-901"),
        day("2025-06-05"),
    )
    .unwrap();
    assert_eq!(recorded.payment.reference.as_deref(), Some("TXN-901"));

    let (amount, method, reference, paid_at): (String, String, Option<String>, String) = conn
        .query_row(
            "SELECT amount, method, reference, paid_at FROM payments WHERE id=?1",
            params![recorded.payment.id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(amount, "250.50");
    assert_eq!(method, "UPI");
    assert_eq!(reference.as_deref(), Some("TXN-901"));
    assert_eq!(paid_at, "2025-06-05");
}

#[test]
fn replaying_the_same_payments_yields_the_same_final_state() {
    let sequence = [("300", "2025-06-02"), ("200", "2025-06-03"), ("500", "2025-06-04")];

    let run = || {
        let mut conn = setup();
        for (amount, date) in sequence {
            ledger::record_payment(&mut conn, 1, dec(amount), "CASH", None, day(date)).unwrap();
        }
        let status: String = conn
            .query_row("SELECT status FROM fee_invoices WHERE id=1", [], |r| {
                r.get(0)
            })
            .unwrap();
        let invoice = ledger::load_invoice(&conn, 1).unwrap().unwrap();
        let paid: Decimal = ledger::load_payments(&conn, 1)
            .unwrap()
            .iter()
            .map(|p| p.amount)
            .sum();
        (status, invoice.amount - paid)
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.0, "PAID");
    assert_eq!(first.1, Decimal::ZERO);
}
