// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{FeeDayTotal, Invoice, InvoiceStatus, Payment};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invoice {0} not found")]
    InvoiceNotFound(i64),
    #[error("Payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Payment amount exceeds remaining balance. Remaining: {remaining}")]
    BalanceExceeded { remaining: Decimal },
    #[error("Invalid stored amount '{raw}' for invoice {invoice_id}")]
    CorruptAmount { invoice_id: i64, raw: String },
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

/// Invoice status is a pure function of the amount owed versus the sum of
/// recorded payments.
pub fn derive_status(invoice_amount: Decimal, total_paid: Decimal) -> InvoiceStatus {
    if total_paid >= invoice_amount {
        InvoiceStatus::Paid
    } else if total_paid > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Pending
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub remaining: Decimal,
}

/// Record a payment against an invoice and update the invoice's status.
///
/// The balance check, the payment insert, and the status update run inside
/// one IMMEDIATE transaction, so two submissions against the same invoice
/// serialize and the loser of a race is rejected instead of over-crediting.
/// A fully paid invoice rejects every further payment with remaining = 0.
pub fn record_payment(
    conn: &mut Connection,
    invoice_id: i64,
    amount: Decimal,
    method: &str,
    reference: Option<&str>,
    paid_at: NaiveDate,
) -> Result<RecordedPayment, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut invoice =
        load_invoice(&tx, invoice_id)?.ok_or(LedgerError::InvoiceNotFound(invoice_id))?;
    let mut payments = load_payments(&tx, invoice_id)?;
    let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

    let remaining = invoice.amount - total_paid;
    if amount > remaining {
        return Err(LedgerError::BalanceExceeded { remaining });
    }

    tx.execute(
        "INSERT INTO payments(invoice_id, amount, method, reference, paid_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            invoice_id,
            amount.to_string(),
            method,
            reference,
            paid_at.to_string()
        ],
    )?;
    let payment_id = tx.last_insert_rowid();

    let new_total = total_paid + amount;
    let status = derive_status(invoice.amount, new_total);
    tx.execute(
        "UPDATE fee_invoices SET status=?1 WHERE id=?2",
        params![status.as_str(), invoice_id],
    )?;

    tx.commit()?;

    let payment = Payment {
        id: payment_id,
        invoice_id,
        amount,
        method: method.to_string(),
        reference: reference.map(|s| s.to_string()),
        paid_at,
    };
    invoice.status = status;
    payments.push(payment.clone());

    Ok(RecordedPayment {
        payment,
        invoice,
        payments,
        remaining: remaining - amount,
    })
}

pub fn load_invoice(conn: &Connection, invoice_id: i64) -> Result<Option<Invoice>, LedgerError> {
    let row = conn
        .query_row(
            "SELECT id, resident_id, amount, due_date, description, status, issued_at
             FROM fee_invoices WHERE id=?1",
            params![invoice_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, NaiveDate>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, NaiveDate>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, resident_id, amount_s, due_date, description, status_s, issued_at)) = row else {
        return Ok(None);
    };
    Ok(Some(Invoice {
        id,
        resident_id,
        amount: parse_amount(&amount_s, id)?,
        due_date,
        description,
        status: InvoiceStatus::parse(&status_s).unwrap_or(InvoiceStatus::Pending),
        issued_at,
    }))
}

pub fn load_payments(conn: &Connection, invoice_id: i64) -> Result<Vec<Payment>, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, invoice_id, amount, method, reference, paid_at
         FROM payments WHERE invoice_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![invoice_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, NaiveDate>(5)?,
        ))
    })?;

    let mut payments = Vec::new();
    for row in rows {
        let (id, invoice_id, amount_s, method, reference, paid_at) = row?;
        payments.push(Payment {
            id,
            invoice_id,
            amount: parse_amount(&amount_s, invoice_id)?,
            method,
            reference,
            paid_at,
        });
    }
    Ok(payments)
}

/// Day-bucketed invoiced/paid totals. Invoices issued in [start, end]
/// bucket their amount on the issuance day; payments of those invoices
/// bucket on their own paid_at day, even when that day falls outside the
/// queried range.
pub fn fees_time_series(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<FeeDayTotal>, LedgerError> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();

    let mut stmt = conn.prepare(
        "SELECT id, issued_at, amount FROM fee_invoices WHERE issued_at>=?1 AND issued_at<=?2",
    )?;
    let rows = stmt.query_map(params![start.to_string(), end.to_string()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, NaiveDate>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (id, issued_at, amount_s) = row?;
        let entry = buckets
            .entry(issued_at)
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += parse_amount(&amount_s, id)?;
    }

    let mut pstmt = conn.prepare(
        "SELECT p.invoice_id, p.paid_at, p.amount
         FROM payments p JOIN fee_invoices i ON p.invoice_id=i.id
         WHERE i.issued_at>=?1 AND i.issued_at<=?2",
    )?;
    let prows = pstmt.query_map(params![start.to_string(), end.to_string()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, NaiveDate>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in prows {
        let (invoice_id, paid_at, amount_s) = row?;
        let entry = buckets
            .entry(paid_at)
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.1 += parse_amount(&amount_s, invoice_id)?;
    }

    Ok(buckets
        .into_iter()
        .map(|(date, (total_invoiced, total_paid))| FeeDayTotal {
            date,
            total_invoiced,
            total_paid,
        })
        .collect())
}

fn parse_amount(raw: &str, invoice_id: i64) -> Result<Decimal, LedgerError> {
    Decimal::from_str_exact(raw).map_err(|_| LedgerError::CorruptAmount {
        invoice_id,
        raw: raw.to_string(),
    })
}
