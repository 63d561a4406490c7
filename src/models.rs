// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: i64,
    pub full_name: String,
    pub room: Option<String>,
}

/// One calendar day's bed utilization, recorded once per day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OccupancySample {
    pub date: NaiveDate,
    pub total_beds: i64,
    pub occupied_beds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    #[serde(rename = "predictedOccupancyRate")]
    pub predicted_occupancy_rate: f64,
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMetadata {
    #[serde(rename = "historicalDays")]
    pub historical_days: usize,
    #[serde(rename = "movingAverage")]
    pub moving_average: f64,
    pub trend: Trend,
    #[serde(rename = "trendSlope")]
    pub trend_slope: f64,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub forecast: Vec<ForecastPoint>,
    pub metadata: ForecastMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<InvoiceStatus> {
        match s {
            "PENDING" => Some(InvoiceStatus::Pending),
            "PARTIAL" => Some(InvoiceStatus::Partial),
            "PAID" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub resident_id: i64,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub status: InvoiceStatus,
    pub issued_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: NaiveDate,
}

/// One day's bucket of the fee time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDayTotal {
    pub date: NaiveDate,
    #[serde(rename = "totalInvoiced")]
    pub total_invoiced: Decimal,
    #[serde(rename = "totalPaid")]
    pub total_paid: Decimal,
}
