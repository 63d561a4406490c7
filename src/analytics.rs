// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Forecast, ForecastMetadata, ForecastPoint, OccupancySample, Trend};
use chrono::Duration;
use thiserror::Error;

/// Number of days predicted ahead of the last historical sample.
pub const FORECAST_HORIZON: usize = 7;
/// Minimum history required before a forecast is attempted.
pub const MIN_SAMPLES: usize = 7;

const MOVING_AVERAGE_WINDOW: usize = 7;
const TREND_WEIGHT: f64 = 0.6;
const AVERAGE_WEIGHT: f64 = 0.4;

pub const METHOD_LABEL: &str = "Linear Regression + Moving Average";
const FORECAST_NOTE: &str = "Statistical forecast for educational purposes. Not financial advice.";

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Insufficient historical data for forecasting. Need at least {MIN_SAMPLES} days, have {have}")]
    InsufficientHistory { have: usize },
    #[error("Invalid occupancy sample on {date}: {occupied_beds} occupied of {total_beds} beds")]
    InvalidSample {
        date: chrono::NaiveDate,
        total_beds: i64,
        occupied_beds: i64,
    },
}

/// Rejects samples that cannot yield an occupancy rate: zero or negative
/// bed counts, or occupied outside [0, total].
pub fn check_sample(sample: &OccupancySample) -> Result<(), ForecastError> {
    if sample.total_beds <= 0
        || sample.occupied_beds < 0
        || sample.occupied_beds > sample.total_beds
    {
        return Err(ForecastError::InvalidSample {
            date: sample.date,
            total_beds: sample.total_beds,
            occupied_beds: sample.occupied_beds,
        });
    }
    Ok(())
}

/// Forecast the next seven days of occupancy from an ascending-by-date
/// sample history. The fitted linear trend is blended with the trailing
/// seven-sample moving average; the average is computed once and held
/// constant across all seven forecast days.
pub fn forecast_occupancy(samples: &[OccupancySample]) -> Result<Forecast, ForecastError> {
    for s in samples {
        check_sample(s)?;
    }
    let n = samples.len();
    if n < MIN_SAMPLES {
        return Err(ForecastError::InsufficientHistory { have: n });
    }

    let rates: Vec<f64> = samples
        .iter()
        .map(|s| 100.0 * s.occupied_beds as f64 / s.total_beds as f64)
        .collect();

    let (slope, intercept) = fit_line(&rates);

    let window = &rates[n - MOVING_AVERAGE_WINDOW..];
    let moving_average = window.iter().sum::<f64>() / window.len() as f64;

    let last_date = samples[n - 1].date;
    let mut forecast = Vec::with_capacity(FORECAST_HORIZON);
    for k in 1..=FORECAST_HORIZON {
        let trend = slope * (n as f64 + k as f64 - 1.0) + intercept;
        let blended = TREND_WEIGHT * trend + AVERAGE_WEIGHT * moving_average;
        forecast.push(ForecastPoint {
            date: last_date + Duration::days(k as i64),
            predicted_occupancy_rate: round1(blended.clamp(0.0, 100.0)),
            method: METHOD_LABEL.to_string(),
        });
    }

    let trend = if slope > 0.0 {
        Trend::Increasing
    } else if slope < 0.0 {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    Ok(Forecast {
        forecast,
        metadata: ForecastMetadata {
            historical_days: n,
            moving_average: round1(moving_average),
            trend,
            trend_slope: round2(slope),
            note: FORECAST_NOTE.to_string(),
        },
    })
}

/// Ordinary least squares of y against index 0..n-1. Returns (slope,
/// intercept); a degenerate x spread yields slope 0.
fn fit_line(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (ys.len() - 1) as f64 / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };
    (slope, y_mean - slope * x_mean)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
