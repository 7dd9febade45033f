//! Ordinary least-squares price trend over years.
//!
//! Fits `price = intercept + slope * year` and extrapolates one year past the
//! newest observation. Years are centred on their mean before fitting so that
//! calendar-scale values do not cost precision.
//!
//! Prices are reported rounded to 2 decimals with banker's rounding
//! (`MidpointNearestEven`) via `rust_decimal`. No clamping is applied: a
//! falling trend can extrapolate to a negative price.

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::resolve::SelectedSubset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    slope: f64,
    intercept: f64,
    observations: usize,
}

impl LinearTrend {
    /// Fits the line through `(year, price)` points.
    ///
    /// # Panics
    ///
    /// Panics when fewer than two points are supplied; callers select at
    /// least that many before fitting.
    pub fn fit(points: &[(i32, f64)]) -> Self {
        assert!(
            points.len() >= 2,
            "trend fit requires at least 2 points, got {}",
            points.len()
        );
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| f64::from(*x)).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = f64::from(*x) - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

        // every point shares one year: the least-squares line is flat at the mean
        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        Self {
            slope,
            intercept: mean_y - slope * mean_x,
            observations: points.len(),
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn evaluate(&self, year: i32) -> f64 {
        self.intercept + self.slope * f64::from(year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendForecast {
    pub predicted_price: f64,
    pub target_year: i32,
}

pub fn predict(subset: &SelectedSubset<'_>) -> TrendForecast {
    let points = subset.points().collect::<Vec<_>>();
    let trend = LinearTrend::fit(&points);
    let target_year = points
        .iter()
        .map(|(year, _)| *year)
        .max()
        .map_or(0, |year| year.saturating_add(1));
    TrendForecast {
        predicted_price: round_price(trend.evaluate(target_year)),
        target_year,
    }
}

/// Rounds to 2 decimals, half to even. Values `Decimal` cannot hold are
/// returned unchanged.
pub fn round_price(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve::SourceLevel, schema::CanonicalRecord};

    fn records(points: &[(i32, f64)]) -> Vec<CanonicalRecord> {
        points
            .iter()
            .map(|(year, price)| CanonicalRecord {
                crop: "wheat".into(),
                district: "delhi".into(),
                state: None,
                season: None,
                month: 3,
                year: *year,
                modal_price: *price,
            })
            .collect()
    }

    fn forecast(points: &[(i32, f64)]) -> TrendForecast {
        let owned = records(points);
        let subset = SelectedSubset {
            records: owned.iter().collect(),
            level: SourceLevel::District,
        };
        predict(&subset)
    }

    #[test]
    fn perfectly_linear_series_extrapolates_exactly() {
        let result = forecast(&[(2019, 1800.0), (2020, 1900.0), (2021, 2000.0)]);
        assert_eq!(result.target_year, 2022);
        assert!((result.predicted_price - 2100.0).abs() < 1e-9);
    }

    #[test]
    fn target_year_follows_the_latest_year_regardless_of_order() {
        let result = forecast(&[(2021, 10.0), (2015, 4.0), (2018, 7.0)]);
        assert_eq!(result.target_year, 2022);
        assert!((result.predicted_price - 11.0).abs() < 1e-9);
    }

    #[test]
    fn fit_matches_hand_computed_least_squares() {
        let trend = LinearTrend::fit(&[(2018, 1.0), (2019, 3.0), (2020, 2.0), (2021, 5.0)]);
        assert!((trend.slope() - 1.1).abs() < 1e-9);
        assert!((trend.evaluate(2022) - 5.5).abs() < 1e-9);
        assert!((trend.intercept() + 2218.7).abs() < 1e-6);
        assert_eq!(trend.observations(), 4);
    }

    #[test]
    fn single_year_subset_predicts_the_mean() {
        let result = forecast(&[(2020, 1000.0), (2020, 1200.0)]);
        assert_eq!(result.target_year, 2021);
        assert_eq!(result.predicted_price, 1100.0);
    }

    #[test]
    fn falling_trend_is_not_clamped() {
        let result = forecast(&[(2019, 200.0), (2020, 100.0)]);
        assert_eq!(result.predicted_price, 0.0);
        let result = forecast(&[(2019, 300.0), (2020, 100.0)]);
        assert_eq!(result.predicted_price, -100.0);
    }

    #[test]
    fn rounding_is_half_to_even_at_two_decimals() {
        assert_eq!(round_price(2100.004), 2100.0);
        assert_eq!(round_price(1234.5678), 1234.57);
        assert_eq!(round_price(0.125), 0.12);
        assert_eq!(round_price(0.135), 0.14);
    }

    #[test]
    #[should_panic(expected = "at least 2 points")]
    fn fitting_one_point_violates_the_contract() {
        LinearTrend::fit(&[(2020, 1.0)]);
    }
}
