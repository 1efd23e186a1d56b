//! Column statistics over ragged tables of scores.
//!
//! Rows are runs (one per resident), columns are positions along a learning
//! curve. Rows shorter than a column are skipped for that column.

/// Arithmetic mean, `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `0.0` for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

fn column(rows: &[Vec<f64>], index: usize) -> Vec<f64> {
    rows.iter().filter_map(|row| row.get(index).copied()).collect()
}

fn width(rows: &[Vec<f64>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

/// Per-column mean.
pub fn column_average(rows: &[Vec<f64>]) -> Vec<f64> {
    (0..width(rows)).map(|i| mean(&column(rows, i))).collect()
}

/// Per-column sample standard deviation.
pub fn column_std_dev(rows: &[Vec<f64>]) -> Vec<f64> {
    (0..width(rows)).map(|i| std_dev(&column(rows, i))).collect()
}
