//! Summary figures shown next to a plotted channel.
use ndarray::Array1;
use serde::Serialize;
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}
/// Summarizes a sanitized sequence. `None` when it holds no samples.
pub fn summarize(values: &[f64]) -> Option<Summary> {
    let samples = Array1::from_vec(values.to_vec());
    let mean = samples.mean()?;
    let min = samples.fold(f64::INFINITY, |acc, &v| acc.min(v));
    let max = samples.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    Some(Summary {
        count: samples.len(),
        min,
        max,
        mean,
        std_dev: samples.std(0.0),
    })
}
