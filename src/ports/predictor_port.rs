//! Probabilistic classifier port for the next-day direction model.

use crate::domain::error::TraderError;

pub trait Predictor {
    /// Train on `features` (one row per observation) and binary `labels`.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[bool]) -> Result<(), TraderError>;

    /// P(label = true) per row, each in [0, 1] and aligned 1:1 with `features`.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TraderError>;
}
