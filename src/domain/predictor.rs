//! Logistic-regression next-day direction model.
//!
//! Features are standardised with the training means and population std,
//! then fitted by deterministic batch gradient descent with an L2 penalty.
//! A training set with a single label class yields a constant 0.5 model.

use tracing::{debug, warn};

use crate::domain::error::TraderError;
use crate::domain::features::{make_features, next_day_labels};
use crate::domain::ohlcv::PricePoint;
use crate::domain::signal::Signal;
use crate::ports::predictor_port::Predictor;

const BUY_PROBABILITY: f64 = 0.6;
const SELL_PROBABILITY: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub iterations: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Trailing share of the labelled rows held out for accuracy.
    pub validation_fraction: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            iterations: 400,
            learning_rate: 0.1,
            l2: 1.0,
            validation_fraction: 0.2,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), TraderError> {
        if self.iterations == 0 {
            return Err(TraderError::invalid("iterations", "must be positive"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TraderError::invalid("learning_rate", "must be positive"));
        }
        if !self.l2.is_finite() || self.l2 < 0.0 {
            return Err(TraderError::invalid("l2", "must be non-negative"));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(TraderError::invalid(
                "validation_fraction",
                "must be within [0, 1)",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FittedModel {
    Unfitted,
    Constant(f64),
    Linear {
        means: Vec<f64>,
        scales: Vec<f64>,
        weights: Vec<f64>,
        bias: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    params: ModelParams,
    model: FittedModel,
}

impl LogisticRegression {
    pub fn new(params: ModelParams) -> Self {
        LogisticRegression {
            params,
            model: FittedModel::Unfitted,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.model, FittedModel::Constant(_))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn column_stats(features: &[Vec<f64>], width: usize) -> (Vec<f64>, Vec<f64>) {
    let n = features.len() as f64;
    let mut means = vec![0.0; width];
    for row in features {
        for (m, x) in means.iter_mut().zip(row) {
            *m += x / n;
        }
    }
    let mut scales = vec![0.0; width];
    for row in features {
        for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
            *s += (x - m).powi(2) / n;
        }
    }
    for s in &mut scales {
        *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
    }
    (means, scales)
}

fn check_width(features: &[Vec<f64>], width: usize) -> Result<(), TraderError> {
    match features.iter().find(|row| row.len() != width) {
        Some(row) => Err(TraderError::Model {
            reason: format!("expected {width} features per row, got {}", row.len()),
        }),
        None => Ok(()),
    }
}

impl Predictor for LogisticRegression {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[bool]) -> Result<(), TraderError> {
        if features.len() != labels.len() {
            return Err(TraderError::Model {
                reason: format!("{} rows but {} labels", features.len(), labels.len()),
            });
        }
        if features.is_empty() {
            return Err(TraderError::Model {
                reason: "no training rows".to_string(),
            });
        }
        let width = features[0].len();
        check_width(features, width)?;

        let positives = labels.iter().filter(|&&y| y).count();
        if positives == 0 || positives == labels.len() {
            warn!("single label class in training window, predicting 0.5");
            self.model = FittedModel::Constant(0.5);
            return Ok(());
        }

        let (means, scales) = column_stats(features, width);
        let scaled: Vec<Vec<f64>> = features
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&means)
                    .zip(&scales)
                    .map(|((x, m), s)| (x - m) / s)
                    .collect()
            })
            .collect();

        let m = features.len() as f64;
        let mut weights = vec![0.0; width];
        let mut bias = 0.0;
        for _ in 0..self.params.iterations {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, &label) in scaled.iter().zip(labels) {
                let z = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
                let err = sigmoid(z) - if label { 1.0 } else { 0.0 };
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= self.params.learning_rate * (g / m + self.params.l2 * *w / m);
            }
            bias -= self.params.learning_rate * grad_b / m;
        }
        debug!(rows = features.len(), ?weights, bias, "logistic regression fitted");

        self.model = FittedModel::Linear {
            means,
            scales,
            weights,
            bias,
        };
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TraderError> {
        match &self.model {
            FittedModel::Unfitted => Err(TraderError::Model {
                reason: "predict called before fit".to_string(),
            }),
            FittedModel::Constant(p) => Ok(vec![*p; features.len()]),
            FittedModel::Linear {
                means,
                scales,
                weights,
                bias,
            } => {
                check_width(features, weights.len())?;
                Ok(features
                    .iter()
                    .map(|row| {
                        let z = row
                            .iter()
                            .zip(means)
                            .zip(scales)
                            .zip(weights)
                            .map(|(((x, m), s), w)| (x - m) / s * w)
                            .sum::<f64>();
                        sigmoid(bias + z)
                    })
                    .collect())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub prob_up: f64,
    pub validation_accuracy: f64,
    pub call: Signal,
}

pub fn call_for(prob_up: f64) -> Signal {
    if prob_up > BUY_PROBABILITY {
        Signal::Buy
    } else if prob_up < SELL_PROBABILITY {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Train on every labelled feature row and predict the direction after the last one.
///
/// Labelled rows are split chronologically; the trailing
/// `validation_fraction` scores accuracy, the rest trains.
pub fn fit_and_predict_next(
    model: &mut dyn Predictor,
    symbol: &str,
    points: &[PricePoint],
    rsi_period: usize,
    validation_fraction: f64,
) -> Result<Prediction, TraderError> {
    let rows = make_features(points, rsi_period);
    if rows.len() < 2 {
        return Err(TraderError::InsufficientHistory {
            symbol: symbol.to_string(),
            have: rows.len(),
            need: 2,
        });
    }

    let labels = next_day_labels(&rows);
    let features: Vec<Vec<f64>> = rows.iter().map(|r| r.values.clone()).collect();
    let (labelled, latest) = features.split_at(labels.len());

    let positives = labels.iter().filter(|&&y| y).count();
    if positives == 0 || positives == labels.len() {
        warn!(%symbol, "single label class, using 0.5 probability");
        return Ok(Prediction {
            prob_up: 0.5,
            validation_accuracy: 0.0,
            call: call_for(0.5),
        });
    }

    let holdout = (labels.len() as f64 * validation_fraction).ceil() as usize;
    let split = labels.len().saturating_sub(holdout).max(1);
    let (train_x, val_x) = labelled.split_at(split);
    let (train_y, val_y) = labels.split_at(split);

    model.fit(train_x, train_y)?;

    let validation_accuracy = if val_x.is_empty() {
        0.0
    } else {
        let probs = model.predict(val_x)?;
        let correct = probs
            .iter()
            .zip(val_y)
            .filter(|&(&p, &y)| (p >= 0.5) == y)
            .count();
        correct as f64 / val_y.len() as f64
    };

    let prob_up = model
        .predict(latest)?
        .first()
        .copied()
        .ok_or_else(|| TraderError::Model {
            reason: "no prediction for the latest row".to_string(),
        })?;

    debug!(%symbol, prob_up, validation_accuracy, "next-day prediction");
    Ok(Prediction {
        prob_up,
        validation_accuracy,
        call: call_for(prob_up),
    })
}
