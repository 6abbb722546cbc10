//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first `n` changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain == 0 as well (no movement at all),
//! in which case RSI = 50.
//!
//! Warmup: the first `n` observations are undefined (need `n` price changes).

/// Carry state for incremental RSI computation.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiState {
    period: usize,
    prev_close: Option<f64>,
    seed_gains: Vec<f64>,
    seed_losses: Vec<f64>,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        RsiState {
            period,
            prev_close: None,
            seed_gains: Vec::with_capacity(period),
            seed_losses: Vec::with_capacity(period),
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
        }
    }

    /// Feed the next close; returns the RSI for this observation if defined.
    pub fn push(&mut self, close: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }

        let prev = self.prev_close.replace(close)?;
        let (gain, loss) = split_change(close - prev);

        if self.seeded {
            self.avg_gain = wilder_step(self.avg_gain, gain, self.period);
            self.avg_loss = wilder_step(self.avg_loss, loss, self.period);
            return Some(rsi_from_averages(self.avg_gain, self.avg_loss));
        }

        self.seed_gains.push(gain);
        self.seed_losses.push(loss);
        if self.seed_gains.len() < self.period {
            return None;
        }

        self.avg_gain = self.seed_gains.iter().sum::<f64>() / self.period as f64;
        self.avg_loss = self.seed_losses.iter().sum::<f64>() / self.period as f64;
        self.seed_gains.clear();
        self.seed_losses.clear();
        self.seeded = true;
        Some(rsi_from_averages(self.avg_gain, self.avg_loss))
    }
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else if change < 0.0 {
        (0.0, -change)
    } else {
        (0.0, 0.0)
    }
}

fn wilder_step(prev_avg: f64, current: f64, period: usize) -> f64 {
    (prev_avg * (period - 1) as f64 + current) / period as f64
}

pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Batch RSI over a close series. Output is aligned 1:1 with `closes`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        let (g, l) = split_change(w[1] - w[0]);
        gains.push(g);
        losses.push(l);
    }

    let mut values = Vec::with_capacity(closes.len());
    values.push(None);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for change_idx in 0..gains.len() {
        if change_idx + 1 < period {
            values.push(None);
        } else if change_idx + 1 == period {
            avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
            avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
            values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        } else {
            avg_gain = wilder_step(avg_gain, gains[change_idx], period);
            avg_loss = wilder_step(avg_loss, losses[change_idx], period);
            values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
    }

    values
}
