//! Exponential Moving Average, used by the MACD features.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = X[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) inputs are undefined.

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in values.iter().enumerate() {
        if i < period - 1 {
            sum += x;
            out.push(None);
        } else if i == period - 1 {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = x * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }

    out
}

/// EMA over a series that is itself undefined for a leading warm-up window.
///
/// Undefined inputs are skipped until the first defined value; the result keeps
/// the input alignment.
pub fn calculate_ema_partial(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let first = match values.iter().position(|v| v.is_some()) {
        Some(i) => i,
        None => return vec![None; values.len()],
    };

    let tail: Vec<f64> = values[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
    let mut out = vec![None; first];
    out.extend(calculate_ema(&tail, period));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let values = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert!(values[2..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(values, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_recursive_calculation() {
        let values = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((values[2].unwrap() - sma).abs() < f64::EPSILON);

        let ema_3 = 40.0 * k + sma * (1.0 - k);
        assert!((values[3].unwrap() - ema_3).abs() < f64::EPSILON);

        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        assert!((values[4].unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_0() {
        assert_eq!(calculate_ema(&[10.0, 20.0], 0), vec![None, None]);
    }

    #[test]
    fn partial_keeps_alignment() {
        let input = vec![None, None, Some(1.0), Some(2.0), Some(3.0)];
        let out = calculate_ema_partial(&input, 2);
        assert_eq!(out.len(), 5);
        assert!(out[..3].iter().all(|v| v.is_none()));
        assert_eq!(out[3], Some(1.5));
    }

    #[test]
    fn partial_all_undefined() {
        assert_eq!(calculate_ema_partial(&[None, None], 3), vec![None, None]);
    }
}
