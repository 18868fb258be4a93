//! Shared smoothing helpers for indicator calculations.
//!
//! All helpers work on `Option<f64>` sequences aligned with the bar series.
//! A smoother seeds on the first `period` consecutive defined inputs; before
//! that its output is `None`. Once seeded, an undefined input yields an
//! undefined output and leaves the running state untouched.

/// Rolling simple mean. Defined only when every value in the window is defined.
pub fn sma_over(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out[i] = sum.map(|s| s / period as f64);
    }
    out
}

/// Exponential moving average with k = 2/(n+1), seeded with the simple mean.
pub fn ema_over(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (period as f64 + 1.0);
    smooth_over(values, period, |prev, x| prev + k * (x - prev))
}

/// Wilder's running mean: avg = (prev * (n-1) + x) / n, seeded with the simple mean.
pub fn wilder_over(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = period as f64;
    smooth_over(values, period, |prev, x| (prev * (n - 1.0) + x) / n)
}

fn smooth_over<F>(values: &[Option<f64>], period: usize, step: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else {
            if state.is_none() {
                seed_sum = 0.0;
                seed_count = 0;
            }
            continue;
        };

        match state {
            Some(prev) => {
                let next = step(prev, x);
                state = Some(next);
                out[i] = Some(next);
            }
            None => {
                seed_sum += x;
                seed_count += 1;
                if seed_count == period {
                    let seed = seed_sum / period as f64;
                    state = Some(seed);
                    out[i] = Some(seed);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn sma_warmup_and_values() {
        let out = sma_over(&defined(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn sma_window_with_gap_is_undefined() {
        let out = sma_over(&[Some(1.0), None, Some(3.0), Some(5.0)], 2);
        assert_eq!(out, vec![None, None, None, Some(4.0)]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let out = ema_over(&defined(&[10.0, 20.0, 30.0]), 3);
        assert_eq!(out[..2], [None::<f64>, None]);
        assert!((out[2].unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_step() {
        let out = ema_over(&defined(&[10.0, 20.0, 30.0, 40.0]), 3);
        let k = 2.0 / 4.0;
        let expected = 40.0 * k + 20.0 * (1.0 - k);
        assert!((out[3].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn wilder_seed_then_smoothing() {
        let out = wilder_over(&defined(&[10.0, 10.0, 10.0, 16.0]), 3);
        assert_eq!(out[2], Some(10.0));
        assert!((out[3].unwrap() - (10.0 * 2.0 + 16.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn leading_undefined_delays_seed() {
        let out = ema_over(&[None, None, Some(4.0), Some(6.0)], 2);
        assert_eq!(out[..3], [None::<f64>, None, None]);
        assert_eq!(out[3], Some(5.0));
    }

    #[test]
    fn gap_after_seed_keeps_state() {
        let out = wilder_over(&[Some(2.0), Some(4.0), None, Some(6.0)], 2);
        assert_eq!(out[1], Some(3.0));
        assert_eq!(out[2], None);
        assert_eq!(out[3], Some((3.0 + 6.0) / 2.0));
    }

    #[test]
    fn zero_period_is_all_undefined() {
        assert!(ema_over(&defined(&[1.0, 2.0]), 0).iter().all(Option::is_none));
        assert!(sma_over(&defined(&[1.0, 2.0]), 0).iter().all(Option::is_none));
    }
}
