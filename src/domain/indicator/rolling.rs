//! Trailing-window primitives shared by the indicators.
//!
//! All windows end at the current index. Outputs are `None` until `window`
//! observations are available or whenever an input in the window is `None`.
//! A zero window yields an all-`None` column; callers validate windows first.

/// Arithmetic mean over a trailing window.
pub fn rolling_mean(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(data, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (n - 1 denominator) over a trailing window.
/// A window of one has no sample deviation and stays undefined.
pub fn rolling_sample_std(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; data.len()];
    }
    rolling_apply(data, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let ss: f64 = w.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    })
}

pub fn rolling_min(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(data, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(data, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Exponential moving average with alpha = 2 / (span + 1), seeded with the
/// first observation. Defined from index 0.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut prev: Option<f64> = None;
    for &x in data {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

pub fn lift(data: &[f64]) -> Vec<Option<f64>> {
    data.iter().copied().map(Some).collect()
}

fn rolling_apply<F>(data: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; data.len()];
    if window == 0 || window > data.len() {
        return out;
    }
    let mut buf: Vec<f64> = Vec::with_capacity(window);
    for i in (window.saturating_sub(1))..data.len() {
        buf.clear();
        let start = i + 1 - window;
        for v in &data[start..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }
        if buf.len() == window {
            out[i] = Some(f(&buf));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_warmup_is_undefined() {
        let out = rolling_mean(&lift(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn mean_propagates_undefined_inputs() {
        let data = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let out = rolling_mean(&data, 2);
        assert_eq!(out, vec![None, None, None, Some(4.0), Some(6.0)]);
    }

    #[test]
    fn zero_window_is_all_undefined() {
        assert_eq!(rolling_mean(&lift(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn window_longer_than_data_is_all_undefined() {
        let data = lift(&[1.0, 2.0, 3.0]);
        assert_eq!(rolling_mean(&data, 4), vec![None, None, None]);
        assert_eq!(rolling_max(&data, usize::MAX), vec![None, None, None]);
        assert_eq!(rolling_sample_std(&data, usize::MAX), vec![None, None, None]);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let out = rolling_sample_std(&lift(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 8);
        // population stddev is 2.0; sample is sqrt(32 / 7)
        assert_relative_eq!(out[7].unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sample_std_window_one_undefined() {
        assert_eq!(rolling_sample_std(&lift(&[1.0, 2.0]), 1), vec![None, None]);
    }

    #[test]
    fn min_max() {
        let data = lift(&[5.0, 3.0, 8.0, 2.0, 7.0]);
        assert_eq!(
            rolling_min(&data, 3),
            vec![None, None, Some(3.0), Some(2.0), Some(2.0)]
        );
        assert_eq!(
            rolling_max(&data, 3),
            vec![None, None, Some(8.0), Some(8.0), Some(8.0)]
        );
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let out = ema(&[10.0, 20.0, 30.0], 3);
        // alpha = 0.5
        assert_eq!(out[0], 10.0);
        assert_relative_eq!(out[1], 15.0);
        assert_relative_eq!(out[2], 22.5);
    }

    #[test]
    fn ema_span_one_tracks_input() {
        assert_eq!(ema(&[3.0, 7.0, 1.0], 1), vec![3.0, 7.0, 1.0]);
    }
}
