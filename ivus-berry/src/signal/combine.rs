//! 信号平滑与多特征信号融合.

use crate::extrema::{detect_extrema, ExtremaSpec, ExtremumKind};
use crate::{GatingError, GatingResult};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1};

/// 滑动平均, 输出与输入等长 (窗口越过两端的部分按 0 计算).
///
/// `window <= 1` 时原样返回.
pub fn smooth(values: ArrayView1<f64>, window: usize) -> Array1<f64> {
    let n = values.len();
    if window <= 1 || n == 0 {
        return values.to_owned();
    }

    // prefix[i] = sum(values[..i])
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values.iter() {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    // 偶数窗口时中心偏左, 与常见的 `same` 卷积一致.
    let start = (window - 1) / 2;
    let w = window as f64;
    Array1::from_shape_fn(n, |i| {
        let hi = (i + start + 1).min(n);
        let lo = (i + start + 1).saturating_sub(window);
        (prefix[hi] - prefix[lo]) / w
    })
}

/// 按极值间隔的稳定程度为多个信号加权求和.
///
/// 心率通常是规律的, 因此极值间隔越不稳定的信号越不可靠. 每个信号先以
/// `window` 平滑并检测极值 (`maxima_only` 时只看极大值), 然后以极值间隔标准差
/// 的倒数作为权重 (已按总和归一化).
///
/// 无法计算间隔标准差 (极值少于 3 个) 或标准差为 0 的信号,
/// 取其它信号中的最大权重; 如果所有信号都如此, 则等权相加.
pub fn combine_signals(
    signals: &[ArrayView1<f64>],
    window: usize,
    spec: &ExtremaSpec,
    maxima_only: bool,
) -> GatingResult<Array1<f64>> {
    let Some(first) = signals.first() else {
        return Ok(Array1::zeros(0));
    };
    let n = first.len();
    if let Some(bad) = signals.iter().find(|s| s.len() != n) {
        return Err(GatingError::LengthMismatch(n, bad.len()));
    }

    let variability: Vec<Option<f64>> = signals
        .iter()
        .map(|s| spacing_std(smooth(s.view(), window).view(), spec, maxima_only))
        .collect();
    let weights = weights_from(&variability);
    log::debug!("combine {} signals, weights {:?}", signals.len(), weights);

    let mut combined = Array1::<f64>::zeros(n);
    for (s, w) in signals.iter().zip(weights) {
        combined.scaled_add(w, s);
    }
    Ok(combined)
}

/// 极值帧间隔的 (总体) 标准差. 间隔少于两个时返回 `None`.
fn spacing_std(values: ArrayView1<f64>, spec: &ExtremaSpec, maxima_only: bool) -> Option<f64> {
    let mask = vec![false; values.len()];
    let diffs: Vec<f64> = detect_extrema(values, &mask, spec)
        .iter()
        .filter(|c| !maxima_only || c.kind == ExtremumKind::Max)
        .map(|c| c.frame)
        .tuple_windows()
        .map(|(a, b)| (b - a) as f64)
        .collect();
    if diffs.len() < 2 {
        return None;
    }
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64;
    Some(var.sqrt())
}

fn weights_from(variability: &[Option<f64>]) -> Vec<f64> {
    let defined: Vec<f64> = variability
        .iter()
        .flatten()
        .copied()
        .filter(|&v| v > 0.0)
        .collect();
    if defined.is_empty() {
        return vec![1.0; variability.len()];
    }

    // (var / sum) ^ -1
    let total: f64 = defined.iter().sum();
    let max_weight = defined
        .iter()
        .map(|v| total / v)
        .fold(f64::NEG_INFINITY, f64::max);
    variability
        .iter()
        .map(|v| match v {
            Some(v) if *v > 0.0 => total / v,
            _ => max_weight,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{combine_signals, smooth, weights_from};
    use crate::extrema::ExtremaSpec;
    use crate::GatingError;
    use ndarray::{arr1, Array1};
    use std::f64::consts::PI;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_smooth() {
        let x = arr1(&[3.0, 6.0, 9.0, 12.0]);
        let y = smooth(x.view(), 3);
        let expected = [3.0, 6.0, 9.0, 7.0];
        assert!(y.iter().zip(expected).all(|(a, b)| f64_eq(*a, b)));

        // 偶数窗口
        let y = smooth(x.view(), 2);
        let expected = [1.5, 4.5, 7.5, 10.5];
        assert!(y.iter().zip(expected).all(|(a, b)| f64_eq(*a, b)));

        assert_eq!(smooth(x.view(), 1), x);
    }

    #[test]
    fn test_weights() {
        let w = weights_from(&[Some(1.0), Some(3.0)]);
        assert!(f64_eq(w[0], 4.0));
        assert!(f64_eq(w[1], 4.0 / 3.0));

        let w = weights_from(&[Some(2.0), None, Some(0.0)]);
        assert_eq!(w, vec![1.0, 1.0, 1.0]);

        assert_eq!(weights_from(&[None, None]), vec![1.0, 1.0]);
    }

    /// 规律信号的权重应高于间隔不规律的信号.
    #[test]
    fn test_combine_prefers_regular() {
        let n = 300;
        let regular = Array1::from_shape_fn(n, |t| (2.0 * PI * t as f64 / 29.5).sin());
        // 周期逐渐拉长的 chirp
        let chirp = Array1::from_shape_fn(n, |t| {
            let t = t as f64;
            (2.0 * PI * t / (20.0 + t / 10.0)).sin()
        });
        let spec = ExtremaSpec::new(10, 0.0, 0.5);
        let combined =
            combine_signals(&[regular.view(), chirp.view()], 1, &spec, true).unwrap();
        let corr_regular: f64 = combined.iter().zip(regular.iter()).map(|(a, b)| a * b).sum();
        let corr_chirp: f64 = combined.iter().zip(chirp.iter()).map(|(a, b)| a * b).sum();
        assert!(corr_regular > corr_chirp);

        let short = Array1::zeros(10);
        assert_eq!(
            combine_signals(&[regular.view(), short.view()], 1, &spec, false).unwrap_err(),
            GatingError::LengthMismatch(300, 10)
        );
    }
}
