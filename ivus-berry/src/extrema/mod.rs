//! 滤波后信号的极值检测.
//!
//! 极大值对应舒张期 (管腔面积最大), 极小值对应收缩期.
//! 检测分为以下几步:
//!
//! 1. 严格局部极值 (平台取第一帧, 端点除外);
//! 2. 滑动窗口内必须是最值;
//! 3. 同类极值之间的最小帧距离;
//! 4. 显著度门限 (两类极值显著度的百分位数乘以比例系数);
//! 5. 合并连续的同类极值, 使结果交替出现.

mod peaks;

use ndarray::ArrayView1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 极值类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExtremumKind {
    /// 极大值.
    Max,

    /// 极小值.
    Min,
}

impl ExtremumKind {
    /// 将数值变换到 "越大越极端" 的方向.
    #[inline]
    pub fn orient(self, v: f64) -> f64 {
        match self {
            Self::Max => v,
            Self::Min => -v,
        }
    }

    /// `a` 是否比 `b` 更极端 (严格).
    #[inline]
    pub fn more_extreme(self, a: f64, b: f64) -> bool {
        self.orient(a) > self.orient(b)
    }
}

/// 一个极值候选.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtremumCandidate {
    /// 帧序号.
    pub frame: usize,

    /// 滤波后信号在该帧的取值.
    pub value: f64,

    /// 极值类型.
    pub kind: ExtremumKind,

    /// 地形显著度 (诊断用).
    pub prominence: f64,

    /// 该帧原本是缺口, 数值来自插值.
    pub interpolated: bool,
}

/// 极值检测参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtremaSpec {
    min_distance: usize,
    percentile: f64,
    prominence_ratio: f64,
}

impl ExtremaSpec {
    /// 构建参数.
    ///
    /// - `min_distance`: 同类极值之间的最小帧距离, 也是滑动窗口的宽度.
    /// - `percentile`: 显著度百分位数, 截断到 `[0, 100]`.
    /// - `prominence_ratio`: 显著度门限相对于百分位数的比例.
    pub fn new(min_distance: usize, percentile: f64, prominence_ratio: f64) -> Self {
        Self {
            min_distance,
            percentile: percentile.clamp(0.0, 100.0),
            prominence_ratio,
        }
    }

    /// 同类极值之间的最小帧距离.
    #[inline]
    pub fn min_distance(&self) -> usize {
        self.min_distance
    }

    /// 显著度百分位数.
    #[inline]
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// 显著度门限比例.
    #[inline]
    pub fn prominence_ratio(&self) -> f64 {
        self.prominence_ratio
    }
}

/// 检测 `values` 中的极值, 结果按帧升序且类型交替.
///
/// `interpolated[i]` 为 `true` 时, 第 `i` 帧上的极值会被标记为插值所得,
/// 但不会被删除. `interpolated` 比 `values` 短时, 缺少的部分视为 `false`.
pub fn detect_extrema(
    values: ArrayView1<f64>,
    interpolated: &[bool],
    spec: &ExtremaSpec,
) -> Vec<ExtremumCandidate> {
    let half = spec.min_distance / 2;
    let mut candidates = Vec::new();
    for kind in [ExtremumKind::Max, ExtremumKind::Min] {
        let v: Vec<f64> = values.iter().map(|&x| kind.orient(x)).collect();
        let found: Vec<usize> = peaks::local_peaks(&v)
            .into_iter()
            .filter(|&i| peaks::dominates_window(&v, i, half))
            .collect();
        let found = peaks::filter_by_distance(&v, &found, spec.min_distance);
        candidates.extend(found.into_iter().map(|i| ExtremumCandidate {
            frame: i,
            value: values[i],
            kind,
            prominence: peaks::prominence(&v, i),
            interpolated: interpolated.get(i).copied().unwrap_or(false),
        }));
    }

    let prominences: Vec<f64> = candidates.iter().map(|c| c.prominence).collect();
    let Some(level) = peaks::percentile(&prominences, spec.percentile) else {
        return vec![];
    };
    let threshold = spec.prominence_ratio * level;
    candidates.retain(|c| c.prominence >= threshold);
    candidates.sort_by_key(|c| c.frame);

    let merged = alternate(candidates);
    log::debug!(
        "detected {} extrema (prominence threshold {:.3})",
        merged.len(),
        threshold
    );
    merged
}

/// 合并连续的同类极值, 保留最极端者 (相等时保留较早者).
fn alternate(sorted: Vec<ExtremumCandidate>) -> Vec<ExtremumCandidate> {
    let mut ans: Vec<ExtremumCandidate> = Vec::with_capacity(sorted.len());
    for c in sorted {
        match ans.last_mut() {
            Some(last) if last.kind == c.kind => {
                if c.kind.more_extreme(c.value, last.value) {
                    *last = c;
                }
            }
            _ => ans.push(c),
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::{detect_extrema, ExtremaSpec, ExtremumCandidate, ExtremumKind};
    use ndarray::{arr1, Array1};
    use std::f64::consts::PI;

    fn frames_of(c: &[ExtremumCandidate], kind: ExtremumKind) -> Vec<usize> {
        c.iter().filter(|c| c.kind == kind).map(|c| c.frame).collect()
    }

    fn assert_invariants(c: &[ExtremumCandidate], min_distance: usize) {
        assert!(c.windows(2).all(|w| w[0].frame < w[1].frame));
        assert!(c.windows(2).all(|w| w[0].kind != w[1].kind));
        for kind in [ExtremumKind::Max, ExtremumKind::Min] {
            let f = frames_of(c, kind);
            assert!(f.windows(2).all(|w| w[1] - w[0] >= min_distance));
        }
    }

    /// 小幅波动被显著度门限去除, 相邻的同类极值被合并.
    #[test]
    fn test_prominence_and_merge() {
        let v = arr1(&[0.0, 10.0, 0.0, 1.0, 0.5, 1.0, 0.0, 10.0, 0.0]);
        let c = detect_extrema(v.view(), &[], &ExtremaSpec::new(2, 50.0, 0.5));
        let got: Vec<(usize, ExtremumKind)> = c.iter().map(|c| (c.frame, c.kind)).collect();
        assert_eq!(
            got,
            vec![
                (1, ExtremumKind::Max),
                (2, ExtremumKind::Min),
                (7, ExtremumKind::Max)
            ]
        );
        assert_eq!(c[0].prominence, 10.0);
    }

    /// 周期为 30 帧的正弦信号.
    #[test]
    fn test_sine() {
        let v = Array1::from_shape_fn(300, |t| (2.0 * PI * t as f64 / 30.0).sin());
        let spec = ExtremaSpec::new(15, 50.0, 0.5);
        let c = detect_extrema(v.view(), &[], &spec);
        assert_invariants(&c, 15);

        let maxima = frames_of(&c, ExtremumKind::Max);
        let minima = frames_of(&c, ExtremumKind::Min);
        assert!((8..=10).contains(&maxima.len()));
        assert!((8..=10).contains(&minima.len()));
        assert!(maxima.windows(2).all(|w| (29..=31).contains(&(w[1] - w[0]))));
        assert!(c.iter().all(|c| !c.interpolated));
    }

    #[test]
    fn test_interpolated_flag() {
        let v = Array1::from_shape_fn(120, |t| (2.0 * PI * t as f64 / 30.0).sin());
        let mut mask = vec![false; 120];
        let spec = ExtremaSpec::new(15, 50.0, 0.5);
        let plain = detect_extrema(v.view(), &mask, &spec);
        let target = plain[1].frame;
        mask[target] = true;

        let flagged = detect_extrema(v.view(), &mask, &spec);
        assert_eq!(flagged.len(), plain.len());
        for c in flagged {
            assert_eq!(c.interpolated, c.frame == target);
        }
    }

    #[test]
    fn test_degenerate() {
        let spec = ExtremaSpec::new(15, 50.0, 0.5);
        assert!(detect_extrema(Array1::<f64>::zeros(0).view(), &[], &spec).is_empty());
        assert!(detect_extrema(Array1::from_elem(40, 3.0).view(), &[], &spec).is_empty());
        let ramp = Array1::from_shape_fn(40, |i| i as f64);
        assert!(detect_extrema(ramp.view(), &[], &spec).is_empty());
    }

    #[test]
    fn test_spec_clamp() {
        let spec = ExtremaSpec::new(15, 150.0, 0.5);
        assert_eq!(spec.percentile(), 100.0);
        assert_eq!(spec.min_distance(), 15);
    }
}
