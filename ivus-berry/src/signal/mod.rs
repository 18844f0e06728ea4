//! 逐帧信号的构建.
//!
//! 门控使用两个相互独立的信号:
//!
//! 1. 轮廓信号 (如管腔面积), 来自手工轮廓或分割模型. 没有轮廓的帧是缺口 (`NaN`).
//! 2. 图像信号 (如相邻帧相关性、模糊度), 直接由像素计算, 因此逐帧完整.
//!
//! 两个信号会被归一化到同一数值范围, 以便后续互相比较.

mod combine;
mod features;

pub use combine::{combine_signals, smooth};
pub use features::{blurring_score, crop_frames, frame_correlation};

use crate::{GatingError, GatingResult};
use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 信号来源.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalSource {
    /// 基于轮廓几何.
    Contour,

    /// 基于像素强度.
    Image,
}

/// 与帧一一对应的实数信号. 缺口以 `NaN` 表示.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signal {
    source: SignalSource,
    values: Array1<f64>,
}

impl Signal {
    /// 由可能缺失的逐帧特征构建. `None` 与非有限值都被视为缺口.
    pub fn from_features(source: SignalSource, features: &[Option<f64>]) -> Self {
        let values = features
            .iter()
            .map(|f| match f {
                Some(v) if v.is_finite() => *v,
                _ => f64::NAN,
            })
            .collect();
        Self { source, values }
    }

    /// 由逐帧特征构建. 非有限值被视为缺口.
    pub fn from_values(source: SignalSource, values: &[f64]) -> Self {
        let values = values
            .iter()
            .map(|&v| if v.is_finite() { v } else { f64::NAN })
            .collect();
        Self { source, values }
    }

    /// 信号来源.
    #[inline]
    pub fn source(&self) -> SignalSource {
        self.source
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 原始数值 (含 `NaN` 缺口).
    #[inline]
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// 第 `frame` 帧是否缺失.
    #[inline]
    pub fn is_gap(&self, frame: usize) -> bool {
        self.values[frame].is_nan()
    }

    /// 所有缺失的帧, 升序.
    pub fn missing_frames(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_nan())
            .map(|(i, _)| i)
            .collect()
    }

    /// 将有效样本线性缩放到 `[0, step]`. 缺口保持为缺口.
    ///
    /// 常数信号 (或没有有效样本的信号) 被缩放为全 0.
    pub fn normalize(&self, step: f64) -> Signal {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        let values = self.values.mapv(|v| {
            if v.is_nan() {
                v
            } else if range > 0.0 {
                (v - min) / range * step
            } else {
                0.0
            }
        });
        Signal {
            source: self.source,
            values,
        }
    }

    /// 线性插值所有缺口, 返回 (填充后的信号, 插值掩码).
    ///
    /// 位于两端的缺口以最近的有效样本填充.
    /// 如果信号中没有任何有效样本, 返回 [`GatingError::InsufficientSamples`].
    pub fn interpolate_gaps(&self) -> GatingResult<(Array1<f64>, Vec<bool>)> {
        let mask: Vec<bool> = self.values.iter().map(|v| v.is_nan()).collect();
        let known: Vec<usize> = (0..self.len()).filter(|&i| !mask[i]).collect();
        let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
            return Err(GatingError::InsufficientSamples(0, 1));
        };

        let mut filled = self.values.clone();
        filled
            .slice_mut(ndarray::s![..first])
            .fill(self.values[first]);
        filled
            .slice_mut(ndarray::s![last + 1..])
            .fill(self.values[last]);

        for w in known.windows(2) {
            let &[a, b] = w else { unreachable!() };
            if b - a < 2 {
                continue;
            }
            let (va, vb) = (self.values[a], self.values[b]);
            let span = (b - a) as f64;
            for i in (a + 1)..b {
                filled[i] = va + (vb - va) * (i - a) as f64 / span;
            }
        }

        Ok((filled, mask))
    }
}

/// 由两组并行的逐帧特征构建归一化后的轮廓信号和图像信号.
///
/// `contour[i]` 为 `None` 表示第 `i` 帧没有轮廓. 图像特征必须逐帧完整.
pub fn build_signals(
    contour: &[Option<f64>],
    image: &[f64],
    normalize_step: f64,
) -> GatingResult<(Signal, Signal)> {
    if contour.len() != image.len() {
        return Err(GatingError::LengthMismatch(contour.len(), image.len()));
    }
    let image = Signal::from_values(SignalSource::Image, image);
    if let Some(&frame) = image.missing_frames().first() {
        return Err(GatingError::IncompleteImageSignal(frame));
    }
    let contour = Signal::from_features(SignalSource::Contour, contour);
    Ok((
        contour.normalize(normalize_step),
        image.normalize(normalize_step),
    ))
}

/// 将帧序号组织成便于阅读的形式, 如 `3-7, 9, 10`.
///
/// 连续超过两帧的区间被压缩为 `首-尾`, 其它帧逐个列出.
pub fn describe_frame_ranges(frames: &[usize]) -> String {
    let mut nums = frames.to_vec();
    nums.sort_unstable();
    nums.dedup();

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < nums.len() {
        let mut j = i;
        while j + 1 < nums.len() && nums[j + 1] == nums[j] + 1 {
            j += 1;
        }
        if j - i + 1 > 2 {
            parts.push(format!("{}-{}", nums[i], nums[j]));
        } else {
            parts.extend(nums[i..=j].iter().map(usize::to_string));
        }
        i = j + 1;
    }
    parts.join(", ")
}
