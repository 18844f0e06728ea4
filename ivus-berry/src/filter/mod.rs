//! 零相位 Butterworth 带通滤波.
//!
//! 心动周期对应的频带通常位于 0.75 ~ 3 Hz. 滤波会去除回撤过程中的慢漂移
//! 和高频噪声. 由于后续步骤关心的是极值的 **位置**, 滤波必须是零相位的
//! (前向 + 反向各一次).

mod butterworth;
mod zero_phase;

pub use butterworth::{ButterworthBandpass, Section};

use crate::signal::{Signal, SignalSource};
use crate::{GatingError, GatingResult};
use ndarray::Array1;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 带通滤波器参数.
///
/// 该对象是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterSpec {
    lowcut: f64,
    highcut: f64,
    order: u32,
    frame_rate: f64,
}

/// 构建 [`FilterSpec`] 错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterSpecError {
    /// 帧率不是有限正数.
    InvalidFrameRate,

    /// 阶数为 0.
    ZeroOrder,

    /// 下截止频率不是有限正数.
    NonPositiveLowcut,

    /// `lowcut >= highcut`.
    EmptyBand,

    /// 上截止频率达到或超过 Nyquist 频率.
    AboveNyquist,
}

impl fmt::Display for FilterSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidFrameRate => "frame rate must be a positive finite number",
            Self::ZeroOrder => "order must be at least 1",
            Self::NonPositiveLowcut => "lowcut must be a positive finite number",
            Self::EmptyBand => "lowcut must be lower than highcut",
            Self::AboveNyquist => "highcut must be lower than the nyquist frequency",
        };
        f.write_str(s)
    }
}

impl std::error::Error for FilterSpecError {}

impl FilterSpec {
    /// 构建滤波参数.
    ///
    /// 要求 `0 < lowcut < highcut < frame_rate / 2` 且 `order >= 1`,
    /// 否则返回对应错误.
    pub fn new(
        lowcut: f64,
        highcut: f64,
        order: u32,
        frame_rate: f64,
    ) -> Result<Self, FilterSpecError> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(FilterSpecError::InvalidFrameRate);
        }
        if order == 0 {
            return Err(FilterSpecError::ZeroOrder);
        }
        if !(lowcut.is_finite() && lowcut > 0.0) {
            return Err(FilterSpecError::NonPositiveLowcut);
        }
        if highcut.is_nan() || lowcut >= highcut {
            return Err(FilterSpecError::EmptyBand);
        }
        if highcut >= frame_rate / 2.0 {
            return Err(FilterSpecError::AboveNyquist);
        }
        Ok(Self {
            lowcut,
            highcut,
            order,
            frame_rate,
        })
    }

    /// 下截止频率 (Hz).
    #[inline]
    pub fn lowcut(&self) -> f64 {
        self.lowcut
    }

    /// 上截止频率 (Hz).
    #[inline]
    pub fn highcut(&self) -> f64 {
        self.highcut
    }

    /// 模拟原型阶数. 带通滤波器的实际阶数为其两倍.
    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// 帧率 (帧每秒).
    #[inline]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Nyquist 频率.
    #[inline]
    pub fn nyquist(&self) -> f64 {
        self.frame_rate / 2.0
    }

    /// 零相位滤波两端各需延拓的样本数.
    #[inline]
    pub fn padlen(&self) -> usize {
        3 * (2 * self.order as usize + 1)
    }

    /// 滤波所需的最少帧数.
    #[inline]
    pub fn min_samples(&self) -> usize {
        self.padlen() + 1
    }
}

/// 经过带通滤波的信号.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilteredSignal {
    source: SignalSource,
    values: Array1<f64>,
    interpolated: Vec<bool>,
}

impl FilteredSignal {
    /// 信号来源.
    #[inline]
    pub fn source(&self) -> SignalSource {
        self.source
    }

    /// 滤波结果.
    #[inline]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// 第 `frame` 帧是否由缺口插值得到.
    #[inline]
    pub fn is_interpolated(&self, frame: usize) -> bool {
        self.interpolated[frame]
    }

    /// 插值掩码, 与帧一一对应.
    #[inline]
    pub fn interpolated_mask(&self) -> &[bool] {
        &self.interpolated
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

    /// 以新的数值替换滤波结果 (例如平滑后), 保留插值掩码.
    pub(crate) fn with_values(self, values: Array1<f64>) -> Self {
        debug_assert_eq!(values.len(), self.interpolated.len());
        Self { values, ..self }
    }
}

/// 对 `signal` 实施零相位带通滤波.
///
/// 缺口帧先做线性插值, 插值位置会在结果中被标记.
/// 当帧数不足 [`FilterSpec::min_samples`] 时返回 [`GatingError::InsufficientSamples`].
pub fn bandpass(signal: &Signal, spec: &FilterSpec) -> GatingResult<FilteredSignal> {
    let (filled, interpolated) = signal.interpolate_gaps()?;
    let filter = ButterworthBandpass::design(spec);
    let values = filter.filtfilt(filled.view())?;
    Ok(FilteredSignal {
        source: signal.source(),
        values: Array1::from_vec(values),
        interpolated,
    })
}

/// 检查帧数是否足够滤波.
#[inline]
pub(crate) fn check_len(len: usize, spec: &FilterSpec) -> GatingResult<()> {
    if len < spec.min_samples() {
        Err(GatingError::InsufficientSamples(
            len as u32,
            spec.min_samples() as u32,
        ))
    } else {
        Ok(())
    }
}
