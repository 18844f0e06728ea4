//! 门控参数.

use crate::consts::defaults;
use crate::extrema::ExtremaSpec;
use crate::filter::FilterSpec;
use crate::gating::ConsensusSpec;
use crate::{GatingError, GatingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一次门控计算的全部参数. 每次调用显式传入, 不存在全局状态.
///
/// 各字段的默认值见 [`defaults`](crate::consts::defaults).
/// 反序列化时缺失的字段取默认值.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GatingConfig {
    /// 帧率 (帧每秒).
    pub frame_rate: f64,

    /// 信号归一化的上限.
    pub normalize_step: f64,

    /// 带通下截止频率 (Hz).
    pub lowcut: f64,

    /// 带通上截止频率 (Hz).
    pub highcut: f64,

    /// Butterworth 模拟原型阶数.
    pub order: u32,

    /// 极值显著度百分位数 (0 ~ 100).
    pub extrema_y_lim: f64,

    /// 同类极值之间的最小帧距离.
    pub extrema_x_lim: usize,

    /// 显著度门限相对于百分位数的比例.
    pub prominence_ratio: f64,

    /// 两个信号的同类极值配对时允许的最大帧距离.
    pub auto_gating_threshold: usize,

    /// 未配对极值回退判定时的批大小.
    pub auto_gating_batch_size: usize,

    /// 只检测舒张期 (极大值).
    pub maxima_only: bool,

    /// 极值检测前的滑动平均窗口. 1 代表不平滑.
    pub smooth_window: usize,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            frame_rate: defaults::FRAME_RATE,
            normalize_step: defaults::NORMALIZE_STEP,
            lowcut: defaults::LOWCUT,
            highcut: defaults::HIGHCUT,
            order: defaults::ORDER,
            extrema_y_lim: defaults::EXTREMA_Y_LIM,
            extrema_x_lim: defaults::EXTREMA_X_LIM,
            prominence_ratio: defaults::PROMINENCE_RATIO,
            auto_gating_threshold: defaults::AUTO_GATING_THRESHOLD,
            auto_gating_batch_size: defaults::AUTO_GATING_BATCH_SIZE,
            maxima_only: false,
            smooth_window: defaults::SMOOTH_WINDOW,
        }
    }
}

impl GatingConfig {
    /// 检查全部参数. 第一个非法参数决定返回的错误.
    pub fn validate(&self) -> GatingResult<()> {
        self.filter_spec()?;
        if !(self.normalize_step.is_finite() && self.normalize_step > 0.0) {
            return Err(GatingError::InvalidConfig("normalize_step"));
        }
        if !(0.0..=100.0).contains(&self.extrema_y_lim) {
            return Err(GatingError::InvalidConfig("extrema_y_lim"));
        }
        if self.extrema_x_lim == 0 {
            return Err(GatingError::InvalidConfig("extrema_x_lim"));
        }
        if !(self.prominence_ratio.is_finite() && self.prominence_ratio >= 0.0) {
            return Err(GatingError::InvalidConfig("prominence_ratio"));
        }
        if self.auto_gating_batch_size == 0 {
            return Err(GatingError::InvalidConfig("auto_gating_batch_size"));
        }
        if self.smooth_window == 0 {
            return Err(GatingError::InvalidConfig("smooth_window"));
        }
        Ok(())
    }

    /// 带通滤波参数.
    pub fn filter_spec(&self) -> GatingResult<FilterSpec> {
        Ok(FilterSpec::new(
            self.lowcut,
            self.highcut,
            self.order,
            self.frame_rate,
        )?)
    }

    /// 极值检测参数.
    #[inline]
    pub fn extrema_spec(&self) -> ExtremaSpec {
        ExtremaSpec::new(
            self.extrema_x_lim,
            self.extrema_y_lim,
            self.prominence_ratio,
        )
    }

    /// 双信号一致性判定参数.
    #[inline]
    pub fn consensus_spec(&self) -> ConsensusSpec {
        ConsensusSpec::new(
            self.auto_gating_threshold,
            self.auto_gating_batch_size,
            self.extrema_x_lim,
            self.maxima_only,
        )
    }
}
