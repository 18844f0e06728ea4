//! 运行时错误.

use crate::filter::FilterSpecError;
use std::fmt;

/// 门控计算的运行时错误.
///
/// 门控结果 "不够可信" 不属于错误, 见 [`GatingReport::ambiguous`](crate::gating::GatingReport).
#[derive(Debug, Clone, PartialEq)]
pub enum GatingError {
    /// 带通滤波器参数非法. 在任何计算开始之前报告.
    InvalidFilterSpec(FilterSpecError),

    /// 其它门控参数非法. 参数为出错的字段名.
    InvalidConfig(&'static str),

    /// 可用样本不足以做实际滤波工作.
    ///
    /// 第一个参数代表目前可用 (非缺口) 的样本数, 第二个参数代表需要的最少样本数.
    /// 轮廓信号全部缺失时为 `(0, 1)`, 与总帧数无关.
    InsufficientSamples(u32, u32),

    /// 轮廓信号与图像信号长度不一致. `(contour, image)`.
    LengthMismatch(usize, usize),

    /// 图像信号必须逐帧完整. 参数为第一个缺失的帧.
    IncompleteImageSignal(usize),
}

impl fmt::Display for GatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilterSpec(e) => write!(f, "invalid filter spec: {e}"),
            Self::InvalidConfig(field) => write!(f, "invalid gating config field `{field}`"),
            Self::InsufficientSamples(have, need) => {
                write!(f, "insufficient samples: {have} usable, at least {need} required")
            }
            Self::LengthMismatch(c, i) => {
                write!(f, "contour signal has {c} frames but image signal has {i}")
            }
            Self::IncompleteImageSignal(frame) => {
                write!(f, "image signal is missing frame {frame}")
            }
        }
    }
}

impl std::error::Error for GatingError {}

impl From<FilterSpecError> for GatingError {
    #[inline]
    fn from(e: FilterSpecError) -> Self {
        Self::InvalidFilterSpec(e)
    }
}
