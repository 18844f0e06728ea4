//! 完整的自动门控流程.

use super::{consensus, GatingReport, ManualOverrides};
use crate::config::GatingConfig;
use crate::extrema::{detect_extrema, ExtremaSpec, ExtremumCandidate};
use crate::filter::{bandpass, check_len, FilterSpec};
use crate::signal::{build_signals, describe_frame_ranges, smooth, Signal};
use crate::{GatingError, GatingResult};

/// 门控输入: 两组逐帧特征.
#[derive(Copy, Clone, Debug)]
pub struct GatingInput<'a> {
    /// 轮廓特征, `None` 表示该帧没有轮廓.
    pub contour: &'a [Option<f64>],

    /// 图像特征, 必须逐帧完整.
    pub image: &'a [f64],
}

impl<'a> GatingInput<'a> {
    /// 构建输入.
    #[inline]
    pub fn new(contour: &'a [Option<f64>], image: &'a [f64]) -> Self {
        Self { contour, image }
    }

    /// 帧数 (以图像特征为准).
    #[inline]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

/// 对两个信号做完整的自动门控.
///
/// 参数非法时, 在任何计算开始之前返回 [`GatingError::InvalidFilterSpec`]
/// 或 [`GatingError::InvalidConfig`]. 帧数不足以滤波时返回
/// [`GatingError::InsufficientSamples`]; 如果希望此时保留手工标记,
/// 使用 [`run_gating_or_manual`].
pub fn run_gating(
    input: &GatingInput,
    config: &GatingConfig,
    manual: &ManualOverrides,
) -> GatingResult<GatingReport> {
    config.validate()?;
    let filter = config.filter_spec()?;

    let (contour, image) = build_signals(input.contour, input.image, config.normalize_step)?;
    check_len(image.len(), &filter)?;

    let missing = contour.missing_frames();
    if !missing.is_empty() {
        log::info!(
            "no contour on frames {}, interpolated before filtering",
            describe_frame_ranges(&missing)
        );
    }

    let extrema_spec = config.extrema_spec();
    let contour_extrema = extrema_of(&contour, &filter, &extrema_spec, config.smooth_window)?;
    let image_extrema = extrema_of(&image, &filter, &extrema_spec, config.smooth_window)?;
    log::debug!(
        "{} contour extrema, {} image extrema",
        contour_extrema.len(),
        image_extrema.len()
    );

    let report = consensus(
        image.len(),
        &contour_extrema,
        &image_extrema,
        &config.consensus_spec(),
        manual,
    );
    log::info!(
        "automatic gating: {} diastolic, {} systolic frames",
        report.diastolic_count,
        report.systolic_count
    );
    Ok(report)
}

/// 与 [`run_gating`] 相同, 但帧数不足 (或轮廓全部缺失) 时
/// 返回只包含手工标记的报告, 而不是错误.
pub fn run_gating_or_manual(
    input: &GatingInput,
    config: &GatingConfig,
    manual: &ManualOverrides,
) -> GatingResult<GatingReport> {
    match run_gating(input, config, manual) {
        Err(GatingError::InsufficientSamples(have, need)) => {
            log::warn!(
                "automatic gating skipped ({have} usable frames, {need} required), keeping manual gating"
            );
            Ok(GatingReport::manual_only(
                input.len(),
                manual,
                config.maxima_only,
            ))
        }
        other => other,
    }
}

fn extrema_of(
    signal: &Signal,
    filter: &FilterSpec,
    spec: &ExtremaSpec,
    smooth_window: usize,
) -> GatingResult<Vec<ExtremumCandidate>> {
    let mut filtered = bandpass(signal, filter)?;
    if smooth_window > 1 {
        let values = smooth(filtered.values().view(), smooth_window);
        filtered = filtered.with_values(values);
    }
    Ok(detect_extrema(
        filtered.values().view(),
        filtered.interpolated_mask(),
        spec,
    ))
}
