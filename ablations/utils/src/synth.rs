//! 合成回撤序列. 真值已知, 便于统计检测命中率.

use std::env;
use std::f64::consts::PI;

/// 默认合成帧数.
pub const DEFAULT_FRAMES: usize = 900;

/// 一段合成的回撤序列.
#[derive(Clone, Debug)]
pub struct Pullback {
    /// 轮廓特征, 周期性地缺失几帧.
    pub contour: Vec<Option<f64>>,

    /// 图像特征, 叠加了干扰.
    pub image: Vec<f64>,

    /// 真实的舒张期帧.
    pub diastole: Vec<usize>,

    /// 真实的收缩期帧.
    pub systole: Vec<usize>,
}

impl Pullback {
    /// 合成 `frames` 帧, 心动周期为 `period` 帧.
    ///
    /// 图像特征叠加两个非整数周期的高频分量和一个慢漂移, 幅度正比于 `noise`.
    /// 轮廓特征每 `gap_every` 帧缺失连续 3 帧 (`gap_every == 0` 时不缺失).
    pub fn synthesize(frames: usize, period: f64, noise: f64, gap_every: usize) -> Self {
        let heart = |t: f64| (2.0 * PI * t / period).sin();
        let interference = |t: f64| {
            0.6 * (2.0 * PI * t / 7.3 + 0.4).sin()
                + 0.4 * (2.0 * PI * t / 4.1 + 1.3).sin()
                + 0.5 * (2.0 * PI * t / 113.0).sin()
        };

        let contour = (0..frames)
            .map(|i| {
                let in_gap = gap_every > 0 && i % gap_every >= gap_every.saturating_sub(3);
                (!in_gap).then(|| heart(i as f64))
            })
            .collect();
        let image = (0..frames)
            .map(|i| {
                let t = i as f64;
                heart(t) + noise * interference(t)
            })
            .collect();

        let at = |offset: f64| -> Vec<usize> {
            (0..)
                .map(|k| (offset + k as f64 * period).round() as usize)
                .take_while(|&f| f < frames)
                .collect()
        };
        Self {
            contour,
            image,
            diastole: at(period / 4.0),
            systole: at(period * 3.0 / 4.0),
        }
    }
}

/// 合成帧数.
///
/// 1. 若环境变量 `$IVUS_ABLATION_FRAMES` 是合法的正整数, 则返回其值;
/// 2. 否则, 返回 [`DEFAULT_FRAMES`].
pub fn frames_from_env_or_default() -> usize {
    env::var("IVUS_ABLATION_FRAMES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_FRAMES)
}

/// `detected` 中距离某个真值帧不超过 `tolerance` 的帧数.
pub fn hits(detected: &[usize], truth: &[usize], tolerance: usize) -> usize {
    detected
        .iter()
        .filter(|&&d| truth.iter().any(|&t| t.abs_diff(d) <= tolerance))
        .count()
}
