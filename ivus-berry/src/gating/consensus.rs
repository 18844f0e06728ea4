//! 轮廓信号与图像信号的极值一致性判定.
//!
//! 只有两个独立信号都认可的极值才会被接受为自动门控结果.

use super::{GatingAssignment, GatingReport, ManualOverrides, Phase};
use crate::extrema::{ExtremumCandidate, ExtremumKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一致性判定参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsensusSpec {
    threshold: usize,
    batch_size: usize,
    min_distance: usize,
    maxima_only: bool,
}

impl ConsensusSpec {
    /// 构建参数.
    ///
    /// - `threshold`: 同类极值直接配对允许的最大帧距离.
    /// - `batch_size`: 回退判定的批大小, 为 0 时按 1 处理.
    /// - `min_distance`: 同一时相相邻两帧的最小距离.
    /// - `maxima_only`: 只考虑极大值 (舒张期).
    pub fn new(threshold: usize, batch_size: usize, min_distance: usize, maxima_only: bool) -> Self {
        Self {
            threshold,
            batch_size: batch_size.max(1),
            min_distance,
            maxima_only,
        }
    }

    /// 直接配对的最大帧距离.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 回退判定的批大小.
    ///
    /// 批是从第 0 帧开始对齐的固定区间 `[k * B, (k + 1) * B)`, 不随极值滑动.
    /// 因此跨越批边界的两个相近极值不会被回退判定接受.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 同一时相相邻两帧的最小距离.
    #[inline]
    pub fn min_distance(&self) -> usize {
        self.min_distance
    }

    /// 是否只考虑极大值.
    #[inline]
    pub fn maxima_only(&self) -> bool {
        self.maxima_only
    }

    #[inline]
    fn batch_of(&self, frame: usize) -> usize {
        frame / self.batch_size
    }
}

/// 综合两个信号的极值, 得到长度为 `len` 的门控结果.
///
/// 1. 手工标记帧上的轮廓极值被跳过;
/// 2. 对每个轮廓极值, 寻找 `threshold` 帧以内最近的、尚未被使用的同类图像极值
///    (距离相等时取较早者), 配对成功后采用轮廓极值的帧;
/// 3. 未能直接配对的轮廓极值, 如果同一批 (`[k * B, (k + 1) * B)`) 中
///    存在尚未被使用的同类图像极值, 也被接受, 否则丢弃;
/// 4. 位于插值帧上的轮廓极值不参与回退判定, 直接配对时采用图像极值的帧;
/// 5. 与同时相的手工标记或前一个自动结果距离小于 `min_distance` 的帧被丢弃.
pub fn consensus(
    len: usize,
    contour: &[ExtremumCandidate],
    image: &[ExtremumCandidate],
    spec: &ConsensusSpec,
    manual: &ManualOverrides,
) -> GatingReport {
    let wanted = |c: &&ExtremumCandidate| !spec.maxima_only || c.kind == ExtremumKind::Max;
    let contour: Vec<ExtremumCandidate> = contour.iter().filter(wanted).copied().collect();
    let image: Vec<ExtremumCandidate> = image.iter().filter(wanted).copied().collect();
    let mut used = vec![false; image.len()];

    let mut accepted: Vec<(usize, Phase)> = Vec::new();
    for c in contour.iter().filter(|c| !manual.contains(c.frame)) {
        let direct = image
            .iter()
            .enumerate()
            .filter(|&(j, m)| !used[j] && m.kind == c.kind && m.frame.abs_diff(c.frame) <= spec.threshold)
            .min_by_key(|&(_, m)| (m.frame.abs_diff(c.frame), m.frame))
            .map(|(j, _)| j);

        if let Some(j) = direct {
            used[j] = true;
            let frame = if c.interpolated { image[j].frame } else { c.frame };
            accepted.push((frame, c.kind.into()));
            continue;
        }
        if c.interpolated {
            continue;
        }

        let batch = spec.batch_of(c.frame);
        let fallback = image
            .iter()
            .enumerate()
            .find(|&(j, m)| !used[j] && m.kind == c.kind && spec.batch_of(m.frame) == batch)
            .map(|(j, _)| j);
        if let Some(j) = fallback {
            used[j] = true;
            accepted.push((c.frame, c.kind.into()));
        } else {
            log::debug!("drop unmatched {:?} at frame {}", c.kind, c.frame);
        }
    }
    accepted.sort_by_key(|&(frame, _)| frame);

    let mut assignment = GatingAssignment::with_manual(len, manual);
    let mut last_auto: [Option<usize>; 2] = [None, None];
    for (frame, phase) in accepted {
        let slot = match phase {
            Phase::Diastole => 0,
            Phase::Systole => 1,
            Phase::None => continue,
        };
        let near_manual = manual
            .iter()
            .any(|(f, p)| p == phase && f.abs_diff(frame) < spec.min_distance);
        let near_auto = last_auto[slot].is_some_and(|last| frame - last < spec.min_distance);
        if near_manual || near_auto {
            continue;
        }
        if assignment.set_auto(frame, phase) {
            last_auto[slot] = Some(frame);
        }
    }

    let report = GatingReport::from_assignment(
        assignment,
        spec.maxima_only,
        contour,
        image,
    );
    if report.ambiguous {
        log::warn!(
            "gating is ambiguous: {} diastolic and {} systolic frames",
            report.diastolic_count,
            report.systolic_count
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::{consensus, ConsensusSpec};
    use crate::extrema::{ExtremumCandidate, ExtremumKind};
    use crate::gating::{ManualOverrides, Phase};

    fn cand(frame: usize, kind: ExtremumKind) -> ExtremumCandidate {
        ExtremumCandidate {
            frame,
            value: 0.0,
            kind,
            prominence: 1.0,
            interpolated: false,
        }
    }

    fn spec() -> ConsensusSpec {
        ConsensusSpec::new(5, 30, 15, false)
    }

    use ExtremumKind::{Max, Min};

    /// 轮廓极值 100 与图像极值 103 配对, 结果位于 100.
    #[test]
    fn test_direct_match() {
        let contour = [cand(100, Max), cand(130, Min)];
        let image = [cand(103, Max), cand(128, Min)];
        let r = consensus(300, &contour, &image, &spec(), &ManualOverrides::new());
        assert_eq!(r.assignment.diastolic_frames(), vec![100]);
        assert_eq!(r.assignment.systolic_frames(), vec![130]);
        assert_eq!(r.assignment.phase(103), Phase::None);
    }

    /// 同一批次内没有图像极值, 轮廓极值 200 被丢弃.
    #[test]
    fn test_unmatched_dropped() {
        let contour = [cand(200, Max)];
        let image = [cand(150, Max), cand(215, Max), cand(200, Min)];
        let r = consensus(300, &contour, &image, &spec(), &ManualOverrides::new());
        assert_eq!(r.assignment.phase(200), Phase::None);
        assert_eq!(r.diastolic_count, 0);
        assert!(r.ambiguous);
    }

    /// 超出距离门限但位于同一批次时, 回退判定接受该极值.
    #[test]
    fn test_batch_fallback() {
        let contour = [cand(61, Max), cand(88, Max)];
        let image = [cand(68, Max), cand(94, Max)];
        let r = consensus(300, &contour, &image, &spec(), &ManualOverrides::new());
        // 61 与 68 同属 [60, 90); 88 与 94 分属不同批次.
        assert_eq!(r.assignment.diastolic_frames(), vec![61]);
    }

    /// 图像极值只能被使用一次, 距离相等时取较早者.
    #[test]
    fn test_consumed_once() {
        let contour = [cand(50, Max), cand(52, Max)];
        let image = [cand(47, Max), cand(53, Max)];
        let spec = ConsensusSpec::new(5, 30, 1, false);
        let r = consensus(100, &contour, &image, &spec, &ManualOverrides::new());
        assert_eq!(r.assignment.diastolic_frames(), vec![50, 52]);

        // 图像极值已经用完, 且批次回退也找不到剩余的候选.
        let contour = [cand(50, Max), cand(52, Max), cand(54, Max)];
        let r = consensus(100, &contour, &image, &spec, &ManualOverrides::new());
        assert_eq!(r.assignment.diastolic_frames(), vec![50, 52]);
    }

    /// 不足两个收缩期时结果可疑, 但舒张期结果保留.
    #[test]
    fn test_ambiguous_keeps_diastole() {
        let contour = [cand(10, Max), cand(25, Min), cand(40, Max), cand(70, Max)];
        let image = [cand(11, Max), cand(41, Max), cand(69, Max)];
        let r = consensus(100, &contour, &image, &spec(), &ManualOverrides::new());
        assert!(r.ambiguous);
        assert_eq!(r.assignment.diastolic_frames(), vec![10, 40, 70]);
        assert_eq!(r.systolic_count, 0);

        let only_max = ConsensusSpec::new(5, 30, 15, true);
        let r = consensus(100, &contour, &image, &only_max, &ManualOverrides::new());
        assert!(!r.ambiguous);
    }

    #[test]
    fn test_maxima_only() {
        let contour = [cand(10, Max), cand(25, Min), cand(40, Max)];
        let image = [cand(10, Max), cand(25, Min), cand(40, Max)];
        let spec = ConsensusSpec::new(5, 30, 15, true);
        let r = consensus(100, &contour, &image, &spec, &ManualOverrides::new());
        assert_eq!(r.assignment.diastolic_frames(), vec![10, 40]);
        assert!(r.assignment.systolic_frames().is_empty());
        assert!(r.contour_extrema.iter().all(|c| c.kind == Max));
    }

    /// 手工标记不被覆盖, 且附近的同时相自动结果被丢弃.
    #[test]
    fn test_manual_respected() {
        let manual: ManualOverrides = [(40, Phase::Systole), (72, Phase::Diastole)]
            .into_iter()
            .collect();
        let contour = [cand(10, Max), cand(40, Max), cand(65, Max), cand(100, Max)];
        let image = [cand(10, Max), cand(40, Max), cand(65, Max), cand(100, Max)];
        let r = consensus(120, &contour, &image, &spec(), &manual);
        assert_eq!(r.assignment.phase(40), Phase::Systole);
        assert!(r.assignment.is_manual(40));
        assert_eq!(r.assignment.diastolic_frames(), vec![10, 72, 100]);
    }

    /// 插值帧上的轮廓极值只能直接配对, 并采用图像极值的帧.
    #[test]
    fn test_interpolated_contour() {
        let mut c = cand(52, Min);
        c.interpolated = true;
        let image = [cand(55, Min)];
        let r = consensus(100, &[c], &image, &spec(), &ManualOverrides::new());
        assert_eq!(r.assignment.systolic_frames(), vec![55]);

        let image = [cand(59, Min)];
        let r = consensus(100, &[c], &image, &spec(), &ManualOverrides::new());
        assert!(r.assignment.systolic_frames().is_empty());
    }

    /// 插值极值移到图像极值的帧后, 与下一个同时相自动结果过近时, 后者被丢弃.
    #[test]
    fn test_auto_separation() {
        let mut moved = cand(52, Max);
        moved.interpolated = true;
        let contour = [moved, cand(67, Max)];
        let image = [cand(56, Max), cand(67, Max)];
        let r = consensus(120, &contour, &image, &spec(), &ManualOverrides::new());

        let dia = r.assignment.diastolic_frames();
        assert_eq!(dia, vec![56]);
        assert!(dia.windows(2).all(|w| w[1] - w[0] >= 15));
        assert_eq!(r.assignment.phase(67), Phase::None);
    }

    /// 回退判定的批从第 0 帧对齐.
    #[test]
    fn test_batch_alignment() {
        let manual = ManualOverrides::new();
        // 209 属于 [180, 210), 216 属于 [210, 240).
        let r = consensus(300, &[cand(209, Max)], &[cand(216, Max)], &spec(), &manual);
        assert!(r.assignment.diastolic_frames().is_empty());

        let r = consensus(300, &[cand(181, Max)], &[cand(209, Max)], &spec(), &manual);
        assert_eq!(r.assignment.diastolic_frames(), vec![181]);
    }
}
