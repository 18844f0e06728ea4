//! 心动周期门控: 为每一帧分配舒张期 / 收缩期.
//!
//! 自动门控结果是一次计算得到的不可变值. 手工标记 (manual override)
//! 在任何自动计算中都不会被覆盖.

mod consensus;
mod pipeline;
mod slot;

pub use consensus::{consensus, ConsensusSpec};
pub use pipeline::{run_gating, run_gating_or_manual, GatingInput};
pub use slot::{GatingSlot, Ticket};

use crate::consts::label;
use crate::extrema::{ExtremumCandidate, ExtremumKind};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 心动周期时相.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// 舒张期 (管腔最大).
    Diastole,

    /// 收缩期 (管腔最小).
    Systole,

    /// 未门控.
    #[default]
    None,
}

impl Phase {
    /// 导出列中的单字符表示.
    #[inline]
    pub fn label(self) -> char {
        match self {
            Self::Diastole => label::DIASTOLE,
            Self::Systole => label::SYSTOLE,
            Self::None => label::NONE,
        }
    }
}

impl From<ExtremumKind> for Phase {
    #[inline]
    fn from(kind: ExtremumKind) -> Self {
        match kind {
            ExtremumKind::Max => Self::Diastole,
            ExtremumKind::Min => Self::Systole,
        }
    }
}

/// 单帧门控状态.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameGate {
    /// 时相.
    pub phase: Phase,

    /// 是否为手工标记.
    pub is_manual: bool,
}

/// 手工标记, 帧序号 -> 时相.
///
/// 手工标记为 [`Phase::None`] 的帧同样受保护, 自动门控不会为其分配时相.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManualOverrides(BTreeMap<usize, Phase>);

impl ManualOverrides {
    /// 空标记.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记第 `frame` 帧, 返回原有标记.
    #[inline]
    pub fn insert(&mut self, frame: usize, phase: Phase) -> Option<Phase> {
        self.0.insert(frame, phase)
    }

    /// 移除第 `frame` 帧的标记.
    #[inline]
    pub fn remove(&mut self, frame: usize) -> Option<Phase> {
        self.0.remove(&frame)
    }

    /// 第 `frame` 帧的标记.
    #[inline]
    pub fn get(&self, frame: usize) -> Option<Phase> {
        self.0.get(&frame).copied()
    }

    /// 第 `frame` 帧是否被手工标记.
    #[inline]
    pub fn contains(&self, frame: usize) -> bool {
        self.0.contains_key(&frame)
    }

    /// 按帧升序遍历.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Phase)> + '_ {
        self.0.iter().map(|(&f, &p)| (f, p))
    }

    /// 标记数量.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, Phase)> for ManualOverrides {
    fn from_iter<I: IntoIterator<Item = (usize, Phase)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 整个回撤序列的门控结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GatingAssignment {
    gates: Vec<FrameGate>,
}

impl GatingAssignment {
    /// 长度为 `len` 的空结果, 每一帧都未门控.
    pub fn new(len: usize) -> Self {
        Self {
            gates: vec![FrameGate::default(); len],
        }
    }

    /// 长度为 `len`, 并写入所有手工标记. 超出范围的标记被忽略.
    pub fn with_manual(len: usize, manual: &ManualOverrides) -> Self {
        let mut ans = Self::new(len);
        for (frame, phase) in manual.iter() {
            if !ans.set_manual(frame, phase) {
                log::warn!("manual gating at frame {frame} is out of range ({len} frames)");
            }
        }
        ans
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// 第 `frame` 帧的门控状态. 越界时返回 `None`.
    #[inline]
    pub fn gate(&self, frame: usize) -> Option<FrameGate> {
        self.gates.get(frame).copied()
    }

    /// 第 `frame` 帧的时相. 越界视为未门控.
    #[inline]
    pub fn phase(&self, frame: usize) -> Phase {
        self.gate(frame).map_or(Phase::None, |g| g.phase)
    }

    /// 第 `frame` 帧是否为手工标记.
    #[inline]
    pub fn is_manual(&self, frame: usize) -> bool {
        self.gate(frame).is_some_and(|g| g.is_manual)
    }

    /// 所有处于 `phase` 的帧, 升序.
    pub fn frames_of(&self, phase: Phase) -> Vec<usize> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| g.phase == phase)
            .map(|(i, _)| i)
            .collect()
    }

    /// 舒张期帧, 升序.
    #[inline]
    pub fn diastolic_frames(&self) -> Vec<usize> {
        self.frames_of(Phase::Diastole)
    }

    /// 收缩期帧, 升序.
    #[inline]
    pub fn systolic_frames(&self) -> Vec<usize> {
        self.frames_of(Phase::Systole)
    }

    /// 手工标记第 `frame` 帧. 越界时返回 `false`.
    pub fn set_manual(&mut self, frame: usize, phase: Phase) -> bool {
        match self.gates.get_mut(frame) {
            Some(g) => {
                *g = FrameGate {
                    phase,
                    is_manual: true,
                };
                true
            }
            None => false,
        }
    }

    /// 清除第 `frame` 帧的手工标记 (时相同时被清除).
    pub fn clear_manual(&mut self, frame: usize) {
        if let Some(g) = self.gates.get_mut(frame) {
            if g.is_manual {
                *g = FrameGate::default();
            }
        }
    }

    /// 写入自动门控结果. 已有时相或手工标记的帧不会被覆盖.
    pub(crate) fn set_auto(&mut self, frame: usize, phase: Phase) -> bool {
        match self.gates.get_mut(frame) {
            Some(g) if !g.is_manual && g.phase == Phase::None => {
                g.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// 当前所有手工标记.
    pub fn manual_overrides(&self) -> ManualOverrides {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_manual)
            .map(|(i, g)| (i, g.phase))
            .collect()
    }

    /// 逐帧时相字符, 如 `['-', 'D', '-', 'S']`.
    pub fn to_phase_labels(&self) -> Vec<char> {
        self.gates.iter().map(|g| g.phase.label()).collect()
    }
}

/// 一次门控计算的报告.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GatingReport {
    /// 门控结果.
    pub assignment: GatingAssignment,

    /// 结果可信度低: 舒张期 (或在检测收缩期时, 收缩期) 帧少于两个.
    pub ambiguous: bool,

    /// 舒张期帧数, 包含手工标记.
    pub diastolic_count: usize,

    /// 收缩期帧数, 包含手工标记.
    pub systolic_count: usize,

    /// 轮廓信号上的极值 (诊断用).
    pub contour_extrema: Vec<ExtremumCandidate>,

    /// 图像信号上的极值 (诊断用).
    pub image_extrema: Vec<ExtremumCandidate>,
}

impl GatingReport {
    /// 由门控结果统计帧数并判断是否可信.
    pub fn from_assignment(
        assignment: GatingAssignment,
        maxima_only: bool,
        contour_extrema: Vec<ExtremumCandidate>,
        image_extrema: Vec<ExtremumCandidate>,
    ) -> Self {
        let diastolic_count = assignment.diastolic_frames().len();
        let systolic_count = assignment.systolic_frames().len();
        let ambiguous = diastolic_count < 2 || (!maxima_only && systolic_count < 2);
        Self {
            assignment,
            ambiguous,
            diastolic_count,
            systolic_count,
            contour_extrema,
            image_extrema,
        }
    }

    /// 只包含手工标记的报告, 用于自动检测无法进行时.
    pub fn manual_only(len: usize, manual: &ManualOverrides, maxima_only: bool) -> Self {
        Self::from_assignment(
            GatingAssignment::with_manual(len, manual),
            maxima_only,
            vec![],
            vec![],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{GatingAssignment, GatingReport, ManualOverrides, Phase};

    #[test]
    fn test_assignment() {
        let manual: ManualOverrides = [(1, Phase::Diastole), (9, Phase::Systole)]
            .into_iter()
            .collect();
        let mut a = GatingAssignment::with_manual(5, &manual);
        assert_eq!(a.len(), 5);
        assert_eq!(a.phase(1), Phase::Diastole);
        assert!(a.is_manual(1));
        assert_eq!(a.phase(9), Phase::None);

        // 自动结果不能覆盖手工标记
        assert!(!a.set_auto(1, Phase::Systole));
        assert!(a.set_auto(3, Phase::Systole));
        assert!(!a.set_auto(3, Phase::Diastole));
        assert_eq!(a.to_phase_labels(), vec!['-', 'D', '-', 'S', '-']);

        a.clear_manual(3);
        assert_eq!(a.phase(3), Phase::Systole);
        a.clear_manual(1);
        assert_eq!(a.phase(1), Phase::None);
        assert!(a.manual_overrides().is_empty());

        assert!(a.set_manual(4, Phase::None));
        assert_eq!(a.manual_overrides().get(4), Some(Phase::None));
        assert!(!a.set_manual(5, Phase::Diastole));
    }

    #[test]
    fn test_report_counts() {
        let manual: ManualOverrides = [(0, Phase::Diastole), (20, Phase::Diastole)]
            .into_iter()
            .collect();
        let r = GatingReport::manual_only(30, &manual, true);
        assert_eq!(r.diastolic_count, 2);
        assert!(!r.ambiguous);

        let r = GatingReport::manual_only(30, &manual, false);
        assert_eq!(r.systolic_count, 0);
        assert!(r.ambiguous);
        assert_eq!(r.assignment.diastolic_frames(), vec![0, 20]);
    }
}
