//! 后台重新计算时的结果槽: 最后开始的计算获胜.

use super::GatingReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// 一次计算的凭据, 由 [`GatingSlot::begin`] 发放.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ticket(u64);

/// 保存最新门控报告的线程安全槽.
///
/// 每次开始计算前调用 [`begin`](Self::begin) 领取凭据, 完成后以该凭据
/// [`commit`](Self::commit). 如果期间已有更新的计算开始, 旧结果会被丢弃.
#[derive(Debug, Default)]
pub struct GatingSlot {
    started: AtomicU64,
    latest: Mutex<Option<(Ticket, GatingReport)>>,
}

impl GatingSlot {
    /// 空槽.
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一次新的计算. 凭据严格递增.
    pub fn begin(&self) -> Ticket {
        Ticket(self.started.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// 提交 `ticket` 对应的结果. 只有当 `ticket` 是最新开始的计算时才保存,
    /// 返回是否保存成功.
    pub fn commit(&self, ticket: Ticket, report: GatingReport) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 != self.started.load(Ordering::SeqCst) {
            log::debug!("discard stale gating result {ticket:?}");
            return false;
        }
        *latest = Some((ticket, report));
        true
    }

    /// 最新保存的报告.
    pub fn latest(&self) -> Option<GatingReport> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, r)| r.clone())
    }

    /// 最新保存的报告对应的凭据.
    pub fn latest_ticket(&self) -> Option<Ticket> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(t, _)| *t)
    }
}

#[cfg(test)]
mod tests {
    use super::GatingSlot;
    use crate::gating::{GatingReport, ManualOverrides, Phase};
    use std::thread;

    fn report(frame: usize) -> GatingReport {
        let manual: ManualOverrides = [(frame, Phase::Diastole)].into_iter().collect();
        GatingReport::manual_only(100, &manual, true)
    }

    #[test]
    fn test_latest_wins() {
        let slot = GatingSlot::new();
        assert!(slot.latest().is_none());

        let a = slot.begin();
        let b = slot.begin();
        assert!(b > a);

        assert!(slot.commit(b, report(2)));
        assert!(!slot.commit(a, report(1)));
        assert_eq!(slot.latest().unwrap().assignment.diastolic_frames(), vec![2]);
        assert_eq!(slot.latest_ticket(), Some(b));
    }

    /// 多个线程同时计算, 只有最后领取凭据的结果被保存.
    #[test]
    fn test_concurrent() {
        let slot = GatingSlot::new();
        let tickets: Vec<_> = (0..8).map(|_| slot.begin()).collect();
        let last = *tickets.last().unwrap();
        thread::scope(|s| {
            for (i, &t) in tickets.iter().enumerate() {
                let slot = &slot;
                s.spawn(move || slot.commit(t, report(i)));
            }
        });
        assert_eq!(slot.latest_ticket(), Some(last));
        assert_eq!(slot.latest().unwrap().assignment.diastolic_frames(), vec![7]);
    }
}
