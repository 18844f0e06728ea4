//! 门控运行统计.

use std::time::{Duration, Instant};

/// 累计计时器.
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (微秒).
    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 某个噪声水平下的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 图像特征干扰幅度.
    level: f64,

    /// 成功完成的门控次数.
    runs: u64,

    /// 返回错误的门控次数.
    failed: u64,

    /// 结果可疑的次数.
    ambiguous: u64,

    /// 检测到的舒张期 / 收缩期帧数.
    detected: [u64; 2],

    /// 与真值相符的舒张期 / 收缩期帧数.
    hits: [u64; 2],

    /// 真值舒张期 / 收缩期帧数.
    truth: [u64; 2],

    timer: AccTimer,
    slowest: Option<Duration>,
}

impl Profile {
    /// 新的统计.
    pub fn new(level: f64) -> Self {
        Self {
            level,
            runs: 0,
            failed: 0,
            ambiguous: 0,
            detected: [0; 2],
            hits: [0; 2],
            truth: [0; 2],
            timer: AccTimer::new(),
            slowest: None,
        }
    }

    /// 开始一次门控计时.
    #[inline]
    pub fn start(&mut self) {
        self.timer.start();
    }

    /// 结束计时, 记录本次门控的耗时.
    pub fn stop(&mut self) {
        let d = self.timer.elapsed();
        self.slowest = Some(self.slowest.map_or(d, |s| s.max(d)));
    }

    /// 记录失败的一次门控.
    #[inline]
    pub fn add_failure(&mut self) {
        self.failed += 1;
    }

    /// 记录一次门控结果. 下标 0 为舒张期, 1 为收缩期.
    pub fn add_run(&mut self, ambiguous: bool, detected: [usize; 2], hits: [usize; 2], truth: [usize; 2]) {
        self.runs += 1;
        self.ambiguous += u64::from(ambiguous);
        for k in 0..2 {
            self.detected[k] += detected[k] as u64;
            self.hits[k] += hits[k] as u64;
            self.truth[k] += truth[k] as u64;
        }
    }

    /// 噪声水平.
    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    /// 成功次数.
    #[inline]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// 失败次数.
    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// 可疑次数.
    #[inline]
    pub fn ambiguous(&self) -> u64 {
        self.ambiguous
    }

    /// 检测到的帧数, `[舒张期, 收缩期]`.
    #[inline]
    pub fn detected(&self) -> [u64; 2] {
        self.detected
    }

    /// 精确率: 命中数 / 检测数. 无检测时返回 `None`.
    pub fn precision(&self, k: usize) -> Option<f64> {
        (self.detected[k] > 0).then(|| self.hits[k] as f64 / self.detected[k] as f64)
    }

    /// 召回率: 命中数 / 真值数. 无真值时返回 `None`.
    pub fn recall(&self, k: usize) -> Option<f64> {
        (self.truth[k] > 0).then(|| self.hits[k] as f64 / self.truth[k] as f64)
    }

    /// 总耗时 (微秒).
    #[inline]
    pub fn total_time_us(&self) -> u64 {
        self.timer.total_us()
    }

    /// 平均耗时 (微秒).
    pub fn avg_time_us(&self) -> Option<f64> {
        let n = self.runs + self.failed;
        (n > 0).then(|| self.timer.total_us() as f64 / n as f64)
    }

    /// 最慢一次门控的耗时.
    #[inline]
    pub fn slowest(&self) -> Option<Duration> {
        self.slowest
    }
}
