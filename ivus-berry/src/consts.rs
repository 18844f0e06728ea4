//! 通用常量.

/// 门控参数的默认值.
///
/// 这些值面向常见的 IVUS 回撤采集 (约 30 帧每秒, 心率 45 ~ 180 次每分钟).
pub mod defaults {
    /// 默认帧率 (单位: 帧每秒).
    pub const FRAME_RATE: f64 = 30.0;

    /// 归一化后信号的取值上限, 信号被缩放到 `[0, NORMALIZE_STEP]`.
    pub const NORMALIZE_STEP: f64 = 100.0;

    /// 带通滤波器下截止频率 (单位: Hz).
    pub const LOWCUT: f64 = 0.75;

    /// 带通滤波器上截止频率 (单位: Hz).
    pub const HIGHCUT: f64 = 3.0;

    /// Butterworth 模拟原型阶数.
    pub const ORDER: u32 = 2;

    /// 极值显著度百分位数 (0 ~ 100).
    pub const EXTREMA_Y_LIM: f64 = 50.0;

    /// 同类极值之间的最小帧距离.
    pub const EXTREMA_X_LIM: usize = 15;

    /// 显著度门限相对于百分位数的比例.
    pub const PROMINENCE_RATIO: f64 = 0.5;

    /// 两个信号的同类极值被视为同一事件的最大帧距离.
    pub const AUTO_GATING_THRESHOLD: usize = 5;

    /// 未配对极值回退判定时的批大小 (帧数).
    pub const AUTO_GATING_BATCH_SIZE: usize = 30;

    /// 极值检测前的滑动平均窗口宽度. 1 代表不平滑.
    pub const SMOOTH_WINDOW: usize = 1;
}

/// 每帧时相在导出列中的字符表示.
pub mod label {
    /// 舒张期.
    pub const DIASTOLE: char = 'D';

    /// 收缩期.
    pub const SYSTOLE: char = 'S';

    /// 未门控.
    pub const NONE: char = '-';
}

/// 模糊度评分时选取的最高频谱幅值比例.
pub const BLUR_TOP_FRACTION: f64 = 0.1;

/// 判定复数极点为实数时允许的虚部误差.
pub(crate) const REAL_POLE_EPS: f64 = 1e-10;
