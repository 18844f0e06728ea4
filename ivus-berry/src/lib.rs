#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 由 IVUS 回撤序列的逐帧特征自动检测心动周期, 即舒张期帧与收缩期帧.
//!
//! 该 crate 只提供 `safe` 接口, 不涉及 GUI、DICOM 读取和分割模型本身.
//!
//! # 注意
//!
//! 1. 所有入口都以 `Result` 返回错误, 不会终止调用进程.
//! 2. 手工标记的帧在任何自动门控中都不会被覆盖.
//! 3. 门控结果 "不够可信" 不是错误, 见 [`gating::GatingReport::ambiguous`].
//!
//! # 开发计划
//!
//! ### 逐帧信号构建 ✅
//!
//! 轮廓信号 (可能有缺口) 与图像信号 (逐帧完整) 的归一化与缺口插值.
//! 图像特征 (相邻帧相关性、FFT 模糊度评分) 的计算, 以及多个特征信号的加权融合.
//!
//! 实现位于 `ivus-berry/src/signal`.
//!
//! ### 零相位 Butterworth 带通滤波 ✅
//!
//! 二阶节级联, 前向-反向滤波, 两端奇延拓.
//!
//! 实现位于 `ivus-berry/src/filter`.
//!
//! ### 极值检测 ✅
//!
//! 最小距离、显著度门限, 结果交替出现.
//!
//! 实现位于 `ivus-berry/src/extrema`.
//!
//! ### 双信号一致性门控 ✅
//!
//! 1. 同类极值在门限帧距离内直接配对. ✅
//! 2. 未配对时按批回退判定. ✅
//! 3. 手工标记优先. ✅
//! 4. 后台重新计算时 "最后开始的计算获胜". ✅
//!
//! 实现位于 `ivus-berry/src/gating`.
//!
//! ### 消融实验 ⌛️
//!
//! 不同噪声水平下的检测数量与耗时.
//!
//! 实现位于 `ablations/noise`.

mod error;

pub use error::GatingError;

/// 门控计算结果.
pub type GatingResult<T> = Result<T, GatingError>;

pub mod config;
pub mod consts;

pub mod extrema;
pub mod filter;
pub mod gating;
pub mod signal;

pub mod prelude;
