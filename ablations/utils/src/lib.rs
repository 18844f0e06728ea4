//! 消融实验依赖的通用组件.

use ivus_berry::config::GatingConfig;
use std::io;

pub mod synth;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: io::Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 消融实验统一使用的门控参数: 默认参数, 30 帧每秒.
#[inline]
pub fn ablation_config() -> GatingConfig {
    GatingConfig::default()
}
