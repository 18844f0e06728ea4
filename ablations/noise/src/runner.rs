//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use ivus_berry::prelude::*;
use std::thread;
use utils::synth::{self, Pullback};

/// 图像特征干扰幅度.
const LEVELS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// 心动周期 (帧), 对应约 50 ~ 67 次每分钟.
const PERIODS: [f64; 4] = [27.0, 30.0, 33.0, 36.0];

/// 轮廓缺失的间隔.
const GAP_EVERY: usize = 97;

/// 检测帧与真值帧的容许距离.
const TOLERANCE: usize = 2;

/// 在 `level` 噪声下对所有心动周期运行门控.
fn run_level(level: f64, frames: usize) -> Profile {
    let config = utils::ablation_config();
    let manual = ManualOverrides::new();
    let mut profile = Profile::new(level);

    for period in PERIODS {
        let p = Pullback::synthesize(frames, period, level, GAP_EVERY);
        let input = GatingInput::new(&p.contour, &p.image);

        profile.start();
        let report = run_gating(&input, &config, &manual);
        profile.stop();

        match report {
            Ok(r) => {
                let dia = r.assignment.diastolic_frames();
                let sys = r.assignment.systolic_frames();
                profile.add_run(
                    r.ambiguous,
                    [dia.len(), sys.len()],
                    [
                        synth::hits(&dia, &p.diastole, TOLERANCE),
                        synth::hits(&sys, &p.systole, TOLERANCE),
                    ],
                    [p.diastole.len(), p.systole.len()],
                );
            }
            Err(e) => {
                log::warn!("level {level}, period {period}: {e}");
                profile.add_failure();
            }
        }
    }
    profile
}

/// 实际运行. 每个噪声水平一个线程.
pub fn run() -> AblationResult {
    let frames = synth::frames_from_env_or_default();
    println!(
        "Running ablation studies ({frames} frames, {} levels, {} cpus)...",
        LEVELS.len(),
        utils::cpus()
    );

    thread::scope(|s| {
        let handles = LEVELS.map(|level| s.spawn(move || run_level(level, frames)));
        AblationResult::from_iter(
            handles
                .into_iter()
                .map(|th| th.join().expect("Thread joining error")),
        )
    })
}
