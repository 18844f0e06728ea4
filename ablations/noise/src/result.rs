//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `p` 的结果写进 `w` 中.
fn describe_into<W: Write>(p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.4}"),
            None => "/".to_string(),
        }
    }

    let [dia, sys] = p.detected();
    writeln!(w, "Profile `noise = {:.2}`:", p.level())?;
    writeln!(w, "{S4}Gating runs: {} (failed: {})", p.runs(), p.failed())?;
    writeln!(w, "{S4}Ambiguous results: {}", p.ambiguous())?;
    writeln!(w, "{S4}Detected frames: {dia} diastolic, {sys} systolic")?;
    for (k, name) in ["Diastole", "Systole"].into_iter().enumerate() {
        writeln!(
            w,
            "{S4}{name} precision / recall: {} / {}",
            f64_to_display(p.precision(k)),
            f64_to_display(p.recall(k))
        )?;
    }
    writeln!(w, "{S4}Total time: {} us", p.total_time_us())?;
    writeln!(
        w,
        "{S4}Average time: {} us",
        f64_to_display(p.avg_time_us())
    )?;
    let t = p.slowest().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Slowest run costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果, 按噪声水平升序.
pub struct AblationResult {
    data: Vec<Profile>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = Profile>>(it: I) -> Self {
        let mut data: Vec<Profile> = it.into_iter().collect();
        data.sort_by(|a, b| a.level().total_cmp(&b.level()));
        Self { data }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for profile in self.data.iter() {
            if let Err(e) = describe_into(profile, &mut buf) {
                eprintln!("{e}");
            }
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }
    }
}
