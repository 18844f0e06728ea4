//! Butterworth 带通滤波器设计.

// 模拟低通原型 -> 低通到带通变换 -> (预畸变) 双线性变换.
// ref: https://en.wikipedia.org/wiki/Butterworth_filter
//      https://en.wikipedia.org/wiki/Bilinear_transform

use super::FilterSpec;
use crate::consts::REAL_POLE_EPS;
use num::complex::Complex64;
use std::f64::consts::PI;

/// 二阶节 (second-order section), 转置直接 II 型.
///
/// `a[0]` 恒为 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Section {
    /// 分子系数.
    pub b: [f64; 3],

    /// 分母系数.
    pub a: [f64; 3],
}

impl Section {
    /// 频率响应 `H(e^{jw})`, `w` 为数字角频率 (弧度每样本).
    pub fn response(&self, w: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        (b0 + z1 * b1 + z2 * b2) / (1.0 + z1 * a1 + z2 * a2)
    }

    /// 直流增益.
    #[inline]
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }
}

/// 数字 Butterworth 带通滤波器, 以二阶节级联表示.
#[derive(Clone, Debug)]
pub struct ButterworthBandpass {
    sections: Vec<Section>,
    padlen: usize,
}

impl ButterworthBandpass {
    /// 按 `spec` 设计滤波器. 结果有 `spec.order()` 个二阶节,
    /// 在数字中心频率处的增益为 1.
    pub fn design(spec: &FilterSpec) -> Self {
        let n = spec.order() as usize;
        let fs2 = 2.0 * spec.frame_rate();

        // 预畸变后的模拟截止角频率
        let w1 = fs2 * (PI * spec.lowcut() / spec.frame_rate()).tan();
        let w2 = fs2 * (PI * spec.highcut() / spec.frame_rate()).tan();
        let bw = w2 - w1;
        let w0_sq = w1 * w2;

        let mut upper = Vec::with_capacity(n);
        let mut real = Vec::with_capacity(2);
        for k in 0..n {
            let theta = PI * (2 * k + n + 1) as f64 / (2 * n) as f64;
            let p = Complex64::from_polar(1.0, theta);
            let half = p * (bw / 2.0);
            let d = (half * half - w0_sq).sqrt();
            for s in [half + d, half - d] {
                let z = (fs2 + s) / (fs2 - s);
                if z.im.abs() <= REAL_POLE_EPS {
                    real.push(z.re);
                } else if z.im > 0.0 {
                    upper.push(z);
                }
            }
        }

        let mut denominators: Vec<[f64; 3]> = upper
            .iter()
            .map(|z| [1.0, -2.0 * z.re, z.norm_sqr()])
            .collect();
        for pair in real.chunks(2) {
            if let &[r1, r2] = pair {
                denominators.push([1.0, -(r1 + r2), r1 * r2]);
            }
        }
        debug_assert_eq!(denominators.len(), n);

        // 模拟中心频率 sqrt(w1 * w2) 映射回数字域
        let wc = 2.0 * (w0_sq.sqrt() / fs2).atan();
        let sections = denominators
            .into_iter()
            .map(|a| {
                let raw = Section { b: [1.0, 0.0, -1.0], a };
                let g = raw.response(wc).norm().recip();
                Section {
                    b: [g, 0.0, -g],
                    a,
                }
            })
            .collect();

        Self {
            sections,
            padlen: spec.padlen(),
        }
    }

    /// 二阶节.
    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// 零相位滤波时两端的延拓长度.
    #[inline]
    pub fn padlen(&self) -> usize {
        self.padlen
    }

    /// 级联后的频率响应幅值, `freq` 单位为 Hz.
    pub fn magnitude(&self, freq: f64, frame_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / frame_rate;
        self.sections
            .iter()
            .map(|s| s.response(w).norm())
            .product()
    }
}
