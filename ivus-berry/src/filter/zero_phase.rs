//! 二阶节级联滤波与前向-反向零相位滤波.

use super::butterworth::{ButterworthBandpass, Section};
use crate::{GatingError, GatingResult};
use ndarray::ArrayView1;

/// 每个二阶节的两个延迟状态.
type State = [f64; 2];

impl ButterworthBandpass {
    /// 单向滤波 `x`, 原地写回. `zi` 是每个二阶节的初始状态.
    pub fn filter_in_place(&self, x: &mut [f64], zi: &[State]) {
        debug_assert_eq!(zi.len(), self.sections().len());
        for (sec, &[mut z0, mut z1]) in self.sections().iter().zip(zi) {
            let Section {
                b: [b0, b1, b2],
                a: [_, a1, a2],
            } = *sec;
            for v in x.iter_mut() {
                let xi = *v;
                let yi = b0 * xi + z0;
                z0 = b1 * xi - a1 * yi + z1;
                z1 = b2 * xi - a2 * yi;
                *v = yi;
            }
        }
    }

    /// 单位阶跃输入下的稳态初始状态. 使用时按首个输入样本缩放.
    pub fn steady_state(&self) -> Vec<State> {
        let mut scale = 1.0;
        self.sections()
            .iter()
            .map(|sec| {
                let g = sec.dc_gain();
                let [_, b1, b2] = sec.b;
                let [_, a1, a2] = sec.a;
                let z1 = (b2 - a2 * g) * scale;
                let z0 = (b1 - a1 * g) * scale + z1;
                scale *= g;
                [z0, z1]
            })
            .collect()
    }

    /// 零相位滤波.
    ///
    /// 先在两端做长度为 [`padlen`](ButterworthBandpass::padlen) 的奇延拓,
    /// 然后正向、反向各滤波一次, 最后去掉延拓部分.
    /// 如果 `x.len() <= padlen`, 返回 [`GatingError::InsufficientSamples`].
    pub fn filtfilt(&self, x: ArrayView1<f64>) -> GatingResult<Vec<f64>> {
        let n = x.len();
        let pad = self.padlen();
        if n <= pad {
            return Err(GatingError::InsufficientSamples(n as u32, pad as u32 + 1));
        }

        let mut ext = odd_extend(x, pad);
        let zi = self.steady_state();

        let x0 = ext[0];
        self.filter_in_place(&mut ext, &scaled(&zi, x0));

        ext.reverse();
        let y0 = ext[0];
        self.filter_in_place(&mut ext, &scaled(&zi, y0));
        ext.reverse();

        ext.truncate(pad + n);
        ext.drain(..pad);
        Ok(ext)
    }
}

#[inline]
fn scaled(zi: &[State], k: f64) -> Vec<State> {
    zi.iter().map(|&[a, b]| [a * k, b * k]).collect()
}

/// 关于两个端点的奇延拓. 要求 `pad < x.len()`.
fn odd_extend(x: ArrayView1<f64>, pad: usize) -> Vec<f64> {
    let n = x.len();
    let (first, last) = (x[0], x[n - 1]);
    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
    ext.extend(x.iter().copied());
    ext.extend((1..=pad).map(|i| 2.0 * last - x[n - 1 - i]));
    ext
}

#[cfg(test)]
mod tests {
    use super::odd_extend;
    use crate::filter::{ButterworthBandpass, FilterSpec};
    use ndarray::{arr1, Array1};

    #[test]
    fn test_odd_extend() {
        let x = arr1(&[1.0, 2.0, 4.0, 7.0]);
        let ext = odd_extend(x.view(), 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }

    /// 常数输入经过带通滤波后应为 0 (无起始瞬态).
    #[test]
    fn test_constant_input() {
        let f = ButterworthBandpass::design(&FilterSpec::new(0.75, 3.0, 3, 30.0).unwrap());
        let x = Array1::from_elem(64, 5.0);
        let y = f.filtfilt(x.view()).unwrap();
        assert_eq!(y.len(), 64);
        assert!(y.iter().all(|v| v.abs() < 1e-9));
    }

    /// 稳态初始条件下, 单位阶跃的单向输出保持为常数.
    #[test]
    fn test_steady_state() {
        let f = ButterworthBandpass::design(&FilterSpec::new(0.75, 3.0, 2, 30.0).unwrap());
        let zi = f.steady_state();
        let mut x = vec![1.0; 32];
        f.filter_in_place(&mut x, &zi);
        let dc: f64 = f.sections().iter().map(|s| s.dc_gain()).product();
        assert!(x.iter().all(|v| (v - dc).abs() < 1e-12));
    }
}
