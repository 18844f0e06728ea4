//! 由原始 IVUS 帧 (形状 `(frames, H, W)`) 直接计算的图像特征.
//!
//! 心脏搏动使导管与管壁发生周期性相对运动, 表现为相邻帧相似度和
//! 图像锐利程度的周期性变化.

use crate::consts::BLUR_TOP_FRACTION;
use ndarray::{s, ArrayView2, ArrayView3, Axis};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::ops::Range;
use std::sync::Arc;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 裁剪每一帧的感兴趣区域, 行范围为 `rows`, 列范围为 `cols`.
///
/// 超出图像的范围会被截断.
pub fn crop_frames<T>(
    frames: ArrayView3<'_, T>,
    rows: Range<usize>,
    cols: Range<usize>,
) -> ArrayView3<'_, T> {
    let (_, h, w) = frames.dim();
    let (r0, r1) = (rows.start.min(h), rows.end.min(h));
    let (c0, c1) = (cols.start.min(w), cols.end.min(w));
    frames.slice_move(s![.., r0..r1.max(r0), c0..c1.max(c0)])
}

/// 每一帧与下一帧像素的 Pearson 相关系数. 最后一帧记为 0 以保持长度.
///
/// 如果某一帧像素值全部相同, 相关系数记为 0.
pub fn frame_correlation<T>(frames: ArrayView3<T>) -> Vec<f64>
where
    T: Copy + Into<f64> + Sync,
{
    let n = frames.len_of(Axis(0));
    if n == 0 {
        return vec![];
    }
    let mut ans = map_frames(n - 1, |i| {
        pearson(
            frames.index_axis(Axis(0), i),
            frames.index_axis(Axis(0), i + 1),
        )
    });
    ans.push(0.0);
    ans
}

/// 每一帧的模糊度评分: 二维 FFT 幅值谱中最高 10% 幅值的平均值.
///
/// 评分越高, 图像中高频成分越多, 即越锐利.
pub fn blurring_score<T>(frames: ArrayView3<T>) -> Vec<f64>
where
    T: Copy + Into<f64> + Sync,
{
    let (n, h, w) = frames.dim();
    if n == 0 || h == 0 || w == 0 {
        return vec![0.0; n];
    }
    let fft2 = Fft2d::new(h, w);
    map_frames(n, |i| fft2.top_magnitude_mean(frames.index_axis(Axis(0), i)))
}

/// 借助 `rayon`, 并行地对 `0..n` 每一帧实施 `op` 操作, 结果保持帧顺序.
#[cfg(feature = "rayon")]
fn map_frames<F>(n: usize, op: F) -> Vec<f64>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    (0..n).into_par_iter().map(op).collect()
}

/// 对 `0..n` 每一帧实施 `op` 操作.
#[cfg(not(feature = "rayon"))]
fn map_frames<F>(n: usize, op: F) -> Vec<f64>
where
    F: Fn(usize) -> f64,
{
    (0..n).map(op).collect()
}

fn pearson<T: Copy + Into<f64>>(a: ArrayView2<T>, b: ArrayView2<T>) -> f64 {
    let len = a.len() as f64;
    let mean_a = a.iter().map(|&v| v.into()).sum::<f64>() / len;
    let mean_b = b.iter().map(|&v| v.into()).sum::<f64>() / len;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x.into() - mean_a, y.into() - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        cov / denom
    } else {
        0.0
    }
}

/// 复用 FFT 计划的二维 FFT.
struct Fft2d {
    h: usize,
    w: usize,
    row: Arc<dyn Fft<f64>>,
    col: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    fn new(h: usize, w: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            h,
            w,
            row: planner.plan_fft_forward(w),
            col: planner.plan_fft_forward(h),
        }
    }

    fn top_magnitude_mean<T: Copy + Into<f64>>(&self, frame: ArrayView2<T>) -> f64 {
        let (h, w) = (self.h, self.w);

        // 行方向
        let mut buf: Vec<Complex<f64>> = frame
            .iter()
            .map(|&v| Complex::new(v.into(), 0.0))
            .collect();
        self.row.process(&mut buf);

        // 转置后做列方向
        let mut t = vec![Complex::new(0.0, 0.0); h * w];
        for r in 0..h {
            for c in 0..w {
                t[c * h + r] = buf[r * w + c];
            }
        }
        self.col.process(&mut t);

        let mut mags: Vec<f64> = t.iter().map(|c| c.norm()).collect();
        let k = ((1.0 - BLUR_TOP_FRACTION) * mags.len() as f64) as usize;
        let k = k.min(mags.len() - 1);
        mags.select_nth_unstable_by(k, f64::total_cmp);
        let top = &mags[k..];
        top.iter().sum::<f64>() / top.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{blurring_score, crop_frames, frame_correlation};
    use ndarray::Array3;

    #[test]
    fn test_frame_correlation() {
        let mut frames = Array3::<f32>::zeros((3, 4, 4));
        for ((z, h, w), v) in frames.indexed_iter_mut() {
            *v = match z {
                0 => (h * 4 + w) as f32,
                1 => (h * 4 + w) as f32 * 2.0 + 1.0,
                _ => 15.0 - (h * 4 + w) as f32,
            };
        }
        let c = frame_correlation(frames.view());
        assert_eq!(c.len(), 3);
        assert!((c[0] - 1.0).abs() < 1e-9);
        assert!((c[1] + 1.0).abs() < 1e-9);
        assert_eq!(c[2], 0.0);

        let flat = Array3::<u8>::from_elem((2, 3, 3), 7);
        assert_eq!(frame_correlation(flat.view()), vec![0.0, 0.0]);
    }

    /// 带有细节纹理的帧比均匀帧更 "锐利".
    #[test]
    fn test_blurring_score() {
        let mut frames = Array3::<f32>::from_elem((2, 8, 8), 1.0);
        for ((z, h, w), v) in frames.indexed_iter_mut() {
            if z == 1 {
                *v += ((h * 3 + w * 5) % 4) as f32 * 0.5;
            }
        }
        let b = blurring_score(frames.view());
        assert_eq!(b.len(), 2);
        assert!(b[1] > b[0]);
    }

    #[test]
    fn test_crop_frames() {
        let frames = Array3::<u8>::zeros((5, 100, 80));
        assert_eq!(crop_frames(frames.view(), 10..60, 20..200).dim(), (5, 50, 60));
        assert_eq!(crop_frames(frames.view(), 120..130, 0..10).dim(), (5, 0, 10));
    }
}
