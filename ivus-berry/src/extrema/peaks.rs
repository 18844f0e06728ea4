//! 单一方向 (极大值) 的峰检测. 极小值检测时调用方先对信号取负.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// 严格局部极大值. 平台取第一个索引, 两个端点永远不是候选.
pub(super) fn local_peaks(v: &[f64]) -> Vec<usize> {
    let n = v.len();
    let mut ans = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if v[i - 1] < v[i] {
            let mut j = i + 1;
            while j + 1 < n && v[j] == v[i] {
                j += 1;
            }
            if v[j] < v[i] {
                ans.push(i);
            }
            i = j;
        } else {
            i += 1;
        }
    }
    ans
}

/// `i` 是否为 `[i - half, i + half]` 窗口内的最大值.
///
/// 窗口内更早出现的相等值优先, 此时 `i` 不是最大值.
pub(super) fn dominates_window(v: &[f64], i: usize, half: usize) -> bool {
    let lo = i.saturating_sub(half);
    let hi = (i + half + 1).min(v.len());
    v[lo..i].iter().all(|&x| x < v[i]) && v[i + 1..hi].iter().all(|&x| x <= v[i])
}

/// 按峰值从高到低 (相等时索引小者优先) 保留峰,
/// 删除与已保留峰距离小于 `distance` 的峰. `peaks` 必须升序.
pub(super) fn filter_by_distance(v: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut priority: Vec<usize> = (0..peaks.len()).collect();
    priority.sort_by_key(|&k| (Reverse(OrderedFloat(v[peaks[k]])), peaks[k]));

    let mut keep = vec![true; peaks.len()];
    for k in priority {
        if !keep[k] {
            continue;
        }
        let p = peaks[k];
        for j in (0..k).rev().take_while(|&j| p - peaks[j] < distance) {
            keep[j] = false;
        }
        for j in (k + 1..peaks.len()).take_while(|&j| peaks[j] - p < distance) {
            keep[j] = false;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// 地形显著度: 峰值减去两侧 "基底" 中较高者.
///
/// 每一侧的基底是从峰出发、直到遇到更高的点 (或信号边界) 为止经过的最小值.
pub(super) fn prominence(v: &[f64], i: usize) -> f64 {
    let peak = v[i];
    let left = v[..=i]
        .iter()
        .rev()
        .take_while(|&&x| x <= peak)
        .fold(peak, |m, &x| m.min(x));
    let right = v[i..]
        .iter()
        .take_while(|&&x| x <= peak)
        .fold(peak, |m, &x| m.min(x));
    peak - left.max(right)
}

/// 线性插值百分位数, `q` 位于 `[0, 100]`. 空输入返回 `None`.
pub(super) fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}
