//! Binary threshold helpers for the preprocessing chain.

/// In-place binary threshold: values strictly above `cutoff` become 255,
/// everything else 0.
pub(crate) fn apply_binary_threshold(data: &mut [u8], cutoff: u8) {
    for v in data.iter_mut() {
        *v = if *v > cutoff { 255 } else { 0 };
    }
}

/// Global Otsu threshold over a full image histogram.
///
/// Picks the cutoff that maximizes the between-class variance of the
/// foreground/background split.
pub(crate) fn otsu_threshold(data: &[u8]) -> u8 {
    if data.is_empty() {
        return 127;
    }

    let mut hist = [0u32; 256];
    for &v in data {
        hist[v as usize] += 1;
    }

    let min_v = data.iter().copied().min().unwrap_or(0);
    let max_v = data.iter().copied().max().unwrap_or(255);
    if min_v == max_v {
        return min_v;
    }

    let total = data.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| (i as f64) * (h as f64))
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}
