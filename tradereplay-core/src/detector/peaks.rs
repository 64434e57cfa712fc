//! One-dimensional peak finding with distance and prominence filters.
//!
//! A peak is a sample strictly above its left neighbour and strictly above the
//! first differing sample to its right. Flat tops count once, at the plateau
//! midpoint (rounded down). The first and last samples are never peaks.

/// Indices of all local maxima, ascending.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Vertical distance between a peak and the higher of its two bases.
///
/// Each base is the lowest sample between the peak and the nearest strictly
/// higher sample on that side, or the series edge if there is none.
pub fn prominence(x: &[f64], peak: usize) -> f64 {
    let height = x[peak];
    let left_base = x[..=peak]
        .iter()
        .rev()
        .take_while(|v| **v <= height)
        .fold(height, |m, v| m.min(*v));
    let right_base = x[peak..]
        .iter()
        .take_while(|v| **v <= height)
        .fold(height, |m, v| m.min(*v));
    height - left_base.max(right_base)
}

/// Drop peaks closer than `distance` samples to a higher kept peak.
///
/// Peaks are visited highest first; among equal heights the later index wins.
pub fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let distance = distance.max(1);
    let mut keep = vec![true; n];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Local maxima at least `distance` apart with at least `min_prominence`.
///
/// The distance filter runs before the prominence filter.
pub fn find_peaks(x: &[f64], distance: usize, min_prominence: f64) -> Vec<usize> {
    let peaks = local_maxima(x);
    select_by_distance(x, &peaks, distance)
        .into_iter()
        .filter(|&p| prominence(x, p) >= min_prominence)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_spike() {
        assert_eq!(local_maxima(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]), vec![3]);
    }

    #[test]
    fn edges_are_never_peaks() {
        assert!(local_maxima(&[5.0, 1.0, 0.0, 1.0, 5.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
        assert!(local_maxima(&[]).is_empty());
    }

    #[test]
    fn plateau_reports_midpoint() {
        // plateau spans 2..=5, midpoint (2 + 5) / 2 = 3
        assert_eq!(local_maxima(&[0.0, 1.0, 3.0, 3.0, 3.0, 3.0, 1.0]), vec![3]);
        // plateau running into the last sample is not a peak
        assert!(local_maxima(&[0.0, 1.0, 3.0, 3.0]).is_empty());
    }

    #[test]
    fn prominence_uses_higher_base() {
        // peak at 3 (height 4): left base min(x[1..=3]) = 1 (stops at x[0]=5 > 4),
        // right base min(x[3..]) = 0 → prominence 4 - max(1, 0) = 3
        let x = [5.0, 1.0, 2.0, 4.0, 0.0];
        assert_eq!(local_maxima(&x), vec![3]);
        assert!((prominence(&x, 3) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn distance_keeps_higher_peak() {
        let x = [0.0, 2.0, 0.0, 3.0, 0.0, 1.0, 0.0];
        let peaks = local_maxima(&x);
        assert_eq!(peaks, vec![1, 3, 5]);
        assert_eq!(select_by_distance(&x, &peaks, 3), vec![3]);
        assert_eq!(select_by_distance(&x, &peaks, 2), vec![1, 3, 5]);
    }

    #[test]
    fn distance_tie_prefers_later_peak() {
        let x = [0.0, 2.0, 0.0, 2.0, 0.0];
        assert_eq!(select_by_distance(&x, &[1, 3], 3), vec![3]);
    }

    #[test]
    fn prominence_filter() {
        let x = [0.0, 0.05, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, 1, 0.1), vec![3]);
        assert_eq!(find_peaks(&x, 1, 0.0), vec![1, 3]);
    }
}
