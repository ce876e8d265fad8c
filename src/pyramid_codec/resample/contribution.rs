//! Contribution lists: the `(source index, weight)` pairs feeding one
//! destination coordinate along one axis.

use crate::pyramid_codec::resample::filters::Filter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub pixel: usize,
    pub weight: f64,
}

/// Maps a raw sample index into `0..len`.
///
/// Negative indices mirror around 0 without repeating it (`-1 -> 1`), indices
/// past the end mirror around the last sample repeating it (`len -> len - 1`).
/// The step is repeated until the index lands inside the source, which only
/// happens more than once for windows wider than the source itself.
///
/// `len` must be non-zero.
pub fn reflect_index(i: isize, len: usize) -> usize {
    debug_assert!(len > 0, "reflect_index on an empty axis");
    let n = len as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = (n - i) + n - 1;
        } else {
            return i as usize;
        }
    }
}

/// Builds the contribution list for destination coordinate `dest_index`.
///
/// When shrinking (`scale < 1`) the kernel is stretched by `1 / scale` and its
/// weights scaled down by the same factor, so it integrates over the source
/// footprint of a destination pixel. When expanding the kernel is used as is.
pub fn compute_contributions(
    dest_index: usize,
    scale: f64,
    filter: &Filter,
    src_len: usize,
) -> Vec<Contribution> {
    let (width, stretch) = if scale < 1.0 {
        (filter.support() / scale, 1.0 / scale)
    } else {
        (filter.support(), 1.0)
    };

    let center = dest_index as f64 / scale;
    let left = (center - width).ceil() as isize;
    let right = (center + width).floor() as isize;

    let mut contributions = Vec::with_capacity((right - left + 1).max(0) as usize);
    for i in left..=right {
        let weight = filter.weight((center - i as f64) / stretch) / stretch;
        contributions.push(Contribution {
            pixel: reflect_index(i, src_len),
            weight,
        });
    }
    contributions
}

/// Contribution lists for every coordinate of a destination axis.
pub fn axis_contributions(
    src_len: usize,
    dest_len: usize,
    filter: &Filter,
) -> Vec<Vec<Contribution>> {
    let scale = dest_len as f64 / src_len as f64;
    (0..dest_len)
        .map(|i| compute_contributions(i, scale, filter, src_len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid_codec::resample::filters::FilterKind;

    #[test]
    fn reflect_matches_single_step_in_range() {
        let len = 5;
        let cases = [(-4, 4), (-1, 1), (0, 0), (4, 4), (5, 4), (6, 3), (9, 0)];
        for (i, expected) in cases {
            assert_eq!(reflect_index(i, len), expected, "i={i}");
        }
    }

    #[test]
    fn reflect_folds_far_indices_into_range() {
        // -3 on a 3-wide axis: first step gives 3, which folds again to 2
        assert_eq!(reflect_index(-3, 3), 2);
        for len in 1..6usize {
            for i in -40..40isize {
                assert!(reflect_index(i, len) < len, "i={i} len={len}");
            }
        }
    }

    #[test]
    fn expanding_lanczos_uses_native_window() {
        let filter = FilterKind::Lanczos3.filter();
        let list = compute_contributions(4, 3.0, &filter, 3);
        // center = 4/3, window ceil(-1.67)..=floor(4.33) => -1..=4
        assert_eq!(list.len(), 6);
        assert!(list.iter().all(|c| c.pixel < 3));
    }

    #[test]
    fn shrinking_weights_sum_to_one_in_interior() {
        for kind in [FilterKind::Triangle, FilterKind::Bell, FilterKind::BSpline] {
            let filter = kind.filter();
            let list = compute_contributions(10, 1.0 / 3.0, &filter, 90);
            let total: f64 = list.iter().map(|c| c.weight).sum();
            assert!((total - 1.0).abs() < 1e-9, "{kind:?}: {total}");
        }
    }

    #[test]
    fn unit_scale_interpolating_kernels_pick_the_source_pixel() {
        for kind in FilterKind::ALL.into_iter().filter(|k| k.is_interpolating()) {
            let filter = kind.filter();
            let list = compute_contributions(2, 1.0, &filter, 6);
            for c in &list {
                if c.pixel == 2 {
                    assert!((c.weight - 1.0).abs() < 1e-12, "{kind:?}");
                } else {
                    assert!(c.weight.abs() < 1e-12, "{kind:?}");
                }
            }
        }
    }

    #[test]
    fn axis_lists_cover_destination() {
        let filter = FilterKind::Mitchell.filter();
        let lists = axis_contributions(7, 19, &filter);
        assert_eq!(lists.len(), 19);
        assert!(lists.iter().all(|l| !l.is_empty()));
    }
}
