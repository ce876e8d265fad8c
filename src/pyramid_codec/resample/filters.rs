//! Interpolation kernels for the separable resampler.
//!
//! Every kernel is symmetric and evaluates to zero at or beyond its support
//! radius. The Box kernel is the exception to strict symmetry: it accepts
//! `t == 0.5` but rejects `t == -0.5`.

use std::f64::consts::PI;

use crate::pyramid_codec::common::error::{CodecError, Result};

const BOX_SUPPORT: f64 = 0.5;
const HERMITE_SUPPORT: f64 = 1.0;
const TRIANGLE_SUPPORT: f64 = 1.0;
const BELL_SUPPORT: f64 = 1.5;
const B_SPLINE_SUPPORT: f64 = 2.0;
const LANCZOS3_SUPPORT: f64 = 3.0;
const MITCHELL_SUPPORT: f64 = 2.0;

const MITCHELL_B: f64 = 1.0 / 3.0;
const MITCHELL_C: f64 = 1.0 / 3.0;

/// A kernel function paired with its support radius.
#[derive(Debug, Clone, Copy)]
pub struct Filter {
    function: fn(f64) -> f64,
    support: f64,
}

impl Filter {
    pub fn weight(&self, t: f64) -> f64 {
        (self.function)(t)
    }

    pub fn support(&self) -> f64 {
        self.support
    }
}

static FILTERS: [Filter; 7] = [
    Filter { function: box_filter, support: BOX_SUPPORT },
    Filter { function: hermite_filter, support: HERMITE_SUPPORT },
    Filter { function: triangle_filter, support: TRIANGLE_SUPPORT },
    Filter { function: bell_filter, support: BELL_SUPPORT },
    Filter { function: b_spline_filter, support: B_SPLINE_SUPPORT },
    Filter { function: lanczos3_filter, support: LANCZOS3_SUPPORT },
    Filter { function: mitchell_filter, support: MITCHELL_SUPPORT },
];

/// Selects one of the seven kernels. Discriminants are the stable filter indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Box = 0,
    Hermite = 1,
    Triangle = 2,
    Bell = 3,
    BSpline = 4,
    Lanczos3 = 5,
    Mitchell = 6,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        FilterKind::Box,
        FilterKind::Hermite,
        FilterKind::Triangle,
        FilterKind::Bell,
        FilterKind::BSpline,
        FilterKind::Lanczos3,
        FilterKind::Mitchell,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn filter(self) -> Filter {
        FILTERS[self.index()]
    }

    /// Whether the kernel is 1 at zero and 0 at every other integer, so that a
    /// resample at scale 1 reproduces its input.
    pub fn is_interpolating(self) -> bool {
        matches!(
            self,
            FilterKind::Box | FilterKind::Hermite | FilterKind::Triangle | FilterKind::Lanczos3
        )
    }
}

impl TryFrom<usize> for FilterKind {
    type Error = CodecError;

    fn try_from(index: usize) -> Result<Self> {
        FilterKind::ALL
            .get(index)
            .copied()
            .ok_or(CodecError::InvalidFilter(index))
    }
}

fn box_filter(t: f64) -> f64 {
    if t > -0.5 && t <= 0.5 { 1.0 } else { 0.0 }
}

fn hermite_filter(t: f64) -> f64 {
    // f(t) = 2|t|^3 - 3|t|^2 + 1
    let t = t.abs();
    if t < 1.0 {
        (2.0 * t - 3.0) * t * t + 1.0
    } else {
        0.0
    }
}

fn triangle_filter(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 { 1.0 - t } else { 0.0 }
}

// box (*) box (*) box
fn bell_filter(t: f64) -> f64 {
    let t = t.abs();
    if t < 0.5 {
        0.75 - t * t
    } else if t < 1.5 {
        let t = t - 1.5;
        0.5 * t * t
    } else {
        0.0
    }
}

// box (*) box (*) box (*) box
fn b_spline_filter(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        let tt = t * t;
        0.5 * tt * t - tt + 2.0 / 3.0
    } else if t < 2.0 {
        let t = 2.0 - t;
        t * t * t / 6.0
    } else {
        0.0
    }
}

fn sinc(x: f64) -> f64 {
    let x = x * PI;
    if x != 0.0 { x.sin() / x } else { 1.0 }
}

fn lanczos3_filter(t: f64) -> f64 {
    let t = t.abs();
    if t < 3.0 {
        sinc(t) * sinc(t / 3.0)
    } else {
        0.0
    }
}

fn mitchell_filter(t: f64) -> f64 {
    let t = t.abs();
    let tt = t * t;
    if t < 1.0 {
        ((12.0 - 9.0 * MITCHELL_B - 6.0 * MITCHELL_C) * (t * tt)
            + (-18.0 + 12.0 * MITCHELL_B + 6.0 * MITCHELL_C) * tt
            + (6.0 - 2.0 * MITCHELL_B))
            / 6.0
    } else if t < 2.0 {
        ((-MITCHELL_B - 6.0 * MITCHELL_C) * (t * tt)
            + (6.0 * MITCHELL_B + 30.0 * MITCHELL_C) * tt
            + (-12.0 * MITCHELL_B - 48.0 * MITCHELL_C) * t
            + (8.0 * MITCHELL_B + 24.0 * MITCHELL_C))
            / 6.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn index_round_trips_through_try_from() {
        for (i, kind) in FilterKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(FilterKind::try_from(i).unwrap(), *kind);
        }
        assert!(matches!(FilterKind::try_from(7), Err(CodecError::InvalidFilter(7))));
    }

    #[test]
    fn supports_match_kernel_table() {
        let expected = [0.5, 1.0, 1.0, 1.5, 2.0, 3.0, 2.0];
        for (kind, support) in FilterKind::ALL.iter().zip(expected) {
            assert_eq!(kind.filter().support(), support);
        }
    }

    #[test]
    fn kernels_vanish_at_and_beyond_support() {
        for kind in FilterKind::ALL {
            let filter = kind.filter();
            for t in [filter.support() + 1e-9, filter.support() + 0.75, 10.0] {
                assert_eq!(filter.weight(t), 0.0, "{kind:?} at {t}");
                assert_eq!(filter.weight(-t), 0.0, "{kind:?} at {}", -t);
            }
        }
    }

    #[test]
    fn box_is_half_open() {
        let filter = FilterKind::Box.filter();
        assert_eq!(filter.weight(0.5), 1.0);
        assert_eq!(filter.weight(-0.5), 0.0);
        assert_eq!(filter.weight(0.0), 1.0);
    }

    #[test]
    fn known_kernel_values() {
        let hermite = FilterKind::Hermite.filter();
        assert!((hermite.weight(0.5) - 0.5).abs() < EPS);

        let triangle = FilterKind::Triangle.filter();
        assert!((triangle.weight(-0.25) - 0.75).abs() < EPS);

        let bell = FilterKind::Bell.filter();
        assert!((bell.weight(0.0) - 0.75).abs() < EPS);
        assert!((bell.weight(1.0) - 0.125).abs() < EPS);

        let b_spline = FilterKind::BSpline.filter();
        assert!((b_spline.weight(0.0) - 2.0 / 3.0).abs() < EPS);
        assert!((b_spline.weight(1.0) - 1.0 / 6.0).abs() < EPS);

        let lanczos = FilterKind::Lanczos3.filter();
        assert_eq!(lanczos.weight(0.0), 1.0);
        assert!(lanczos.weight(1.0).abs() < EPS);
        assert!(lanczos.weight(2.0).abs() < EPS);

        let mitchell = FilterKind::Mitchell.filter();
        assert!((mitchell.weight(0.0) - 8.0 / 9.0).abs() < EPS);
        assert!((mitchell.weight(1.0) - 1.0 / 18.0).abs() < EPS);
    }

    #[test]
    fn kernels_are_symmetric_except_box_edge() {
        for kind in FilterKind::ALL {
            let filter = kind.filter();
            for step in 0..40 {
                let t = step as f64 * 0.073;
                if kind == FilterKind::Box && (t - 0.5).abs() < EPS {
                    continue;
                }
                assert!((filter.weight(t) - filter.weight(-t)).abs() < EPS, "{kind:?} at {t}");
            }
        }
    }
}
