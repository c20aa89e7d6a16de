//! Easing curves for the page snap animation

/// Ease-out cubic: fast start, gentle landing
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Ease-in-out cubic
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation (no easing)
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// An easing curve usable by [`PanConfig`](crate::shell::PanConfig)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// [`linear`]
    Linear,
    /// [`ease_out_cubic`]
    #[default]
    OutCubic,
    /// [`ease_in_out_cubic`]
    InOutCubic,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress in `[0, 1]`
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => linear(t),
            Easing::OutCubic => ease_out_cubic(t),
            Easing::InOutCubic => ease_in_out_cubic(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_endpoints() {
        for easing in [Easing::Linear, Easing::OutCubic, Easing::InOutCubic] {
            assert!((easing.apply(0.0) - 0.0).abs() < 0.001, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{:?}", easing);
        }
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 0.001);
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        assert_eq!(ease_out_cubic(-1.0), 0.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn easing_bounded_output(t in 0.0f64..=1.0) {
            for easing in [Easing::Linear, Easing::OutCubic, Easing::InOutCubic] {
                let result = easing.apply(t);
                prop_assert!((0.0..=1.0).contains(&result), "{:?}({}) = {}", easing, t, result);
            }
        }

        #[test]
        fn ease_out_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease_out_cubic(lo) <= ease_out_cubic(hi));
        }
    }
}
