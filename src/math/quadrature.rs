//! Adaptive Gauss–Kronrod quadrature with a reusable workspace.
//!
//! The G7-K15 rule is applied to the whole interval; while the summed error
//! estimate exceeds the tolerance, the interval with the largest error is
//! bisected. The interval list lives in a [`QuadratureWorkspace`] whose
//! capacity is fixed at construction, so repeated integrals (one or more per
//! data point, every solver iteration) never reallocate.

/// Kronrod nodes on `[-1, 1]`; odd indices are the 7 Gauss nodes.
const XGK: [f64; 15] = [
    -0.991_455_371_120_812_6,
    -0.949_107_912_342_758_5,
    -0.864_864_423_359_769_1,
    -0.741_531_185_599_394_4,
    -0.586_087_235_467_691_1,
    -0.405_845_151_377_397_2,
    -0.207_784_955_007_898_5,
    0.0,
    0.207_784_955_007_898_5,
    0.405_845_151_377_397_2,
    0.586_087_235_467_691_1,
    0.741_531_185_599_394_4,
    0.864_864_423_359_769_1,
    0.949_107_912_342_758_5,
    0.991_455_371_120_812_6,
];

const WGK: [f64; 15] = [
    0.022_935_322_010_529_224,
    0.063_092_092_629_978_56,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_89,
    0.209_482_141_084_727_82,
    0.204_432_940_075_298_89,
    0.190_350_578_064_785_4,
    0.169_004_726_639_267_9,
    0.140_653_259_715_525_92,
    0.104_790_010_322_250_18,
    0.063_092_092_629_978_56,
    0.022_935_322_010_529_224,
];

const WG: [f64; 7] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_64,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
    0.381_830_050_505_118_9,
    0.279_705_391_489_276_64,
    0.129_484_966_168_869_7,
];

/// Narrowest half-interval, in units of the spacing of doubles at its
/// midpoint, that may still be bisected.
const MIN_WIDTH_ULPS: f64 = 1000.0;

/// Absolute and relative error targets.
///
/// The integral is accepted once `error <= max(atol, rtol * |integral|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Default for QuadTolerance {
    fn default() -> Self {
        Self { atol: 0.0, rtol: 1e-7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadResult {
    pub integral: f64,
    pub error: f64,
    pub intervals: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    a: f64,
    b: f64,
    integral: f64,
    error: f64,
    abs_integral: f64,
}

/// Interval storage for [`QuadratureWorkspace::integrate`].
#[derive(Debug, Clone)]
pub struct QuadratureWorkspace {
    limit: usize,
    intervals: Vec<Interval>,
}

impl QuadratureWorkspace {
    /// Workspace allowing at most `limit` subintervals (at least 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            intervals: Vec::with_capacity(limit),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn capacity(&self) -> usize {
        self.intervals.capacity()
    }

    /// Integrate `f` over `[a, b]`.
    ///
    /// Reversed bounds give the negated integral. When the subdivision budget
    /// runs out, the worst interval has shrunk to rounding level, or the
    /// integrand produces non-finite values, the current estimate is returned
    /// with `converged == false`.
    pub fn integrate<F>(&mut self, f: F, a: f64, b: f64, tol: QuadTolerance) -> QuadResult
    where
        F: Fn(f64) -> f64,
    {
        if a == b {
            return QuadResult {
                integral: 0.0,
                error: 0.0,
                intervals: 0,
                converged: true,
            };
        }
        if a > b {
            let r = self.integrate(f, b, a, tol);
            return QuadResult {
                integral: -r.integral,
                ..r
            };
        }

        self.intervals.clear();
        let (integral, error, abs_integral) = gauss_kronrod_15(&f, a, b);
        self.intervals.push(Interval {
            a,
            b,
            integral,
            error,
            abs_integral,
        });

        let mut total = integral;
        let mut total_error = error;
        let mut total_abs = abs_integral;

        loop {
            if !(total.is_finite() && total_error.is_finite()) {
                return self.finish(total, total_error, false);
            }
            let target = tol.atol.max(tol.rtol * total.abs());
            if total_error <= target {
                return self.finish(total, total_error, true);
            }
            // Error already at rounding level of the integrand.
            if total_error <= 50.0 * f64::EPSILON * total_abs {
                return self.finish(total, total_error, true);
            }
            if self.intervals.len() >= self.limit {
                log::trace!(
                    "quadrature budget of {} intervals exhausted on [{a}, {b}] (error {total_error:e})",
                    self.limit
                );
                return self.finish(total, total_error, false);
            }

            let Some(worst) = self.worst_interval() else {
                return self.finish(total, total_error, false);
            };
            let iv = self.intervals[worst];
            let mid = 0.5 * (iv.a + iv.b);
            // Halves this narrow would put Kronrod nodes on the bounds.
            if 0.5 * (iv.b - iv.a) <= MIN_WIDTH_ULPS * (f64::EPSILON * mid.abs() + f64::MIN_POSITIVE) {
                log::trace!("quadrature interval [{}, {}] at rounding level", iv.a, iv.b);
                return self.finish(total, total_error, false);
            }
            self.intervals.swap_remove(worst);
            let (i1, e1, abs1) = gauss_kronrod_15(&f, iv.a, mid);
            let (i2, e2, abs2) = gauss_kronrod_15(&f, mid, iv.b);

            total += i1 + i2 - iv.integral;
            total_error += e1 + e2 - iv.error;
            total_abs += abs1 + abs2 - iv.abs_integral;

            self.intervals.push(Interval {
                a: iv.a,
                b: mid,
                integral: i1,
                error: e1,
                abs_integral: abs1,
            });
            self.intervals.push(Interval {
                a: mid,
                b: iv.b,
                integral: i2,
                error: e2,
                abs_integral: abs2,
            });
        }
    }

    fn worst_interval(&self) -> Option<usize> {
        self.intervals
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.error.total_cmp(&y.1.error))
            .map(|(i, _)| i)
    }

    fn finish(&self, integral: f64, error: f64, converged: bool) -> QuadResult {
        QuadResult {
            integral,
            error,
            intervals: self.intervals.len(),
            converged,
        }
    }
}

/// G7-K15 on `[a, b]`: `(kronrod, |kronrod - gauss|, ∫|f|)`.
fn gauss_kronrod_15<F>(f: &F, a: f64, b: f64) -> (f64, f64, f64)
where
    F: Fn(f64) -> f64,
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let mut kronrod = 0.0;
    let mut gauss = 0.0;
    let mut abs_sum = 0.0;
    for (i, (&node, &wk)) in XGK.iter().zip(WGK.iter()).enumerate() {
        let v = f(center + half * node);
        kronrod += wk * v;
        abs_sum += wk * v.abs();
        if i % 2 == 1 {
            gauss += WG[i / 2] * v;
        }
    }

    let kronrod = kronrod * half;
    let gauss = gauss * half;
    (kronrod, (kronrod - gauss).abs(), abs_sum * half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn integrates_sine_over_half_period() {
        let mut ws = QuadratureWorkspace::new(100);
        let r = ws.integrate(f64::sin, 0.0, PI, QuadTolerance::default());
        assert!(r.converged);
        assert_relative_eq!(r.integral, 2.0, max_relative = 1e-10);
    }

    #[test]
    fn subdivides_near_endpoint_singularity() {
        let mut ws = QuadratureWorkspace::new(2000);
        let r = ws.integrate(|x: f64| 1.0 / x.sqrt(), 0.0, 1.0, QuadTolerance::default());
        assert!(r.intervals > 1);
        assert_relative_eq!(r.integral, 2.0, max_relative = 1e-6);
    }

    #[test]
    fn reversed_bounds_negate() {
        let mut ws = QuadratureWorkspace::new(50);
        let fwd = ws.integrate(|x: f64| x * x, 0.0, 2.0, QuadTolerance::default());
        let back = ws.integrate(|x: f64| x * x, 2.0, 0.0, QuadTolerance::default());
        assert_relative_eq!(fwd.integral, 8.0 / 3.0, max_relative = 1e-12);
        assert_eq!(back.integral, -fwd.integral);
    }

    #[test]
    fn workspace_is_not_regrown() {
        let mut ws = QuadratureWorkspace::new(64);
        let cap = ws.capacity();
        for k in 1..20 {
            let k = k as f64;
            ws.integrate(|x: f64| (k * x).cos().powi(2), 0.0, 10.0, QuadTolerance::default());
        }
        assert_eq!(ws.capacity(), cap);
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let mut ws = QuadratureWorkspace::new(2);
        let r = ws.integrate(
            |x: f64| (50.0 * x).sin(),
            0.0,
            10.0,
            QuadTolerance { atol: 0.0, rtol: 1e-14 },
        );
        assert!(!r.converged);
        assert!(r.intervals <= 2);
    }

    #[test]
    fn bisection_stops_at_rounding_level() {
        // Singular at the lower bound, which sits away from zero.
        let mut ws = QuadratureWorkspace::new(2000);
        let r = ws.integrate(
            |x: f64| 1.0 / (x - 1.0).sqrt(),
            1.0,
            2.0,
            QuadTolerance { atol: 0.0, rtol: 1e-14 },
        );
        assert!(!r.converged);
        assert!(r.integral.is_finite());
        assert!(r.intervals < 2000);
        assert_relative_eq!(r.integral, 2.0, max_relative = 1e-6);
    }

    #[test]
    fn non_finite_integrand_stops_early() {
        let mut ws = QuadratureWorkspace::new(2000);
        let r = ws.integrate(|_| f64::NAN, 0.0, 1.0, QuadTolerance::default());
        assert!(!r.converged);
        assert!(r.integral.is_nan());
        assert_eq!(r.intervals, 1);
    }
}
