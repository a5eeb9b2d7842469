//! Resonant tunneling with unequal lead couplings.
//!
//! The line shape has no closed form. For conductance `g`,
//!
//! ```text
//! P(g) = N g^(-3/2) ∫_a^b p(x) dx,      a, b = (2 - g ∓ 2√(1 - g)) / g
//!
//! p(x) = x / (t2 √(t1 t2)) · (1 + (γL + x γR)² / t2)
//!        · exp(-(x γL - γR)² / (2 t2) - r² (γL² + γR²) t1 / (8 t2 g))
//!
//! t1 = 4x - g (1 + x)²,   t2 = 1 + x²
//! ```
//!
//! `t1` vanishes at both bounds, so the integrand has `1/√t1` endpoint
//! singularities. Since `ab = 1`, `t1 = g (x - a)(b - x)`, and the change of
//! variables `x = (a + b)/2 + (b - a)/2 · cos θ` gives `dx / √t1 = -dθ / √g`:
//! every integral below is taken over `θ ∈ [0, π]` with a smooth integrand.
//!
//! Residuals are plain differences `P(g) - f`.

use std::cell::RefCell;
use std::f64::consts::PI;

use crate::domain::Dataset;
use crate::math::{QuadTolerance, QuadratureWorkspace};
use crate::models::model::{LineShapeModel, product_grid};

pub const GAMMAL: usize = 0;
pub const GAMMAR: usize = 1;
pub const R: usize = 2;
pub const NORM: usize = 3;

const NAMES: &[&str] = &["gammal", "gammar", "r", "norm"];
const DISPLAY_NAMES: &[&str] = &["gammaL", "gammaR", "r", "norm"];
const REQUIRED: &[&str] = &["gammal", "gammar", "r"];

/// Subinterval budget for each integral.
pub const QUAD_LIMIT: usize = 2000;

pub struct AsymmetricResonant<'a> {
    data: &'a Dataset,
    workspace: RefCell<QuadratureWorkspace>,
    tol: QuadTolerance,
}

/// Which integral to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Integral {
    Density,
    /// `∫ x A E √t1 / t2^(5/2) dx`; `∂P/∂r` up to prefactors.
    Coupling,
    DGammaL,
    DGammaR,
}

/// Integration chord `[a, b]` for one conductance value.
#[derive(Debug, Clone, Copy)]
struct Chord {
    g: f64,
    center: f64,
    half: f64,
}

impl Chord {
    fn new(g: f64) -> Self {
        let s = (1.0 - g).sqrt();
        Self {
            g,
            center: (2.0 - g) / g,
            half: 2.0 * s / g,
        }
    }

    /// `(x, t1)` at angle `theta`.
    fn point(&self, theta: f64) -> (f64, f64) {
        let (s, c) = theta.sin_cos();
        let x = self.center + self.half * c;
        (x, self.g * self.half * self.half * s * s)
    }
}

impl<'a> AsymmetricResonant<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self::with_tolerance(data, QuadTolerance { atol: 0.0, rtol: 1e-7 })
    }

    /// Model whose integrals are taken to `tol` instead of the stock `1e-7`
    /// relative.
    pub fn with_tolerance(data: &'a Dataset, tol: QuadTolerance) -> Self {
        Self {
            data,
            workspace: RefCell::new(QuadratureWorkspace::new(QUAD_LIMIT)),
            tol,
        }
    }

    /// One of the integrals at conductance `g`, including the `1/√g` from the
    /// change of variables.
    fn integral(&self, which: Integral, params: &[f64], g: f64) -> f64 {
        let chord = Chord::new(g);
        let result = self
            .workspace
            .borrow_mut()
            .integrate(|theta| integrand(which, params, &chord, theta), 0.0, PI, self.tol);
        if !result.converged {
            log::trace!(
                "{which:?} integral at g={g} not converged (error {:e})",
                result.error
            );
        }
        result.integral / g.sqrt()
    }

    fn derivatives(&self, params: &[f64], g: f64, density: f64, out: &mut [f64]) {
        let (gl, gr, r, norm) = (params[GAMMAL], params[GAMMAR], params[R], params[NORM]);
        let g15 = g * g.sqrt();

        out[GAMMAL] = norm / g15 * self.integral(Integral::DGammaL, params, g);
        out[GAMMAR] = norm / g15 * self.integral(Integral::DGammaR, params, g);
        out[R] = -0.25 * norm * r * (gl * gl + gr * gr) / (g15 * g)
            * self.integral(Integral::Coupling, params, g);
        out[NORM] = density / g15;
    }
}

/// θ-space integrand (without the common `1/√g`).
fn integrand(which: Integral, params: &[f64], chord: &Chord, theta: f64) -> f64 {
    let (gl, gr, r) = (params[GAMMAL], params[GAMMAR], params[R]);
    let g = chord.g;
    let (x, t1) = chord.point(theta);

    let t2 = 1.0 + x * x;
    let lead = gl + x * gr;
    let t3 = lead * lead / t2;
    let skew = x * gl - gr;
    let e = (-0.5 * skew * skew / t2 - 0.125 * r * r * (gl * gl + gr * gr) * t1 / (t2 * g)).exp();
    let t2_52 = t2 * t2 * t2.sqrt();

    match which {
        Integral::Density => x * (1.0 + t3) * e / (t2 * t2.sqrt()),
        Integral::Coupling => x * (1.0 + t3) * e * t1 / t2_52,
        Integral::DGammaL => {
            x * e / t2_52
                * ((2.0 - x * x) * gl + 3.0 * x * gr
                    - t3 * x * skew
                    - 0.25 * (1.0 + t3) * r * r * gl * t1 / g)
        }
        Integral::DGammaR => {
            x * e / t2_52
                * (3.0 * x * gl + (2.0 * x * x - 1.0) * gr + t3 * skew
                    - 0.25 * (1.0 + t3) * r * r * gr * t1 / g)
        }
    }
}

pub(crate) fn create(data: &Dataset) -> Box<dyn LineShapeModel + '_> {
    Box::new(AsymmetricResonant::new(data))
}

impl LineShapeModel for AsymmetricResonant<'_> {
    fn name(&self) -> &'static str {
        "AsymmetricResonant"
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn display_names(&self) -> &'static [&'static str] {
        DISPLAY_NAMES
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn dataset(&self) -> &Dataset {
        self.data
    }

    fn evaluate(&self, params: &[f64], g: f64) -> f64 {
        params[NORM] * self.integral(Integral::Density, params, g) / (g * g.sqrt())
    }

    fn residual(&self, params: &[f64], g: f64, f: f64) -> f64 {
        self.evaluate(params, g) - f
    }

    fn jacobian(&self, params: &[f64], g: f64, _f: f64, out: &mut [f64]) {
        let density = self.integral(Integral::Density, params, g);
        self.derivatives(params, g, density, out);
    }

    fn resid_j(&self, params: &[f64], g: f64, f: f64, out: &mut [f64]) -> f64 {
        let density = self.integral(Integral::Density, params, g);
        self.derivatives(params, g, density, out);
        params[NORM] * density / (g * g.sqrt()) - f
    }

    fn default_guesses(&self) -> Vec<Vec<f64>> {
        const GAMMAS: [f64; 5] = [5.0, 10.0, 20.0, 30.0, 40.0];
        product_grid(&[&GAMMAS, &GAMMAS, &[0.1, 0.5, 1.0, 2.0, 10.0], &[1.0]])
    }

    fn process_fit_parameters(&self, params: &mut [f64]) {
        if params[GAMMAL] < 0.0 && params[GAMMAR] < 0.0 {
            params[GAMMAL] = -params[GAMMAL];
            params[GAMMAR] = -params[GAMMAR];
        }
        // the line shape is symmetric under γL <-> γR
        if params[GAMMAL] > params[GAMMAR] {
            params.swap(GAMMAL, GAMMAR);
        }
        params[R] = params[R].abs();
    }

    fn is_good_fit(&self, params: &[f64]) -> bool {
        params[GAMMAL] > 0.0 && params[GAMMAR] > 0.0
    }
}
