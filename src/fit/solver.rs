//! Levenberg–Marquardt iteration.
//!
//! Each [`LevenbergMarquardt::iterate`] call proposes damped Gauss–Newton
//! steps until one reduces the sum of squares by enough relative to the
//! linear model's prediction (gain ratio `ρ`), or gives up after a fixed
//! number of rejections. Damping follows Nielsen's rule:
//!
//! - accept: `μ ← μ · max(1/3, 1 - (2ρ - 1)³)`, `ν ← 2`
//! - reject: `μ ← μ · ν`, `ν ← 2ν`
//!
//! Parameters are scaled by the running maximum of the Jacobian column norms
//! (Moré scaling), so `μ` is dimensionless.
//!
//! The solver owns its working vectors; they are sized once in
//! [`LevenbergMarquardt::new`] and reset by [`LevenbergMarquardt::set`] at the
//! start of every attempt. The scaled Jacobian is factored once per iteration
//! and every trial step reuses that factorization.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverError;
use crate::fit::adapter::LeastSquaresProblem;
use crate::math::DampedStepSolver;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmSettings {
    /// Damping at the start of each attempt.
    pub initial_damping: f64,
    /// Minimum gain ratio for a step to be taken.
    pub acceptance_ratio: f64,
    /// Rejected trial steps allowed within one iteration.
    pub max_rejections: usize,
}

impl Default for LmSettings {
    fn default() -> Self {
        Self {
            initial_damping: 1e-3,
            acceptance_ratio: 1e-4,
            max_rejections: 10,
        }
    }
}

/// Result of one successful iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A step was taken (possibly of length zero at a stationary point).
    Accepted,
    /// No acceptable step was found; the position is unchanged.
    NoProgress,
}

#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    settings: LmSettings,
    x: DVector<f64>,
    f: DVector<f64>,
    jac: DMatrix<f64>,
    dx: DVector<f64>,
    scale: DVector<f64>,
    gradient: DVector<f64>,
    step: DVector<f64>,
    linear: DVector<f64>,
    trial_x: DVector<f64>,
    trial_f: DVector<f64>,
    damped: DampedStepSolver,
    mu: f64,
    nu: f64,
}

impl LevenbergMarquardt {
    /// Solver for `n` residuals in `p` parameters.
    pub fn new(n: usize, p: usize, settings: LmSettings) -> Self {
        Self {
            settings,
            x: DVector::zeros(p),
            f: DVector::zeros(n),
            jac: DMatrix::zeros(n, p),
            dx: DVector::zeros(p),
            scale: DVector::zeros(p),
            gradient: DVector::zeros(p),
            step: DVector::zeros(p),
            linear: DVector::zeros(n),
            trial_x: DVector::zeros(p),
            trial_f: DVector::zeros(n),
            damped: DampedStepSolver::new(n, p),
            mu: settings.initial_damping,
            nu: 2.0,
        }
    }

    /// Load a starting point and reset all iteration state.
    pub fn set<P>(&mut self, problem: &mut P, x0: &[f64]) -> Result<(), SolverError>
    where
        P: LeastSquaresProblem + ?Sized,
    {
        if x0.len() != self.x.len() {
            return Err(SolverError::DimensionMismatch {
                expected: self.x.len(),
                found: x0.len(),
            });
        }

        self.x.copy_from_slice(x0);
        self.dx.fill(0.0);
        self.scale.fill(0.0);
        self.mu = self.settings.initial_damping;
        self.nu = 2.0;

        problem.residuals_and_jacobian(&self.x, &mut self.f, &mut self.jac);
        if !all_finite(self.f.iter()) {
            return Err(SolverError::NonFiniteResidual);
        }
        if !all_finite(self.jac.iter()) {
            return Err(SolverError::NonFiniteJacobian);
        }
        Ok(())
    }

    /// Take one step.
    pub fn iterate<P>(&mut self, problem: &mut P) -> Result<StepStatus, SolverError>
    where
        P: LeastSquaresProblem + ?Sized,
    {
        self.update_scale();

        // Zero gradient: already stationary, take a null step.
        self.jac.tr_mul_to(&self.f, &mut self.gradient);
        if self.gradient.amax() == 0.0 {
            self.dx.fill(0.0);
            return Ok(StepStatus::Accepted);
        }
        if !self.damped.factor(&self.jac, &self.f, &self.scale) {
            return Err(SolverError::SingularStep);
        }

        let ssq = self.f.norm_squared();
        for _ in 0..self.settings.max_rejections {
            if !self.mu.is_finite() {
                break;
            }
            if !self.damped.step(self.mu, &mut self.step) {
                return Err(SolverError::SingularStep);
            }

            self.linear.copy_from(&self.f);
            self.linear.gemv(1.0, &self.jac, &self.step, 1.0);
            let predicted = ssq - self.linear.norm_squared();

            self.trial_x.copy_from(&self.x);
            self.trial_x += &self.step;
            problem.residuals(&self.trial_x, &mut self.trial_f);

            let rho = if predicted > 0.0 && all_finite(self.trial_f.iter()) {
                (ssq - self.trial_f.norm_squared()) / predicted
            } else {
                f64::NEG_INFINITY
            };

            if rho > self.settings.acceptance_ratio {
                std::mem::swap(&mut self.x, &mut self.trial_x);
                std::mem::swap(&mut self.f, &mut self.trial_f);
                self.dx.copy_from(&self.step);

                problem.jacobian(&self.x, &mut self.jac);
                if !all_finite(self.jac.iter()) {
                    return Err(SolverError::NonFiniteJacobian);
                }

                let shrink = 1.0 - (2.0 * rho - 1.0).powi(3);
                self.mu *= shrink.max(1.0 / 3.0);
                self.nu = 2.0;
                return Ok(StepStatus::Accepted);
            }

            self.mu *= self.nu;
            self.nu *= 2.0;
        }

        self.dx.fill(0.0);
        Ok(StepStatus::NoProgress)
    }

    /// Step-size convergence test: every `|dx_i| < epsabs + epsrel · |x_i|`.
    pub fn test_delta(&self, epsabs: f64, epsrel: f64) -> bool {
        self.dx
            .iter()
            .zip(self.x.iter())
            .all(|(dx, x)| dx.abs() < epsabs + epsrel * x.abs())
    }

    pub fn position(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn last_step(&self) -> &DVector<f64> {
        &self.dx
    }

    /// Euclidean norm of the residual vector at the current position.
    pub fn residual_norm(&self) -> f64 {
        self.f.norm()
    }

    pub fn damping(&self) -> f64 {
        self.mu
    }

    fn update_scale(&mut self) {
        for (s, col) in self.scale.iter_mut().zip(self.jac.column_iter()) {
            *s = s.max(col.norm());
            if *s == 0.0 {
                *s = 1.0;
            }
        }
    }
}

fn all_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|v| v.is_finite())
}
