//! Multi-start optimization driver.
//!
//! Given a model and an ordered list of starting vectors, we run
//! Levenberg–Marquardt from every candidate and keep the result with the
//! smallest residual norm. Per attempt:
//!
//! - load the candidate (`Init`); a non-finite start is an error
//! - iterate until the step test passes (`Converged`), the iteration cap is
//!   hit or no acceptable step exists (`NoProgress`), or the solver fails
//!   (`Error`)
//!
//! Errored attempts never compete. Every candidate is run, even after one has
//! converged; the order of candidates decides ties (earlier wins).

use nalgebra::DVector;

use crate::domain::{AttemptOutcome, AttemptRecord, BestFit};
use crate::error::SolverError;
use crate::fit::adapter::{LeastSquaresProblem, LineShapeProblem};
use crate::fit::solver::{LevenbergMarquardt, LmSettings, StepStatus};
use crate::models::LineShapeModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    pub epsabs: f64,
    pub epsrel: f64,
    pub max_iterations: usize,
    pub solver: LmSettings,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            epsabs: 1e-4,
            epsrel: 1e-4,
            max_iterations: 1000,
            solver: LmSettings::default(),
        }
    }
}

/// One finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FitAttempt {
    pub index: usize,
    pub initial: Vec<f64>,
    pub params: Vec<f64>,
    /// `NaN` when the attempt errored.
    pub residual_norm: f64,
    pub outcome: AttemptOutcome,
    pub iterations: usize,
    /// Stopped by the iteration cap rather than by the solver.
    pub capped: bool,
    pub error: Option<SolverError>,
}

impl FitAttempt {
    /// Why the attempt stopped short of convergence, if it did and the cap
    /// was not the reason.
    pub fn status_message(&self) -> Option<String> {
        match (&self.error, self.outcome) {
            (Some(err), _) => Some(err.to_string()),
            (None, AttemptOutcome::NoProgress) if !self.capped => {
                Some("iteration is not making progress towards solution".to_string())
            }
            _ => None,
        }
    }

    pub fn record(&self) -> AttemptRecord {
        AttemptRecord {
            index: self.index,
            outcome: self.outcome,
            iterations: self.iterations,
            residual_norm: self.outcome.is_accepted().then_some(self.residual_norm),
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Hooks for watching a run (iteration echo, progress output).
pub trait FitObserver {
    /// Called with the starting vector (`iteration == 0`) and after every
    /// successful iteration.
    fn on_iteration(&mut self, _candidate: usize, _iteration: usize, _params: &[f64]) {}

    fn on_attempt(&mut self, _attempt: &FitAttempt) {}
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl FitObserver for SilentObserver {}

/// Outcome of a whole multi-start run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitRun {
    pub best: Option<BestFit>,
    pub attempts: Vec<AttemptRecord>,
}

impl FitRun {
    pub fn accepted(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts.iter().filter(|a| a.outcome.is_accepted())
    }

    pub fn count(&self, outcome: AttemptOutcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }
}

/// Run every candidate and return the best accepted result.
pub fn fit_candidates(
    model: &dyn LineShapeModel,
    candidates: &[Vec<f64>],
    settings: &DriverSettings,
    observer: &mut dyn FitObserver,
) -> FitRun {
    let mut problem = LineShapeProblem::new(model);
    let mut solver = LevenbergMarquardt::new(
        problem.residual_count(),
        problem.parameter_count(),
        settings.solver,
    );

    let mut run = FitRun {
        best: None,
        attempts: Vec::with_capacity(candidates.len()),
    };

    for (index, candidate) in candidates.iter().enumerate() {
        let attempt = run_attempt(&mut solver, &mut problem, index, candidate, settings, observer);
        observer.on_attempt(&attempt);

        log::debug!(
            "candidate {index}: {} after {} iterations (resid {:e})",
            attempt.outcome.label(),
            attempt.iterations,
            attempt.residual_norm
        );

        run.attempts.push(attempt.record());

        if !attempt.outcome.is_accepted() {
            continue;
        }
        let better = match &run.best {
            None => true,
            Some(best) => attempt.residual_norm < best.residual_norm,
        };
        if better {
            run.best = Some(BestFit {
                candidate: attempt.index,
                initial: attempt.initial,
                params: attempt.params,
                residual_norm: attempt.residual_norm,
                outcome: attempt.outcome,
                iterations: attempt.iterations,
            });
        }
    }

    log::info!(
        "{} candidates: {} converged, {} no progress, {} errors",
        candidates.len(),
        run.count(AttemptOutcome::Converged),
        run.count(AttemptOutcome::NoProgress),
        run.count(AttemptOutcome::Error),
    );
    if let Some(best) = &run.best {
        log::info!(
            "best: candidate {} from {:?} ({}, {} iterations, resid {:e})",
            best.candidate,
            best.initial,
            best.outcome.label(),
            best.iterations,
            best.residual_norm
        );
    }

    run
}

fn run_attempt<P>(
    solver: &mut LevenbergMarquardt,
    problem: &mut P,
    index: usize,
    candidate: &[f64],
    settings: &DriverSettings,
    observer: &mut dyn FitObserver,
) -> FitAttempt
where
    P: LeastSquaresProblem + ?Sized,
{
    let failed = |iterations: usize, err: SolverError, params: &DVector<f64>| FitAttempt {
        index,
        initial: candidate.to_vec(),
        params: params.iter().copied().collect(),
        residual_norm: f64::NAN,
        outcome: AttemptOutcome::Error,
        iterations,
        capped: false,
        error: Some(err),
    };

    if let Err(err) = solver.set(problem, candidate) {
        return failed(0, err, &DVector::from_column_slice(candidate));
    }
    observer.on_iteration(index, 0, solver.position().as_slice());

    let mut iterations = 0;
    let mut capped = false;
    let outcome = loop {
        if iterations >= settings.max_iterations {
            capped = true;
            break AttemptOutcome::NoProgress;
        }
        iterations += 1;

        match solver.iterate(problem) {
            Err(err) => return failed(iterations, err, solver.position()),
            Ok(status) => {
                observer.on_iteration(index, iterations, solver.position().as_slice());
                log::trace!(
                    "candidate {index} iter {iterations}: resid {:e}",
                    solver.residual_norm()
                );
                if status == StepStatus::NoProgress {
                    break AttemptOutcome::NoProgress;
                }
            }
        }

        if solver.test_delta(settings.epsabs, settings.epsrel) {
            break AttemptOutcome::Converged;
        }
    };

    FitAttempt {
        index,
        initial: candidate.to_vec(),
        params: solver.position().iter().copied().collect(),
        residual_norm: solver.residual_norm(),
        outcome,
        iterations,
        capped,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dataset;
    use crate::models::{SymmetricResonant, symmetric_resonant};

    /// Five points from γ = 10, N = 1 with alternating ±1% noise.
    fn scenario_a() -> Dataset {
        let data = Dataset::default();
        let model = SymmetricResonant::new(&data);
        let truth = [10.0, 1.0];
        let pairs: Vec<(f64, f64)> = [0.6, 0.7, 0.8, 0.9, 0.95]
            .iter()
            .enumerate()
            .map(|(i, &g)| {
                let noise = if i % 2 == 0 { 1.01 } else { 0.99 };
                (g, model.evaluate(&truth, g) * noise)
            })
            .collect();
        Dataset::from_pairs(&pairs)
    }

    /// Residuals that never move, paired with a Jacobian that promises they
    /// will.
    struct Plateau<'a> {
        data: &'a Dataset,
    }

    impl LineShapeModel for Plateau<'_> {
        fn name(&self) -> &'static str {
            "Plateau"
        }

        fn parameter_names(&self) -> &'static [&'static str] {
            &["level"]
        }

        fn required_parameters(&self) -> &'static [&'static str] {
            &["level"]
        }

        fn dataset(&self) -> &Dataset {
            self.data
        }

        fn evaluate(&self, _params: &[f64], _x: f64) -> f64 {
            1.0
        }

        fn residual(&self, params: &[f64], x: f64, observed: f64) -> f64 {
            self.evaluate(params, x) - observed
        }

        fn jacobian(&self, _params: &[f64], _x: f64, _observed: f64, out: &mut [f64]) {
            out[0] = 1.0;
        }

        fn default_guesses(&self) -> Vec<Vec<f64>> {
            vec![vec![1.0]]
        }
    }

    #[derive(Default)]
    struct Recorder {
        iterations: Vec<(usize, usize)>,
        attempts: Vec<AttemptOutcome>,
        messages: Vec<Option<String>>,
    }

    impl FitObserver for Recorder {
        fn on_iteration(&mut self, candidate: usize, iteration: usize, _params: &[f64]) {
            self.iterations.push((candidate, iteration));
        }

        fn on_attempt(&mut self, attempt: &FitAttempt) {
            self.attempts.push(attempt.outcome);
            self.messages.push(attempt.status_message());
        }
    }

    #[test]
    fn recovers_symmetric_resonant_parameters() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let run = fit_candidates(&model, &model.default_guesses(), &DriverSettings::default(), &mut SilentObserver);

        let best = run.best.expect("a fit");
        let mut p = best.params.clone();
        model.process_fit_parameters(&mut p);
        assert!((p[symmetric_resonant::GAMMA] - 10.0).abs() < 0.5, "gamma = {}", p[0]);
        assert!((p[symmetric_resonant::NORM] - 1.0).abs() < 0.05, "norm = {}", p[1]);
        assert!(best.residual_norm < 0.05);
    }

    #[test]
    fn best_is_no_worse_than_any_accepted_attempt() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let run = fit_candidates(&model, &model.default_guesses(), &DriverSettings::default(), &mut SilentObserver);
        let best = run.best.as_ref().unwrap();
        for a in run.accepted() {
            assert!(best.residual_norm <= a.residual_norm.unwrap());
        }
        assert_eq!(run.attempts.len(), 5);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let guesses = model.default_guesses();
        let a = fit_candidates(&model, &guesses, &DriverSettings::default(), &mut SilentObserver);
        let b = fit_candidates(&model, &guesses, &DriverSettings::default(), &mut SilentObserver);
        let (a, b) = (a.best.unwrap(), b.best.unwrap());
        assert_eq!(a.residual_norm.to_bits(), b.residual_norm.to_bits());
        for (x, y) in a.params.iter().zip(b.params.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(a.candidate, b.candidate);
    }

    #[test]
    fn every_candidate_failing_yields_no_fit() {
        // zero observations make the relative residual infinite
        let data = Dataset::from_pairs(&[(0.5, 0.0), (0.6, 0.0), (0.7, 0.0)]);
        let model = SymmetricResonant::new(&data);
        let mut rec = Recorder::default();
        let run = fit_candidates(&model, &model.default_guesses(), &DriverSettings::default(), &mut rec);

        assert!(run.best.is_none());
        assert_eq!(run.count(AttemptOutcome::Error), 5);
        assert_eq!(rec.attempts.len(), 5);
        assert!(rec.iterations.is_empty());
        assert!(run.attempts.iter().all(|a| a.residual_norm.is_none() && a.error.is_some()));
        assert!(rec.messages.iter().all(|m| m.is_some()));
    }

    #[test]
    fn iteration_cap_is_soft_success() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let settings = DriverSettings {
            max_iterations: 1,
            epsabs: 0.0,
            epsrel: 0.0,
            ..DriverSettings::default()
        };
        let mut rec = Recorder::default();
        let run = fit_candidates(&model, &[vec![20.0, 2.0]], &settings, &mut rec);
        assert_eq!(run.attempts[0].outcome, AttemptOutcome::NoProgress);
        assert_eq!(run.attempts[0].iterations, 1);
        assert!(run.best.is_some());
        assert!(rec.messages[0].is_none());
        assert_eq!(rec.iterations, vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn stalled_solver_is_soft_success_with_a_message() {
        let data = Dataset::from_pairs(&[(0.2, 0.0), (0.4, 0.5), (0.6, 0.0)]);
        let model = Plateau { data: &data };
        let mut rec = Recorder::default();
        let run = fit_candidates(&model, &[vec![3.0]], &DriverSettings::default(), &mut rec);

        assert_eq!(run.attempts[0].outcome, AttemptOutcome::NoProgress);
        assert_eq!(run.attempts[0].iterations, 1);
        assert_eq!(
            rec.messages[0].as_deref(),
            Some("iteration is not making progress towards solution")
        );
        assert_eq!(rec.iterations, vec![(0, 0), (0, 1)]);

        let best = run.best.expect("stalled attempts still compete");
        assert_eq!(best.params, vec![3.0]);
        assert_eq!(best.outcome, AttemptOutcome::NoProgress);
        assert!((best.residual_norm - 1.5).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_the_earlier_candidate() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let start = vec![12.0, 1.1];
        let run = fit_candidates(
            &model,
            &[start.clone(), start.clone()],
            &DriverSettings::default(),
            &mut SilentObserver,
        );
        assert_eq!(run.best.unwrap().candidate, 0);
    }

    #[test]
    fn errored_attempts_do_not_stop_the_run() {
        let data = scenario_a();
        let model = SymmetricResonant::new(&data);
        let candidates = vec![vec![f64::NAN, 1.0], vec![10.0, 1.0]];
        let run = fit_candidates(&model, &candidates, &DriverSettings::default(), &mut SilentObserver);
        assert_eq!(run.attempts[0].outcome, AttemptOutcome::Error);
        assert_eq!(run.best.unwrap().candidate, 1);
    }
}
