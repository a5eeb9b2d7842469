//! Terminal formatting for fit progress and results.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays free of output concerns
//! - output changes are localized (the exact text is relied on by scripts)
//!
//! Numbers use C-style scientific notation (`1.2345e+01`): Rust's `{:e}`
//! omits the exponent sign and padding, so [`fmt_sci`] rebuilds it.

use crate::fit::FitAttempt;

/// `v` in scientific notation with `precision` mantissa digits and a signed,
/// at least two-digit exponent.
pub fn fmt_sci(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{v:.precision$e}");
    let Some((mantissa, exp)) = raw.split_once('e') else {
        return raw;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// `name=value, name=value, ...` with four mantissa digits.
///
/// With `stdev`, each value is followed by `name_err=stdev`.
pub fn format_parameters(names: &[&str], params: &[f64], stdev: Option<&[f64]>) -> String {
    let mut parts = Vec::with_capacity(names.len() * 2);
    for (i, (name, value)) in names.iter().zip(params.iter()).enumerate() {
        parts.push(format!("{name}={}", fmt_sci(*value, 4)));
        if let Some(err) = stdev.and_then(|s| s.get(i)) {
            parts.push(format!("{name}_err={}", fmt_sci(*err, 4)));
        }
    }
    parts.join(", ")
}

/// One line of the per-iteration echo, without the newline.
pub fn format_iteration(iteration: usize, names: &[&str], params: &[f64]) -> String {
    format!("Iter={iteration:>3}, {}", format_parameters(names, params, None))
}

/// Trailer printed after an attempt when iteration echo is on: the stop
/// reason (if any) and, for accepted attempts, the residual norm.
pub fn format_attempt_end(attempt: &FitAttempt) -> String {
    let mut out = String::new();
    if let Some(msg) = attempt.status_message() {
        out.push_str(&format!("   {msg}\n\n"));
    }
    if attempt.outcome.is_accepted() {
        out.push_str(&format!("Residual = {}\n\n", fmt_sci(attempt.residual_norm, 6)));
    }
    out
}

/// Final two-line result.
pub fn format_result(residual_norm: f64, names: &[&str], params: &[f64], stdev: Option<&[f64]>) -> String {
    format!(
        "Resid = {}\n{}\n",
        fmt_sci(residual_norm, 6),
        format_parameters(names, params, stdev)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AttemptOutcome;
    use crate::error::SolverError;

    fn attempt(outcome: AttemptOutcome, capped: bool, error: Option<SolverError>) -> FitAttempt {
        FitAttempt {
            index: 0,
            initial: vec![1.0],
            params: vec![1.0],
            residual_norm: 0.4310146,
            outcome,
            iterations: 3,
            capped,
            error,
        }
    }

    #[test]
    fn sci_matches_c_printf() {
        assert_eq!(fmt_sci(0.4310146, 6), "4.310146e-01");
        assert_eq!(fmt_sci(27.52039, 6), "2.752039e+01");
        assert_eq!(fmt_sci(9.9462, 4), "9.9462e+00");
        assert_eq!(fmt_sci(-1.5e-120, 2), "-1.50e-120");
        assert_eq!(fmt_sci(0.0, 4), "0.0000e+00");
        assert_eq!(fmt_sci(f64::NAN, 4), "nan");
    }

    #[test]
    fn result_block_layout() {
        let out = format_result(0.4310146, &["gamma", "norm"], &[9.9462, 3.9567], None);
        assert_eq!(out, "Resid = 4.310146e-01\ngamma=9.9462e+00, norm=3.9567e+00\n");
    }

    #[test]
    fn uncertainties_follow_each_value() {
        let out = format_parameters(&["gamma", "norm"], &[9.9462, 3.9567], Some(&[0.12, 0.05]));
        assert_eq!(
            out,
            "gamma=9.9462e+00, gamma_err=1.2000e-01, norm=3.9567e+00, norm_err=5.0000e-02"
        );
    }

    #[test]
    fn iteration_counter_is_right_aligned() {
        assert_eq!(
            format_iteration(0, &["gamma", "norm"], &[8.0, 3.0]),
            "Iter=  0, gamma=8.0000e+00, norm=3.0000e+00"
        );
        assert!(format_iteration(1000, &["gamma"], &[1.0]).starts_with("Iter=1000, "));
    }

    #[test]
    fn attempt_trailer_depends_on_outcome() {
        let done = attempt(AttemptOutcome::Converged, false, None);
        assert_eq!(format_attempt_end(&done), "Residual = 4.310146e-01\n\n");

        let capped = attempt(AttemptOutcome::NoProgress, true, None);
        assert_eq!(format_attempt_end(&capped), "Residual = 4.310146e-01\n\n");

        let stalled = attempt(AttemptOutcome::NoProgress, false, None);
        assert!(format_attempt_end(&stalled).starts_with("   iteration is not making progress"));

        let failed = attempt(AttemptOutcome::Error, false, Some(SolverError::NonFiniteJacobian));
        assert_eq!(format_attempt_end(&failed), "   Jacobian is not finite\n\n");
    }
}
