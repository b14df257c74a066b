//! # PID controller module
//!
//! Discrete time, fixed period PID controller used for each control axis.
//!
//! The controller is stepped once per control cycle, so the period is a calibration constant
//! rather than being measured between calls. For the `k`th call:
//!
//! ```text
//! e[k] = setpoint - measurement
//! I[k] = I[k-1] + e[k] * T
//! D[k] = (e[k] - e[k-1]) / T
//! u[k] = clamp(k_p * e[k] + k_i * I[k] + k_d * D[k] + bias, min_output, max_output)
//! ```
//!
//! with `I[-1] = e[-1] = 0`.
//!
//! ## Anti-windup
//!
//! With [`AntiWindup::Conditional`] the new integral is only kept if the unclamped output is
//! within the output bounds, or if the integral contribution of this error pulls the output back
//! towards the bounds. The output of the step which first saturates is still computed from the
//! new integral, but the integral stops growing from then on. [`AntiWindup::None`] always
//! accumulates.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration of a PID controller.
///
/// The bounds are expected to satisfy `min_output <= max_output` and the period to be positive.
/// This is not enforced, use [`PidGains::violations`] to check.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Lower bound of the output
    pub min_output: f64,

    /// Upper bound of the output
    pub max_output: f64,

    /// The control period
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Constant offset added to the output before clamping
    pub bias: f64,
}

/// A PID controller
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    gains: PidGains,

    anti_windup: AntiWindup,

    /// The integral accumulation
    integral: f64,

    /// Previous error
    prev_error: f64,

    /// True if the last output was clamped
    saturated: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A calibration value which breaks the expected invariants.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GainsViolation {
    /// `min_output` is greater than `max_output`, or either is NaN
    InvertedBounds { min_output: f64, max_output: f64 },

    /// The period is zero, negative, or NaN
    NonPositivePeriod(f64),
}

/// Integrator behaviour while the output is saturated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntiWindup {
    /// Always accumulate the integral.
    None,

    /// Stop accumulating when doing so would drive the output further into saturation.
    Conditional,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AntiWindup {
    fn default() -> Self {
        AntiWindup::Conditional
    }
}

impl PidGains {
    /// List any calibration values which break the expected invariants.
    pub fn violations(&self) -> Vec<GainsViolation> {
        let mut v = vec![];

        if !(self.min_output <= self.max_output) {
            v.push(GainsViolation::InvertedBounds {
                min_output: self.min_output,
                max_output: self.max_output,
            });
        }
        if !(self.period_s > 0.0) {
            v.push(GainsViolation::NonPositivePeriod(self.period_s));
        }

        v
    }
}

impl std::fmt::Display for GainsViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainsViolation::InvertedBounds {
                min_output,
                max_output,
            } => write!(
                f,
                "min_output ({}) is greater than max_output ({})",
                min_output, max_output
            ),
            GainsViolation::NonPositivePeriod(p) => write!(f, "period_s ({}) is not positive", p),
        }
    }
}

impl PidController {
    /// Create a new controller with the given calibration and zeroed state.
    pub fn calibrate(gains: PidGains, anti_windup: AntiWindup) -> Self {
        Self {
            gains,
            anti_windup,
            integral: 0.0,
            prev_error: 0.0,
            saturated: false,
        }
    }

    /// Step the controller, returning the clamped output.
    ///
    /// No validation is performed, NaN inputs give a NaN output.
    pub fn compute(&mut self, setpoint: f64, measurement: f64) -> f64 {
        let g = &self.gains;

        let error = setpoint - measurement;
        let integral = self.integral + error * g.period_s;
        let deriv = (error - self.prev_error) / g.period_s;

        let raw = g.k_p * error + g.k_i * integral + g.k_d * deriv + g.bias;

        // Comparisons rather than f64::clamp so that NaN passes through and inverted bounds do
        // not panic
        let (out, saturated) = if raw > g.max_output {
            (g.max_output, true)
        } else if raw < g.min_output {
            (g.min_output, true)
        } else {
            (raw, false)
        };

        let winding_up = (raw > g.max_output && g.k_i * error > 0.0)
            || (raw < g.min_output && g.k_i * error < 0.0);

        match self.anti_windup {
            AntiWindup::Conditional if winding_up => (),
            _ => self.integral = integral,
        }

        self.prev_error = error;
        self.saturated = saturated;

        out
    }

    /// Returns true if the output of the last step was clamped to a bound.
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gains(k_p: f64, k_i: f64, k_d: f64, min_output: f64, max_output: f64) -> PidGains {
        PidGains {
            k_p,
            k_i,
            k_d,
            min_output,
            max_output,
            period_s: 0.08,
            bias: 0.0,
        }
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::calibrate(
            gains(1.0, 0.0, 0.0, -100.0, 100.0),
            AntiWindup::Conditional,
        );

        assert_eq!(pid.compute(10.0, 0.0), 10.0);
        assert_eq!(pid.compute(10.0, 0.0), 10.0);
        assert!(!pid.is_saturated());
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::calibrate(
            gains(1.0, 2.0, 0.0, -100.0, 100.0),
            AntiWindup::Conditional,
        );

        let first = pid.compute(10.0, 0.0);
        let second = pid.compute(10.0, 0.0);

        assert!((first - (10.0 + 2.0 * 0.8)).abs() < 1e-9);
        assert!((second - (10.0 + 2.0 * 1.6)).abs() < 1e-9);
        assert!(second > first);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::calibrate(
            gains(100.0, 0.0, 0.0, -5.0, 5.0),
            AntiWindup::Conditional,
        );

        assert_eq!(pid.compute(10.0, 0.0), 5.0);
        assert!(pid.is_saturated());
        assert_eq!(pid.compute(-10.0, 0.0), -5.0);
        assert!(pid.is_saturated());
    }

    #[test]
    fn test_derivative_uses_previous_error() {
        let mut pid = PidController::calibrate(
            gains(0.0, 0.0, 0.4, -100.0, 100.0),
            AntiWindup::Conditional,
        );

        // First step differentiates against a zero previous error
        assert!((pid.compute(1.0, 0.0) - 0.4 * 1.0 / 0.08).abs() < 1e-9);
        // Constant error, no derivative
        assert!(pid.compute(1.0, 0.0).abs() < 1e-9);
        // Error falls from 1 to 0.5
        assert!((pid.compute(1.0, 0.5) - 0.4 * -0.5 / 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_bias_applied_before_clamp() {
        let mut g = gains(0.0, 0.0, 0.0, -10.0, 10.0);
        g.bias = 3.0;
        let mut pid = PidController::calibrate(g, AntiWindup::None);
        assert_eq!(pid.compute(0.0, 0.0), 3.0);

        g.bias = 30.0;
        let mut pid = PidController::calibrate(g, AntiWindup::None);
        assert_eq!(pid.compute(0.0, 0.0), 10.0);
    }

    #[test]
    fn test_conditional_anti_windup_holds_integral() {
        let mut pid = PidController::calibrate(
            gains(1.0, 1.0, 0.0, -5.0, 5.0),
            AntiWindup::Conditional,
        );

        for _ in 0..50 {
            assert_eq!(pid.compute(10.0, 0.0), 5.0);
        }

        // Saturated from the first step so nothing was accumulated
        assert_eq!(pid.integral(), 0.0);

        // Recovers immediately once the error reverses
        let out = pid.compute(0.0, 1.0);
        assert!((out - (-1.0 - 0.08)).abs() < 1e-9);
    }

    #[test]
    fn test_no_anti_windup_keeps_integrating() {
        let mut pid = PidController::calibrate(
            gains(1.0, 1.0, 0.0, -5.0, 5.0),
            AntiWindup::None,
        );

        for _ in 0..50 {
            assert_eq!(pid.compute(10.0, 0.0), 5.0);
        }

        assert!((pid.integral() - 50.0 * 10.0 * 0.08).abs() < 1e-9);

        // Wound up integral keeps the output pinned after the error reverses
        assert_eq!(pid.compute(0.0, 1.0), 5.0);
    }

    #[test]
    fn test_anti_windup_allows_unwinding() {
        let mut pid = PidController::calibrate(
            gains(0.0, 1.0, 0.0, -5.0, 5.0),
            AntiWindup::Conditional,
        );

        // Build up some integral within the bounds
        for _ in 0..5 {
            pid.compute(10.0, 0.0);
        }
        assert!((pid.integral() - 4.0).abs() < 1e-9);

        // Negative error unwinds it
        pid.compute(0.0, 10.0);
        assert!((pid.integral() - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_nan_propagates() {
        let mut pid = PidController::calibrate(
            gains(1.0, 0.0, 0.0, -5.0, 5.0),
            AntiWindup::Conditional,
        );

        assert!(pid.compute(std::f64::NAN, 0.0).is_nan());
    }

    #[test]
    fn test_violations() {
        assert!(gains(1.0, 0.0, 0.0, -1.0, 1.0).violations().is_empty());

        let mut g = gains(1.0, 0.0, 0.0, 1.0, -1.0);
        g.period_s = 0.0;
        assert_eq!(
            g.violations(),
            vec![
                GainsViolation::InvertedBounds {
                    min_output: 1.0,
                    max_output: -1.0
                },
                GainsViolation::NonPositivePeriod(0.0),
            ]
        );
        assert_eq!(
            g.violations()[1].to_string(),
            "period_s (0) is not positive"
        );
    }
}
