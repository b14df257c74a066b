//! Parameters structure for CtrlLoop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pid::{AntiWindup, GainsViolation, PidGains};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default control period.
pub const DEFAULT_TIMER_PERIOD_MS: u64 = 80;

/// Default magnetic declination.
pub const DEFAULT_MAGNETIC_DECLINATION_DEG: f64 = 10.7;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    // ---- TIMING ----

    /// Period of the control loop.
    ///
    /// Units: milliseconds
    #[serde(default = "default_timer_period_ms")]
    pub timer_period_ms: u64,

    // ---- CONTROLLERS ----

    /// Depth controller calibration
    pub depth: AxisParams,

    /// Heading controller calibration
    pub heading: AxisParams,

    /// If true integration is inhibited while it would push a saturated output further out of
    /// its bounds.
    #[serde(default = "default_anti_windup")]
    pub anti_windup: bool,

    /// How the thruster level is derived from the desired speed.
    #[serde(default)]
    pub speed_control: SpeedControl,

    // ---- SENSORS ----

    /// Added to the scaled modem yaw to give heading relative to true north.
    ///
    /// Units: degrees
    #[serde(default = "default_magnetic_declination_deg")]
    pub magnetic_declination_deg: f64,

    /// If set only modem records with this ID are used as heading measurements.
    #[serde(default)]
    pub status_msg_id: Option<u8>,

    // ---- ACTUATORS ----

    /// Mapping of controller outputs onto the fins.
    #[serde(default)]
    pub fin_mapping: FinMapping,

    // ---- ARCHIVING ----

    /// If true every emitted command is written to the session archive.
    #[serde(default)]
    pub archive_commands: bool,
}

/// Calibration of a single control axis.
///
/// The control period is shared between axes and so is not included here.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisParams {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub min_output: f64,
    pub max_output: f64,

    #[serde(default)]
    pub bias: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Mapping from controller outputs onto fin deflections.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinMapping {
    /// Top fin follows the heading output, the side fins follow the depth output with the right
    /// fin inverted.
    Simple,

    /// As `Simple`, with each fin also offset by a share of the thruster level and a fixed
    /// per-fin correction.
    TrimOffset {
        trim_ratio: f64,
        top_fin_offset: f64,
        right_fin_offset: f64,
        left_fin_offset: f64,
    },
}

/// Source of the thruster level.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpeedControl {
    /// The desired speed is used as the thruster level directly.
    Passthrough,

    /// A third controller drives the measured forwards speed to the desired speed.
    Pid(AxisParams),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Control period in seconds.
    pub fn period_s(&self) -> f64 {
        util::time::millis_to_seconds(self.timer_period_ms)
    }

    /// The integrator behaviour selected by `anti_windup`.
    pub fn anti_windup(&self) -> AntiWindup {
        if self.anti_windup {
            AntiWindup::Conditional
        } else {
            AntiWindup::None
        }
    }

    /// List any parameters which break the expected invariants.
    ///
    /// Violations are not rejected, the caller should warn about them and carry on.
    pub fn check(&self) -> Vec<String> {
        let mut v = vec![];

        if self.timer_period_ms == 0 {
            v.push("timer_period_ms is zero".to_string());
        }

        let period_s = self.period_s();
        let mut axes = vec![("depth", self.depth), ("heading", self.heading)];
        if let SpeedControl::Pid(speed) = self.speed_control {
            axes.push(("speed", speed));
        }

        for (name, axis) in axes {
            for e in axis.gains(period_s).violations() {
                match e {
                    // Shared between axes, already reported above
                    GainsViolation::NonPositivePeriod(_) => (),
                    e => v.push(format!("{}: {}", name, e)),
                }
            }
        }

        v
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            timer_period_ms: DEFAULT_TIMER_PERIOD_MS,
            depth: AxisParams::default(),
            heading: AxisParams::default(),
            anti_windup: default_anti_windup(),
            speed_control: SpeedControl::default(),
            magnetic_declination_deg: DEFAULT_MAGNETIC_DECLINATION_DEG,
            status_msg_id: None,
            fin_mapping: FinMapping::default(),
            archive_commands: false,
        }
    }
}

impl AxisParams {
    /// Build the controller calibration for this axis.
    pub fn gains(&self, period_s: f64) -> PidGains {
        PidGains {
            k_p: self.k_p,
            k_i: self.k_i,
            k_d: self.k_d,
            min_output: self.min_output,
            max_output: self.max_output,
            period_s,
            bias: self.bias,
        }
    }
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            k_p: 0.0,
            k_i: 0.0,
            k_d: 0.0,
            min_output: 0.0,
            max_output: 0.0,
            bias: 0.0,
        }
    }
}

impl Default for FinMapping {
    fn default() -> Self {
        FinMapping::Simple
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        SpeedControl::Passthrough
    }
}

fn default_timer_period_ms() -> u64 {
    DEFAULT_TIMER_PERIOD_MS
}

fn default_anti_windup() -> bool {
    true
}

fn default_magnetic_declination_deg() -> f64 {
    DEFAULT_MAGNETIC_DECLINATION_DEG
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
        [depth]
        k_p = 20.0
        k_i = 0.5
        k_d = 1.0
        min_output = -30.0
        max_output = 30.0

        [heading]
        k_p = 1.5
        k_i = 0.0
        k_d = 0.2
        min_output = -30.0
        max_output = 30.0
        bias = 2.0
    "#;

    #[test]
    fn test_defaults() {
        let p: Params = util::params::parse(MINIMAL).unwrap();

        assert_eq!(p.timer_period_ms, 80);
        assert!((p.period_s() - 0.08).abs() < 1e-12);
        assert!(p.anti_windup);
        assert_eq!(p.anti_windup(), AntiWindup::Conditional);
        assert_eq!(p.magnetic_declination_deg, 10.7);
        assert_eq!(p.status_msg_id, None);
        assert_eq!(p.fin_mapping, FinMapping::Simple);
        assert_eq!(p.speed_control, SpeedControl::Passthrough);
        assert!(!p.archive_commands);
        assert_eq!(p.depth.bias, 0.0);
        assert_eq!(p.heading.bias, 2.0);
        assert!(p.check().is_empty());
    }

    #[test]
    fn test_variants() {
        let toml_str = format!(
            r#"
            timer_period_ms = 100
            anti_windup = false
            status_msg_id = 16
            fin_mapping = {{ TrimOffset = {{ trim_ratio = 0.1, top_fin_offset = 1.0, right_fin_offset = -2.0, left_fin_offset = 3.0 }} }}
            speed_control = {{ Pid = {{ k_p = 2.0, k_i = 0.1, k_d = 0.0, min_output = 0.0, max_output = 100.0 }} }}
            {}
            "#,
            MINIMAL
        );

        let p: Params = util::params::parse(&toml_str).unwrap();

        assert_eq!(p.timer_period_ms, 100);
        assert_eq!(p.anti_windup(), AntiWindup::None);
        assert_eq!(p.status_msg_id, Some(0x10));
        assert_eq!(
            p.fin_mapping,
            FinMapping::TrimOffset {
                trim_ratio: 0.1,
                top_fin_offset: 1.0,
                right_fin_offset: -2.0,
                left_fin_offset: 3.0,
            }
        );
        match p.speed_control {
            SpeedControl::Pid(a) => assert_eq!(a.max_output, 100.0),
            s => panic!("Expected speed PID, got {:?}", s),
        }
    }

    #[test]
    fn test_check_reports_violations() {
        let mut p: Params = util::params::parse(MINIMAL).unwrap();
        p.timer_period_ms = 0;
        p.heading.min_output = 50.0;
        p.speed_control = SpeedControl::Pid(AxisParams {
            min_output: 1.0,
            max_output: -1.0,
            ..AxisParams::default()
        });

        let v = p.check();
        assert_eq!(v.len(), 3, "{:?}", v);
        assert!(v[0].contains("timer_period_ms"));
        assert_eq!(
            v[1],
            "heading: min_output (50) is greater than max_output (30)"
        );
        assert!(v[2].starts_with("speed"));
    }
}
