//! Integrity parameter lookup tables.
//!
//! Integrity messages carry indices into published tables rather than
//! scaled values. The last index of most tables means "not provided".
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// "Not provided" marker
const NA: f64 = -1.0;

/// Mean failure duration of a single satellite fault [s]
pub const SATELLITE_FAILURE_DURATION: [f64; 16] = [
    5.0, 10.0, 30.0, 60.0, 120.0, 600.0, 900.0, 1800.0, 3600.0, 7200.0, 10800.0, 21600.0,
    43200.0, 86400.0, 604800.0, NA,
];

/// Mean failure duration of a constellation fault [s]
pub const CONSTELLATION_FAILURE_DURATION: [f64; 16] = [
    0.0, 5.0, 10.0, 30.0, 60.0, 90.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0, 14400.0, 28800.0,
    57600.0, 115200.0, NA,
];

/// Overbounding standard deviation of the pseudorange error [m]
pub const CODE_SIGMA: [f64; 32] = [
    0.02, 0.04, 0.06, 0.08, 0.10, 0.12, 0.14, 0.16, 0.18, 0.20, 0.25, 0.30, 0.35, 0.40, 0.45,
    0.50, 0.60, 0.70, 0.80, 0.90, 1.00, 1.25, 1.50, 1.75, 2.00, 2.50, 3.00, 4.00, 5.00, 7.00, NA,
    NA,
];

/// Overbounding standard deviation of the carrier phase error [m]
pub const PHASE_SIGMA: [f64; 32] = [
    0.001, 0.002, 0.003, 0.004, 0.005, 0.006, 0.007, 0.008, 0.009, 0.010, 0.011, 0.012, 0.013,
    0.014, 0.015, 0.016, 0.017, 0.018, 0.019, 0.020, 0.022, 0.024, 0.026, 0.028, 0.030, 0.032,
    0.034, 0.036, 0.040, 0.045, 0.050, NA,
];

/// Overbounding bias of the long term pseudorange error [m]
pub const CODE_BIAS: [f64; 16] = [
    0.0, 0.01, 0.02, 0.03, 0.04, 0.05, 0.075, 0.10, 0.20, 0.40, 0.60, 0.80, 1.0, 3.0, 7.0, NA,
];

/// Overbounding bias of the long term carrier phase error [m]
pub const PHASE_BIAS: [f64; 16] = [
    0.001, 0.002, 0.003, 0.004, 0.005, 0.006, 0.008, 0.010, 0.012, 0.014, 0.016, 0.018, 0.020,
    0.025, 0.030, NA,
];

/// Correlation time of the pseudorange error [s]
pub const CODE_CORRELATION_TIME: [f64; 16] = [
    0.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0, 120.0, 180.0, 300.0, 600.0, 1200.0, 3600.0, 7200.0,
    14400.0, NA,
];

/// Correlation time of the carrier phase error [s]
pub const PHASE_CORRELATION_TIME: [f64; 16] = [
    0.0, 2.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0, 120.0, 180.0, 240.0, 300.0, 600.0, 1800.0,
    7200.0, NA,
];

lazy_static! {
    /// Fault probabilities
    pub static ref PROBABILITY: [f64; 16] = {
        let exponents = [
            -11.0, -10.0, -9.0, -8.0, -7.0, -6.2, -6.0, -5.2, -5.0, -4.2, -4.0, -3.3, -3.0, -2.3,
            -2.0,
        ];
        let mut table = [NA; 16];
        for (value, exponent) in table.iter_mut().zip(exponents.iter()) {
            *value = 10.0_f64.powf(*exponent);
        }
        table
    };
}

/// Bound on the rate of change of the pseudorange error standard deviation [m/s]
pub const CODE_SIGMA_RATE: [f64; 16] = [
    1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 3e-3, 6e-3, 1e-2, 3e-2, 6e-2, 0.10, 0.50, 5.0, 0.0, NA,
];

/// Bound on the rate of change of the phase error standard deviation [m/s]
pub const PHASE_SIGMA_RATE: [f64; 16] = [
    1e-10, 1e-9, 1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 4e-4, 1e-3, 4e-3, 0.01, 0.04, 0.10, 0.50, 5.0, NA,
];

/// Bounding sigma on the phase range rate error [m/s]
pub const PHASE_RANGE_RATE_SIGMA: [f64; 16] = [
    1e-3, 2e-3, 5e-3, 7.5e-3, 0.010, 0.014, 0.018, 0.025, 0.050, 0.10, 0.15, 0.20, 0.50, 1.0,
    20.0, NA,
];

/// Phase range rate error integrity index
pub const PHASE_RANGE_RATE_INDEX: [f64; 16] = [
    1e-11, 1e-10, 1e-9, 1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 0.01, 0.1, 1.0, 10.0, 0.0, 0.0, NA,
];

/// Bounding rates: pseudorange bias, orbit/clock, ionosphere and troposphere errors [m/s]
pub const RATE_BOUND: [f64; 8] = [5e-4, 1e-3, 2e-3, 4e-3, 0.01, 0.02, 0.05, NA];

/// Residual ionosphere error standard deviation on GPS L1 [m]
pub const IONOSPHERE_SIGMA: [f64; 8] = [5e-3, 1e-2, 2e-2, 5e-2, 0.10, 0.25, 1.0, NA];

/// Residual troposphere error standard deviation [m]
pub const TROPOSPHERE_SIGMA: [f64; 8] = [0.01, 0.02, 0.03, 0.05, 0.075, 0.10, 0.125, NA];

/// Bounding inter constellation bias [m]
pub const INTER_CONSTELLATION_BIAS: [f64; 8] = [0.00, 0.01, 0.02, 0.05, 0.10, 0.25, 0.50, NA];

/// Bounding inter frequency bias [m]
pub const INTER_FREQUENCY_BIAS: [f64; 8] = [0.00, 0.04, 0.07, 0.10, 0.20, 0.30, 0.50, NA];

/// Gaussian mixture component mean [m]
pub const GMM_MEAN: [f64; 16] = [
    0.00, 0.04, 0.07, 0.10, 0.20, 0.30, 0.50, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 80.0, 100.0, NA,
];

/// Gaussian mixture component standard deviation [m]
pub const GMM_SIGMA: [f64; 16] = [
    0.0, 0.04, 0.07, 0.10, 0.20, 0.25, 0.30, 0.40, 0.50, 0.70, 1.0, 2.0, 5.0, 7.0, 10.0, NA,
];

/// Extended area time parameter degradation factor
pub const TIME_DEGRADATION: [f64; 8] = [1.0, 1.05, 1.1, 1.2, 1.4, 1.7, 2.0, NA];

/// Extended area spatial parameter degradation factor
pub const SPATIAL_DEGRADATION: [f64; 8] = [1.0, 1.1, 1.3, 1.6, 2.0, 3.0, 5.0, NA];

/// Integrity risk degradation factor
pub const RISK_DEGRADATION: [f64; 4] = [1.0, 10.0, 1e2, 1e3];

/// Time to detect degradation factor
pub const DETECTION_DEGRADATION: [f64; 4] = [1.0, 1.25, 2.0, 4.0];

/// Validity periods [s]
pub const VALIDITY_PERIOD: [f64; 16] = [
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 240.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
    7200.0, 10800.0,
];

/// Maps `index` through `table`. `None` when not provided.
pub fn lookup(table: &[f64], index: u8) -> Option<f64> {
    table
        .get(index as usize)
        .copied()
        .filter(|value| *value >= 0.0)
}

/// Time to alert of the communication link [s]. Index 127 is not provided.
pub fn time_to_alert(index: u8) -> Option<f64> {
    if index >= 127 {
        None
    } else {
        Some((index as f64 + 1.0) * 0.1)
    }
}

/// Carrier to noise density ratio [dB.Hz]. Index 0 is not provided.
pub fn cnr_level(index: u8) -> Option<f64> {
    match index {
        0 => None,
        1..=19 => Some(index as f64 - 1.0),
        20..=244 => Some(19.0 + (index as f64 - 20.0) * 0.2),
        _ => Some(64.0 + (index as f64 - 245.0)),
    }
}

/// Automatic gain control level [dB]. Index 0 is not provided.
pub fn agc_level(index: u8) -> Option<f64> {
    if index == 0 {
        None
    } else {
        Some(index as f64 - 128.0)
    }
}

bitflags! {
    /// Service provider solution types (15 bit field)
    #[derive(Debug, Default, Copy, Clone)]
    #[derive(PartialEq, Eq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct SolutionType: u16 {
        const ARAIM = 0x4000;
        const SBAS = 0x2000;
        const GBAS = 0x1000;
        const DGNSS = 0x0800;
        const RTK = 0x0400;
        const NRTK = 0x0200;
        const PPP = 0x0100;
        const PPP_AR = 0x0080;
        const PPP_RTK = 0x0040;
        const OTHER = 0x0001;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sentinel_is_not_zero() {
        assert_eq!(lookup(&CODE_BIAS, 0), Some(0.0));
        assert_eq!(lookup(&CODE_BIAS, 15), None);
        assert_eq!(lookup(&CODE_SIGMA, 29), Some(7.0));
        assert_eq!(lookup(&CODE_SIGMA, 30), None);
        assert_eq!(lookup(&RISK_DEGRADATION, 3), Some(1e3));
        assert_eq!(lookup(&RISK_DEGRADATION, 4), None);
        assert_eq!(lookup(&VALIDITY_PERIOD, 15), Some(10800.0));
    }

    #[test]
    fn probabilities() {
        assert!((PROBABILITY[0] - 1e-11).abs() < 1e-20);
        assert!((PROBABILITY[5] - 6.309573444801929e-7).abs() < 1e-15);
        assert_eq!(lookup(&*PROBABILITY, 15), None);
    }

    #[test]
    fn levels() {
        for (index, expected) in [
            (0, None),
            (1, Some(0.0)),
            (19, Some(18.0)),
            (20, Some(19.0)),
            (25, Some(20.0)),
            (245, Some(64.0)),
            (255, Some(74.0)),
        ] {
            match (cnr_level(index), expected) {
                (Some(cnr), Some(expected)) => assert!((cnr - expected).abs() < 1e-9),
                (cnr, expected) => assert_eq!(cnr, expected),
            }
        }
        assert_eq!(agc_level(0), None);
        assert_eq!(agc_level(128), Some(0.0));
        assert_eq!(agc_level(100), Some(-28.0));
        assert_eq!(time_to_alert(0), Some(0.1));
        assert_eq!(time_to_alert(127), None);
    }

    #[test]
    fn solution_types() {
        let solution = SolutionType::from_bits_truncate(0x4000 | 0x0100);
        assert!(solution.contains(SolutionType::ARAIM));
        assert!(solution.contains(SolutionType::PPP));
        assert!(!solution.contains(SolutionType::RTK));
    }
}
