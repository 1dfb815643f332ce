/// Speed of light in vacuum [m/s]
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// One light millisecond [m]
pub const RANGE_MS: f64 = SPEED_OF_LIGHT * 1.0E-3;

/// Semi-circles to radians
pub const SC2RAD: f64 = std::f64::consts::PI;

pub const P2_5: f64 = 1.0 / 32.0;
pub const P2_6: f64 = 1.0 / 64.0;
pub const P2_10: f64 = 1.0 / 1024.0;
pub const P2_11: f64 = 4.882_812_5E-4;
pub const P2_19: f64 = 1.907_348_632_812_5E-6;
pub const P2_20: f64 = 9.536_743_164_062_5E-7;
pub const P2_24: f64 = 5.960_464_477_539_063E-8;
pub const P2_28: f64 = 3.725_290_298_461_914E-9;
pub const P2_29: f64 = 1.862_645_149_230_957E-9;
pub const P2_30: f64 = 9.313_225_746_154_785E-10;
pub const P2_31: f64 = 4.656_612_873_077_393E-10;
pub const P2_32: f64 = 2.328_306_436_538_696E-10;
pub const P2_33: f64 = 1.164_153_218_269_348E-10;
pub const P2_34: f64 = 5.820_766_091_346_741E-11;
pub const P2_40: f64 = 9.094_947_017_729_282E-13;
pub const P2_41: f64 = 4.547_473_508_864_641E-13;
pub const P2_43: f64 = 1.136_868_377_216_16E-13;
pub const P2_46: f64 = 1.421_085_471_520_2E-14;
pub const P2_50: f64 = 8.881_784_197_001_252E-16;
pub const P2_55: f64 = 2.775_557_561_562_891E-17;
pub const P2_59: f64 = 1.734_723_475_976_807E-18;
pub const P2_66: f64 = 1.355_252_715_606_881E-20;

/// Seconds in one week
pub const WEEK_SECONDS: f64 = 604_800.0;

/// Seconds in one day
pub const DAY_SECONDS: f64 = 86_400.0;

/// Moscow time offset to UTC [s]
pub const GLONASS_UTC_OFFSET: f64 = 10_800.0;
