//! Wire time fields to [Epoch], disambiguated against a reference [Epoch].
//! Every resolved [Epoch] is expressed in [TimeScale::GPST].
use crate::constants::{DAY_SECONDS, GLONASS_UTC_OFFSET, WEEK_SECONDS};
use hifitime::{Duration, Epoch, TimeScale};

/// GPS - UTC offset [s] applicable at `t`
pub(crate) fn gps_utc_offset(t: Epoch) -> f64 {
    // TAI - GPST = 19s
    t.leap_seconds(true).map(|tai_utc| tai_utc - 19.0).unwrap_or(18.0)
}

/// Week counter and time of week [s] of `t` in `ts`
pub(crate) fn week_tow(t: Epoch, ts: TimeScale) -> (u32, f64) {
    let (week, nanos) = t.to_time_scale(ts).to_time_of_week();
    (week, nanos as f64 * 1.0E-9)
}

/// Builds a GPST [Epoch] from `week` and `tow` [s] expressed in `ts`.
/// `tow` may exceed the week boundaries.
pub(crate) fn from_week_tow(week: u32, tow: f64, ts: TimeScale) -> Epoch {
    let t = Epoch::from_time_of_week(week, 0, ts) + Duration::from_seconds(tow);
    t.to_time_scale(TimeScale::GPST)
}

/// Resolves a time of week [s] in `ts` to the [Epoch] nearest to `reference`.
pub(crate) fn resolve_tow(reference: Epoch, tow: f64, ts: TimeScale) -> Epoch {
    let (week, ref_tow) = week_tow(reference, ts);
    let tow = tow.rem_euclid(WEEK_SECONDS);
    let mut week = week as i64;
    let dt = tow - ref_tow;
    if dt > WEEK_SECONDS / 2.0 {
        week -= 1;
    } else if dt < -WEEK_SECONDS / 2.0 {
        week += 1;
    }
    from_week_tow(week.max(0) as u32, tow, ts)
}

/// GPS time of week [s] of `t`.
pub(crate) fn gps_tow(t: Epoch) -> f64 {
    week_tow(t, TimeScale::GPST).1
}

/// Moscow time of week [s] of `t`, used by Glonass.
fn moscow_tow(t: Epoch) -> f64 {
    (gps_tow(t) - gps_utc_offset(t) + GLONASS_UTC_OFFSET).rem_euclid(WEEK_SECONDS)
}

/// Resolves a Glonass day of week and time of day [s].
/// Day 7 means "unknown": the reference day is then used.
pub(crate) fn resolve_glonass(reference: Epoch, dow: u8, tod: f64) -> Epoch {
    let ref_moscow = moscow_tow(reference);
    let mut t = if dow < 7 {
        dow as f64 * DAY_SECONDS + tod
    } else {
        (ref_moscow / DAY_SECONDS).floor() * DAY_SECONDS + tod
    };
    if dow >= 7 {
        if t - ref_moscow > DAY_SECONDS / 2.0 {
            t -= DAY_SECONDS;
        } else if t - ref_moscow < -DAY_SECONDS / 2.0 {
            t += DAY_SECONDS;
        }
    }
    let tow = t - GLONASS_UTC_OFFSET + gps_utc_offset(reference);
    resolve_tow(reference, tow, TimeScale::GPST)
}

/// Resolves a Glonass time of day [s] (no day of week).
pub(crate) fn resolve_glonass_tod(reference: Epoch, tod: f64) -> Epoch {
    resolve_glonass(reference, 7, tod)
}

/// Glonass day of week and time of day [s] of `t`.
pub(crate) fn glonass_dow_tod(t: Epoch) -> (u8, f64) {
    let moscow = moscow_tow(t);
    let dow = (moscow / DAY_SECONDS).floor();
    (dow as u8, moscow - dow * DAY_SECONDS)
}

/// Picks the full week number nearest to the `reference` week,
/// given a week counter transmitted modulo `modulus`.
/// Weeks preceding the time scale origin are never returned.
pub(crate) fn adjust_week(raw_week: u32, modulus: u32, reference: Epoch, ts: TimeScale) -> u32 {
    let (ref_week, _) = week_tow(reference, ts);
    let k = ((ref_week as f64 - raw_week as f64) / modulus as f64).round();
    let mut week = raw_week as i64 + k as i64 * modulus as i64;
    while week < 0 {
        week += modulus as i64;
    }
    week as u32
}

#[cfg(test)]
mod test {
    use super::*;

    fn reference() -> Epoch {
        from_week_tow(2300, 300_000.0, TimeScale::GPST)
    }

    #[test]
    fn nearest_week() {
        let t0 = reference();
        for (tow, expected_week) in [
            (300_010.0, 2300),
            (10.0, 2300),
            (603_000.0, 2299),
        ] {
            let t = resolve_tow(t0, tow, TimeScale::GPST);
            let (week, resolved) = week_tow(t, TimeScale::GPST);
            assert_eq!(week, expected_week);
            assert!((resolved - tow).abs() < 1.0E-6);
        }

        let late = from_week_tow(2300, 604_000.0, TimeScale::GPST);
        let t = resolve_tow(late, 100.0, TimeScale::GPST);
        assert_eq!(week_tow(t, TimeScale::GPST).0, 2301);
    }

    #[test]
    fn broadcast_week_rollover() {
        let t0 = reference();
        assert_eq!(adjust_week(512, 1024, t0, TimeScale::GPST), 2560);
        assert_eq!(adjust_week(252, 1024, t0, TimeScale::GPST), 2300);
        assert_eq!(adjust_week(2300 % 4096, 4096, t0, TimeScale::GPST), 2300);
        // nearest candidate would precede the origin
        assert_eq!(adjust_week(4095, 4096, t0, TimeScale::GPST), 4095);
        assert_eq!(adjust_week(8191, 8192, t0, TimeScale::GPST), 8191);
    }

    #[test]
    fn glonass_day_and_time() {
        let t0 = reference();
        let (dow, tod) = glonass_dow_tod(t0);
        assert!(dow < 7);
        let t = resolve_glonass(t0, dow, tod);
        assert!((t - t0).to_seconds().abs() < 1.0E-6);
        let t = resolve_glonass_tod(t0, tod);
        assert!((t - t0).to_seconds().abs() < 1.0E-6);
    }

    #[test]
    fn beidou_time() {
        let t0 = reference();
        let (_, bdt_tow) = week_tow(t0, TimeScale::BDT);
        let t = resolve_tow(t0, bdt_tow, TimeScale::BDT);
        assert!((t - t0).to_seconds().abs() < 1.0E-6);
        assert_eq!(t.time_scale, TimeScale::GPST);
    }
}
