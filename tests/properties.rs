// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

use chrono::NaiveDate;
use epochframe::{
    CalendarDateTime, EopEntry, InMemoryLoader, Instant, PVCoordinates, Result, Rotation,
    ScaleKind, TimeScales, Transform, Vector3, GPS, TAI, TT,
};
use proptest::prelude::*;
use qtty::Seconds;

fn scales() -> TimeScales {
    let entries = (0..60)
        .map(|i| {
            let date = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap() + chrono::Duration::days(i);
            EopEntry::new(date, -0.05 - 0.0005 * i as f64, 0.02, 0.30)
        })
        .collect();
    TimeScales::load(&InMemoryLoader::with_iers_leap_seconds(entries)).unwrap()
}

fn to_calendar(scales: &TimeScales, kind: ScaleKind, t: &Instant) -> Result<CalendarDateTime> {
    match kind {
        ScaleKind::Tai => t.to_calendar(&TAI),
        ScaleKind::Tt => t.to_calendar(&TT),
        ScaleKind::Gps => t.to_calendar(&GPS),
        ScaleKind::Utc => t.to_calendar(scales.utc()),
        ScaleKind::Ut1 => t.to_calendar(scales.ut1()),
    }
}

fn from_calendar(scales: &TimeScales, kind: ScaleKind, c: &CalendarDateTime) -> Instant {
    match kind {
        ScaleKind::Tai => Instant::from_calendar_date_time(c, &TAI),
        ScaleKind::Tt => Instant::from_calendar_date_time(c, &TT),
        ScaleKind::Gps => Instant::from_calendar_date_time(c, &GPS),
        ScaleKind::Utc => Instant::from_calendar_date_time(c, scales.utc()),
        ScaleKind::Ut1 => Instant::from_calendar_date_time(c, scales.ut1()),
    }
}

/// Away from instants where a scale's reading steps (leap resets, EOP end).
fn is_regular(scales: &TimeScales, t: &Instant) -> bool {
    let far = |edge: Instant| t.duration_from(&edge).value().abs() > 2.0;
    scales.utc().leap_seconds().entries().iter().all(|leap| far(leap.boundary()))
        && far(scales.ut1().eop_history().end_date())
}

fn arb_instant() -> impl Strategy<Value = Instant> {
    (-3_000_000_000i64..3_000_000_000i64, 0.0f64..1.0).prop_map(|(whole, fraction)| {
        Instant::TAI_REFERENCE
            .shifted_by(Seconds::new(whole as f64))
            .shifted_by(Seconds::new(fraction))
    })
}

fn arb_scale() -> impl Strategy<Value = ScaleKind> {
    prop::sample::select(ScaleKind::ALL.to_vec())
}

fn arb_vector(bound: f64) -> impl Strategy<Value = Vector3> {
    (-bound..bound, -bound..bound, -bound..bound).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn arb_transform() -> impl Strategy<Value = Transform> {
    (
        arb_vector(1.0),
        -3.0f64..3.0,
        arb_vector(1e-3),
        arb_vector(1e7),
        arb_vector(1e4),
    )
        .prop_filter_map("degenerate axis", |(axis, angle, rate, translation, velocity)| {
            let rotation = Rotation::from_axis_angle(axis, angle)?;
            (axis.norm() > 1e-3).then(|| {
                Transform::new(Instant::J2000_EPOCH, rotation, rate, translation, velocity)
            })
        })
}

proptest! {
    #[test]
    fn calendar_round_trip(t in arb_instant(), kind in arb_scale()) {
        let scales = scales();
        prop_assume!(is_regular(&scales, &t));
        let calendar = to_calendar(&scales, kind, &t).unwrap();
        let back = from_calendar(&scales, kind, &calendar);
        let error = back.duration_from(&t).value();
        prop_assert!(error.abs() < 1e-9, "{kind}: {t} -> {calendar:?} -> {back} ({error:e} s)");
    }

    #[test]
    fn durations_do_not_depend_on_scale(
        a in arb_instant(),
        b in arb_instant(),
        sa in arb_scale(),
        sb in arb_scale(),
    ) {
        let scales = scales();
        prop_assume!(is_regular(&scales, &a) && is_regular(&scales, &b));
        let a2 = from_calendar(&scales, sa, &to_calendar(&scales, sa, &a).unwrap());
        let b2 = from_calendar(&scales, sb, &to_calendar(&scales, sb, &b).unwrap());
        let direct = a.duration_from(&b).value();
        let via_scales = a2.duration_from(&b2).value();
        prop_assert!((direct - via_scales).abs() < 2e-9, "{direct} vs {via_scales}");
    }

    #[test]
    fn shift_then_measure(t in arb_instant(), dt in -1.0e6f64..1.0e6) {
        let shifted = t.shifted_by(Seconds::new(dt));
        prop_assert!((shifted.duration_from(&t).value() - dt).abs() < 1e-9);
        if dt.abs() > 1e-6 {
            prop_assert_eq!(shifted > t, dt > 0.0);
        }
    }

    #[test]
    fn transform_inverse_is_identity(t in arb_transform()) {
        let round = t.compose(&t.inverse());
        prop_assert!(round.rotation().angle() < 1e-12);
        prop_assert!(round.translation().norm() < 1e-12 * t.translation().norm().max(1.0));
        prop_assert!(round.rotation_rate().norm() < 1e-12);
        let scale = t.velocity().norm() + t.rotation_rate().norm() * t.translation().norm() + 1.0;
        prop_assert!(round.velocity().norm() < 1e-12 * scale);
    }

    #[test]
    fn composition_matches_sequential_application(
        a in arb_transform(),
        b in arb_transform(),
        p in arb_vector(1e7),
        v in arb_vector(1e4),
    ) {
        let pv = PVCoordinates::new(p, v);
        let chained = a.compose(&b).transform_pv(&pv);
        let stepwise = b.transform_pv(&a.transform_pv(&pv));
        let position_scale = p.norm() + a.translation().norm() + b.translation().norm() + 1.0;
        prop_assert!(chained.position.distance(&stepwise.position) < 1e-12 * position_scale);
        let velocity_scale = stepwise.velocity.norm() + 1e-3 * position_scale + 1.0;
        prop_assert!(chained.velocity.distance(&stepwise.velocity) < 1e-12 * velocity_scale);
    }
}
