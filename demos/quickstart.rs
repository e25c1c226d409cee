// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

use chrono::{NaiveDate, Utc};
use epochframe::providers::{GCRF, ITRF};
use epochframe::{
    EopEntry, FrameTree, InMemoryLoader, Instant, PVCoordinates, Result, ScaleKind,
    TimeScalesFactory, Vector3,
};

fn main() -> Result<()> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let eop = (0..31)
        .map(|d| {
            let date = start + chrono::Duration::days(d);
            EopEntry::new(date, 0.01 - 0.0004 * d as f64, 0.1, 0.25)
        })
        .collect();
    let factory = TimeScalesFactory::new(InMemoryLoader::with_iers_leap_seconds(eop));
    let scales = factory.scales()?;

    let now = Instant::from_utc(Utc::now(), scales.utc());
    let date = scales.instant(ScaleKind::Utc, 2024, 1, 15, 12, 0, 0.0)?;
    println!("now:            {now}");
    println!("2024-01-15 UTC: {date}");
    for kind in ScaleKind::ALL {
        println!("  {kind:>3} − TAI = {:+.6} s", scales.offset_from_reference(kind, &date).value());
    }

    let tree = FrameTree::earth_hierarchy(&scales)?;
    let (itrf, gcrf) = match (tree.frame_by_name(ITRF), tree.frame_by_name(GCRF)) {
        (Some(itrf), Some(gcrf)) => (itrf, gcrf),
        _ => return Ok(()),
    };
    let station = PVCoordinates::new(
        Vector3::new(4_849_202.0, -360_329.0, 4_114_913.0),
        Vector3::ZERO,
    );
    let inertial = tree.transform(itrf, gcrf, &date)?.transform_pv(&station);
    println!("station in GCRF: {:?}", inertial.position);
    println!("station speed:   {:.3} m/s", inertial.velocity.norm());
    Ok(())
}
