use std::collections::BTreeMap;

use proptest::prelude::*;
use reqtags_core::config::{parse_duration, AlertSchedule, AlertSettings, HumanDuration};
use reqtags_core::constants::MAX_SCHEDULE_OFFSET_DAYS;
use reqtags_core::errors::ConfigError;

const MAX_SECS: u64 = i64::MAX as u64;

fn unit() -> impl Strategy<Value = (&'static str, u64)> {
    prop_oneof![
        Just(("seconds", 1u64)),
        Just(("min", 60)),
        Just(("h", 3_600)),
        Just(("days", 86_400)),
        Just(("w", 604_800)),
    ]
}

proptest! {
    #[test]
    fn display_reparses_to_same_offset(secs in prop_oneof![0u64..(100 * 604_800), 0u64..=MAX_SECS]) {
        let d = HumanDuration::from_secs(secs);
        let reparsed = parse_duration(&d.to_string()).unwrap();
        prop_assert_eq!(d, reparsed);
    }

    #[test]
    fn single_part_scales_by_unit(n in 0u64..10_000, (name, scale) in unit()) {
        let d = parse_duration(&format!("{n} {name}")).unwrap();
        prop_assert_eq!(d.as_secs(), n * scale);
    }

    #[test]
    fn compound_parts_sum(a in 0u64..500, b in 0u64..500, (ua, sa) in unit(), (ub, sb) in unit()) {
        let d = parse_duration(&format!("{a}{ua}, {b} {ub}")).unwrap();
        prop_assert_eq!(d.as_secs(), a * sa + b * sb);
    }

    #[test]
    fn alerts_due_is_monotonic(mut offsets in prop::collection::vec(0u64..1_000_000, 0..6),
                               e1 in 0u64..2_000_000, e2 in 0u64..2_000_000) {
        offsets.sort_unstable();
        let schedule = AlertSchedule {
            alert: offsets.into_iter().map(HumanDuration::from_secs).collect(),
            ..AlertSchedule::default()
        };
        let (lo, hi) = if e1 <= e2 { (e1, e2) } else { (e2, e1) };
        prop_assert!(
            schedule.alerts_due(HumanDuration::from_secs(lo))
                <= schedule.alerts_due(HumanDuration::from_secs(hi))
        );
    }

    #[test]
    fn schedule_offsets_past_a_century_are_out_of_range(
        stop in 1u64..=MAX_SECS,
        extra in 0u64..=MAX_SECS,
    ) {
        let remove = stop.saturating_add(extra).min(MAX_SECS);
        let schedule = AlertSchedule {
            alert: vec![HumanDuration::ZERO],
            stop: HumanDuration::from_secs(stop),
            remove: HumanDuration::from_secs(remove),
            scope: vec!["*".to_string()],
        };
        let mut schedules = BTreeMap::new();
        schedules.insert("*".to_string(), schedule);
        let result = AlertSettings::new(schedules).validate();

        let max = HumanDuration::from_days(MAX_SCHEDULE_OFFSET_DAYS).as_secs();
        if remove > max {
            let out_of_range = matches!(result, Err(ConfigError::OutOfRange { .. }));
            prop_assert!(out_of_range);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
