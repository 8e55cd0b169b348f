//! Invariants that must hold after any sequence of progress operations.

use chrono::{DateTime, Duration, Local, TimeZone};
use focusroom_core::progress::catalog;
use focusroom_core::{MemoryStore, ProgressEngine};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Record { minutes: u32 },
    Update { index: usize, progress: i64 },
    Unlock { index: usize },
    ResetCheck,
    SetGoal { goal: u32 },
}

fn op() -> impl Strategy<Value = Op> {
    let n = catalog().len();
    prop_oneof![
        4 => (0u32..240).prop_map(|minutes| Op::Record { minutes }),
        2 => (0..n, -50i64..200).prop_map(|(index, progress)| Op::Update { index, progress }),
        1 => (0..n).prop_map(|index| Op::Unlock { index }),
        1 => Just(Op::ResetCheck),
        1 => (1u32..1200).prop_map(|goal| Op::SetGoal { goal }),
    ]
}

fn start() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 12, 8, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn unlocked_implies_full_and_never_relocks(
        steps in prop::collection::vec((op(), 0i64..60), 1..60)
    ) {
        let store = MemoryStore::new();
        let mut now = start();
        let mut engine = ProgressEngine::new(600, now);
        let ids: Vec<String> = engine.achievements().iter().map(|a| a.id.clone()).collect();
        let mut ever_unlocked: HashSet<String> = HashSet::new();

        for (op, advance_hours) in steps {
            now += Duration::hours(advance_hours);
            match op {
                Op::Record { minutes } => {
                    engine.record_session(&store, minutes, now);
                }
                Op::Update { index, progress } => {
                    engine.update_progress(&store, &ids[index], progress, now).unwrap();
                }
                Op::Unlock { index } => {
                    engine.unlock_achievement(&store, &ids[index], now).unwrap();
                }
                Op::ResetCheck => {
                    engine.check_weekly_reset(&store, now);
                }
                Op::SetGoal { goal } => {
                    engine.set_weekly_goal(&store, goal, now);
                }
            }

            for a in engine.achievements() {
                prop_assert!(a.progress <= 100);
                if a.unlocked {
                    prop_assert_eq!(a.progress, 100);
                    ever_unlocked.insert(a.id.clone());
                } else {
                    prop_assert!(!ever_unlocked.contains(&a.id), "{} relocked", a.id);
                }
            }
            prop_assert!(engine.state().percent_of_goal() <= 100);
        }
    }

    #[test]
    fn reset_check_is_idempotent_within_a_week(
        minutes in 1u32..500,
        days_later in 0i64..40,
    ) {
        let store = MemoryStore::new();
        let mut engine = ProgressEngine::new(600, start());
        engine.record_session(&store, minutes, start());

        let now = start() + Duration::days(days_later);
        engine.check_weekly_reset(&store, now);
        let after_first = engine.state().clone();
        prop_assert!(engine.check_weekly_reset(&store, now).is_empty());
        prop_assert_eq!(engine.state(), &after_first);
    }

    #[test]
    fn persisted_state_reloads_identically(
        sessions in prop::collection::vec((0u32..180, 0i64..30), 1..20)
    ) {
        let store = MemoryStore::new();
        let mut now = start();
        let mut engine = ProgressEngine::new(600, now);
        for (minutes, hours) in sessions {
            now += Duration::hours(hours);
            engine.record_session(&store, minutes, now);
        }

        let reloaded = ProgressEngine::load(&store, 600, now);
        prop_assert_eq!(reloaded.state(), engine.state());
        prop_assert_eq!(reloaded.achievements(), engine.achievements());
    }
}
