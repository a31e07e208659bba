//! Per-stop relative position of a vehicle and an optional target stop.
//!
//! Every stop gets exactly one [`StopState`]. Rules, first match wins:
//!
//! 1. `Unknown` when there is no current sequence
//! 2. `Current` at the current sequence
//! 3. `Target` at the target sequence
//! 4. `Passed` behind the current sequence
//! 5. `Between` strictly between current and target
//! 6. `Upcoming` ahead of the current sequence
//! 7. `Unknown` otherwise
//!
//! A target that is already behind the vehicle keeps its `Target` label, and
//! nothing is labelled `Between`: that band only exists in the direction of
//! travel. Both the stop list and the map markers are styled from this output.

use crate::models::types::Stop;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StopState {
    Passed,
    Current,
    Between,
    Target,
    Upcoming,
    Unknown,
}

impl StopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Current => "current",
            Self::Between => "between",
            Self::Target => "target",
            Self::Upcoming => "upcoming",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedStop {
    pub stop: Stop,
    pub state: StopState,
}

/// Label a single stop.
pub fn classify_sequence(sequence: u32, current: Option<u32>, target: Option<u32>) -> StopState {
    let Some(current) = current else {
        return StopState::Unknown;
    };

    if sequence == current {
        StopState::Current
    } else if Some(sequence) == target {
        StopState::Target
    } else if sequence < current {
        StopState::Passed
    } else if target.is_some_and(|t| current < sequence && sequence < t) {
        StopState::Between
    } else if sequence > current {
        StopState::Upcoming
    } else {
        StopState::Unknown
    }
}

/// Label every stop, preserving input order.
pub fn classify(stops: &[Stop], current: Option<u32>, target: Option<u32>) -> Vec<ClassifiedStop> {
    stops
        .iter()
        .map(|stop| ClassifiedStop {
            stop: stop.clone(),
            state: classify_sequence(stop.sequence, current, target),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use proptest::prelude::*;

    fn stops(n: u32) -> Vec<Stop> {
        (1..=n)
            .map(|seq| {
                Stop::new(format!("s{seq}"), format!("Stop {seq}"), seq, Point::new(101.6, 3.1))
            })
            .collect()
    }

    fn states(classified: &[ClassifiedStop]) -> Vec<StopState> {
        classified.iter().map(|c| c.state).collect()
    }

    #[test]
    fn test_no_current_is_all_unknown() {
        let out = classify(&stops(4), None, Some(3));
        assert!(out.iter().all(|c| c.state == StopState::Unknown));
    }

    #[test]
    fn test_target_ahead() {
        use StopState::*;
        let out = classify(&stops(7), Some(2), Some(5));
        assert_eq!(
            states(&out),
            vec![Passed, Current, Between, Between, Target, Upcoming, Upcoming]
        );
    }

    #[test]
    fn test_no_target() {
        use StopState::*;
        let out = classify(&stops(4), Some(2), None);
        assert_eq!(states(&out), vec![Passed, Current, Upcoming, Upcoming]);
    }

    #[test]
    fn test_target_already_passed() {
        use StopState::*;
        let out = classify(&stops(6), Some(4), Some(2));
        assert_eq!(states(&out), vec![Passed, Target, Passed, Current, Upcoming, Upcoming]);
        assert!(out.iter().all(|c| c.state != Between));
    }

    #[test]
    fn test_current_wins_over_target() {
        let out = classify(&stops(3), Some(2), Some(2));
        assert_eq!(out[1].state, StopState::Current);
        assert!(out.iter().all(|c| c.state != StopState::Target));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let list = stops(10);
        let first = classify(&list, Some(3), Some(8));
        let second = classify(&list, Some(3), Some(8));
        assert_eq!(first, second);
    }

    #[test]
    fn test_preserves_input_order() {
        let mut list = stops(3);
        list.reverse();
        let out = classify(&list, Some(2), None);
        let seqs: Vec<u32> = out.iter().map(|c| c.stop.sequence).collect();
        assert_eq!(seqs, vec![3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_every_stop_gets_one_state(
            n in 0u32..40,
            current in proptest::option::of(0u32..45),
            target in proptest::option::of(0u32..45),
        ) {
            let list = stops(n);
            let out = classify(&list, current, target);
            prop_assert_eq!(out.len(), list.len());
            for (c, s) in out.iter().zip(list.iter()) {
                prop_assert_eq!(&c.stop, s);
            }
        }

        #[test]
        fn prop_passed_and_upcoming_never_interleave(
            n in 1u32..40,
            current in 1u32..40,
            target in proptest::option::of(1u32..40),
        ) {
            let out = classify(&stops(n), Some(current), target);
            for c in &out {
                match c.state {
                    StopState::Passed => prop_assert!(c.stop.sequence < current),
                    StopState::Upcoming | StopState::Between => {
                        prop_assert!(c.stop.sequence > current)
                    }
                    StopState::Current => prop_assert_eq!(c.stop.sequence, current),
                    StopState::Target => prop_assert_eq!(Some(c.stop.sequence), target),
                    StopState::Unknown => prop_assert!(false, "unknown with a current stop"),
                }
            }

            let last_passed = out.iter().rposition(|c| c.state == StopState::Passed);
            let first_upcoming = out.iter().position(|c| c.state == StopState::Upcoming);
            if let (Some(p), Some(u)) = (last_passed, first_upcoming) {
                prop_assert!(p < u);
            }
        }
    }
}
