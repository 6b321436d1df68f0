use chrono::{DateTime, Duration, Utc};

use super::timeline::Bounds;

/// Lane chosen for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneAssignment<K> {
    pub item: K,
    pub lane: usize,
}

/// Result of stacking a set of bars into non-overlapping lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneLayout<K> {
    /// One entry per input item, in start order.
    pub assignments: Vec<LaneAssignment<K>>,
    pub lane_count: usize,
}

impl<K: PartialEq> LaneLayout<K> {
    pub fn lane_of(&self, item: &K) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| &a.item == item)
            .map(|a| a.lane)
    }
}

/// Greedy interval partitioning.
///
/// Items are placed in start order into the first lane whose last bar (plus
/// `buffer`) ends strictly before the item starts; otherwise a new lane opens.
/// The sort is stable, so ties keep input order and unrelated items do not
/// swap lanes while another bar is dragged.
pub fn assign_lanes<K: Copy>(items: &[(K, Bounds)], buffer: Duration) -> LaneLayout<K> {
    let mut order: Vec<&(K, Bounds)> = items.iter().collect();
    order.sort_by_key(|(_, bounds)| bounds.start);

    let mut lane_ends: Vec<DateTime<Utc>> = Vec::new();
    let mut assignments = Vec::with_capacity(items.len());

    for (item, bounds) in order {
        let end = bounds.end.max(bounds.start) + buffer;
        let lane = match lane_ends.iter().position(|lane_end| *lane_end < bounds.start) {
            Some(lane) => {
                lane_ends[lane] = end;
                lane
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };
        assignments.push(LaneAssignment { item: *item, lane });
    }

    LaneLayout {
        assignments,
        lane_count: lane_ends.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timeline::to_timestamp;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn span(start: &str, end: &str) -> Bounds {
        Bounds::from_dates(d(start), d(end))
    }

    fn half_day() -> Duration {
        Duration::hours(12)
    }

    #[test]
    fn overlapping_deliverables_stack_and_later_one_reuses_first_lane() {
        let items = [
            (1, span("2025-02-01", "2025-02-10")),
            (2, span("2025-02-05", "2025-02-15")),
            (3, span("2025-02-20", "2025-02-25")),
        ];
        let layout = assign_lanes(&items, half_day());
        assert_eq!(layout.lane_of(&1), Some(0));
        assert_eq!(layout.lane_of(&2), Some(1));
        assert_eq!(layout.lane_of(&3), Some(0));
        assert_eq!(layout.lane_count, 2);
    }

    #[test]
    fn no_items_means_no_lanes() {
        let layout = assign_lanes::<u32>(&[], half_day());
        assert_eq!(layout.lane_count, 0);
        assert!(layout.assignments.is_empty());
    }

    #[test]
    fn zero_duration_item_gets_exactly_one_lane() {
        let items = [(7, span("2025-05-05", "2025-05-05"))];
        let layout = assign_lanes(&items, half_day());
        assert_eq!(layout.assignments, vec![LaneAssignment { item: 7, lane: 0 }]);
        assert_eq!(layout.lane_count, 1);
    }

    #[test]
    fn buffer_separates_back_to_back_bars() {
        // Second bar starts the day the first ends: inside the 12h buffer.
        let items = [
            (1, span("2025-01-01", "2025-01-05")),
            (2, span("2025-01-05", "2025-01-08")),
        ];
        let layout = assign_lanes(&items, half_day());
        assert_eq!(layout.lane_of(&2), Some(1));

        let items = [
            (1, span("2025-01-01", "2025-01-05")),
            (2, span("2025-01-06", "2025-01-08")),
        ];
        assert_eq!(assign_lanes(&items, half_day()).lane_of(&2), Some(0));
    }

    #[test]
    fn nudging_one_bar_does_not_reshuffle_others() {
        let base = [
            (1, span("2025-01-01", "2025-01-20")),
            (2, span("2025-01-10", "2025-01-30")),
            (3, span("2025-02-10", "2025-02-20")),
        ];
        let mut nudged = base;
        nudged[1].1 = nudged[1].1.shifted(Duration::hours(30));

        let before = assign_lanes(&base, half_day());
        let after = assign_lanes(&nudged, half_day());
        for id in [1, 2, 3] {
            assert_eq!(before.lane_of(&id), after.lane_of(&id));
        }
    }

    fn arb_items() -> impl Strategy<Value = Vec<(usize, Bounds)>> {
        prop::collection::vec((0_i64..400, 0_i64..40), 0..40).prop_map(|raw| {
            let origin = to_timestamp(d("2025-01-01"));
            raw.into_iter()
                .enumerate()
                .map(|(i, (offset, len))| {
                    let start = origin + Duration::days(offset);
                    (i, Bounds::new(start, start + Duration::days(len)))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn bars_sharing_a_lane_never_overlap(items in arb_items()) {
            let layout = assign_lanes(&items, half_day());
            prop_assert_eq!(layout.assignments.len(), items.len());
            prop_assert!(layout.lane_count <= items.len());

            for a in &layout.assignments {
                for b in &layout.assignments {
                    if a.item >= b.item || a.lane != b.lane {
                        continue;
                    }
                    let (ab, bb) = (items[a.item].1, items[b.item].1);
                    let disjoint = ab.end + half_day() < bb.start || bb.end + half_day() < ab.start;
                    prop_assert!(disjoint, "{:?} and {:?} share lane {}", ab, bb, a.lane);
                }
            }
        }

        #[test]
        fn disjoint_bars_fit_in_one_lane(gaps in prop::collection::vec((1_i64..30, 0_i64..20), 1..30)) {
            let mut cursor = to_timestamp(d("2025-01-01"));
            let mut items = Vec::new();
            for (i, (gap, len)) in gaps.into_iter().enumerate() {
                let start = cursor + Duration::days(gap);
                let end = start + Duration::days(len);
                items.push((i, Bounds::new(start, end)));
                cursor = end;
            }
            prop_assert_eq!(assign_lanes(&items, half_day()).lane_count, 1);
        }
    }
}
