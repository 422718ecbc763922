//! Candidate ranking.

use std::cmp::Ordering;

use super::select::Candidate;

/// Order two candidates by preference.
///
/// 1. Arrival at the destination (earlier is better)
/// 2. Departure (earlier is better)
pub fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.arrival_minute
        .cmp(&b.arrival_minute)
        .then_with(|| a.departure_minute.cmp(&b.departure_minute))
}

/// Rank candidates best-first.
///
/// The sort is stable: candidates that tie on both keys keep their input order.
pub fn rank_candidates(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(compare_candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtt::ServiceRecord;

    fn records(n: usize) -> Vec<ServiceRecord> {
        (0..n)
            .map(|i| ServiceRecord {
                service_uid: format!("S{i}"),
                ..Default::default()
            })
            .collect()
    }

    fn candidate(record: &ServiceRecord, dep: u32, arr: u32) -> Candidate<'_> {
        Candidate {
            record,
            departure_minute: dep,
            arrival_minute: arr,
            duration_minutes: arr - dep,
        }
    }

    fn uids(ranked: &[Candidate<'_>]) -> Vec<String> {
        ranked.iter().map(|c| c.record.service_uid.clone()).collect()
    }

    #[test]
    fn earliest_arrival_first() {
        let rs = records(3);
        let ranked = rank_candidates(vec![
            candidate(&rs[0], 480, 560),
            candidate(&rs[1], 490, 540),
            candidate(&rs[2], 500, 550),
        ]);
        assert_eq!(uids(&ranked), vec!["S1", "S2", "S0"]);
    }

    #[test]
    fn equal_arrival_prefers_earlier_departure() {
        let rs = records(2);
        let ranked = rank_candidates(vec![candidate(&rs[0], 500, 560), candidate(&rs[1], 490, 560)]);
        assert_eq!(uids(&ranked), vec!["S1", "S0"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let rs = records(3);
        for _ in 0..10 {
            let ranked = rank_candidates(vec![
                candidate(&rs[2], 500, 560),
                candidate(&rs[0], 500, 560),
                candidate(&rs[1], 500, 560),
            ]);
            assert_eq!(uids(&ranked), vec!["S2", "S0", "S1"]);
        }
    }

    #[test]
    fn empty_input() {
        assert!(rank_candidates(Vec::new()).is_empty());
    }
}
