use mongodb::bson::oid::ObjectId;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Derived rating figures for one doctor. Doctors without reviews carry
/// the neutral summary rather than being excluded from listings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub review_count: i64,
}

impl RatingSummary {
    pub const NEUTRAL: RatingSummary = RatingSummary {
        average_rating: 0.0,
        review_count: 0,
    };
}

pub fn summarize(ratings: &[i32]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary::NEUTRAL;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    RatingSummary {
        average_rating: sum as f64 / ratings.len() as f64,
        review_count: ratings.len() as i64,
    }
}

/// Bulk path for listings: one pass over (doctor_id, rating) pairs instead
/// of one query per doctor. Goes through `summarize` so the per-doctor and
/// bulk figures agree exactly.
pub fn summarize_by_doctor(
    pairs: impl IntoIterator<Item = (ObjectId, i32)>,
) -> HashMap<ObjectId, RatingSummary> {
    let mut grouped: HashMap<ObjectId, Vec<i32>> = HashMap::new();
    for (doctor_id, rating) in pairs {
        grouped.entry(doctor_id).or_default().push(rating);
    }
    grouped
        .into_iter()
        .map(|(doctor_id, ratings)| (doctor_id, summarize(&ratings)))
        .collect()
}

/// Default listing order: highest average first.
pub fn rating_order(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_count_over_ratings() {
        let summary = summarize(&[8, 9, 10]);
        assert_eq!(summary.average_rating, 9.0);
        assert_eq!(summary.review_count, 3);
    }

    #[test]
    fn empty_slice_yields_neutral_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.review_count, 0);
    }

    #[test]
    fn bulk_path_matches_single_path() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let pairs = vec![(a, 8), (b, 7), (a, 9), (a, 10)];

        let map = summarize_by_doctor(pairs);
        assert_eq!(map[&a], summarize(&[8, 9, 10]));
        assert_eq!(map[&b], summarize(&[7]));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn listing_sorts_highest_average_first() {
        let mut doctors = vec![
            ("unreviewed", summarize(&[])),
            ("good", summarize(&[7, 8])),
            ("best", summarize(&[8, 9, 10])),
        ];
        doctors.sort_by(|(a_name, a), (b_name, b)| {
            rating_order(a.average_rating, b.average_rating).then_with(|| a_name.cmp(b_name))
        });

        let names: Vec<&str> = doctors.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["best", "good", "unreviewed"]);
    }
}
