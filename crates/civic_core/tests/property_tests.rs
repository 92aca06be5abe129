//! Property-based tests for the scoring engine.
//!
//! Every factor must stay inside [0, 1] for any valid input, scoring must be
//! a pure function of its arguments, and the reported components and weights
//! must reproduce the final score.
//!
//! ```bash
//! cargo test -p civic_core --test property_tests
//! PROPTEST_CASES=10000 cargo test -p civic_core --test property_tests
//! ```

use civic_core::geo::Coordinate;
use civic_core::schema::{IdeaCategory, InfraCondition, InfrastructureObject};
use civic_core::scoring::{
    IdeaSignals, Prioritizer, PriorityTier, ScoringContext, SimilarIdea, duplicate_factor,
    infrastructure_factor, social_factor,
};
use proptest::prelude::*;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

const KINDS: &[&str] = &[
    "football_field",
    "playground",
    "sport_complex",
    "mural",
    "sculpture",
    "art_object",
    "green_zone",
    "park",
    "waste_sorting",
    "bench",
    "lighting",
    "road",
    "library",
];

fn coordinate() -> impl Strategy<Value = Coordinate> {
    (53.9f64..54.1, 86.5f64..86.7).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
}

fn category() -> impl Strategy<Value = IdeaCategory> {
    prop::sample::select(IdeaCategory::ALL.to_vec())
}

fn condition() -> impl Strategy<Value = InfraCondition> {
    prop::sample::select(vec![
        InfraCondition::Poor,
        InfraCondition::Average,
        InfraCondition::Good,
        InfraCondition::Unknown,
    ])
}

fn similar_idea() -> impl Strategy<Value = SimilarIdea> {
    // negative ages are future-dated candidates
    (coordinate(), -5i64..90).prop_map(|(location, age_days)| SimilarIdea {
        location,
        created_at: NOW - Duration::days(age_days),
    })
}

fn infrastructure() -> impl Strategy<Value = InfrastructureObject> {
    (0usize..KINDS.len(), coordinate(), condition()).prop_map(|(kind, location, condition)| {
        InfrastructureObject {
            id: format!("obj-{kind}"),
            kind: KINDS[kind].to_string(),
            location,
            condition,
            name: None,
        }
    })
}

fn signals() -> impl Strategy<Value = IdeaSignals> {
    (coordinate(), category(), 0u32..100_000, 0u32..10_000).prop_map(
        |(location, category, votes_count, comments_count)| IdeaSignals {
            location,
            category,
            votes_count,
            comments_count,
        },
    )
}

fn context() -> impl Strategy<Value = ScoringContext> {
    (
        prop::collection::vec(similar_idea(), 0..30),
        prop::collection::vec(infrastructure(), 0..20),
        0u64..2_000_000,
    )
        .prop_map(|(similar_ideas, infrastructure, city_population)| ScoringContext {
            similar_ideas,
            infrastructure,
            city_population,
            now: NOW,
        })
}

proptest! {
    #[test]
    fn prop_duplicate_factor_in_unit_range(
        origin in coordinate(),
        similar in prop::collection::vec(similar_idea(), 0..40),
    ) {
        let value = duplicate_factor(&origin, &similar, NOW, 200.0);
        prop_assert!((0.0..=1.0).contains(&value), "got {value}");
    }

    #[test]
    fn prop_social_factor_in_unit_range(
        votes in any::<u32>(),
        comments in any::<u32>(),
        population in any::<u64>(),
    ) {
        let value = social_factor(votes, comments, population);
        prop_assert!((0.0..=1.0).contains(&value), "got {value}");
    }

    #[test]
    fn prop_social_factor_grows_with_engagement(
        votes in 0u32..1000,
        extra in 1u32..1000,
        population in 1u64..1_000_000,
    ) {
        let lower = social_factor(votes, 0, population);
        let higher = social_factor(votes + extra, 0, population);
        prop_assert!(higher >= lower);
    }

    #[test]
    fn prop_infrastructure_factor_in_unit_range(
        origin in coordinate(),
        category in category(),
        objects in prop::collection::vec(infrastructure(), 0..30),
    ) {
        let value = infrastructure_factor(&origin, category, &objects, 1000.0);
        prop_assert!((0.0..=1.0).contains(&value), "got {value}");
    }

    #[test]
    fn prop_final_score_bounded_and_tiered(idea in signals(), context in context()) {
        let prioritizer = Prioritizer::default();
        let result = prioritizer.calculate_importance_score(&idea, &context).unwrap();
        prop_assert!((0.0..=1.0).contains(&result.final_score));
        prop_assert_eq!(result.priority, PriorityTier::from_score(result.final_score));
        prop_assert_eq!(result.recommended_action, result.priority.recommended_action());
        for part in [
            result.components.duplicate_score,
            result.components.social_score,
            result.components.infrastructure_score,
        ] {
            prop_assert!((0.0..=1.0).contains(&part));
        }
    }

    #[test]
    fn prop_scoring_is_deterministic(idea in signals(), context in context()) {
        let prioritizer = Prioritizer::default();
        let first = prioritizer.calculate_importance_score(&idea, &context).unwrap();
        let second = prioritizer.calculate_importance_score(&idea, &context).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_components_reproduce_final_score(idea in signals(), context in context()) {
        let result = Prioritizer::default()
            .calculate_importance_score(&idea, &context)
            .unwrap();
        let c = result.components;
        let w = result.weights;
        let recombined = c.duplicate_score * w.duplicate
            + c.social_score * w.social
            + c.infrastructure_score * w.infrastructure;
        prop_assert!((recombined - result.final_score).abs() <= 1e-3,
            "recombined {recombined} vs {}", result.final_score);
    }
}
