use crate::enrich::Assessment;
use crate::scoring::{PriorityTier, round_score};
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct RankedIdea {
    pub rank: usize,
    #[serde(flatten)]
    pub assessment: Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingStatistics {
    pub critical_count: usize,
    pub high_count: usize,
    pub total_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrioritizedIdeas {
    pub total: usize,
    pub by_priority: BTreeMap<PriorityTier, Vec<RankedIdea>>,
    pub top: Vec<RankedIdea>,
    pub statistics: RankingStatistics,
}

/// Orders assessments by final score, highest first, and groups them by tier.
/// Equal scores keep their input order.
pub fn rank(mut assessments: Vec<Assessment>) -> PrioritizedIdeas {
    assessments.sort_by(|a, b| b.result.final_score.total_cmp(&a.result.final_score));

    let ranked: Vec<RankedIdea> = assessments
        .into_iter()
        .enumerate()
        .map(|(index, assessment)| RankedIdea {
            rank: index + 1,
            assessment,
        })
        .collect();

    let mut by_priority: BTreeMap<PriorityTier, Vec<RankedIdea>> =
        PriorityTier::ALL.iter().map(|tier| (*tier, Vec::new())).collect();
    for item in &ranked {
        by_priority
            .entry(item.assessment.result.priority)
            .or_default()
            .push(item.clone());
    }

    let total_score: f64 = ranked.iter().map(|r| r.assessment.result.final_score).sum();
    let statistics = RankingStatistics {
        critical_count: by_priority[&PriorityTier::Critical].len(),
        high_count: by_priority[&PriorityTier::High].len(),
        total_score: round_score(total_score, 3),
    };

    PrioritizedIdeas {
        total: ranked.len(),
        top: ranked.iter().take(TOP_COUNT).cloned().collect(),
        by_priority,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::schema::{Idea, IdeaCategory, IdeaStatus};
    use crate::scoring::{Components, Explanation, PriorityResult, Weights};

    fn assessment(id: &str, score: f64) -> Assessment {
        let priority = PriorityTier::from_score(score);
        let result = PriorityResult {
            final_score: score,
            priority,
            components: Components {
                duplicate_score: score,
                social_score: score,
                infrastructure_score: score,
            },
            weights: Weights::default(),
            explanation: Explanation {
                summary: format!("Priority: {}", priority.as_str().to_uppercase()),
                details: Vec::new(),
                factors: Vec::new(),
            },
            recommended_action: priority.recommended_action(),
        };
        Assessment {
            idea: Idea {
                id: id.to_string(),
                title: format!("Idea {id}"),
                description: "A description long enough".to_string(),
                category: IdeaCategory::Sport,
                status: IdeaStatus::New,
                location: Coordinate::new(54.0, 86.6),
                address: None,
                author_id: "author".to_string(),
                votes_count: 0,
                comments_count: 0,
                duplicate_count: 0,
                importance_score: None,
                infrastructure_deficit: None,
                social_weight: None,
                priority: None,
                photo_urls: Vec::new(),
                created_at: "2025-06-01T12:00:00.000Z".to_string(),
                updated_at: None,
            },
            result,
            nearby_duplicates: 0,
        }
    }

    #[test]
    fn sorts_descending_and_groups_by_tier() {
        let ranked = rank(vec![
            assessment("low", 0.2),
            assessment("critical", 0.9),
            assessment("medium", 0.5),
            assessment("high", 0.65),
            assessment("critical-2", 0.8),
        ]);
        let order: Vec<&str> = ranked.top.iter().map(|r| r.assessment.idea.id.as_str()).collect();
        assert_eq!(order, vec!["critical", "critical-2", "high", "medium", "low"]);
        assert_eq!(ranked.top[0].rank, 1);
        assert_eq!(ranked.total, 5);
        assert_eq!(ranked.by_priority[&PriorityTier::Critical].len(), 2);
        assert_eq!(ranked.by_priority[&PriorityTier::Low].len(), 1);
        assert_eq!(ranked.statistics.critical_count, 2);
        assert_eq!(ranked.statistics.high_count, 1);
        assert!((ranked.statistics.total_score - 3.05).abs() < 1e-9);
    }

    #[test]
    fn top_is_capped_and_ties_are_stable() {
        let items = (0..7).map(|i| assessment(&format!("i{i}"), 0.5)).collect();
        let ranked = rank(items);
        assert_eq!(ranked.top.len(), TOP_COUNT);
        assert_eq!(ranked.top[0].assessment.idea.id, "i0");
        assert_eq!(ranked.top[4].assessment.idea.id, "i4");
        assert_eq!(ranked.by_priority[&PriorityTier::Medium].len(), 7);
        assert!(ranked.by_priority[&PriorityTier::High].is_empty());
    }

    #[test]
    fn empty_batch() {
        let ranked = rank(Vec::new());
        assert_eq!(ranked.total, 0);
        assert!(ranked.top.is_empty());
        assert_eq!(ranked.statistics.total_score, 0.0);
        assert_eq!(ranked.by_priority.len(), 4);
    }
}
