//! Aggregate counts over a snapshot of ideas.

use crate::error::{CivicError, CivicResult};
use crate::schema::{Idea, IdeaCategory, IdeaStatus, parse_timestamp};
use crate::scoring::{PriorityTier, round_score};
use serde::Serialize;
use std::collections::BTreeMap;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

pub const MAX_PERIOD_DAYS: u32 = 365;
pub const TOP_PROBLEM_THRESHOLD: f64 = 0.7;
pub const TOP_PROBLEM_COUNT: usize = 5;
pub const UNSCORED_HEAT_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    pub total_users: u64,
    pub new_users_in_period: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProblem {
    pub id: String,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
    pub category: IdeaCategory,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trends {
    pub ideas_per_day: f64,
    pub users_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub period_days: u32,
    pub total_ideas: usize,
    pub active_ideas: usize,
    pub completed_ideas: usize,
    pub total_users: u64,
    pub by_category: BTreeMap<IdeaCategory, usize>,
    pub by_status: BTreeMap<IdeaStatus, usize>,
    pub by_priority: BTreeMap<PriorityTier, usize>,
    pub unscored: usize,
    /// Ideas created per UTC day inside the period, oldest day first.
    pub daily: BTreeMap<String, usize>,
    pub top_problems: Vec<TopProblem>,
    pub trends: Trends,
    pub heatmap: Vec<HeatPoint>,
}

/// Summarizes `ideas` as of `now`. Totals and the heatmap cover every idea;
/// category, status, priority and daily counts cover the trailing
/// `period_days` only.
pub fn summarize(
    ideas: &[Idea],
    users: UserStats,
    now: OffsetDateTime,
    period_days: u32,
) -> CivicResult<AnalyticsReport> {
    if period_days == 0 || period_days > MAX_PERIOD_DAYS {
        return Err(CivicError::invalid_input(
            "period_days",
            format!("must be within 1..={MAX_PERIOD_DAYS}, got {period_days}"),
        ));
    }
    let start = now - Duration::days(i64::from(period_days));

    let mut by_category: BTreeMap<IdeaCategory, usize> =
        IdeaCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_status: BTreeMap<IdeaStatus, usize> =
        IdeaStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_priority: BTreeMap<PriorityTier, usize> =
        PriorityTier::ALL.iter().map(|t| (*t, 0)).collect();
    let mut daily = empty_days(start, now);
    let mut unscored = 0;
    let mut in_period = 0usize;

    for idea in ideas {
        let created = parse_timestamp(&idea.created_at)?;
        if created < start || created > now {
            continue;
        }
        in_period += 1;
        *by_category.entry(idea.category).or_default() += 1;
        *by_status.entry(idea.status).or_default() += 1;
        match idea.priority {
            Some(tier) => *by_priority.entry(tier).or_default() += 1,
            None => unscored += 1,
        }
        *daily.entry(day_key(created.to_offset(UtcOffset::UTC).date())).or_default() += 1;
    }

    let mut scored: Vec<&Idea> = ideas
        .iter()
        .filter(|idea| idea.importance_score.is_some_and(|s| s >= TOP_PROBLEM_THRESHOLD))
        .collect();
    scored.sort_by(|a, b| {
        b.importance_score
            .unwrap_or_default()
            .total_cmp(&a.importance_score.unwrap_or_default())
    });
    let top_problems = scored
        .into_iter()
        .take(TOP_PROBLEM_COUNT)
        .map(|idea| TopProblem {
            id: idea.id.clone(),
            title: idea.title.clone(),
            score: idea.importance_score.unwrap_or_default(),
        })
        .collect();

    let days = f64::from(period_days);
    let trends = Trends {
        ideas_per_day: round_score(in_period as f64 / days, 3),
        users_per_day: round_score(users.new_users_in_period as f64 / days, 3),
    };

    Ok(AnalyticsReport {
        period_days,
        total_ideas: ideas.len(),
        active_ideas: ideas.iter().filter(|i| i.status.is_active()).count(),
        completed_ideas: ideas
            .iter()
            .filter(|i| i.status == IdeaStatus::Completed)
            .count(),
        total_users: users.total_users,
        by_category,
        by_status,
        by_priority,
        unscored,
        daily,
        top_problems,
        trends,
        heatmap: heatmap(ideas),
    })
}

/// One point per idea, weighted by importance (0.5 while unscored).
pub fn heatmap(ideas: &[Idea]) -> Vec<HeatPoint> {
    ideas
        .iter()
        .map(|idea| HeatPoint {
            lat: idea.location.latitude,
            lng: idea.location.longitude,
            weight: idea.importance_score.unwrap_or(UNSCORED_HEAT_WEIGHT),
            category: idea.category,
            count: idea.duplicate_count.saturating_add(1),
        })
        .collect()
}

fn empty_days(start: OffsetDateTime, end: OffsetDateTime) -> BTreeMap<String, usize> {
    let mut days = BTreeMap::new();
    let last = end.to_offset(UtcOffset::UTC).date();
    let mut day = start.to_offset(UtcOffset::UTC).date();
    while day <= last {
        days.insert(day_key(day), 0);
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

fn day_key(day: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}
