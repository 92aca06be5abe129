use crate::error::{CivicError, CivicResult};
use crate::geo::Coordinate;
use crate::schema::{Idea, IdeaCategory, InfraCondition, InfrastructureObject};
use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::debug;

pub const DUPLICATE_BASELINE: f64 = 0.3;
const DUPLICATE_RECENCY_DAYS: f64 = 30.0;
const DUPLICATE_EXPECTED_MAX: f64 = 10.0;

const SOCIAL_POPULATION_BASELINE: f64 = 10_000.0;
const SOCIAL_SIGMOID_CENTER: f64 = 5.0;

pub const INFRASTRUCTURE_BASELINE: f64 = 0.5;
const INFRASTRUCTURE_DISTANCE_WEIGHT: f64 = 0.7;
const INFRASTRUCTURE_CONDITION_WEIGHT: f64 = 0.3;

const HIGH_SIGNAL: f64 = 0.7;
const MODERATE_SIGNAL: f64 = 0.4;

const CONFIG_FILE: &str = "prioritizer.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityTier {
    /// Highest urgency first.
    pub const ALL: [PriorityTier; 4] = [
        PriorityTier::Critical,
        PriorityTier::High,
        PriorityTier::Medium,
        PriorityTier::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Critical => "critical",
            PriorityTier::High => "high",
            PriorityTier::Medium => "medium",
            PriorityTier::Low => "low",
        }
    }

    /// Tier for `score` under the default thresholds.
    pub fn from_score(score: f64) -> Self {
        Thresholds::default().tier_for(score)
    }

    pub fn recommended_action(&self) -> RecommendedAction {
        let (timeframe, action, escalation) = match self {
            PriorityTier::Critical => (
                "24-48 hours",
                "Route to the responsible team immediately",
                "Notify foundation leadership",
            ),
            PriorityTier::High => (
                "3-5 days",
                "Include in the nearest work plan",
                "Monitor status weekly",
            ),
            PriorityTier::Medium => (
                "1-2 weeks",
                "Review at the scheduled planning meeting",
                "Standard procedure",
            ),
            PriorityTier::Low => (
                "1 month",
                "Accumulate statistics on similar requests",
                "Automatic monitoring",
            ),
        };
        RecommendedAction {
            timeframe: timeframe.to_string(),
            action: action.to_string(),
            escalation: escalation.to_string(),
        }
    }

    fn urgency_note(&self) -> Option<&'static str> {
        match self {
            PriorityTier::Critical => Some("Requires immediate review"),
            PriorityTier::High => Some("Recommended for review first"),
            PriorityTier::Medium | PriorityTier::Low => None,
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityTier {
    type Err = CivicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PriorityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == value)
            .ok_or_else(|| CivicError::UnknownTier(value.to_string()))
    }
}

/// Action lookup for a stored tier label. Tiers only come out of the
/// threshold function, so an unrecognised label is an error, never a default.
pub fn recommended_action_for(label: &str) -> CivicResult<RecommendedAction> {
    Ok(label.parse::<PriorityTier>()?.recommended_action())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Weights {
    pub duplicate: f64,
    pub social: f64,
    pub infrastructure: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            duplicate: 0.4,
            social: 0.3,
            infrastructure: 0.3,
        }
    }
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.duplicate + self.social + self.infrastructure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical: 0.8,
            high: 0.6,
            medium: 0.4,
        }
    }
}

impl Thresholds {
    /// Evaluated high to low; a score on a boundary belongs to the higher tier.
    pub fn tier_for(&self, score: f64) -> PriorityTier {
        if score >= self.critical {
            PriorityTier::Critical
        } else if score >= self.high {
            PriorityTier::High
        } else if score >= self.medium {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRadius {
    pub duplicate_m: f64,
    pub infrastructure_m: f64,
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self {
            duplicate_m: 200.0,
            infrastructure_m: 1000.0,
        }
    }
}

/// How much data the gathering layer pulls for one idea.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextLimits {
    pub similar_ideas: usize,
    pub infrastructure_radius_m: f64,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            similar_ideas: 10,
            infrastructure_radius_m: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub rounding: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { rounding: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritizerConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub radius: SearchRadius,
    pub context: ContextLimits,
    pub output: OutputConfig,
}

impl PrioritizerConfig {
    /// Reads `prioritizer.toml` from `path`, falling back to the built-in
    /// defaults when the file does not exist.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);
        if !config_path.exists() {
            debug!(path = %config_path.display(), "no prioritizer config, using defaults");
            return Ok(Self::default());
        }
        let config_str = fs::read_to_string(&config_path)?;
        let config: PrioritizerConfig = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CivicResult<()> {
        let weights = [
            self.weights.duplicate,
            self.weights.social,
            self.weights.infrastructure,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CivicError::InvalidConfig(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(CivicError::InvalidConfig(format!(
                "weights must sum to 1.0, got {}",
                self.weights.total()
            )));
        }
        let t = &self.thresholds;
        if !(t.critical <= 1.0 && t.critical > t.high && t.high > t.medium && t.medium > 0.0) {
            return Err(CivicError::InvalidConfig(format!(
                "thresholds must satisfy 1 >= critical > high > medium > 0, got {}/{}/{}",
                t.critical, t.high, t.medium
            )));
        }
        if !(self.radius.duplicate_m > 0.0 && self.radius.infrastructure_m > 0.0) {
            return Err(CivicError::InvalidConfig(
                "search radii must be positive".to_string(),
            ));
        }
        if !(self.context.infrastructure_radius_m > 0.0) || self.context.similar_ideas == 0 {
            return Err(CivicError::InvalidConfig(
                "context limits must be positive".to_string(),
            ));
        }
        if self.output.rounding > 9 {
            return Err(CivicError::InvalidConfig(format!(
                "rounding of {} decimals is out of range",
                self.output.rounding
            )));
        }
        Ok(())
    }
}

/// A nearby idea already judged similar by the upstream lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarIdea {
    pub location: Coordinate,
    pub created_at: OffsetDateTime,
}

/// The slice of an idea the scorer looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdeaSignals {
    pub location: Coordinate,
    pub category: IdeaCategory,
    pub votes_count: u32,
    pub comments_count: u32,
}

impl From<&Idea> for IdeaSignals {
    fn from(idea: &Idea) -> Self {
        Self {
            location: idea.location,
            category: idea.category,
            votes_count: idea.votes_count,
            comments_count: idea.comments_count,
        }
    }
}

/// Externally gathered data needed to score one idea. `now` is carried here
/// so scoring stays a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub similar_ideas: Vec<SimilarIdea>,
    pub infrastructure: Vec<InfrastructureObject>,
    pub city_population: u64,
    pub now: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Components {
    pub duplicate_score: f64,
    pub social_score: f64,
    pub infrastructure_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Explanation {
    pub summary: String,
    pub details: Vec<String>,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendedAction {
    pub timeframe: String,
    pub action: String,
    pub escalation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityResult {
    pub final_score: f64,
    pub priority: PriorityTier,
    pub components: Components,
    pub weights: Weights,
    pub explanation: Explanation,
    pub recommended_action: RecommendedAction,
}

/// Recency-weighted density of similar reports around `origin`.
///
/// Each candidate inside `radius_m` adds `max(0, 1 - age_days / 30)`; the sum
/// is capped at 10 expected duplicates and log-compressed so a handful of
/// recent reports already reads as a strong signal.
pub fn duplicate_factor(
    origin: &Coordinate,
    similar: &[SimilarIdea],
    now: OffsetDateTime,
    radius_m: f64,
) -> f64 {
    if similar.is_empty() {
        return DUPLICATE_BASELINE;
    }

    let total_similarity: f64 = similar
        .iter()
        .filter(|other| origin.distance_m(&other.location) <= radius_m)
        .map(|other| {
            // future-dated reports count as brand new
            let age_days = (now - other.created_at).whole_days().max(0) as f64;
            (1.0 - age_days / DUPLICATE_RECENCY_DAYS).max(0.0)
        })
        .sum();

    let mut factor = clamp_score(total_similarity / DUPLICATE_EXPECTED_MAX, 0.0, 1.0);
    if factor > 0.0 {
        factor = (factor * 10.0).ln_1p() / 10f64.ln_1p();
    }
    factor
}

/// Number of similar ideas inside the duplicate radius, regardless of age.
pub fn nearby_duplicates(origin: &Coordinate, similar: &[SimilarIdea], radius_m: f64) -> usize {
    similar
        .iter()
        .filter(|other| origin.distance_m(&other.location) <= radius_m)
        .count()
}

/// Engagement relative to city size. Comments weigh double a vote.
pub fn social_factor(votes: u32, comments: u32, population: u64) -> f64 {
    if population == 0 {
        return 0.0;
    }
    let engagement = f64::from(votes) + 2.0 * f64::from(comments);
    let normalized = engagement / (population as f64 / SOCIAL_POPULATION_BASELINE);
    let factor = 1.0 / (1.0 + (-(normalized - SOCIAL_SIGMOID_CENTER)).exp());
    factor.min(1.0)
}

/// Infrastructure kinds that serve a category. Empty when the category has
/// no physical counterpart.
pub fn relevant_infrastructure(category: IdeaCategory) -> &'static [&'static str] {
    match category {
        IdeaCategory::Sport => &["football_field", "playground", "sport_complex"],
        IdeaCategory::Art => &["mural", "sculpture", "art_object"],
        IdeaCategory::Ecology => &["green_zone", "park", "waste_sorting"],
        IdeaCategory::Infrastructure => &["bench", "lighting", "road"],
        IdeaCategory::Education | IdeaCategory::Culture | IdeaCategory::Other => &[],
    }
}

pub fn condition_factor(condition: InfraCondition) -> f64 {
    match condition {
        InfraCondition::Poor => 0.8,
        InfraCondition::Average => 0.5,
        InfraCondition::Good => 0.2,
        InfraCondition::Unknown => 0.5,
    }
}

/// Deficit of category-relevant infrastructure near `origin`.
pub fn infrastructure_factor(
    origin: &Coordinate,
    category: IdeaCategory,
    objects: &[InfrastructureObject],
    radius_m: f64,
) -> f64 {
    let target_kinds = relevant_infrastructure(category);
    if target_kinds.is_empty() || objects.is_empty() {
        return INFRASTRUCTURE_BASELINE;
    }

    let mut nearest: Option<(f64, InfraCondition)> = None;
    for object in objects {
        if !target_kinds.contains(&object.kind.as_str()) {
            continue;
        }
        let distance = origin.distance_m(&object.location);
        if nearest.is_none_or(|(best, _)| distance < best) {
            nearest = Some((distance, object.condition));
        }
    }

    let (distance_factor, condition) = match nearest {
        // nothing relevant anywhere is the strongest deficit
        None => (1.0, InfraCondition::Unknown),
        Some((distance, condition)) => (clamp_score(1.0 - distance / radius_m, 0.0, 1.0), condition),
    };

    distance_factor * INFRASTRUCTURE_DISTANCE_WEIGHT
        + condition_factor(condition) * INFRASTRUCTURE_CONDITION_WEIGHT
}

/// Combines the three factors into a score, tier and recommendation.
///
/// Holds configuration only; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct Prioritizer {
    config: PrioritizerConfig,
}

impl Prioritizer {
    pub fn new(config: PrioritizerConfig) -> CivicResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrioritizerConfig {
        &self.config
    }

    pub fn calculate_importance_score(
        &self,
        idea: &IdeaSignals,
        context: &ScoringContext,
    ) -> CivicResult<PriorityResult> {
        validate_inputs(idea, context)?;

        let raw = Components {
            duplicate_score: duplicate_factor(
                &idea.location,
                &context.similar_ideas,
                context.now,
                self.config.radius.duplicate_m,
            ),
            social_score: social_factor(
                idea.votes_count,
                idea.comments_count,
                context.city_population,
            ),
            infrastructure_score: infrastructure_factor(
                &idea.location,
                idea.category,
                &context.infrastructure,
                self.config.radius.infrastructure_m,
            ),
        };

        let final_score = self.combine(&raw);
        let priority = self.config.thresholds.tier_for(final_score);
        debug!(
            duplicate = raw.duplicate_score,
            social = raw.social_score,
            infrastructure = raw.infrastructure_score,
            final_score,
            %priority,
            "scored idea"
        );

        let decimals = self.config.output.rounding;
        Ok(PriorityResult {
            final_score,
            priority,
            components: Components {
                duplicate_score: round_score(raw.duplicate_score, decimals),
                social_score: round_score(raw.social_score, decimals),
                infrastructure_score: round_score(raw.infrastructure_score, decimals),
            },
            weights: self.config.weights,
            explanation: explain(&raw, priority),
            recommended_action: priority.recommended_action(),
        })
    }

    /// Weighted sum of the components, clamped and rounded.
    pub fn combine(&self, components: &Components) -> f64 {
        let weights = &self.config.weights;
        let weighted = components.duplicate_score * weights.duplicate
            + components.social_score * weights.social
            + components.infrastructure_score * weights.infrastructure;
        round_score(clamp_score(weighted, 0.0, 1.0), self.config.output.rounding)
    }

    pub fn tier_for(&self, score: f64) -> PriorityTier {
        self.config.thresholds.tier_for(score)
    }
}

fn validate_inputs(idea: &IdeaSignals, context: &ScoringContext) -> CivicResult<()> {
    idea.location.validate("idea.location")?;
    for (index, other) in context.similar_ideas.iter().enumerate() {
        other
            .location
            .validate(&format!("similar_ideas[{index}].location"))?;
    }
    for (index, object) in context.infrastructure.iter().enumerate() {
        object
            .location
            .validate(&format!("infrastructure[{index}].location"))?;
    }
    Ok(())
}

fn explain(components: &Components, priority: PriorityTier) -> Explanation {
    let mut details = Vec::new();

    push_signal(
        &mut details,
        components.duplicate_score,
        "Many residents report this same problem",
        "Several residents have noted similar problems",
    );
    push_signal(
        &mut details,
        components.social_score,
        "The idea has strong community support",
        "The idea has drawn interest from residents",
    );
    push_signal(
        &mut details,
        components.infrastructure_score,
        "The area has an acute shortage of such facilities",
        "Existing infrastructure needs improvement",
    );
    if let Some(note) = priority.urgency_note() {
        details.push(note.to_string());
    }

    Explanation {
        summary: format!("Priority: {}", priority.as_str().to_uppercase()),
        details,
        factors: vec![
            format!("Problem recurrence: {}", percent(components.duplicate_score)),
            format!("Resident support: {}", percent(components.social_score)),
            format!("Infrastructure deficit: {}", percent(components.infrastructure_score)),
        ],
    }
}

fn push_signal(details: &mut Vec<String>, score: f64, high: &str, moderate: &str) {
    if score > HIGH_SIGNAL {
        details.push(high.to_string());
    } else if score > MODERATE_SIGNAL {
        details.push(moderate.to_string());
    }
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

pub fn clamp_score(value: f64, floor: f64, ceiling: f64) -> f64 {
    value.max(floor).min(ceiling)
}

pub fn round_score(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
