//! Gathers the external context a score needs: similar ideas, nearby
//! infrastructure and city population. This is the only part of scoring that
//! touches the store.

use crate::db;
use crate::schema::{Idea, parse_timestamp};
use crate::scoring::{
    ContextLimits, IdeaSignals, Prioritizer, PriorityResult, ScoringContext, SimilarIdea,
    nearby_duplicates,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use time::OffsetDateTime;
use tracing::debug;

const CITIES_FILE: &str = "cities.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityProfile {
    pub name: String,
    pub population: u64,
    pub area_km2: f64,
}

impl CityProfile {
    pub fn density_per_km2(&self) -> f64 {
        if self.area_km2 <= 0.0 {
            return 0.0;
        }
        self.population as f64 / self.area_km2
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CitiesFile {
    #[serde(default)]
    fallback: Option<CityProfile>,
    cities: Vec<CityProfile>,
}

/// Population reference table with a fallback profile for unknown cities.
#[derive(Debug, Clone)]
pub struct CityDirectory {
    cities: Vec<CityProfile>,
    fallback: CityProfile,
}

impl Default for CityDirectory {
    fn default() -> Self {
        let cities = [
            ("Kiselyovsk", 84_369, 160.0),
            ("Barnaul", 632_372, 939.0),
            ("Novokuznetsk", 537_480, 424.0),
        ]
        .into_iter()
        .map(|(name, population, area_km2)| CityProfile {
            name: name.to_string(),
            population,
            area_km2,
        })
        .collect();
        Self {
            cities,
            fallback: default_city(),
        }
    }
}

fn default_city() -> CityProfile {
    CityProfile {
        name: "unknown".to_string(),
        population: 50_000,
        area_km2: 100.0,
    }
}

impl CityDirectory {
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let cities_path = path.join(CITIES_FILE);
        if !cities_path.exists() {
            debug!(path = %cities_path.display(), "no city table, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&cities_path)
            .with_context(|| format!("reading {}", cities_path.display()))?;
        let file: CitiesFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing {}", cities_path.display()))?;
        Ok(Self {
            cities: file.cities,
            fallback: file.fallback.unwrap_or_else(default_city),
        })
    }

    /// Case-insensitive lookup; unknown names get the fallback profile.
    pub fn lookup(&self, name: &str) -> &CityProfile {
        let name = name.trim().to_lowercase();
        self.cities
            .iter()
            .find(|city| city.name.to_lowercase() == name)
            .unwrap_or(&self.fallback)
    }

    pub fn population(&self, name: &str) -> u64 {
        self.lookup(name).population
    }

    pub fn cities(&self) -> &[CityProfile] {
        &self.cities
    }
}

/// Builds the scoring context for a stored idea.
pub fn gather_context(
    conn: &Connection,
    idea: &Idea,
    city_population: u64,
    limits: &ContextLimits,
    now: OffsetDateTime,
) -> Result<ScoringContext> {
    let similar_ideas = db::similar_ideas(conn, idea, limits.similar_ideas)?
        .iter()
        .map(|other| -> Result<SimilarIdea> {
            Ok(SimilarIdea {
                location: other.location,
                created_at: parse_timestamp(&other.created_at)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let infrastructure =
        db::infrastructure_within(conn, &idea.location, limits.infrastructure_radius_m)?;

    debug!(
        idea_id = %idea.id,
        similar = similar_ideas.len(),
        infrastructure = infrastructure.len(),
        city_population,
        "gathered scoring context"
    );
    Ok(ScoringContext {
        similar_ideas,
        infrastructure,
        city_population,
        now,
    })
}

/// An idea together with its freshly computed priority.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub idea: Idea,
    pub result: PriorityResult,
    pub nearby_duplicates: u32,
}

pub fn assess(
    conn: &Connection,
    prioritizer: &Prioritizer,
    idea: Idea,
    city_population: u64,
    now: OffsetDateTime,
) -> Result<Assessment> {
    let config = prioritizer.config();
    let context = gather_context(conn, &idea, city_population, &config.context, now)?;
    let result = prioritizer
        .calculate_importance_score(&IdeaSignals::from(&idea), &context)
        .with_context(|| format!("scoring idea {}", idea.id))?;
    let nearby = nearby_duplicates(&idea.location, &context.similar_ideas, config.radius.duplicate_m);
    Ok(Assessment {
        idea,
        result,
        nearby_duplicates: u32::try_from(nearby).unwrap_or(u32::MAX),
    })
}

/// Scores an idea and writes the derived fields back to the store. The
/// returned idea reflects the stored values.
pub fn assess_and_store(
    conn: &Connection,
    prioritizer: &Prioritizer,
    idea: Idea,
    city_population: u64,
    now: OffsetDateTime,
) -> Result<Assessment> {
    let mut assessment = assess(conn, prioritizer, idea, city_population, now)?;
    db::apply_priority(
        conn,
        &assessment.idea.id,
        &assessment.result,
        assessment.nearby_duplicates,
        now,
    )?;
    assessment.idea = db::require_idea(conn, &assessment.idea.id)?;
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::schema::{IdeaCategory, InfraCondition, InfrastructureObject, NewIdea};
    use crate::scoring::PriorityTier;
    use time::Duration;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

    fn submit(conn: &Connection, title: &str, category: IdeaCategory, lat: f64, at: OffsetDateTime) -> Idea {
        let draft = NewIdea {
            title: title.to_string(),
            description: "Something the neighbourhood keeps asking for".to_string(),
            category: Some(category),
            location: Coordinate::new(lat, 86.6),
            address: None,
            photo_urls: Vec::new(),
        };
        db::create_idea(conn, &draft, category, None, at).unwrap()
    }

    #[test]
    fn city_lookup_ignores_case_and_falls_back() {
        let cities = CityDirectory::default();
        assert_eq!(cities.population("barnaul"), 632_372);
        assert_eq!(cities.population(" KISELYOVSK "), 84_369);
        assert_eq!(cities.population("Atlantis"), 50_000);
        assert!((cities.lookup("Novokuznetsk").density_per_km2() - 537_480.0 / 424.0).abs() < 1e-9);
    }

    #[test]
    fn city_table_parses_from_yaml() {
        let file: CitiesFile = serde_yaml::from_str(
            r#"
fallback: { name: unknown, population: 1000, area_km2: 10 }
cities:
  - { name: Tomsk, population: 568508, area_km2: 297 }
"#,
        )
        .unwrap();
        let cities = CityDirectory {
            cities: file.cities,
            fallback: file.fallback.unwrap(),
        };
        assert_eq!(cities.population("tomsk"), 568_508);
        assert_eq!(cities.population("Barnaul"), 1000);
    }

    #[test]
    fn context_uses_same_category_and_nearby_infrastructure() {
        let conn = db::open_in_memory().unwrap();
        let idea = submit(&conn, "Football pitch", IdeaCategory::Sport, 54.0, NOW);
        submit(&conn, "Football goals", IdeaCategory::Sport, 54.0005, NOW - Duration::days(3));
        submit(&conn, "Mural on school", IdeaCategory::Art, 54.0, NOW);
        db::upsert_infrastructure(
            &conn,
            &InfrastructureObject {
                id: "f-1".to_string(),
                kind: "football_field".to_string(),
                location: Coordinate::new(54.02, 86.6),
                condition: InfraCondition::Poor,
                name: None,
            },
        )
        .unwrap();
        db::upsert_infrastructure(
            &conn,
            &InfrastructureObject {
                id: "far".to_string(),
                kind: "football_field".to_string(),
                location: Coordinate::new(55.0, 86.6),
                condition: InfraCondition::Good,
                name: None,
            },
        )
        .unwrap();

        let context = gather_context(&conn, &idea, 84_369, &ContextLimits::default(), NOW).unwrap();
        assert_eq!(context.similar_ideas.len(), 1);
        assert_eq!(context.similar_ideas[0].created_at, NOW - Duration::days(3));
        assert_eq!(context.infrastructure.len(), 1);
        assert_eq!(context.infrastructure[0].id, "f-1");
        assert_eq!(context.city_population, 84_369);
    }

    #[test]
    fn assess_and_store_writes_back_scores() {
        let conn = db::open_in_memory().unwrap();
        let idea = submit(&conn, "Football pitch", IdeaCategory::Sport, 54.0, NOW);
        submit(&conn, "Football goals", IdeaCategory::Sport, 54.0005, NOW);

        let assessment = assess_and_store(&conn, &Prioritizer::default(), idea, 84_369, NOW).unwrap();
        assert_eq!(assessment.nearby_duplicates, 1);
        let stored = &assessment.idea;
        assert_eq!(stored.importance_score, Some(assessment.result.final_score));
        assert_eq!(stored.social_weight, Some(assessment.result.components.social_score));
        assert_eq!(
            stored.infrastructure_deficit,
            Some(assessment.result.components.infrastructure_score)
        );
        assert_eq!(stored.duplicate_count, 1);
        assert_eq!(stored.priority, Some(assessment.result.priority));
        assert_ne!(stored.priority, Some(PriorityTier::Critical));
    }
}
