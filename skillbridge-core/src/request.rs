//! Roadmap request and its cache key

use crate::enums::{SkillLevel, TimeAvailability};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Learner profile details used to personalise a roadmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    pub skills: Vec<String>,
    pub learning_goals: Vec<String>,
    pub location: Option<String>,
    /// Hours per week the learner says they can spend
    pub availability_hours: Option<u32>,
    pub experience_years: u32,
}

impl UserContext {
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.learning_goals = goals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_experience_years(mut self, years: u32) -> Self {
        self.experience_years = years;
        self
    }

    pub fn with_availability_hours(mut self, hours: u32) -> Self {
        self.availability_hours = Some(hours);
        self
    }
}

/// A learner's request for a roadmap. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapRequest {
    domain: String,
    skill_level: SkillLevel,
    time_availability: TimeAvailability,
    #[serde(default)]
    user_context: UserContext,
}

impl RoadmapRequest {
    pub fn new(
        domain: impl Into<String>,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
        user_context: UserContext,
    ) -> Self {
        Self {
            domain: domain.into(),
            skill_level,
            time_availability,
            user_context,
        }
    }

    /// Domain exactly as the learner typed it.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn skill_level(&self) -> SkillLevel {
        self.skill_level
    }

    pub fn time_availability(&self) -> TimeAvailability {
        self.time_availability
    }

    pub fn user_context(&self) -> &UserContext {
        &self.user_context
    }

    /// Cache key of the normalized request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_request(self)
    }
}

// ============================================================================
// CACHE KEY
// ============================================================================

fn normalize_list(items: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = items
        .iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect();
    normalized.sort();
    normalized
}

/// Content-addressed key for a roadmap request.
///
/// A SHA-256 digest over the normalized request: strings are trimmed and
/// lower-cased, list fields are sorted. Two requests that differ only in
/// casing, surrounding whitespace or list order map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(request: &RoadmapRequest) -> Self {
        let ctx = request.user_context();
        // `Value` objects keep their keys sorted, so the rendering is canonical.
        let canonical = serde_json::json!({
            "domain": request.domain().trim().to_lowercase(),
            "skill_level": request.skill_level().as_str(),
            "time_availability": request.time_availability().as_str(),
            "user_skills": normalize_list(&ctx.skills),
            "learning_goals": normalize_list(&ctx.learning_goals),
            "location": ctx
                .location
                .as_deref()
                .map(|l| l.trim().to_lowercase())
                .unwrap_or_default(),
        })
        .to_string();

        let digest = Sha256::digest(canonical.as_bytes());
        Self(format!("roadmap_{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(domain: &str, ctx: UserContext) -> RoadmapRequest {
        RoadmapRequest::new(domain, SkillLevel::Beginner, TimeAvailability::PartTime, ctx)
    }

    #[test]
    fn test_cache_key_ignores_casing_and_order() {
        let a = request(
            "Python",
            UserContext::default()
                .with_skills(["SQL", "git"])
                .with_goals(["Data Science"])
                .with_location(" Lagos "),
        );
        let b = request(
            "  python ",
            UserContext::default()
                .with_skills(["Git", "sql"])
                .with_goals(["data science"])
                .with_location("lagos"),
        );
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_distinguishes_levels() {
        let ctx = UserContext::default();
        let a = RoadmapRequest::new("Go", SkillLevel::Beginner, TimeAvailability::Casual, ctx.clone());
        let b = RoadmapRequest::new("Go", SkillLevel::Advanced, TimeAvailability::Casual, ctx);
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_format() {
        let key = request("Rust", UserContext::default()).cache_key();
        assert!(key.as_str().starts_with("roadmap_"));
        // "roadmap_" + 64 hex chars
        assert_eq!(key.as_str().len(), 8 + 64);
    }

    #[test]
    fn test_user_context_deserializes_from_empty_object() {
        let ctx: UserContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, UserContext::default());
    }
}
