//! Enum types for roadmap requests and results

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// REQUEST ENUMS
// ============================================================================

/// Learner skill level a roadmap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// All levels in ascending order.
    pub const ALL: [SkillLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// Wire representation ("beginner", "intermediate", "advanced").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ValidationError::InvalidValue {
                field: "skill_level".to_string(),
                value: s.to_string(),
                reason: "expected beginner, intermediate or advanced".to_string(),
            }),
        }
    }
}

/// How much time per week the learner can commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeAvailability {
    /// Roughly 5-10 hours per week
    PartTime,
    /// Roughly 20-40 hours per week
    FullTime,
    /// Roughly 2-5 hours per week
    Casual,
}

impl TimeAvailability {
    pub const ALL: [TimeAvailability; 3] = [Self::PartTime, Self::FullTime, Self::Casual];

    /// Wire representation ("part-time", "full-time", "casual").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartTime => "part-time",
            Self::FullTime => "full-time",
            Self::Casual => "casual",
        }
    }
}

impl fmt::Display for TimeAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeAvailability {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "part-time" => Ok(Self::PartTime),
            "full-time" => Ok(Self::FullTime),
            "casual" => Ok(Self::Casual),
            _ => Err(ValidationError::InvalidValue {
                field: "time_availability".to_string(),
                value: s.to_string(),
                reason: "expected part-time, full-time or casual".to_string(),
            }),
        }
    }
}

// ============================================================================
// RESULT ENUMS
// ============================================================================

/// Which generation path produced a roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedBy {
    /// Structured JSON returned by the completion service
    Ai,
    /// Completion service answered, but only free-form text could be salvaged
    AiFallbackText,
    /// Catalog-driven synthesis, no completion service involved
    Deterministic,
}

impl GeneratedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::AiFallbackText => "ai_fallback_text",
            Self::Deterministic => "deterministic",
        }
    }

    /// True when the completion service contributed content.
    pub fn is_ai(&self) -> bool {
        !matches!(self, Self::Deterministic)
    }
}

impl fmt::Display for GeneratedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty tag carried by catalog entries and module projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Lenient parse used on model output; unknown values yield `None`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "easy" => Some(Self::Beginner),
            "intermediate" | "medium" => Some(Self::Intermediate),
            "advanced" | "hard" | "expert" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl From<SkillLevel> for Difficulty {
    fn from(level: SkillLevel) -> Self {
        match level {
            SkillLevel::Beginner => Self::Beginner,
            SkillLevel::Intermediate => Self::Intermediate,
            SkillLevel::Advanced => Self::Advanced,
        }
    }
}

/// Kind of learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Tutorial,
    Video,
    Documentation,
    Practice,
    Project,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tutorial => "tutorial",
            Self::Video => "video",
            Self::Documentation => "documentation",
            Self::Practice => "practice",
            Self::Project => "project",
        }
    }

    /// Lenient parse used on model output. Anything unrecognised is a tutorial.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "course" => Self::Video,
            "documentation" | "docs" | "book" | "article" => Self::Documentation,
            "practice" | "exercise" => Self::Practice,
            "project" => Self::Project,
            _ => Self::Tutorial,
        }
    }
}

// ============================================================================
// CIRCUIT BREAKER STATE
// ============================================================================

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, testing if service recovered
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
