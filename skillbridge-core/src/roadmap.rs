//! Generated roadmap types

use crate::enums::{Difficulty, GeneratedBy, ResourceType, SkillLevel, TimeAvailability};
use crate::{round_to, Timestamp};
use serde::{Deserialize, Serialize};

/// A checkpoint along the roadmap timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub week: u32,
    pub achievement: String,
    #[serde(default)]
    pub description: String,
}

/// A learning resource attached to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub platform: String,
    pub url: String,
    pub free: bool,
    pub estimated_time: String,
}

/// A practice exercise attached to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub title: String,
    pub description: String,
    pub estimated_time: String,
}

/// Capstone project for a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub complexity: Difficulty,
}

/// One unit of a roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// 1-based position within the roadmap
    pub id: u32,
    pub name: String,
    pub description: String,
    /// Between three and five learning objectives
    pub objectives: Vec<String>,
    /// Always greater than zero
    pub estimated_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default)]
    pub assessment: String,
    #[serde(default)]
    pub completed: bool,
}

impl Module {
    /// Bare module with the given id and name; every other field empty.
    pub fn new(id: u32, name: impl Into<String>, estimated_hours: u32) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            objectives: Vec::new(),
            estimated_hours: estimated_hours.max(1),
            difficulty: None,
            prerequisites: Vec::new(),
            resources: Vec::new(),
            exercises: Vec::new(),
            project: None,
            assessment: String::new(),
            completed: false,
        }
    }
}

/// The structured learning plan the engine hands to its callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRoadmap {
    pub domain: String,
    pub skill_level: SkillLevel,
    pub time_availability: TimeAvailability,
    pub estimated_duration_weeks: u32,
    pub total_estimated_hours: u32,
    pub milestones: Vec<Milestone>,
    /// Never empty
    pub modules: Vec<Module>,
    /// Percentage of completed modules, 0.0 at creation
    pub progress: f64,
    pub generated_by: GeneratedBy,
    /// Estimated USD spent on the completion service for this roadmap
    pub cost: f64,
    /// Seconds spent waiting on the completion service
    pub response_time: f64,
    pub generated_at: Timestamp,
}

impl GeneratedRoadmap {
    pub fn completed_modules(&self) -> usize {
        self.modules.iter().filter(|m| m.completed).count()
    }

    /// Recompute `progress` as `completed / total * 100`, rounded to two
    /// decimals, and return it.
    pub fn recompute_progress(&mut self) -> f64 {
        self.progress = if self.modules.is_empty() {
            0.0
        } else {
            round_to(
                self.completed_modules() as f64 / self.modules.len() as f64 * 100.0,
                2,
            )
        };
        self.progress
    }

    /// Mark a module complete or incomplete.
    ///
    /// `module_ref` is either the module's 0-based position or its name.
    /// Returns `false` when no module matches. Progress is recomputed on a match.
    pub fn set_module_completed(&mut self, module_ref: &str, completed: bool) -> bool {
        let by_index = module_ref.trim().parse::<usize>().ok();
        let position = self
            .modules
            .iter()
            .enumerate()
            .position(|(idx, module)| Some(idx) == by_index || module.name == module_ref);

        match position {
            Some(idx) => {
                self.modules[idx].completed = completed;
                self.recompute_progress();
                true
            }
            None => false,
        }
    }
}
