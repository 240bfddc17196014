//! Deterministic roadmap synthesis
//!
//! Catalog-driven and string-templated. No network, no cost. Apart from
//! `generated_at`, the output is a pure function of
//! `(domain, skill_level, time_availability)`.

use skillbridge_core::{
    Clock, Difficulty, Exercise, GeneratedBy, GeneratedRoadmap, Milestone, Module, Project,
    Resource, ResourceType, SkillLevel, SystemClock, TimeAvailability,
};
use std::sync::Arc;

use skillbridge_core::Difficulty::{Advanced as A, Beginner as B, Intermediate as I};

// ============================================================================
// CATALOGS
// ============================================================================

const PYTHON: &[(&str, u32, Difficulty)] = &[
    ("Python Programming Fundamentals", 25, B),
    ("Data Structures and Algorithms", 30, I),
    ("Object-Oriented Programming", 20, I),
    ("Web Development with Django/Flask", 35, I),
    ("Data Science and Machine Learning", 40, A),
    ("Testing and Debugging", 15, I),
    ("Deployment and DevOps", 20, A),
];

const JAVASCRIPT: &[(&str, u32, Difficulty)] = &[
    ("JavaScript Fundamentals", 20, B),
    ("DOM Manipulation and Events", 15, B),
    ("Asynchronous JavaScript", 25, I),
    ("Modern JavaScript (ES6+)", 20, I),
    ("Frontend Framework (React/Vue)", 30, I),
    ("Node.js and Backend Development", 25, A),
    ("Testing and Deployment", 15, I),
];

const WEB_DEVELOPMENT: &[(&str, u32, Difficulty)] = &[
    ("HTML & CSS Fundamentals", 20, B),
    ("Responsive Design and Flexbox/Grid", 15, B),
    ("JavaScript Basics", 25, B),
    ("Frontend Framework", 30, I),
    ("Backend API Development", 25, I),
    ("Database Design and Management", 20, I),
    ("Deployment and DevOps", 15, A),
];

/// Suffixes of the generic catalog, prefixed with the domain name.
const GENERIC: &[(&str, u32, Difficulty)] = &[
    ("Fundamentals", 20, B),
    ("Core Concepts", 25, I),
    ("Advanced Applications", 30, A),
    ("Professional Projects", 25, A),
    ("Best Practices", 15, I),
];

/// Titles used when model output cannot be salvaged at all.
const DEFAULT_MODULE_SUFFIXES: &[&str] = &[
    "Fundamentals",
    "Core Concepts",
    "Practical Applications",
    "Advanced Topics",
    "Project Development",
    "Best Practices",
];

const MILESTONE_NAMES: [&str; 4] = [
    "Foundation Complete",
    "Core Skills Mastered",
    "Advanced Proficiency",
    "Learning Goal Achieved",
];

/// One catalog row: a module title with its nominal effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
    pub hours: u32,
    pub difficulty: Difficulty,
}

/// Catalog for `domain`. Lookup is case-insensitive with spaces treated as
/// underscores; unknown domains get the generic five-module catalog.
pub fn catalog(domain: &str) -> Vec<CatalogEntry> {
    let known = match domain.trim().to_lowercase().replace(' ', "_").as_str() {
        "python" => Some(PYTHON),
        "javascript" => Some(JAVASCRIPT),
        "web_development" => Some(WEB_DEVELOPMENT),
        _ => None,
    };

    match known {
        Some(rows) => rows
            .iter()
            .map(|&(title, hours, difficulty)| CatalogEntry {
                title: title.to_string(),
                hours,
                difficulty,
            })
            .collect(),
        None => GENERIC
            .iter()
            .map(|&(suffix, hours, difficulty)| CatalogEntry {
                title: format!("{} {}", domain.trim(), suffix),
                hours,
                difficulty,
            })
            .collect(),
    }
}

/// Difficulty tiers kept for each skill level.
///
/// Intermediate keeps a single tier while the other levels keep two. The
/// asymmetry is preserved pending product input.
pub fn allowed_difficulties(level: SkillLevel) -> &'static [Difficulty] {
    match level {
        SkillLevel::Beginner => &[B, I],
        SkillLevel::Intermediate => &[I],
        SkillLevel::Advanced => &[I, A],
    }
}

/// Filter `entries` for `level`. Falls back to the unfiltered catalog if the
/// filter would leave nothing.
pub fn filter_for_level(entries: Vec<CatalogEntry>, level: SkillLevel) -> Vec<CatalogEntry> {
    let allowed = allowed_difficulties(level);
    let filtered: Vec<CatalogEntry> = entries
        .iter()
        .filter(|e| allowed.contains(&e.difficulty))
        .cloned()
        .collect();
    if filtered.is_empty() {
        entries
    } else {
        filtered
    }
}

/// Weeks needed for `total_hours`: part-time 0.2, full-time 0.05 and casual
/// 0.3 weeks per hour, truncated, never under four weeks.
pub fn estimate_weeks(total_hours: u32, time: TimeAvailability) -> u32 {
    // Exact integer ratios of the per-hour constants.
    let (num, den) = match time {
        TimeAvailability::PartTime => (1, 5),
        TimeAvailability::FullTime => (1, 20),
        TimeAvailability::Casual => (3, 10),
    };
    let weeks = u64::from(total_hours) * num / den;
    u32::try_from(weeks).unwrap_or(u32::MAX).max(4)
}

/// Checkpoints at 25, 50, 75 and 100 percent of `total_weeks`.
pub fn milestones(total_weeks: u32) -> Vec<Milestone> {
    let weeks = [
        total_weeks / 4,
        total_weeks / 2,
        // Below `total_weeks`, so the narrowing cannot truncate.
        (u64::from(total_weeks) * 3 / 4) as u32,
        total_weeks,
    ];
    weeks
        .iter()
        .zip(MILESTONE_NAMES)
        .map(|(&week, name)| Milestone {
            week,
            achievement: name.to_string(),
            description: format!(
                "Reach this milestone to validate your progress in {}",
                name.to_lowercase()
            ),
        })
        .collect()
}

/// Six generic modules for `domain`, used by the parser's last tier.
pub fn default_modules(domain: &str) -> Vec<Module> {
    DEFAULT_MODULE_SUFFIXES
        .iter()
        .enumerate()
        .map(|(i, suffix)| {
            let name = format!("{} {}", domain.trim(), suffix);
            let mut module = Module::new(i as u32 + 1, name.clone(), 20);
            module.description = format!("Comprehensive study of {}", name.to_lowercase());
            module.objectives = vec![
                format!("Understand {} concepts", name),
                format!("Apply {} in practical scenarios", name),
                format!("Master {} implementation", name),
            ];
            module.resources = vec![Resource {
                title: format!("{} Guide", name),
                resource_type: ResourceType::Tutorial,
                platform: "Web".to_string(),
                url: "https://example.com".to_string(),
                free: true,
                estimated_time: String::new(),
            }];
            module
        })
        .collect()
}

fn resources(title: &str, domain: &str) -> Vec<Resource> {
    let docs_slug = domain.trim().to_lowercase().replace(' ', "-");
    let rows = [
        (
            "Official Documentation",
            ResourceType::Documentation,
            "Official Docs",
            format!("https://docs.example.com/{}", docs_slug),
            "2-3 hours",
        ),
        (
            "Interactive Tutorial",
            ResourceType::Tutorial,
            "Interactive Learning",
            "https://example.com/interactive-tutorial".to_string(),
            "4-5 hours",
        ),
        (
            "Video Course",
            ResourceType::Video,
            "Educational Platform",
            "https://youtube.com/watch?v=example".to_string(),
            "6-8 hours",
        ),
        (
            "Hands-on Project",
            ResourceType::Project,
            "Practice Platform",
            "https://example.com/project".to_string(),
            "8-10 hours",
        ),
    ];

    rows.into_iter()
        .map(|(suffix, resource_type, platform, url, time)| Resource {
            title: format!("{} - {}", title, suffix),
            resource_type,
            platform: platform.to_string(),
            url,
            free: true,
            estimated_time: time.to_string(),
        })
        .collect()
}

fn exercises(title: &str) -> Vec<Exercise> {
    vec![
        Exercise {
            title: format!("Basic {} Exercise", title),
            description: format!(
                "Practice fundamental {} concepts with guided examples",
                title
            ),
            estimated_time: "1-2 hours".to_string(),
        },
        Exercise {
            title: format!("Intermediate {} Challenge", title),
            description: format!("Solve more complex {} problems independently", title),
            estimated_time: "2-3 hours".to_string(),
        },
        Exercise {
            title: format!("Advanced {} Project", title),
            description: format!("Apply {} knowledge in a comprehensive project", title),
            estimated_time: "4-6 hours".to_string(),
        },
    ]
}

fn expand(id: u32, entry: &CatalogEntry, domain: &str) -> Module {
    let t = &entry.title;
    let mut module = Module::new(id, t.clone(), entry.hours);
    module.description = format!(
        "Comprehensive study of {} with hands-on projects and real-world applications",
        t
    );
    module.objectives = vec![
        format!("Master {} fundamentals and core concepts", t),
        format!("Apply {} in practical, real-world scenarios", t),
        format!("Develop expertise in {} best practices", t),
        format!("Build portfolio projects demonstrating {} proficiency", t),
        format!("Prepare for professional {} development", t),
    ];
    module.difficulty = Some(entry.difficulty);
    module.resources = resources(t, domain);
    module.exercises = exercises(t);
    module.project = Some(Project {
        title: format!("{} Capstone Project", t),
        description: format!(
            "Build a comprehensive {} application showcasing all learned concepts",
            t
        ),
        complexity: entry.difficulty,
    });
    module.assessment =
        "Demonstrate proficiency through practical implementation and code review".to_string();
    module
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct FallbackGenerator {
    clock: Arc<dyn Clock>,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn generate(
        &self,
        domain: &str,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
    ) -> GeneratedRoadmap {
        let entries = filter_for_level(catalog(domain), skill_level);
        let total_hours: u32 = entries.iter().map(|e| e.hours).sum();
        let weeks = estimate_weeks(total_hours, time_availability);

        tracing::info!(
            domain,
            skill_level = %skill_level,
            modules = entries.len(),
            weeks,
            "Generating deterministic roadmap"
        );

        let modules = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| expand(i as u32 + 1, entry, domain))
            .collect();

        GeneratedRoadmap {
            domain: domain.to_string(),
            skill_level,
            time_availability,
            estimated_duration_weeks: weeks,
            total_estimated_hours: total_hours,
            milestones: milestones(weeks),
            modules,
            progress: 0.0,
            generated_by: GeneratedBy::Deterministic,
            cost: 0.0,
            response_time: 0.0,
            generated_at: self.clock.now(),
        }
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FallbackGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackGenerator").finish()
    }
}
