//! Extract a roadmap from free-form completion text
//!
//! `parse` never fails. It degrades through three tiers:
//! 1. the first balanced `{...}` substring that decodes and validates
//! 2. numbered or bulleted list items turned into module stubs
//! 3. the generic default modules for the domain

use crate::fallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use skillbridge_core::{
    Clock, Difficulty, Exercise, GeneratedBy, GeneratedRoadmap, Milestone, Module, Project,
    Resource, ResourceType, SkillLevel, SystemClock, TimeAvailability,
};
use std::sync::Arc;

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s*([^0-9\n]+)").expect("Invalid numbered-item regex"));
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-•]\s*([^\n]+)").expect("Invalid bullet-item regex"));

const MAX_HEURISTIC_MODULES: usize = 7;
const MIN_SECTION_CHARS: usize = 10;
const DEFAULT_MODULE_HOURS: u32 = 20;
const MIN_OBJECTIVES: usize = 3;
const MAX_OBJECTIVES: usize = 5;

// ============================================================================
// JSON CANDIDATES
// ============================================================================

/// Length in bytes of the balanced object starting at `text[0] == '{'`.
///
/// Braces inside string literals are ignored.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Balanced-brace substrings of `raw`, outermost first, in order of their
/// opening brace.
pub fn json_candidates(raw: &str) -> impl Iterator<Item = &str> + '_ {
    raw.char_indices()
        .filter(|&(_, ch)| ch == '{')
        .filter_map(move |(start, _)| {
            balanced_object_len(&raw[start..]).map(|len| &raw[start..start + len])
        })
}

/// A decoded document is a roadmap iff it has a `domain` and a non-empty
/// `modules` list whose every entry is an object with a `title` or `name`.
pub fn is_valid_roadmap(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if !obj.contains_key("domain") {
        return false;
    }
    match obj.get("modules").and_then(Value::as_array) {
        Some(modules) if !modules.is_empty() => modules.iter().all(|m| {
            m.as_object()
                .is_some_and(|m| m.contains_key("title") || m.contains_key("name"))
        }),
        _ => false,
    }
}

// ============================================================================
// LENIENT FIELD ACCESS
// ============================================================================

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Non-negative integer from a number or a numeric-prefixed string ("15 hours").
fn uint_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    match obj.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// `text` cut to `max` characters, with an ellipsis only when something was cut.
fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate_chars(text, max))
    } else {
        text.to_string()
    }
}

fn resource_from(value: &Value) -> Option<Resource> {
    let resource = match value {
        Value::Object(obj) => Resource {
            title: str_field(obj, "title").unwrap_or("Resource").to_string(),
            resource_type: str_field(obj, "type")
                .map(ResourceType::parse_lenient)
                .unwrap_or(ResourceType::Tutorial),
            platform: str_field(obj, "platform").unwrap_or("Web").to_string(),
            url: str_field(obj, "url")
                .unwrap_or("https://example.com")
                .to_string(),
            free: obj.get("free").and_then(Value::as_bool).unwrap_or(true),
            estimated_time: str_field(obj, "estimated_time")
                .unwrap_or_default()
                .to_string(),
        },
        Value::String(title) if !title.trim().is_empty() => Resource {
            title: title.trim().to_string(),
            resource_type: ResourceType::Tutorial,
            platform: "Web".to_string(),
            url: "https://example.com".to_string(),
            free: true,
            estimated_time: String::new(),
        },
        _ => return None,
    };
    Some(resource)
}

fn exercise_from(value: &Value) -> Option<Exercise> {
    match value {
        Value::Object(obj) => Some(Exercise {
            title: str_field(obj, "title")?.to_string(),
            description: str_field(obj, "description")
                .unwrap_or_default()
                .to_string(),
            estimated_time: str_field(obj, "estimated_time")
                .unwrap_or_default()
                .to_string(),
        }),
        Value::String(title) if !title.trim().is_empty() => Some(Exercise {
            title: title.trim().to_string(),
            description: String::new(),
            estimated_time: String::new(),
        }),
        _ => None,
    }
}

fn milestone_from(value: &Value) -> Option<Milestone> {
    let obj = value.as_object()?;
    let achievement = str_field(obj, "achievement")
        .or_else(|| str_field(obj, "title"))
        .or_else(|| str_field(obj, "name"))?;
    Some(Milestone {
        week: uint_field(obj, "week")?,
        achievement: achievement.to_string(),
        description: str_field(obj, "description")
            .unwrap_or_default()
            .to_string(),
    })
}

fn padded_objectives(mut objectives: Vec<String>, subject: &str) -> Vec<String> {
    let templates = [
        format!("Understand {} concepts", subject),
        format!("Apply {} in practice", subject),
        format!("Master {} fundamentals", subject),
    ];
    for template in templates {
        if objectives.len() >= MIN_OBJECTIVES {
            break;
        }
        if !objectives.contains(&template) {
            objectives.push(template);
        }
    }
    objectives.truncate(MAX_OBJECTIVES);
    objectives
}

fn module_from(index: usize, obj: &Map<String, Value>, level: SkillLevel) -> Module {
    let fallback_name = format!("Module {}", index + 1);
    let name = str_field(obj, "name")
        .or_else(|| str_field(obj, "title"))
        .unwrap_or(fallback_name.as_str())
        .to_string();

    let id = uint_field(obj, "id")
        .filter(|id| *id > 0)
        .unwrap_or(index as u32 + 1);
    let hours = uint_field(obj, "estimated_hours")
        .or_else(|| uint_field(obj, "estimated_time"))
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_MODULE_HOURS);

    let mut module = Module::new(id, name, hours);
    module.description = str_field(obj, "description")
        .unwrap_or_default()
        .to_string();
    module.objectives = padded_objectives(string_list(obj, "objectives"), &module.name);
    module.difficulty = str_field(obj, "difficulty").and_then(Difficulty::parse_lenient);
    module.prerequisites = string_list(obj, "prerequisites");
    module.resources = obj
        .get("resources")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(resource_from).collect())
        .unwrap_or_default();
    module.exercises = obj
        .get("exercises")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(exercise_from).collect())
        .unwrap_or_default();
    module.project = obj.get("project").and_then(Value::as_object).and_then(|p| {
        Some(Project {
            title: str_field(p, "title")?.to_string(),
            description: str_field(p, "description").unwrap_or_default().to_string(),
            complexity: str_field(p, "complexity")
                .and_then(Difficulty::parse_lenient)
                .unwrap_or_else(|| Difficulty::from(level)),
        })
    });
    module.assessment = str_field(obj, "assessment").unwrap_or_default().to_string();
    module
}

// ============================================================================
// HEURISTIC EXTRACTION
// ============================================================================

fn capture_items(re: &Regex, raw: &str) -> Vec<String> {
    re.captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// List items long enough to stand for a module, at most seven.
pub fn heuristic_sections(raw: &str) -> Vec<String> {
    let mut sections = capture_items(&NUMBERED_ITEM, raw);
    if sections.is_empty() {
        sections = capture_items(&BULLET_ITEM, raw);
    }

    sections
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SECTION_CHARS)
        .take(MAX_HEURISTIC_MODULES)
        .collect()
}

fn stub_module(index: usize, section: &str) -> Module {
    let short = truncate_chars(section, 30);
    let mut module = Module::new(
        index as u32 + 1,
        format!("Module {}: {}", index + 1, shorten(section, 50)),
        15 + 5 * index as u32,
    );
    module.description = format!("Learn about {}", shorten(section, 100));
    module.objectives = vec![
        format!("Understand {} concepts", short),
        format!("Apply {} in practice", short),
        format!("Master {} fundamentals", short),
    ];
    module.resources = vec![Resource {
        title: format!("{} Tutorial", short),
        resource_type: ResourceType::Tutorial,
        platform: "Web".to_string(),
        url: "https://example.com".to_string(),
        free: true,
        estimated_time: String::new(),
    }];
    module
}

// ============================================================================
// PARSER
// ============================================================================

pub struct ResponseParser {
    clock: Arc<dyn Clock>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn parse(
        &self,
        raw_text: &str,
        domain: &str,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
    ) -> GeneratedRoadmap {
        for candidate in json_candidates(raw_text) {
            let Ok(value) = serde_json::from_str::<Value>(candidate) else {
                continue;
            };
            if is_valid_roadmap(&value) {
                if let Some(obj) = value.as_object() {
                    return self.from_document(obj, domain, skill_level, time_availability);
                }
            }
        }

        tracing::warn!(
            domain,
            response_chars = raw_text.chars().count(),
            "No valid roadmap JSON in completion, extracting list items"
        );

        let sections = heuristic_sections(raw_text);
        let modules = if sections.is_empty() {
            tracing::warn!(domain, "No usable list items in completion, using default modules");
            fallback::default_modules(domain)
        } else {
            sections
                .iter()
                .enumerate()
                .map(|(i, section)| stub_module(i, section))
                .collect()
        };

        self.assemble(
            domain.to_string(),
            skill_level,
            time_availability,
            modules,
            None,
            None,
            Vec::new(),
            GeneratedBy::AiFallbackText,
        )
    }

    fn from_document(
        &self,
        obj: &Map<String, Value>,
        domain: &str,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
    ) -> GeneratedRoadmap {
        let modules = obj
            .get("modules")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, m)| m.as_object().map(|m| module_from(i, m, skill_level)))
                    .collect()
            })
            .unwrap_or_default();

        let milestones = obj
            .get("milestones")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(milestone_from).collect())
            .unwrap_or_default();

        self.assemble(
            str_field(obj, "domain").unwrap_or(domain).to_string(),
            skill_level,
            time_availability,
            modules,
            uint_field(obj, "total_estimated_hours").filter(|h| *h > 0),
            uint_field(obj, "estimated_duration_weeks").filter(|w| *w > 0),
            milestones,
            GeneratedBy::Ai,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        domain: String,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
        mut modules: Vec<Module>,
        total_hours: Option<u32>,
        weeks: Option<u32>,
        mut milestones: Vec<Milestone>,
        generated_by: GeneratedBy,
    ) -> GeneratedRoadmap {
        if modules.is_empty() {
            modules = fallback::default_modules(&domain);
        }
        let total_hours = total_hours.unwrap_or_else(|| {
            modules
                .iter()
                .map(|m| m.estimated_hours)
                .fold(0u32, u32::saturating_add)
        });
        let weeks = weeks.unwrap_or_else(|| fallback::estimate_weeks(total_hours, time_availability));
        if milestones.is_empty() {
            milestones = fallback::milestones(weeks);
        }

        GeneratedRoadmap {
            domain,
            skill_level,
            time_availability,
            estimated_duration_weeks: weeks,
            total_estimated_hours: total_hours,
            milestones,
            modules,
            progress: 0.0,
            generated_by,
            cost: 0.0,
            response_time: 0.0,
            generated_at: self.clock.now(),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseParser").finish()
    }
}
