//! Prompt construction for roadmap generation
//!
//! Pure and deterministic: identical requests yield identical prompt text.

use skillbridge_core::{RoadmapRequest, SkillLevel, TimeAvailability};
use skillbridge_llm::ChatMessage;

const SYSTEM_PROMPT: &str = "You are an expert learning path generator and educational consultant.

Your task is to create comprehensive, personalized learning roadmaps that are:
- Practical and hands-on oriented
- Progressive and well-structured
- Tailored to the learner's background and goals
- Include specific resources and time estimates
- Focus on real-world applications and projects

Each roadmap should be detailed enough to serve as a complete learning guide while being \
flexible enough to accommodate different learning speeds and styles.";

/// System/user prompt pair sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn level_guidance(level: SkillLevel) -> &'static str {
        match level {
            SkillLevel::Beginner => {
                "Focus on fundamentals and ensure no prior knowledge is assumed. \
                 Include extra foundational concepts."
            }
            SkillLevel::Intermediate => {
                "Build on existing knowledge and introduce more complex concepts. \
                 Include practical applications."
            }
            SkillLevel::Advanced => {
                "Focus on expert-level topics, best practices, and cutting-edge developments. \
                 Include complex projects."
            }
        }
    }

    pub fn time_guidance(time: TimeAvailability) -> &'static str {
        match time {
            TimeAvailability::PartTime => "Optimize for 5-10 hours per week with flexible scheduling.",
            TimeAvailability::FullTime => {
                "Optimize for 20-40 hours per week with intensive learning pace."
            }
            TimeAvailability::Casual => "Optimize for 2-5 hours per week with relaxed progression.",
        }
    }

    pub fn build(&self, request: &RoadmapRequest) -> Prompt {
        Prompt {
            system: SYSTEM_PROMPT.to_string(),
            user: self.user_prompt(request),
        }
    }

    fn user_prompt(&self, request: &RoadmapRequest) -> String {
        let domain = request.domain();
        let level = request.skill_level();
        let time = request.time_availability();
        let ctx = request.user_context();

        let skills = if ctx.skills.is_empty() {
            "No prior experience specified".to_string()
        } else {
            ctx.skills.join(", ")
        };
        let goals = if ctx.learning_goals.is_empty() {
            "General proficiency in the domain".to_string()
        } else {
            ctx.learning_goals.join(", ")
        };
        let location = ctx.location.as_deref().unwrap_or("Not specified");
        let hours = ctx
            .availability_hours
            .map(|h| h.to_string())
            .unwrap_or_else(|| "Not specified".to_string());

        format!(
            "Create a comprehensive, personalized learning roadmap for {domain} with these specifications:

**Learner Profile:**
- Skill Level: {level}
- Current Skills: {skills}
- Learning Goals: {goals}
- Experience: {experience} years
- Location: {location}
- Available Time: {hours} hours per week
- Learning Pace: {time}

**Domain:** {domain}
**Target Level:** {level_upper}

**Specific Instructions:**
{level_guidance}
{time_guidance}

**Roadmap Requirements:**
1. Create 6-8 learning modules that progress logically
2. Each module should have:
   - Clear learning objectives (3-5 specific goals)
   - Estimated completion time (in hours)
   - 3-5 high-quality resources with specific URLs
   - Practical exercises or projects
   - Self-assessment criteria
3. Include milestone checkpoints every 2-3 modules
4. Add prerequisite information for each module
5. Suggest complementary skills to learn alongside
6. Include career progression suggestions
7. Add real-world project ideas

**Resource Guidelines:**
- Include a mix of free and paid resources
- Prioritize interactive and hands-on content
- Include official documentation and community resources
- Add video tutorials, written guides, and practice platforms
- Ensure resources are current and up-to-date

**Output Format:**
Respond with a single JSON object in exactly this format:
{schema}

Ensure the roadmap is:
- Practical and immediately actionable
- Progressive and builds upon previous knowledge
- Tailored to the specific skill level and time constraints
- Includes diverse learning resources and formats
- Leads to demonstrable skills and portfolio projects",
            domain = domain,
            level = level,
            level_upper = level.as_str().to_uppercase(),
            skills = skills,
            goals = goals,
            experience = ctx.experience_years,
            location = location,
            hours = hours,
            time = time,
            level_guidance = Self::level_guidance(level),
            time_guidance = Self::time_guidance(time),
            schema = output_schema(domain, level),
        )
    }
}

/// Example document the model is asked to mirror.
fn output_schema(domain: &str, level: SkillLevel) -> String {
    let example = serde_json::json!({
        "domain": domain,
        "skill_level": level.as_str(),
        "estimated_duration_weeks": 12,
        "total_estimated_hours": 120,
        "milestones": [
            {"week": 4, "achievement": "Foundation Complete"},
            {"week": 8, "achievement": "Intermediate Skills"},
            {"week": 12, "achievement": "Ready for Advanced Projects"}
        ],
        "modules": [{
            "id": 1,
            "title": "Module Title",
            "description": "What will be learned and why it's important",
            "objectives": [
                "Specific learning objective 1",
                "Specific learning objective 2",
                "Specific learning objective 3"
            ],
            "estimated_hours": 15,
            "prerequisites": ["Prerequisite 1", "Prerequisite 2"],
            "resources": [{
                "title": "Resource Title",
                "type": "tutorial|video|documentation|practice|project",
                "platform": "Platform Name",
                "url": "https://example.com",
                "free": true,
                "estimated_time": "2 hours"
            }],
            "exercises": [{
                "title": "Exercise Title",
                "description": "What to practice",
                "estimated_time": "1 hour"
            }],
            "project": {
                "title": "Project Title",
                "description": "Real-world project to build",
                "complexity": "beginner|intermediate|advanced"
            },
            "assessment": "How to measure completion and understanding"
        }]
    });

    // Pretty-printing a `Value` cannot fail.
    serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string())
}
