//! Roadmap Generator Binary
//!
//! Generates one roadmap from the command line and prints it as JSON.
//! Configuration comes from `SKILLBRIDGE_*` environment variables; without an
//! API key the deterministic generator is used.
//!
//! Usage:
//!   cargo run -p skillbridge-engine --bin generate-roadmap -- Python beginner part-time

use skillbridge_core::{EngineConfig, SkillLevel, SkillbridgeResult, TimeAvailability, UserContext};
use skillbridge_engine::{init_tracing, RoadmapOrchestrator, TelemetryConfig};

struct Args {
    domain: String,
    skill_level: SkillLevel,
    time_availability: TimeAvailability,
}

fn parse_args() -> SkillbridgeResult<Args> {
    let mut args = std::env::args().skip(1);
    let domain = args.next().unwrap_or_else(|| "Python".to_string());
    let skill_level = match args.next() {
        Some(s) => s.parse()?,
        None => SkillLevel::Beginner,
    };
    let time_availability = match args.next() {
        Some(s) => s.parse()?,
        None => TimeAvailability::PartTime,
    };
    Ok(Args {
        domain,
        skill_level,
        time_availability,
    })
}

async fn run() -> SkillbridgeResult<String> {
    let args = parse_args()?;
    let config = EngineConfig::from_env();
    config.validate()?;
    init_tracing(&TelemetryConfig::from_env())?;

    let engine = RoadmapOrchestrator::from_config(config);
    let roadmap = engine
        .generate_roadmap(
            &args.domain,
            args.skill_level,
            args.time_availability,
            UserContext::default(),
            true,
        )
        .await;

    serde_json::to_string_pretty(&roadmap).map_err(|e| {
        skillbridge_core::ConfigError::InvalidValue {
            field: "output".to_string(),
            value: args.domain,
            reason: format!("Failed to serialize roadmap: {}", e),
        }
        .into()
    })
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to generate roadmap: {}", e);
            std::process::exit(1);
        }
    }
}
