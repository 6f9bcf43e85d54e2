//! The `irtcat init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create irtcat.toml
    if std::path::Path::new("irtcat.toml").exists() {
        println!("irtcat.toml already exists, skipping.");
    } else {
        std::fs::write("irtcat.toml", SAMPLE_CONFIG)?;
        println!("Created irtcat.toml");
    }

    // Create example item bank
    std::fs::create_dir_all("item-banks")?;
    let example_path = std::path::Path::new("item-banks/example.toml");
    if example_path.exists() {
        println!("item-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created item-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit item-banks/example.toml with your calibrated items");
    println!("  2. Run: irtcat validate --bank item-banks/example.toml");
    println!("  3. Run: irtcat simulate --bank item-banks/example.toml --examinees 50");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# irtcat configuration

max_questions = 30
target_se = 0.3
parallelism = 4
output_dir = "./irtcat-results"
# seed = 42

[strategy]
kind = "standard"

# Simulated examinees
[examinee]
pace = 1.0
fatigue = 0.0
report_confidence = false
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Item Bank"
description = "A small arithmetic bank to get started"

[[items]]
id = "arith-001"
subject = "arithmetic"
topic = "addition"
band = "beginner"
difficulty = -1.5
discrimination = 1.1
guessing = 0.2
expected_time_secs = 20

[[items]]
id = "arith-002"
subject = "arithmetic"
topic = "subtraction"
band = "beginner"
difficulty = -0.8
discrimination = 1.3
guessing = 0.2
expected_time_secs = 25

[[items]]
id = "arith-003"
subject = "arithmetic"
topic = "multiplication"
band = "intermediate"
difficulty = 0.0
discrimination = 1.4
guessing = 0.2
expected_time_secs = 40

[[items]]
id = "arith-004"
subject = "arithmetic"
topic = "division"
band = "intermediate"
difficulty = 0.4
discrimination = 1.2
guessing = 0.2
expected_time_secs = 45

[[items]]
id = "arith-005"
subject = "arithmetic"
topic = "fractions"
band = "advanced"
difficulty = 1.0
discrimination = 1.5
guessing = 0.15
expected_time_secs = 60

[[items]]
id = "arith-006"
subject = "arithmetic"
topic = "percentages"
band = "advanced"
difficulty = 1.4
discrimination = 1.3
guessing = 0.15
expected_time_secs = 60

[[items]]
id = "arith-007"
subject = "arithmetic"
topic = "exponents"
band = "expert"
difficulty = 2.0
discrimination = 1.6
guessing = 0.1
expected_time_secs = 90
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use irtcat_core::bank::{parse_bank_str, validate_bank};
    use irtcat_core::config::CatConfig;

    #[test]
    fn sample_config_parses() {
        let config: CatConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config, CatConfig::default());
    }

    #[test]
    fn example_bank_is_valid() {
        let bank = parse_bank_str(EXAMPLE_BANK, Path::new("example.toml")).unwrap();
        assert_eq!(bank.len(), 7);
        assert!(validate_bank(&bank).is_empty());
    }
}
