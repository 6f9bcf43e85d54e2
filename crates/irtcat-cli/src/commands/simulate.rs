//! The `irtcat simulate` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use irtcat_core::bank::load_bank;
use irtcat_core::config::load_config_from;
use irtcat_core::traits::MemoryRepository;
use irtcat_core::StoppingRule;
use irtcat_report::write_html_report;
use irtcat_sim::{ProgressReporter, SimulatedSession, SimulationConfig, SimulationReport, Simulator};

use super::StrategyArgs;

pub struct SimulateArgs {
    pub bank: PathBuf,
    pub examinees: usize,
    pub strategy: StrategyArgs,
    pub max_questions: Option<usize>,
    pub target_se: Option<f64>,
    pub parallelism: Option<usize>,
    pub seed: Option<u64>,
    pub ability_range: (f64, f64),
    pub pace: Option<f64>,
    pub fatigue: Option<f64>,
    pub confidence: bool,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_session_start(&self, examinee_id: &str, true_ability: f64) {
        eprintln!("  Starting: {examinee_id} (true ability {true_ability:+.2})");
    }

    fn on_session_complete(&self, session: &SimulatedSession) {
        let summary = &session.summary;
        eprintln!(
            "  Done: {} [{}] {} items, estimate {:+.2} (SE {:.2}, error {:+.2})",
            summary.examinee_id,
            summary.end,
            summary.responses.len(),
            summary.estimate.ability,
            summary.estimate.standard_error,
            session.error(),
        );
    }

    fn on_session_error(&self, examinee_id: &str, error: &str) {
        eprintln!("  ERROR: {examinee_id}: {error}");
    }

    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} sessions, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: SimulateArgs) -> Result<()> {
    let (min_ability, max_ability) = args.ability_range;
    anyhow::ensure!(args.examinees >= 1, "examinees must be at least 1");
    anyhow::ensure!(
        min_ability.is_finite() && max_ability.is_finite() && min_ability <= max_ability,
        "ability range must be finite with min <= max"
    );

    let config = load_config_from(args.config.as_deref())?;
    let strategy = args.strategy.build(&config.strategy)?;
    let stopping = StoppingRule::new(
        args.max_questions.unwrap_or(config.max_questions),
        args.target_se.unwrap_or(config.target_se),
    );
    anyhow::ensure!(stopping.max_questions >= 1, "max questions must be at least 1");
    anyhow::ensure!(stopping.target_se > 0.0, "target SE must be positive");
    let parallelism = args.parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let bank = load_bank(&args.bank)?;
    anyhow::ensure!(!bank.is_empty(), "item bank '{}' has no items", bank.name);

    let mut sim_config = SimulationConfig::from_config(&config);
    sim_config.examinees = args.examinees;
    sim_config.ability_range = args.ability_range;
    sim_config.parallelism = parallelism;
    sim_config.seed = args.seed.or(config.seed);
    sim_config.session.stopping = stopping;
    sim_config.session.strategy = strategy;
    if let Some(pace) = args.pace {
        anyhow::ensure!(pace.is_finite() && pace > 0.0, "pace must be positive");
        sim_config.pace = pace;
    }
    if let Some(fatigue) = args.fatigue {
        anyhow::ensure!(
            fatigue.is_finite() && fatigue >= 0.0,
            "fatigue must be non-negative"
        );
        sim_config.fatigue = fatigue;
    }
    sim_config.report_confidence |= args.confidence;

    eprintln!(
        "irtcat v{} - Simulating {} examinees on {} ({} items), strategy {}",
        env!("CARGO_PKG_VERSION"),
        args.examinees,
        bank.name,
        bank.len(),
        sim_config.session.strategy.kind(),
    );
    eprintln!();

    let simulator = Simulator::new(Arc::new(MemoryRepository::new(bank)), sim_config);
    let report = simulator.run(&ConsoleReporter).await?;

    print_summary(&report);

    let formats: Vec<&str> = match args.format.as_str() {
        "all" => vec!["json", "html"],
        "none" => vec![],
        other => other.split(',').map(str::trim).collect(),
    };
    if formats.is_empty() {
        return Ok(());
    }

    let output = args.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &SimulationReport) {
    use comfy_table::{Cell, Table};

    let stats = &report.stats;
    let mut table = Table::new();
    table.set_header(vec![
        "Strategy",
        "Sessions",
        "Bias",
        "RMSE",
        "MAE",
        "Correlation",
        "Mean Length",
        "Mean SE",
        "Accuracy",
    ]);
    table.add_row(vec![
        Cell::new(report.strategy),
        Cell::new(stats.sessions),
        Cell::new(format!("{:+.3}", stats.bias)),
        Cell::new(format!("{:.3}", stats.rmse)),
        Cell::new(format!("{:.3}", stats.mean_absolute_error)),
        Cell::new(format!("{:.3}", stats.correlation)),
        Cell::new(format!("{:.1}", stats.mean_length)),
        Cell::new(format!("{:.3}", stats.mean_standard_error)),
        Cell::new(format!("{:.1}%", stats.mean_accuracy * 100.0)),
    ]);
    eprintln!("\n{table}");

    let mut ends = Table::new();
    ends.set_header(vec!["End", "Sessions"]);
    for (end, count) in &stats.end_counts {
        ends.add_row(vec![Cell::new(end), Cell::new(count)]);
    }
    eprintln!("{ends}");
}
