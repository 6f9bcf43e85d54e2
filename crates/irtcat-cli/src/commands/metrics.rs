//! The `irtcat metrics` command.

use std::path::PathBuf;

use anyhow::Result;

use irtcat_core::service::{session_metrics, MetricsRequest};
use irtcat_core::AdaptiveMetrics;

use super::{fill_items, print_json, read_request};

pub fn execute(input: PathBuf, bank: Option<PathBuf>, format: String) -> Result<()> {
    let mut request: MetricsRequest = read_request(&input)?;
    fill_items(bank, &mut request.items)?;
    let metrics = session_metrics(&request);

    match format.as_str() {
        "json" => print_json(&metrics),
        "table" => {
            print_table(&metrics);
            Ok(())
        }
        other => anyhow::bail!("unknown format: '{other}' (expected table or json)"),
    }
}

fn print_table(metrics: &AdaptiveMetrics) {
    use comfy_table::{Cell, Table};

    let mut summary = Table::new();
    summary.set_header(vec!["Metric", "Value"]);
    let rows = [
        ("Algorithm", metrics.algorithm.to_string()),
        ("Questions", metrics.total_questions.to_string()),
        ("Final ability", format!("{:+.3}", metrics.final_ability)),
        ("Final SE", format!("{:.3}", metrics.final_standard_error)),
        ("Accuracy", format!("{:.1}%", metrics.accuracy * 100.0)),
        ("Mean response", format!("{:.1}s", metrics.mean_response_secs)),
        ("Efficiency", format!("{:.3}", metrics.algorithm_efficiency)),
        ("Utilization", format!("{:.3}", metrics.question_utilization)),
        ("Stability", format!("{:.3}", metrics.ability_stability)),
    ];
    for (name, value) in rows {
        summary.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("{summary}");

    if metrics.convergence.is_empty() {
        return;
    }
    let mut trajectory = Table::new();
    trajectory.set_header(vec!["#", "Ability", "SE", "Correct"]);
    for point in &metrics.convergence {
        trajectory.add_row(vec![
            Cell::new(point.question),
            Cell::new(format!("{:+.3}", point.ability)),
            Cell::new(format!("{:.3}", point.standard_error)),
            Cell::new(if point.correct { "yes" } else { "no" }),
        ]);
    }
    println!("{trajectory}");
}
