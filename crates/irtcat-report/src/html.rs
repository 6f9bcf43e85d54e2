//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use irtcat_sim::{SimulatedSession, SimulationReport};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a simulation report.
pub fn generate_html(report: &SimulationReport) -> String {
    let mut html = String::new();
    let stats = &report.stats;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>irtcat simulation: {}</title>\n",
        html_escape(&report.repository)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>irtcat simulation report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Bank: <strong>{}</strong> | strategy {} | {} sessions | seed {} | {}</p>\n",
        html_escape(&report.repository),
        report.strategy,
        stats.sessions,
        report.seed,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Recovery summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Recovery</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Bias</th><th>RMSE</th><th>MAE</th><th>Correlation</th><th>Mean length</th><th>Mean SE</th><th>Accuracy</th><th>Failed</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{:+.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.1}</td><td>{:.3}</td><td>{:.1}%</td><td>{}</td></tr></tbody>\n",
        stats.bias,
        stats.rmse,
        stats.mean_absolute_error,
        stats.correlation,
        stats.mean_length,
        stats.mean_standard_error,
        stats.mean_accuracy * 100.0,
        report.failed,
    ));
    html.push_str("</table>\n");

    if !stats.end_counts.is_empty() {
        html.push_str("<table class=\"summary\">\n<thead><tr><th>Ended by</th><th>Sessions</th></tr></thead>\n<tbody>\n");
        for (end, count) in &stats.end_counts {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                html_escape(end),
                count
            ));
        }
        html.push_str("</tbody></table>\n");
    }

    if !report.sessions.is_empty() {
        html.push_str(&generate_scatter(&report.sessions));
    }
    html.push_str("</section>\n");

    // Per-session results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Sessions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Examinee</th><th onclick=\"sortTable(1)\">True θ</th><th onclick=\"sortTable(2)\">Estimate</th><th onclick=\"sortTable(3)\">Error</th><th onclick=\"sortTable(4)\">SE</th><th onclick=\"sortTable(5)\">Items</th><th onclick=\"sortTable(6)\">Ended by</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for s in &report.sessions {
        let class = if s.error().abs() <= s.summary.estimate.standard_error * 2.0 {
            "pass"
        } else {
            "fail"
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:+.3}</td><td>{:.3}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            html_escape(&s.summary.examinee_id),
            s.true_ability,
            s.summary.estimate.ability,
            s.error(),
            s.summary.estimate.standard_error,
            s.summary.responses.len(),
            s.summary.end,
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SimulationReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Scatter plot of estimated against true ability, with the identity line.
fn generate_scatter(sessions: &[SimulatedSession]) -> String {
    let size = 360.0;
    let margin = 40.0;
    let bound = sessions
        .iter()
        .flat_map(|s| [s.true_ability.abs(), s.summary.estimate.ability.abs()])
        .fold(1.0_f64, f64::max)
        .ceil();
    let scale = |v: f64| margin + (v + bound) / (2.0 * bound) * size;
    let flip = |v: f64| margin + size - (v + bound) / (2.0 * bound) * size;

    let mut svg = format!(
        "<svg width=\"{w}\" height=\"{w}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        w = size + 2.0 * margin
    );
    svg.push_str(&format!(
        "  <rect x=\"{margin}\" y=\"{margin}\" width=\"{size}\" height=\"{size}\" fill=\"none\" stroke=\"currentColor\" stroke-opacity=\"0.3\"/>\n"
    ));
    svg.push_str(&format!(
        "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#6b7280\" stroke-dasharray=\"4\"/>\n",
        scale(-bound),
        flip(-bound),
        scale(bound),
        flip(bound)
    ));
    for s in sessions {
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"#3b82f6\"><title>{}</title></circle>\n",
            scale(s.true_ability),
            flip(s.summary.estimate.ability),
            html_escape(&s.summary.examinee_id)
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">true ability</text>\n",
        margin + size / 2.0,
        size + margin * 1.75
    ));
    svg.push_str(&format!(
        "  <text x=\"12\" y=\"{:.1}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\" transform=\"rotate(-90 12 {:.1})\">estimate</text>\n",
        margin + size / 2.0,
        margin + size / 2.0
    ));
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = isNaN(na) || isNaN(nb) ? va.localeCompare(vb) : na - nb;
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
