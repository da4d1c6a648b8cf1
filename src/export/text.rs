//! Terminal rendering
//!
//! Tables are built with `tabled`; color is applied to headings and labels
//! only so cell widths stay correct.

use crate::acwr::{AcwrBand, AcwrPoint};
use crate::confidence::Confidence;
use crate::engine::{BatchReport, EngineReport};
use crate::pmc::PmcPoint;
use crate::readiness::{ReadinessLabel, ReadinessResult};
use crate::recovery::{RecommendationPriority, RecoveryRecommendation};
use colored::*;
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ReadinessRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Score")]
    score: u8,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Why")]
    why: String,
}

#[derive(Tabled)]
struct PmcRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "TSB")]
    tsb: String,
}

#[derive(Tabled)]
struct AcwrRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Acute (7d)")]
    acute: String,
    #[tabled(rename = "Chronic (28d)")]
    chronic: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Band")]
    band: String,
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Component")]
    component: &'static str,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
    #[tabled(rename = "Recovery")]
    recovery: u8,
    #[tabled(rename = "ACWR")]
    acwr: String,
    #[tabled(rename = "TSB")]
    tsb: String,
}

fn number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn ratio(point: &AcwrPoint) -> String {
    point
        .ratio
        .map(|r| format!("{:.2}", r))
        .unwrap_or_else(|| "-".to_string())
}

fn band(point: &AcwrPoint) -> String {
    point
        .band
        .map(|b| b.display_name().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn colored_label(label: ReadinessLabel) -> ColoredString {
    let text = label.to_string();
    match label {
        ReadinessLabel::Fresh => text.green().bold(),
        ReadinessLabel::Optimal => text.cyan().bold(),
        ReadinessLabel::Tired => text.yellow().bold(),
        ReadinessLabel::VeryTired => text.red().bold(),
    }
}

fn colored_confidence(confidence: Confidence) -> ColoredString {
    match confidence {
        Confidence::High => confidence.as_str().green(),
        Confidence::Medium => confidence.as_str().yellow(),
        Confidence::Low => confidence.as_str().red(),
    }
}

fn colored_band(band: AcwrBand) -> ColoredString {
    match band {
        AcwrBand::Optimal => band.display_name().green(),
        AcwrBand::Undertraining => band.display_name().blue(),
        AcwrBand::Caution => band.display_name().yellow(),
        AcwrBand::HighRisk => band.display_name().red().bold(),
    }
}

/// Table of daily readiness results
pub fn render_readiness_table(results: &[ReadinessResult]) -> String {
    let rows = results.iter().map(|r| ReadinessRow {
        date: r.date.to_string(),
        score: r.score,
        label: r.label.to_string(),
        confidence: r.confidence.to_string(),
        why: r.why_line.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Table of PMC values; days before the first activity show `-`
pub fn render_pmc_table(series: &[PmcPoint]) -> String {
    let rows = series.iter().map(|p| PmcRow {
        date: p.date.to_string(),
        ctl: number(p.ctl),
        atl: number(p.atl),
        tsb: number(p.tsb),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Table of ACWR values
pub fn render_acwr_table(series: &[AcwrPoint]) -> String {
    let rows = series.iter().map(|p| AcwrRow {
        date: p.date.to_string(),
        acute: format!("{:.1}", p.acute_7d),
        chronic: format!("{:.1}", p.chronic_28d),
        ratio: ratio(p),
        band: band(p),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Recovery score, breakdown and prioritized recommendations
pub fn render_recovery(recovery: &RecoveryRecommendation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} (confidence {}%)",
        "Recovery:".bold(),
        recovery.recovery_score.to_string().bold(),
        recovery.confidence
    );

    let breakdown = &recovery.breakdown;
    let optional = |v: Option<u8>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let rows = vec![
        BreakdownRow {
            component: "Sleep",
            score: breakdown.sleep_score.to_string(),
        },
        BreakdownRow {
            component: "HRV",
            score: breakdown.hrv_score.to_string(),
        },
        BreakdownRow {
            component: "Resting HR",
            score: breakdown.resting_hr_score.to_string(),
        },
        BreakdownRow {
            component: "Wellness",
            score: optional(breakdown.subjective_wellness_score),
        },
        BreakdownRow {
            component: "Training load",
            score: breakdown.training_load_impact.to_string(),
        },
        BreakdownRow {
            component: "Stress level",
            score: optional(breakdown.stress_level),
        },
    ];
    let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));

    let _ = writeln!(out, "{}", "Recommendations".bold().underline());
    for (priority, text) in recovery.prioritized() {
        let tag = match priority {
            RecommendationPriority::High => "[high]".red().bold(),
            RecommendationPriority::Medium => "[medium]".yellow(),
            RecommendationPriority::Low => "[low]".dimmed(),
        };
        let _ = writeln!(out, "  {} {}", tag, text);
    }

    for limitation in &recovery.limitations {
        let _ = writeln!(out, "  {} {}", "note:".dimmed(), limitation.dimmed());
    }
    out
}

/// Full single-day report
pub fn render_report(report: &EngineReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!("Readiness report for {} on {}", report.user_id, report.date)
            .bold()
            .underline()
    );
    let _ = writeln!(out);

    let readiness = &report.readiness;
    let _ = writeln!(
        out,
        "{} {} {} (confidence {})",
        "Readiness:".bold(),
        readiness.score.to_string().bold(),
        colored_label(readiness.label),
        colored_confidence(readiness.confidence)
    );
    let _ = writeln!(out, "  {}", readiness.why_line);
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "Baselines".bold());
    for window in [&report.baselines.hrv, &report.baselines.resting_hr] {
        let _ = writeln!(
            out,
            "  {:<11} mean {:>6}  samples {:>2}/{}  coverage {:.0}%",
            window.metric.display_name(),
            number(window.mean),
            window.sample_count,
            window.window_days,
            window.coverage_ratio * 100.0
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "Training load".bold());
    match &report.load {
        Some(state) => {
            let _ = writeln!(
                out,
                "  CTL {:.1}  ATL {:.1}  TSB {:.1}",
                state.ctl(),
                state.atl(),
                state.tsb()
            );
            if let Some(form) = report.form {
                let _ = writeln!(out, "  Form: {}", form.description());
            }
        }
        None => {
            let _ = writeln!(out, "  No activities recorded yet");
        }
    }

    let acwr = &report.acwr;
    let _ = write!(
        out,
        "  ACWR {} (acute {:.1}, chronic {:.1})",
        ratio(acwr),
        acwr.acute_7d,
        acwr.chronic_28d
    );
    match acwr.band {
        Some(b) => {
            let _ = writeln!(out, " {}", colored_band(b));
            let _ = writeln!(out, "  {}", b.guidance());
        }
        None => {
            let _ = writeln!(out);
        }
    }
    let _ = writeln!(out);

    out.push_str(&render_recovery(&report.recovery));

    if !report.issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            format!("{} input value(s) were dropped during validation", report.issues.len()).yellow()
        );
    }
    out
}

/// One line per user of a batch run
pub fn render_batch(batch: &BatchReport) -> String {
    let rows = batch.reports.iter().map(|r| BatchRow {
        user: r.user_id.clone(),
        readiness: format!("{} {}", r.readiness.score, r.readiness.label),
        recovery: r.recovery.recovery_score,
        acwr: ratio(&r.acwr),
        tsb: number(r.load.as_ref().map(|s| s.tsb())),
    });

    let mut out = Table::new(rows).with(Style::rounded()).to_string();
    out.push('\n');
    let _ = writeln!(
        out,
        "{} users, {} failed, {} ms",
        batch.total_users, batch.failed_users, batch.total_duration_ms
    );
    for (user, error) in &batch.failures {
        let _ = writeln!(out, "  {} {}: {}", "failed".red(), user, error);
    }
    out
}
