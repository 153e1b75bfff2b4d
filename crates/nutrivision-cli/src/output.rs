//! Output formatting module

use nutrivision_app::app::{MacroComparisonRow, PerformanceRow};
use nutrivision_app::report::AnalysisReport;
use nutrivision_types::{
    OutputFormat, Result, Technique, TechniqueResult, TechniqueStatus, TECHNIQUE_CATALOG,
};
use std::fmt::Write;

const RULE: &str = "----------------------------------------";

pub fn output_report(output_format: OutputFormat, report: &AnalysisReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\nAnalysis of {}", report.source);
    println!("Model: {}", report.model);

    for cell in &report.results {
        print!("{}", render_card(cell));
    }

    if !report.macro_comparison.is_empty() {
        print!("{}", render_macro_table(&report.macro_comparison));
        print!("{}", render_performance_table(&report.performance));
    }

    println!("\n{} succeeded, {} failed", report.succeeded(), report.failed());
    Ok(())
}

pub fn output_single(output_format: OutputFormat, cell: &TechniqueResult) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(cell)?);
    } else {
        print!("{}", render_card(cell));
    }
    Ok(())
}

/// One-line summary used when a spinner finishes
pub fn status_line(cell: &TechniqueResult) -> String {
    match (cell.status(), &cell.data, &cell.error) {
        (TechniqueStatus::Success, Some(data), _) => format!(
            "{}: {} ({:.0} kcal, {} ms)",
            cell.technique_name, data.food_name, data.macros.calories, data.processing_time_ms
        ),
        (TechniqueStatus::Error, _, Some(err)) => {
            format!("{}: failed - {}", cell.technique_name, err)
        }
        (TechniqueStatus::Loading, _, _) => format!("{}: analyzing...", cell.technique_name),
        _ => format!("{}: idle", cell.technique_name),
    }
}

pub fn render_card(cell: &TechniqueResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", cell.technique_name);
    let _ = writeln!(out, "{}", "=".repeat(cell.technique_name.chars().count()));

    match (&cell.data, &cell.error) {
        (Some(data), _) => {
            let _ = writeln!(out, "Food:            {}", data.food_name);
            let _ = writeln!(out, "Portion:         {}", data.portion_estimate);
            let _ = writeln!(out, "{}", RULE);
            let _ = writeln!(out, "Calories:        {:.0} kcal", data.macros.calories);
            let _ = writeln!(out, "Protein:         {:.1} g", data.macros.protein);
            let _ = writeln!(out, "Carbs:           {:.1} g", data.macros.carbs);
            let _ = writeln!(out, "Fat:             {:.1} g", data.macros.fat);
            let _ = writeln!(out, "{}", RULE);
            let _ = writeln!(out, "Confidence:      {:.0}%", data.confidence_score);
            let _ = writeln!(out, "Time:            {} ms", data.processing_time_ms);
            let _ = writeln!(out, "\nReasoning:");
            let _ = writeln!(out, "{}", data.reasoning);
        }
        (None, Some(err)) => {
            let _ = writeln!(out, "Analysis failed: {}", err);
        }
        (None, None) if cell.loading => {
            let _ = writeln!(out, "(still analyzing)");
        }
        (None, None) => {
            let _ = writeln!(out, "(no result)");
        }
    }
    out
}

fn technique_columns(rows: impl Iterator<Item = Technique>) -> Vec<Technique> {
    let present: Vec<Technique> = rows.collect();
    Technique::ALL.into_iter().filter(|t| present.contains(t)).collect()
}

fn short_name(technique: Technique) -> &'static str {
    match technique {
        Technique::RapidScan => "Rapid",
        Technique::DeepAnalysis => "Analytical",
        Technique::HealthOptimized => "Clinical",
    }
}

pub fn render_macro_table(rows: &[MacroComparisonRow]) -> String {
    let columns =
        technique_columns(rows.iter().flat_map(|r| r.values.iter().map(|v| v.technique)));

    let mut out = String::new();
    let _ = writeln!(out, "\nMacro Comparison");
    let _ = writeln!(out, "================");
    let _ = write!(out, "{:<17}", "");
    for technique in &columns {
        let _ = write!(out, "{:>12}", short_name(*technique));
    }
    let _ = writeln!(out, "{:>10}", "Spread");

    for row in rows {
        let _ = write!(out, "{:<17}", row.subject);
        for technique in &columns {
            match row.value(*technique) {
                Some(v) => {
                    let _ = write!(out, "{:>12.1}", v);
                }
                None => {
                    let _ = write!(out, "{:>12}", "-");
                }
            }
        }
        let _ = writeln!(out, "{:>10.1}", row.spread());
    }
    out
}

pub fn render_performance_table(rows: &[PerformanceRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nPerformance");
    let _ = writeln!(out, "===========");
    let _ = writeln!(out, "{:<30}{:>10}{:>12}", "Technique", "Time", "Confidence");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<30}{:>7} ms{:>11.0}%",
            row.name, row.processing_time_ms, row.confidence_score
        );
    }
    out
}

pub fn print_techniques(output_format: OutputFormat) -> Result<()> {
    if output_format == OutputFormat::Json {
        let list: Vec<_> = TECHNIQUE_CATALOG
            .iter()
            .map(|c| {
                serde_json::json!({
                    "technique": c.technique,
                    "name": c.name,
                    "description": c.description,
                    "color": c.color,
                    "instruction": c.instruction,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("\nAnalysis Techniques");
    println!("===================");
    for config in &TECHNIQUE_CATALOG {
        println!("\n{} [{}] {}", config.name, config.technique.id(), config.color);
        println!("  {}", config.description);
    }
    Ok(())
}
