//! Command implementations

use crate::cli::{Cli, Commands};
use crate::output::{output_report, output_single, print_techniques, status_line};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use nutrivision_app::acquire::{acquire, ImageSource, SAMPLE_IMAGES};
use nutrivision_app::app::Orchestrator;
use nutrivision_app::config::Config;
use nutrivision_app::report::AnalysisReport;
use nutrivision_types::{AnalysisResult, OutputFormat, Result, Technique, TechniqueResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub async fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Analyze { input, technique } => {
            cmd_analyze(&config, &input, technique, output_format).await
        }

        Commands::Techniques => print_techniques(output_format),

        Commands::Samples => cmd_samples(output_format),

        Commands::Config {
            show,
            set_model,
            set_temperature,
            set_api_base,
            set_timeout,
            set_output,
            reset,
        } => cmd_config(
            show,
            set_model,
            set_temperature,
            set_api_base,
            set_timeout,
            set_output,
            reset,
        ),
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn spinner(multi: &MultiProgress, message: String) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(spinner_style());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn cmd_analyze(
    config: &Config,
    input: &str,
    technique: Option<Technique>,
    output_format: OutputFormat,
) -> Result<()> {
    let source = ImageSource::parse(input)?;
    debug!(source = %source.describe(), "acquiring image");
    let image = acquire(&source, Duration::from_secs(config.request_timeout_secs)).await?;

    let analyzer = Arc::new(config.build_analyzer()?);

    // Spinners only make sense for humans
    let multi = MultiProgress::new();
    if output_format == OutputFormat::Json {
        multi.set_draw_target(ProgressDrawTarget::hidden());
    }

    if let Some(technique) = technique {
        let pb = spinner(&multi, format!("{}: analyzing...", technique.name()));
        let outcome = analyzer.invoke(&image, technique).await;
        pb.finish_and_clear();
        let cell = single_result(technique, outcome)?;
        return output_single(output_format, &cell);
    }

    let mut orchestrator = Orchestrator::new(analyzer);
    orchestrator.submit_image(Some(image));

    let bars: HashMap<Technique, ProgressBar> = orchestrator
        .state()
        .results()
        .iter()
        .map(|cell| (cell.technique, spinner(&multi, status_line(cell))))
        .collect();

    while let Some(technique) = orchestrator.next_update().await {
        if let Some(pb) = bars.get(&technique) {
            pb.finish_with_message(status_line(orchestrator.state().get(technique)));
        }
    }

    let report =
        AnalysisReport::from_state(orchestrator.state(), source.describe(), &config.model);
    output_report(output_format, &report)
}

/// Setup problems fail the command; anything else is shown as the technique's result
fn single_result(technique: Technique, outcome: Result<AnalysisResult>) -> Result<TechniqueResult> {
    match outcome {
        Ok(data) => Ok(TechniqueResult::succeeded(technique, data)),
        Err(e) if e.is_configuration() => Err(e),
        Err(e) => Ok(TechniqueResult::failed(technique, e.to_string())),
    }
}

fn cmd_samples(output_format: OutputFormat) -> Result<()> {
    if output_format == OutputFormat::Json {
        let list: Vec<_> = SAMPLE_IMAGES
            .iter()
            .enumerate()
            .map(|(i, (name, url))| {
                serde_json::json!({ "index": i + 1, "name": name, "url": url })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("\nSample Images");
    println!("=============");
    for (i, (name, url)) in SAMPLE_IMAGES.iter().enumerate() {
        println!("{:>2}. {:<8} {}", i + 1, name, truncate(url, 70));
    }
    println!("\nUse: nutrivision analyze sample:<n|name>");
    Ok(())
}

fn cmd_config(
    show: bool,
    set_model: Option<String>,
    set_temperature: Option<f32>,
    set_api_base: Option<String>,
    set_timeout: Option<u64>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(model) = set_model {
        config.model = model;
        modified = true;
    }

    if let Some(temperature) = set_temperature {
        config.temperature = temperature;
        modified = true;
    }

    if let Some(api_base) = set_api_base {
        config.api_base = api_base.trim_end_matches('/').to_string();
        modified = true;
    }

    if let Some(timeout) = set_timeout {
        config.request_timeout_secs = timeout;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use nutrivision_types::{ConfigError, Error, InvocationError};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_parse_analyze_with_technique() {
        let cli = Cli::try_parse_from([
            "nutrivision",
            "analyze",
            "sample:2",
            "--technique",
            "deep-analysis",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Analyze { input, technique } => {
                assert_eq!(input, "sample:2");
                assert_eq!(technique, Some(Technique::DeepAnalysis));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_config_flags() {
        let cli = Cli::try_parse_from([
            "nutrivision",
            "config",
            "--set-temperature",
            "0.2",
            "--set-timeout",
            "30",
        ])
        .unwrap();
        match cli.command {
            Commands::Config {
                set_temperature,
                set_timeout,
                reset,
                ..
            } => {
                assert_eq!(set_temperature, Some(0.2));
                assert_eq!(set_timeout, Some(30));
                assert!(!reset);
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_single_result_fails_command_on_missing_key() {
        let outcome = Err(ConfigError::MissingApiKey.into());
        assert!(matches!(
            single_result(Technique::RapidScan, outcome),
            Err(Error::Config(ConfigError::MissingApiKey))
        ));

        let outcome = Err(InvocationError::Service {
            status: 429,
            message: "Quota exceeded".to_string(),
        }
        .into());
        let cell = single_result(Technique::RapidScan, outcome).unwrap();
        assert!(!cell.loading);
        assert!(cell.error.as_deref().unwrap().contains("429"));
    }

    #[test]
    fn test_analyze_requires_input() {
        assert!(Cli::try_parse_from(["nutrivision", "analyze"]).is_err());
    }
}
