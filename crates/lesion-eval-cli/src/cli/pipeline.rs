use super::args::Cli;
use anyhow::Context;
use lesion_eval_core::evaluator::{evaluate_cases, Scorer};
use lesion_eval_core::report::{case_summaries, MetricsReport};
use lesion_eval_core::{inputs, match_cases, read_predictions, write_metrics, EvalConfig};
use lesion_eval_metrics::{aggregate, LesionScorer};

/// Container entry: list inputs, read, match, score once, write.
pub fn run(cli: &Cli) -> anyhow::Result<MetricsReport> {
    cli.validate()?;
    let config = cli.eval_config();
    let scorer = LesionScorer::new(cli.scoring_options());
    run_with_scorer(&config, &scorer)
}

pub fn run_with_scorer(config: &EvalConfig, scorer: &dyn Scorer) -> anyhow::Result<MetricsReport> {
    inputs::log_input_files(&config.input_dir);

    let predictions_path = config.predictions_path();
    let jobs = read_predictions(&predictions_path)
        .with_context(|| format!("reading {}", predictions_path.display()))?;
    tracing::info!(
        challenge = config.challenge.as_str(),
        jobs = jobs.len(),
        "read predictions"
    );

    let cases = match_cases(&jobs, config)?;
    let metrics = evaluate_cases(&cases, scorer, config.challenge.label_postprocess())?;

    let report = MetricsReport {
        aggregates: aggregate(&metrics),
        results: config
            .include_case_results
            .then(|| case_summaries(&metrics, &cases)),
    };
    tracing::info!(
        "aggregates: {}",
        serde_json::to_string(&report.aggregates).unwrap_or_default()
    );

    write_metrics(&report, &config.metrics_path())?;
    Ok(report)
}
