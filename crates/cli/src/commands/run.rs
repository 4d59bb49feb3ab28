//! `quarry run` — the full feature-engineering pipeline.

use std::path::PathBuf;

use quarry_semantic::SemanticModelManager;
use quarry_workflow::{
    BaselineEvaluation, FeatureEngineeringPipeline, Judge, PipelineStatus,
};

use super::{build_agent, load_config};

pub async fn run(model_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let (agent, client, provider) = build_agent(&config)?;

    let model_path = model_path
        .map(PathBuf::from)
        .unwrap_or_else(|| config.semantic.model_path.clone());

    let pipeline = FeatureEngineeringPipeline::new(
        provider.clone(),
        &config.model.name,
        agent,
        Judge::standard(client.clone(), provider, &config.model.name),
        Box::new(BaselineEvaluation),
        client,
        SemanticModelManager::new(),
        &model_path,
    );

    let report = pipeline.run().await?;

    println!("Run {}", report.run_id);
    println!("Question: {}", report.question);
    if let Some(sql) = &report.sql {
        println!("SQL:\n{sql}");
    }
    for entry in &report.validation {
        let mark = if entry.verdict.valid { "pass" } else { "FAIL" };
        println!("  [{mark}] {}: {}", entry.strategy, entry.verdict.message);
    }
    match report.status {
        PipelineStatus::Completed => {
            println!("Status: completed — query recorded in {}", model_path.display());
            for (metric, value) in &report.metrics {
                println!("  {metric}: {value}");
            }
        }
        PipelineStatus::Rejected => println!("Status: rejected by the judge"),
        PipelineStatus::Incomplete => {
            println!("Status: incomplete — no final answer within the step budget")
        }
    }

    Ok(())
}
