//! `quarry ask` — one task through the agent loop.

use quarry_agent::RunOutcome;

use super::{build_agent, load_config};

pub async fn run(task: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let (agent, _client, _provider) = build_agent(&config)?;

    match agent.run(&task).await? {
        RunOutcome::Completed { answer, steps } => {
            eprintln!("(answered in {steps} steps)");
            match answer {
                serde_json::Value::String(s) => println!("{s}"),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }
        RunOutcome::Incomplete { steps } => {
            eprintln!("No final answer within {steps} steps.");
        }
    }

    Ok(())
}
