use std::process;
use std::sync::Arc;

use leadgen::tools::ApifyActorTool;
use leadgen::{ExecutionContext, GroqClient, Inputs, Memory, ModelConfig, Runner, crew};

const SEARCH_ACTOR: &str = "code_crafter/apollo-io-scraper";

fn main() {
    let inputs = ExecutionContext::new(Inputs {
        topic: "AI Agents".into(),
        role: "AI Agent Development".into(),
        location: "Remote".into(),
        budget_min: 1000,
        max_results: 50,
    });

    println!(
        "starting lead generation: {} / {}",
        inputs.get("topic").unwrap_or(""),
        inputs.get("role").unwrap_or("")
    );

    match run(&inputs) {
        Ok(report) => {
            println!("lead generation completed");
            println!("{report}");
        }
        Err(err) => {
            eprintln!("lead generation failed: {err}");
            process::exit(1);
        }
    }
}

fn run(inputs: &ExecutionContext) -> Result<String, Box<dyn std::error::Error>> {
    // Credentials resolve once, before any task executes.
    let model = Arc::new(GroqClient::new(ModelConfig::from_env()?));
    let search_tool = ApifyActorTool::from_env(SEARCH_ACTOR)?;
    let pipeline = crew::lead_pipeline(model, Box::new(search_tool))?;

    let mut runner = Runner::new(pipeline).with_tracing();
    let mut memory = Memory::new();
    let run = runner.kickoff(inputs, &mut memory)?;

    Ok(run.final_output().unwrap_or_default().to_string())
}
