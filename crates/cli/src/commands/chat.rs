//! `hopper chat`: Interactive or single-message chat mode.

use std::io::Write;

use hopper_core::trace::TurnTrace;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    if !config.is_engine_configured() {
        eprintln!();
        eprintln!("  ERROR: No reasoning engine configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY / HOPPER_API_KEY      (OpenAI-compatible)");
        eprintln!("    AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY,");
        eprintln!("    AZURE_OPENAI_DEPLOYMENT_NAME         (Azure OpenAI)");
        eprintln!();
        eprintln!("  Or run `hopper init` and edit:");
        eprintln!("    {}", hopper_config::AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No engine configured. See above for setup instructions.".into());
    }

    let orchestrator = super::build_orchestrator(&config)?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let trace = orchestrator.submit_message(&msg).await;
        eprint!("\r              \r");
        print_trace(&trace?);
        return Ok(());
    }

    let tool_names: Vec<String> = orchestrator.list_tools().into_iter().map(|t| t.name).collect();

    println!();
    println!("  Hopper — Interactive Mode");
    println!();
    println!("  Engine:  {}", orchestrator.engine_name());
    println!("  Model:   {}", config.engine.model);
    println!("  Tools:   {}", tool_names.join(", "));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/clear' to forget the conversation, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                orchestrator.clear_history().await;
                println!("  History cleared.\n");
                continue;
            }
            _ => {}
        }

        eprint!("  ...");
        match orchestrator.submit_message(line).await {
            Ok(trace) => {
                eprint!("\r     \r");
                println!();
                print_trace(&trace);
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn print_trace(trace: &TurnTrace) {
    if let Some(tool) = &trace.tool_used {
        println!("  [tool] {tool}");
        if let Some(thinking) = &trace.thinking {
            println!("  [thinking] {thinking}");
        }
        if let Some(output) = &trace.tool_output {
            println!("  [output] {output}");
        }
    }
    for line in trace.response.lines() {
        println!("  Hopper > {line}");
    }
}
