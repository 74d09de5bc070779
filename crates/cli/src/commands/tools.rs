//! `hopper tools`: List the built-in tools.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let orchestrator = super::build_orchestrator(&config)?;

    let tools = orchestrator.list_tools();
    println!("🔧 {} tools available\n", tools.len());
    for tool in &tools {
        println!("  {:<18} {}", tool.name, tool.description);
    }

    Ok(())
}
