//! `hopper doctor`: Diagnose configuration and engine reachability.

use hopper_config::{AppConfig, EngineKind};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Hopper Doctor — Configuration Diagnostics");
    println!("============================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ℹ️  No config file; using defaults and environment (run `hopper init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    let engine = &config.engine;
    println!("  ℹ️  Engine: {:?} ({})", engine.kind, engine.base_url);

    if engine.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set OPENAI_API_KEY or AZURE_OPENAI_API_KEY");
        issues += 1;
    }

    match engine.kind {
        EngineKind::Azure if engine.deployment.is_none() => {
            println!("  ⚠️  No Azure deployment — set AZURE_OPENAI_DEPLOYMENT_NAME");
            issues += 1;
        }
        EngineKind::Azure => {
            println!("  ✅ Deployment: {}", engine.deployment.as_deref().unwrap_or_default());
        }
        EngineKind::Openai => println!("  ✅ Model: {}", engine.model),
    }

    if config.is_engine_configured() {
        let reasoning = hopper_providers::build_from_config(&config);
        match reasoning.health_check().await {
            Ok(true) => println!("  ✅ Engine reachable"),
            Ok(false) => {
                println!("  ⚠️  Engine answered but reported unhealthy");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Engine unreachable: {e}");
                issues += 1;
            }
        }
    }

    let tools = super::build_orchestrator(&config)?.list_tools();
    println!("  ✅ {} tools registered", tools.len());

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
