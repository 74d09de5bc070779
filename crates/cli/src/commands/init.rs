//! `hopper init`: Write a default configuration file.

use hopper_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!();
    println!("📝 Next steps:");
    println!("   1. Add your API key under [engine], or export OPENAI_API_KEY");
    println!("      (for Azure, export AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY");
    println!("      and AZURE_OPENAI_DEPLOYMENT_NAME)");
    println!("   2. Run: hopper doctor");
    println!("   3. Run: hopper chat");

    Ok(())
}
