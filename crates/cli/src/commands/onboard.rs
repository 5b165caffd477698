//! `consolechat onboard` — Write the default configuration file.

use consolechat_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(AppConfig::config_dir())?;
    std::fs::write(&config_path, AppConfig::default_toml())?;

    println!("Generated {}", config_path.display());
    println!("Fill in `model_path` and `backend.script` before starting a chat.");
    Ok(())
}
