use matchbook_core::{EngineConfig, Result};
use std::path::Path;

/// Engine settings are read from `engine.json` in the data directory when
/// present; otherwise the defaults apply. The file is optional so a fresh
/// data dir works out of the box.
pub fn load_engine_config(data_dir: &Path) -> Result<EngineConfig> {
    let path = data_dir.join("engine.json");

    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: EngineConfig = serde_json::from_str(&contents)?;
    config.validate()?;

    Ok(config)
}
