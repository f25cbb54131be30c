//! Configuration loading and resolution.

use vision_bridge::{Result, VisionConfig};

/// Load the vision configuration from the environment, applying an
/// optional CLI model override on top.
pub fn load_config(model_override: Option<&str>) -> Result<VisionConfig> {
    let mut config = VisionConfig::from_env()?;
    if let Some(model) = model_override {
        config.model = model.to_string();
    }
    Ok(config)
}
