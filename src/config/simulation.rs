use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed. 0 draws a fresh seed from the OS.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Directory holding tiles.toml, items.toml and maps/. Embedded content is
    /// used when unset.
    #[serde(default)]
    pub content_directory: Option<String>,
    #[serde(default = "default_start_map")]
    pub start_map: String,
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u32,
    #[serde(default = "default_untill_chance")]
    pub untill_chance: f64,
    #[serde(default = "default_inventory_slots")]
    pub inventory_slots: usize,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    #[serde(default = "default_max_health")]
    pub max_health: i32,
    #[serde(default = "default_spawn")]
    pub spawn: [i32; 2],
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_start_map() -> String {
    "Home Base".to_string()
}
fn default_days_per_season() -> u32 {
    28
}
fn default_untill_chance() -> f64 {
    0.5
}
fn default_inventory_slots() -> usize {
    10
}
fn default_max_stack() -> u32 {
    99
}
fn default_max_health() -> i32 {
    100
}
fn default_spawn() -> [i32; 2] {
    [5, 5]
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: 0,
            log_level: default_log_level(),
            log_format: default_log_format(),
            content_directory: None,
            start_map: default_start_map(),
            days_per_season: default_days_per_season(),
            untill_chance: default_untill_chance(),
            inventory_slots: default_inventory_slots(),
            max_stack: default_max_stack(),
            max_health: default_max_health(),
            spawn: default_spawn(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.start_map.trim().is_empty() {
            errors.push(
                "start_map must not be empty. Example: start_map = \"Home Base\"".to_string(),
            );
        }

        if self.days_per_season == 0 {
            errors.push(format!(
                "days_per_season must be > 0, got {}. Example: days_per_season = 28",
                self.days_per_season
            ));
        }

        if !(0.0..=1.0).contains(&self.untill_chance) {
            errors.push(format!(
                "untill_chance must be within 0.0-1.0, got {}. Example: untill_chance = 0.5",
                self.untill_chance
            ));
        }

        if self.inventory_slots == 0 {
            errors.push(format!(
                "inventory_slots must be > 0, got {}. Example: inventory_slots = 10",
                self.inventory_slots
            ));
        }

        if self.max_stack == 0 {
            errors.push(format!(
                "max_stack must be > 0, got {}. Example: max_stack = 99",
                self.max_stack
            ));
        }

        if self.max_health <= 0 {
            errors.push(format!(
                "max_health must be > 0, got {}. Example: max_health = 100",
                self.max_health
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"text\"",
                valid_formats, self.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
