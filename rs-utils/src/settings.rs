use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use bevy::prelude::Resource;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_SKIN_SERVER: &str = "https://cdn.classicube.net/skin/";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Which player name labels are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMode {
    None,
    #[default]
    Hovered,
    All,
    AllHovered,
    AllUnscaled,
}

impl FromStr for NameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "hovered" => Ok(Self::Hovered),
            "all" => Ok(Self::All),
            "all_hovered" | "allhovered" => Ok(Self::AllHovered),
            "all_unscaled" | "allunscaled" => Ok(Self::AllUnscaled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    #[default]
    None,
    SnapToBlock,
    Circle,
    CircleAll,
}

impl FromStr for ShadowMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "snap_to_block" | "snaptoblock" => Ok(Self::SnapToBlock),
            "circle" => Ok(Self::Circle),
            "circle_all" | "circleall" => Ok(Self::CircleAll),
            _ => Err(()),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|_| {
        warn!("unknown option value {raw:?}, using default");
        T::default()
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HacksSettings {
    pub enabled: bool,
    pub speed_multiplier: f32,
    pub pushback_placing: bool,
    pub noclip_slide: bool,
    pub wom_style_hacks: bool,
    pub full_block_step: bool,
    pub jump_velocity: f32,
}

impl Default for HacksSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_multiplier: 10.0,
            pushback_placing: false,
            noclip_slide: false,
            wom_style_hacks: false,
            full_block_step: false,
            jump_velocity: 0.42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(deserialize_with = "lenient")]
    pub name_mode: NameMode,
    #[serde(deserialize_with = "lenient")]
    pub shadow_mode: ShadowMode,
    pub classic_mode: bool,
    pub view_bobbing: bool,
    pub username: String,
    pub skin_server: String,
    pub hacks: HacksSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            name_mode: NameMode::Hovered,
            shadow_mode: ShadowMode::None,
            classic_mode: false,
            view_bobbing: true,
            username: "Player".to_string(),
            skin_server: DEFAULT_SKIN_SERVER.to_string(),
            hacks: HacksSettings::default(),
        }
    }
}

impl ClientSettings {
    /// Loads settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        let mut settings = toml::from_str::<Self>(contents)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Clamps numeric options to their allowed ranges and applies the
    /// classic-mode overrides.
    pub fn sanitize(&mut self) {
        self.hacks.speed_multiplier = clamp_or(self.hacks.speed_multiplier, 0.1, 50.0, 10.0);
        self.hacks.jump_velocity = clamp_or(self.hacks.jump_velocity, 0.0, 52.0, 0.42);
        if self.classic_mode {
            self.name_mode = NameMode::Hovered;
            self.shadow_mode = ShadowMode::None;
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() { value.clamp(min, max) } else { fallback }
}
