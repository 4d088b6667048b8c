// SPDX-License-Identifier: MPL-2.0
//! This module handles the gallery's configuration: the two output
//! directories the generation tool writes into, loaded from and saved to a
//! `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use prompt_gallery::config::{self, Config};
//!
//! // Load existing configuration, falling back to the default layout
//! let config = config::load().unwrap_or_default();
//! println!("txt2img outputs: {}", config.txt2img_dir.display());
//!
//! // Save after changing a directory
//! config::save(&config).expect("Failed to save config");
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "prompt_gallery";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Output directory of the text-to-image pipeline.
    #[serde(default = "default_txt2img_dir")]
    pub txt2img_dir: PathBuf,
    /// Output directory of the image-to-image pipeline.
    #[serde(default = "default_img2img_dir")]
    pub img2img_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            txt2img_dir: default_txt2img_dir(),
            img2img_dir: default_img2img_dir(),
        }
    }
}

fn default_txt2img_dir() -> PathBuf {
    PathBuf::from("outputs/txt2img")
}

fn default_img2img_dir() -> PathBuf {
    PathBuf::from("outputs/img2img")
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_default())
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
