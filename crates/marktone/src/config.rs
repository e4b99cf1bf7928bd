// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Composer configuration.
//!
//! `defaults/marktone.default.toml` is embedded so the documented defaults
//! and runtime behaviour stay in sync. Hosts layer their own settings on top
//! through [`Loader`] before deserializing into [`ComposerConfig`].

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, File, FileFormat};
use serde::Deserialize;

use crate::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/marktone.default.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComposerConfig {
    pub mentions: MentionConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionConfig {
    pub trigger: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadConfig {
    pub enabled: bool,
    pub default_thumbnail_width: u32,
    pub image_mime_prefix: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            mentions: MentionConfig { trigger: '@' },
            upload: UploadConfig {
                enabled: true,
                default_thumbnail_width: 250,
                image_mime_prefix: "image/".to_owned(),
            },
        }
    }
}

/// Helper for layering host overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML document held in memory.
    pub fn with_toml_str(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    pub fn build(self) -> Result<ComposerConfig, ConfigError> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
