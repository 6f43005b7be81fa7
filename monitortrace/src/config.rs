// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use crate::translator::{TranslatorOptions, DEFAULT_MIN_DURATION, DEFAULT_REFERENCE_YEAR};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,

    #[serde(default = "default_min_duration", with = "humantime_duration")]
    pub min_duration: Duration,
}

fn default_reference_year() -> i32 {
    DEFAULT_REFERENCE_YEAR
}

fn default_min_duration() -> Duration {
    DEFAULT_MIN_DURATION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            min_duration: default_min_duration(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(
            self.reference_year >= 1970,
            "reference_year must be 1970 or later, got {}",
            self.reference_year
        );
        eyre::ensure!(
            self.min_duration >= DEFAULT_MIN_DURATION,
            "min_duration must be at least {}, got {}",
            humantime::format_duration(DEFAULT_MIN_DURATION),
            humantime::format_duration(self.min_duration)
        );
        Ok(())
    }

    pub fn translator_options(&self) -> TranslatorOptions {
        TranslatorOptions {
            reference_year: self.reference_year,
            min_duration: self.min_duration,
        }
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
