// Copyright 2025 Fernando Borretti
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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::srs::Scheduler;
use crate::types::quality::Quality;

pub const CONFIG_FILE_NAME: &str = "learninghub.toml";

/// Per-collection settings, read from `learninghub.toml`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The port the review server listens on.
    pub port: u16,
    /// The lowest rating that counts as a successful recall. `easy` keeps
    /// the historical behaviour; `good` is the textbook SM-2 reading.
    pub pass_threshold: Quality,
    /// Cards to review per day.
    pub daily_goal: usize,
    /// Open the review page in a browser when the server starts.
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            pass_threshold: Quality::Easy,
            daily_goal: 20,
            open_browser: true,
        }
    }
}

impl Config {
    /// Read the configuration in `directory`, falling back to the defaults
    /// if there is no configuration file.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No configuration file, using defaults.");
            return Ok(Self::default());
        }
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.pass_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        let config = Config::parse("port = 9000\npass_threshold = \"good\"\nopen_browser = false\n")?;
        assert_eq!(config.port, 9000);
        assert_eq!(config.pass_threshold, Quality::Good);
        assert_eq!(config.daily_goal, 20);
        assert!(!config.open_browser);
        assert_eq!(config.scheduler().pass_threshold(), Quality::Good);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::parse("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_rejects_invalid_threshold() {
        assert!(Config::parse("pass_threshold = \"medium\"").is_err());
    }

    #[test]
    fn test_load_missing_file() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn test_load_file() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "daily_goal = 50\n")?;
        assert_eq!(Config::load(dir.path())?.daily_goal, 50);
        Ok(())
    }
}
