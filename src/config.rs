//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at
//! all) gives the stock setup: `model.onnx` in the working directory, the
//! embedded label table, a 0.7 confidence threshold and Stockfish
//! searched in the usual install locations with one second per move.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    classifier::{Backend, CONFIDENCE_THRESHOLD},
    error::ReaderError,
    labels::LabelTable,
};

/// Environment variable naming a JSON config file for the binary.
pub const CONFIG_ENV: &str = "CHESSBOARD_READER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub model_path: PathBuf,
    pub backend: Backend,
    /// Name of the model's image input
    pub input_name: String,
    /// Name of the model's probability output
    pub output_name: String,
    /// Custom label table; the embedded one when absent.
    pub label_table: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub engine: EngineConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            backend: Backend::default(),
            input_name: "input".to_owned(),
            output_name: "output".to_owned(),
            label_table: None,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            engine: EngineConfig::default(),
        }
    }
}

impl ReaderConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Read the file named by [`CONFIG_ENV`], or fall back to defaults.
    pub fn from_env() -> Result<Self, ReaderError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn labels(&self) -> Result<LabelTable, ReaderError> {
        match &self.label_table {
            Some(path) => LabelTable::from_json_file(path),
            None => Ok(LabelTable::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Locations tried in order. A bare name is also looked up on `PATH`.
    pub candidates: Vec<PathBuf>,
    /// Extra arguments for the engine process.
    pub args: Vec<String>,
    /// Search time handed to the engine (`go movetime`).
    #[serde(with = "millis")]
    pub move_time: Duration,
    /// Wall-clock cap on the whole conversation, startup included.
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidates: [
                "/usr/games/stockfish",
                "/usr/local/bin/stockfish",
                "/snap/bin/stockfish",
                "/usr/bin/stockfish",
                "stockfish",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            args: Vec::new(),
            move_time: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Durations are written as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser::Error};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(d.as_millis()).map_err(S::Error::custom)?;
        s.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
