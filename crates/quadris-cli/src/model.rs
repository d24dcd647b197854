use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use chrono::{DateTime, Utc};
use quadris_engine::Weights;
use serde::{Deserialize, Serialize};

/// Trained weight set as saved by the `train` command.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeightModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub best_score: usize,
    pub weights: Weights,
}

impl WeightModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open weight model file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to read weight model file: {}", path.display()))?;

        Ok(model)
    }
}
