use crate::RecommenderError;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

const DEFAULT_COLUMNS: &[&str] = &[
    "species_dog",
    "species_cat",
    "species_other",
    "size_small",
    "size_medium",
    "size_large",
    "temperament_calm",
    "temperament_playful",
    "temperament_friendly",
    "temperament_energetic",
    "temperament_gentle",
    "energy_low",
    "energy_moderate",
    "energy_high",
    "age",
];

/// What a user is looking for. `None` or `"any"` leaves a group unset.
#[derive(Debug, Clone, Default)]
pub struct Preference {
    pub species: Option<String>,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}

impl Preference {
    /// Target age in months: the middle of the range, or whichever bound is
    /// set.
    pub fn target_age(&self) -> Option<f64> {
        match (self.min_age, self.max_age) {
            (Some(lo), Some(hi)) => Some((lo as f64 + hi as f64) / 2.0),
            (Some(one), None) | (None, Some(one)) => Some(one as f64),
            (None, None) => None,
        }
    }
}

/// One pet up for adoption, as seen by the encoder.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub species: String,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub age: Option<i64>,
}

#[derive(Deserialize)]
struct Artifact {
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Column layout plus an optional standardisation `(x - mean) / scale`.
#[derive(Debug, Clone)]
pub struct FeatureSpace {
    columns: Vec<String>,
    scaler: Option<(Vec<f64>, Vec<f64>)>,
}

impl Default for FeatureSpace {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            scaler: None,
        }
    }
}

impl FeatureSpace {
    /// Load a fitted artifact: `{"columns": [...], "mean": [...], "scale": [...]}`.
    pub fn load(path: &Path) -> Result<Self, RecommenderError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RecommenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let space = Self::from_json(&raw)?;
        info!(
            "Loaded recommender feature space from {} ({} columns)",
            path.display(),
            space.columns.len()
        );
        Ok(space)
    }

    pub fn from_json(raw: &str) -> Result<Self, RecommenderError> {
        let artifact: Artifact = serde_json::from_str(raw)?;
        let n = artifact.columns.len();
        if artifact.mean.len() != n || artifact.scale.len() != n {
            return Err(RecommenderError::Shape {
                columns: n,
                mean: artifact.mean.len(),
                scale: artifact.scale.len(),
            });
        }
        // A zero scale means the column was constant during fitting.
        let scale = artifact
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self {
            columns: artifact.columns.into_iter().map(|c| c.to_lowercase()).collect(),
            scaler: Some((artifact.mean, scale)),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn encode_candidate(&self, pet: &Candidate) -> Vec<f64> {
        let mut vec = vec![0.0; self.columns.len()];
        self.set_one_hot(&mut vec, "species", Some(&pet.species));
        self.set_one_hot(&mut vec, "size", pet.size.as_deref());
        self.set_one_hot(&mut vec, "temperament", pet.temperament.as_deref());
        self.set_one_hot(&mut vec, "energy", pet.activity_level.as_deref());
        if let Some(i) = self.age_index() {
            vec[i] = pet.age.unwrap_or(0) as f64;
        }
        self.scale(&mut vec);
        vec
    }

    /// Encode a preference, plus a mask of the columns that take part in the
    /// distance. The age column is masked out when the user gave no age range.
    pub fn encode_preference(&self, pref: &Preference) -> (Vec<f64>, Vec<bool>) {
        let mut vec = vec![0.0; self.columns.len()];
        let mut mask = vec![true; self.columns.len()];
        self.set_one_hot(&mut vec, "species", pref.species.as_deref());
        self.set_one_hot(&mut vec, "size", pref.size.as_deref());
        self.set_one_hot(&mut vec, "temperament", pref.temperament.as_deref());
        self.set_one_hot(&mut vec, "energy", pref.activity_level.as_deref());
        if let Some(i) = self.age_index() {
            match pref.target_age() {
                Some(age) => vec[i] = age,
                None => mask[i] = false,
            }
        }
        self.scale(&mut vec);
        (vec, mask)
    }

    fn set_one_hot(&self, vec: &mut [f64], group: &str, value: Option<&str>) {
        let Some(value) = value else { return };
        let value = value.to_lowercase();
        if value == "any" {
            return;
        }
        let name = format!("{group}_{value}");
        if let Some(i) = self.columns.iter().position(|c| *c == name) {
            vec[i] = 1.0;
        }
    }

    fn age_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c == "age")
    }

    fn scale(&self, vec: &mut [f64]) {
        if let Some((mean, scale)) = &self.scaler {
            for ((x, m), s) in vec.iter_mut().zip(mean).zip(scale) {
                *x = (*x - m) / s;
            }
        }
    }
}
