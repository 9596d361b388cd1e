use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FilamentError, Result};

/// Tag whose value marks a folder as experiment or background video.
pub const VTYPE_TAG: &str = "vtype";

/// Tag ignored when parsing (timestamps and other noise in folder names).
pub const REMOVE_TAG: &str = "remove";

/// How video folder names encode their metadata.
///
/// A folder `20210929_6M-PEO_fps-25k_1_exp` with format
/// `date_sampleinfo_fps_run_vtype` and sample format `MW-polymer` yields
/// `date=20210929, MW=6M, polymer=PEO, fps=25000, run=1, vtype=exp`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    #[serde(default = "default_fname_format")]
    pub fname_format: String,
    #[serde(default = "default_sampleinfo_format")]
    pub sampleinfo_format: String,
    #[serde(default = "default_fname_split")]
    pub fname_split: String,
    #[serde(default = "default_sample_split")]
    pub sample_split: String,
    #[serde(default = "default_experiment_tag")]
    pub experiment_tag: String,
    #[serde(default = "default_background_tag")]
    pub background_tag: String,
    /// Pair every experiment with the single background video in the folder.
    #[serde(default)]
    pub one_background: bool,
}

fn default_fname_format() -> String {
    "date_sampleinfo_fps_run_vtype".into()
}
fn default_sampleinfo_format() -> String {
    "sample".into()
}
fn default_fname_split() -> String {
    "_".into()
}
fn default_sample_split() -> String {
    "-".into()
}
fn default_experiment_tag() -> String {
    "exp".into()
}
fn default_background_tag() -> String {
    "bg".into()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fname_format: default_fname_format(),
            sampleinfo_format: default_sampleinfo_format(),
            fname_split: default_fname_split(),
            sample_split: default_sample_split(),
            experiment_tag: default_experiment_tag(),
            background_tag: default_background_tag(),
            one_background: false,
        }
    }
}

impl DiscoveryConfig {
    fn format_tags(&self) -> Vec<&str> {
        self.fname_format.split(self.fname_split.as_str()).collect()
    }

    /// Position of `tag` within the folder-name format.
    pub fn tag_position(&self, tag: &str) -> Option<usize> {
        self.format_tags().iter().position(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Parse a frames-per-second tag value such as `25k`, `fps-25k` or `5000`.
pub fn parse_fps(value: &str) -> Option<f64> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let base: f64 = digits.parse().ok()?;
    if value.to_ascii_lowercase().contains('k') {
        Some(base * 1000.0)
    } else {
        Some(base)
    }
}

/// Split a folder name into its tags according to `config`.
pub fn parse_name(name: &str, config: &DiscoveryConfig) -> Result<BTreeMap<String, String>> {
    let values: Vec<&str> = name.split(config.fname_split.as_str()).collect();
    let tags = config.format_tags();
    if values.len() < tags.len() {
        return Err(FilamentError::InvalidConfig(format!(
            "'{name}' has {} field(s) but format '{}' expects {}",
            values.len(),
            config.fname_format,
            tags.len()
        )));
    }

    let mut params = BTreeMap::new();
    for (tag, value) in tags.iter().zip(values) {
        let lower = tag.to_ascii_lowercase();
        if lower == REMOVE_TAG {
            continue;
        } else if lower.contains("fps") {
            let fps = parse_fps(value).ok_or_else(|| {
                FilamentError::InvalidConfig(format!("'{value}' in '{name}' is not a frame rate"))
            })?;
            params.insert("fps".to_string(), format!("{fps}"));
        } else if lower.contains("run") {
            let run: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
            params.insert("run".to_string(), run);
        } else if lower.contains("sampleinfo") {
            params.insert("sample".to_string(), value.to_string());
            let sample_values: Vec<&str> = value.split(config.sample_split.as_str()).collect();
            for (sample_tag, sample_value) in config
                .sampleinfo_format
                .split(config.sample_split.as_str())
                .zip(sample_values)
            {
                params.insert(sample_tag.to_string(), sample_value.to_string());
            }
        } else {
            params.insert(tag.to_string(), value.to_string());
        }
    }
    Ok(params)
}
