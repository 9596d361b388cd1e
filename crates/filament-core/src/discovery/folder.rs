use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FilamentError, Result};

use super::tags::{parse_name, DiscoveryConfig, VTYPE_TAG};

/// One experiment video and the background video it is subtracted against.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoPair {
    /// Experiment folder name with the video-type field removed.
    pub name: String,
    pub experiment: PathBuf,
    /// `None` when no matching background was found.
    pub background: Option<PathBuf>,
    /// Frame rate parsed from the `fps` tag, if present.
    pub fps: Option<f64>,
    /// Identifying metadata parsed from the folder name.
    pub tags: BTreeMap<String, String>,
}

/// Find experiment/background video pairs among the sub-folders of `root`.
///
/// Folders whose names do not match the configured format, or whose video
/// type is neither the experiment nor the background tag, are skipped with
/// a warning. Experiments without a background are still returned so the
/// batch can report them as `MissingInput`. Pairs are sorted by name.
pub fn discover_pairs(root: &Path, config: &DiscoveryConfig) -> Result<Vec<VideoPair>> {
    if !root.is_dir() {
        return Err(FilamentError::MissingInput(format!(
            "videos folder {} not found",
            root.display()
        )));
    }
    let vtype_pos = config.tag_position(VTYPE_TAG).ok_or_else(|| {
        FilamentError::InvalidConfig(format!(
            "folder name format '{}' has no '{VTYPE_TAG}' tag",
            config.fname_format
        ))
    })?;

    let mut folders: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            folders.push((name.to_string(), path.clone()));
        }
    }
    folders.sort();

    let mut experiments = Vec::new();
    let mut backgrounds: BTreeMap<String, PathBuf> = BTreeMap::new();
    for (name, path) in folders {
        let tags = match parse_name(&name, config) {
            Ok(tags) => tags,
            Err(e) => {
                warn!(folder = %name, error = %e, "Skipping folder");
                continue;
            }
        };
        let key = pair_key(&name, vtype_pos, &config.fname_split);
        match tags.get(VTYPE_TAG).map(String::as_str) {
            Some(v) if v == config.experiment_tag => experiments.push((key, path, tags)),
            Some(v) if v == config.background_tag => {
                backgrounds.insert(key, path);
            }
            other => {
                warn!(folder = %name, vtype = ?other, "Skipping folder with unknown video type");
            }
        }
    }

    let shared_background = if config.one_background {
        if backgrounds.len() > 1 {
            warn!(
                count = backgrounds.len(),
                "one_background is set but several backgrounds exist; using the first"
            );
        }
        backgrounds.values().next().cloned()
    } else {
        None
    };

    let pairs: Vec<VideoPair> = experiments
        .into_iter()
        .map(|(name, experiment, mut tags)| {
            let background = if config.one_background {
                shared_background.clone()
            } else {
                backgrounds.get(&name).cloned()
            };
            tags.remove(VTYPE_TAG);
            let fps = tags.get("fps").and_then(|v| v.parse().ok());
            VideoPair {
                name,
                experiment,
                background,
                fps,
                tags,
            }
        })
        .collect();

    debug!(root = %root.display(), pairs = pairs.len(), "Discovered video pairs");
    Ok(pairs)
}

/// Folder name with the video-type field removed, shared by an experiment
/// and its background.
fn pair_key(name: &str, vtype_pos: usize, split: &str) -> String {
    name.split(split)
        .enumerate()
        .filter(|(i, _)| *i != vtype_pos)
        .map(|(_, v)| v)
        .collect::<Vec<_>>()
        .join(split)
}
