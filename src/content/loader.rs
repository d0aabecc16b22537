//! Startup loading of the static definition sources.
//!
//! The layer-priority list and default character descriptor are RON; equip
//! definitions are one JSON file per equip id under `assets/equip/`.

use ron::Options;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::data::{CharacterDescriptor, EquipDef};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// RON options with extensions enabled for more flexible parsing.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

fn read_file(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|e| ContentError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the layer-priority list (back to front) from a RON file.
pub fn load_zmap(path: &Path) -> Result<Vec<String>, ContentError> {
    let contents = read_file(path)?;
    ron_options()
        .from_str(&contents)
        .map_err(|e| ContentError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Load the initial character descriptor from a RON file.
pub fn load_default_character(path: &Path) -> Result<CharacterDescriptor, ContentError> {
    let contents = read_file(path)?;
    ron_options()
        .from_str(&contents)
        .map_err(|e| ContentError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Parse a single equip definition from JSON.
pub fn parse_equip(path_label: &str, contents: &str) -> Result<EquipDef, ContentError> {
    serde_json::from_str(contents).map_err(|e| ContentError::Parse {
        path: path_label.to_string(),
        message: e.to_string(),
    })
}

/// Load every `*.json` equip definition under a directory.
///
/// Files that fail to read or parse are collected as errors; the remaining
/// definitions still load.
pub fn load_equip_dir(dir: &Path) -> (Vec<EquipDef>, Vec<ContentError>) {
    let mut defs = Vec::new();
    let mut errors = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(ContentError::Io {
                path: dir.display().to_string(),
                source: e,
            });
            return (defs, errors);
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let contents = match read_file(&path) {
            Ok(c) => c,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        match parse_equip(&path.display().to_string(), &contents) {
            Ok(def) => defs.push(def),
            Err(e) => errors.push(e),
        }
    }

    (defs, errors)
}
