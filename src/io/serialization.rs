// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document serialization and deserialization.
//!
//! Review packages and staffing reports are written as YAML or JSON,
//! chosen by file extension.

use anyhow::{bail, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Yaml,
    Json,
}

impl DocFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(DocFormat::Yaml),
            Some("json") => Ok(DocFormat::Json),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocFormat::Yaml => "yaml",
            DocFormat::Json => "json",
        }
    }
}

/// Export a document in YAML format.
pub fn export_yaml<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export a document in JSON format.
pub fn export_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import a document from YAML format.
pub fn import_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import a document from JSON format.
pub fn import_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

/// Write a document, choosing the format from the extension.
pub fn export_document<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    match DocFormat::from_path(path)? {
        DocFormat::Yaml => export_yaml(data, path),
        DocFormat::Json => export_json(data, path),
    }
}

/// Read a document, choosing the format from the extension.
pub fn import_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    match DocFormat::from_path(path)? {
        DocFormat::Yaml => import_yaml(path),
        DocFormat::Json => import_json(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        hours: f64,
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocFormat::from_path(Path::new("a.YML")).unwrap(), DocFormat::Yaml);
        assert_eq!(DocFormat::from_path(Path::new("a.json")).unwrap(), DocFormat::Json);
        assert!(DocFormat::from_path(Path::new("a.pdf")).is_err());
        assert!(DocFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_document_in_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Doc {
            name: "sh010".to_string(),
            hours: 2.5,
        };
        for file in ["doc.yaml", "doc.json"] {
            let path = dir.path().join(file);
            export_document(&doc, &path).unwrap();
            let back: Doc = import_document(&path).unwrap();
            assert_eq!(back, doc);
        }
    }
}
