//! File-backed report persistence and project loading.
//!
//! Saves are atomic: the report is written to a `.tmp` sibling, synced,
//! then renamed over the target.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hvac_core::project::SCHEMA_VERSION;
use hvac_core::{Project, ProjectReport, ReportSink};

/// Writes each report as JSON to one path.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>, pretty: bool) -> Self {
        JsonFileSink {
            path: path.into(),
            pretty,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonFileSink {
    type Error = anyhow::Error;

    fn store(&mut self, report: &ProjectReport) -> Result<()> {
        let json = render(report, self.pretty)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut tmp_file =
            File::create(&tmp_path).with_context(|| format!("creating {}", tmp_path.display()))?;
        tmp_file
            .write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tmp_file
            .sync_all()
            .with_context(|| format!("syncing {}", tmp_path.display()))?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("renaming to {}", self.path.display()));
        }
        tracing::info!(path = %self.path.display(), "report saved");
        Ok(())
    }
}

pub fn render<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Read a project file and check its schema version.
pub fn load_project(path: &Path) -> Result<Project> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let project: Project =
        serde_json::from_str(&contents).with_context(|| format!("invalid project JSON in {}", path.display()))?;
    check_version(&project.meta.version)?;
    Ok(project)
}

/// Major versions must match; a newer minor version is rejected.
fn check_version(file_version: &str) -> Result<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    match (file.first(), current.first()) {
        (Some(f), Some(c)) if f == c => {}
        _ => bail!("project schema {file_version} is not compatible with {SCHEMA_VERSION}"),
    }
    if let (Some(f), Some(c)) = (file.get(1), current.get(1)) {
        if f > c {
            bail!("project schema {file_version} is newer than supported {SCHEMA_VERSION}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hvac_core::calculations::{RoomGeometry, RoomInput};
    use hvac_core::Engine;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hvac_cli_test_{}_{}", std::process::id(), name))
    }

    fn report() -> ProjectReport {
        let mut project = Project::new("Designer", "26-777", "Client");
        project.add_room(
            "L1",
            RoomInput {
                label: "Office".to_string(),
                geometry: RoomGeometry::rectangular(15.0, 12.0, 9.0),
                ..RoomInput::default()
            },
        );
        Engine::builtin().unwrap().compute(&project).unwrap()
    }

    #[test]
    fn test_store_leaves_no_tmp_file() {
        let path = temp_path("report.json");
        let mut sink = JsonFileSink::new(&path, true);
        sink.store(&report()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        let saved: ProjectReport = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.job_id, "26-777");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_project_roundtrip() {
        let path = temp_path("project.json");
        let project = Project::new("Designer", "26-778", "Client");
        fs::write(&path, render(&project, false).unwrap()).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_check() {
        assert!(check_version(SCHEMA_VERSION).is_ok());
        assert!(check_version("0.1.0").is_err());
        assert!(check_version("1.99.0").is_err());
        assert!(check_version("garbage").is_err());
    }
}
