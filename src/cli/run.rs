//! Task pipeline: version tasks build the asset map, replace tasks consume it.

use anyhow::{Context, Result};

use crate::asset::{AssetMap, revision_files};
use crate::config::{FileverConfig, Phase, ReplaceTask, Settings, Task};
use crate::rewrite::Rewriter;
use crate::utils::{path::LocalFs, plural_count};
use crate::{debug, log};

/// Run the tasks whose phase is in `phases`, in configured order.
///
/// Each replace task sees every entry produced by the version tasks before
/// it. The first fatal error aborts the run.
pub fn run_tasks(config: &FileverConfig, phases: &[Phase]) -> Result<AssetMap> {
    let fs = LocalFs::new(config.get_root());
    let mut map = AssetMap::new();

    for (index, task) in config.tasks.iter().enumerate() {
        let label = task.label(index);
        if !phases.contains(&task.phase()) {
            debug!("run"; "skipping {}", label);
            continue;
        }

        let settings = config.settings_for(task);
        match task {
            Task::Version(version) => {
                debug!("version"; "running {} ({}, length {})", label, settings.algorithm, settings.length);
                let produced = revision_files(&fs, &version.files, settings, version.hash_strategy())
                    .with_context(|| format!("task `{label}` failed"))?;
                map.extend(produced);
            }
            Task::Replace(replace) => {
                replace_links(&fs, &map, replace, settings, &label)
                    .with_context(|| format!("task `{label}` failed"))?;
            }
        }
    }

    Ok(map)
}

fn replace_links(
    fs: &LocalFs,
    map: &AssetMap,
    task: &ReplaceTask,
    settings: Settings,
    label: &str,
) -> Result<()> {
    if map.is_empty() {
        log!("replace"; "{}: no revisioned assets, nothing to link", label);
        return Ok(());
    }

    let patterns = task.ref_patterns()?;
    let hash = task.hash_pattern()?;

    let report = Rewriter::new(fs, map, &patterns)
        .with_hash(hash.as_ref())
        .with_encoding(settings.encoding)
        .run(&task.files)?;

    log!(
        "replace";
        "{}: updated {}, {} already linked",
        label,
        plural_count(report.updated, "file"),
        plural_count(report.already_linked, "reference")
    );
    if report.missing > 0 {
        log!("warning"; "{} not found", plural_count(report.missing, "target"));
    }
    Ok(())
}

/// Pretty JSON of the asset map, in insertion order.
pub fn map_json(map: &AssetMap) -> Result<String> {
    serde_json::to_string_pretty(map).context("failed to serialize asset map")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[[task]]
phase = "version"
name = "styles"
files = [{ src = ["css/*.css"] }]

[[task]]
phase = "replace"
files = [{ src = ["index.html"] }]
patterns = [{ label = "css", regex = '<link[^>]+href="([^"]+)"' }]
hash = '(\.[0-9a-f]{8})\.\w+$'
"#;

    fn project() -> (TempDir, FileverConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/app.css"), "body{}").unwrap();
        fs::write(
            dir.path().join("index.html"),
            r#"<link rel="stylesheet" href="css/app.css">"#,
        )
        .unwrap();

        let mut config = FileverConfig::from_str(CONFIG).unwrap();
        config.root = dir.path().to_path_buf();
        (dir, config)
    }

    #[test]
    fn test_run_versions_then_links() {
        let (dir, config) = project();

        let map = run_tasks(&config, &[Phase::Version, Phase::Replace]).unwrap();
        assert_eq!(map.len(), 1);

        let revisioned = map.get("css/app.css").unwrap().to_string();
        assert!(dir.path().join(&revisioned).exists());
        assert!(!dir.path().join("css/app.css").exists());

        let html = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(html, format!(r#"<link rel="stylesheet" href="{revisioned}">"#));
    }

    #[test]
    fn test_version_only_leaves_references() {
        let (dir, config) = project();

        let map = run_tasks(&config, &[Phase::Version]).unwrap();
        assert_eq!(map.len(), 1);
        let html = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(html.contains(r#"href="css/app.css""#));
    }

    #[test]
    fn test_replace_with_empty_map_is_noop() {
        let (dir, config) = project();

        let map = run_tasks(&config, &[Phase::Replace]).unwrap();
        assert!(map.is_empty());
        assert!(dir.path().join("css/app.css").exists());
    }

    #[test]
    fn test_failing_task_is_named() {
        let (dir, config) = project();
        fs::write(dir.path().join("rev"), "not a dir").unwrap();
        let mut config = config;
        if let Task::Version(version) = &mut config.tasks[0] {
            version.files[0].dest = Some("rev".into());
        }

        let err = run_tasks(&config, &[Phase::Version]).unwrap_err();
        assert!(err.to_string().contains("styles"));
        assert!(dir.path().join("css/app.css").exists());
    }

    #[test]
    fn test_map_json_keeps_order() {
        let mut map = AssetMap::new();
        map.insert_with_separator("b.css", "b.1.css", '/');
        map.insert_with_separator("a.css", "a.2.css", '/');
        let json = map_json(&map).unwrap();
        assert!(json.find("b.css").unwrap() < json.find("a.css").unwrap());
    }
}
