//! Naming conventions of the testing-result tree.
//!
//! A results root holds one directory per testing run, named like
//! `<app>-<tool>-...#<issue>.<apk>.apk...`. The app is recognised by prefix
//! against a fixed list; the issue id and APK file name are cut out of the
//! base name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{DroidcovError, Result};

/// Apps under study, in matching order (first prefix match wins).
pub const KNOWN_APPS: &[&str] = &[
    "ActivityDiary",
    "AmazeFileManager",
    "and-bible",
    "AnkiDroid",
    "APhotoManager",
    "commons",
    "collect",
    "FirefoxLite",
    "Frost",
    "geohashdroid",
    "MaterialFBook",
    "nextcloud",
    "Omni-Notes",
    "open-event-attendee-android",
    "openlauncher",
    "osmeditor4android",
    "Phonograph",
    "Scarlet-Notes",
    "sunflower",
    "WordPress",
];

fn base_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Return the first known app whose name prefixes the directory's base name.
pub fn classify_app(dir: &Path) -> Option<&'static str> {
    let base = base_name(dir);
    let app = KNOWN_APPS.iter().copied().find(|app| base.starts_with(app));
    if app.is_none() {
        warn!(
            "cannot find app name for this testing result dir: {}",
            dir.display()
        );
    }
    app
}

/// APK file name embedded in the directory name: everything before the first
/// `.apk`, with `.apk` appended back.
pub fn apk_name(dir: &Path) -> Result<String> {
    let base = base_name(dir);
    let end = base.find(".apk").ok_or_else(|| DroidcovError::Naming {
        dir: dir.to_path_buf(),
        reason: "no '.apk' in name",
    })?;
    Ok(format!("{}.apk", &base[..end]))
}

/// Issue id embedded in the directory name: the text after the first `#`, up
/// to the next `.` (or the next `#`).
pub fn issue_id(dir: &Path) -> Result<String> {
    let base = base_name(dir);
    let after_hash = base
        .split('#')
        .nth(1)
        .ok_or_else(|| DroidcovError::Naming {
            dir: dir.to_path_buf(),
            reason: "no '#' in name",
        })?;
    let id = after_hash.split('.').next().unwrap_or_default();
    Ok(id.to_string())
}

/// Result directories of a results root, grouped by app name.
#[derive(Debug, Default)]
pub struct ResultsIndex {
    pub apps: BTreeMap<&'static str, Vec<PathBuf>>,
    /// Directories whose name matched no known app.
    pub unclassified: Vec<PathBuf>,
}

impl ResultsIndex {
    /// Scan the immediate subdirectories of `root`, in name order.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let mut index = ResultsIndex::default();
        for dir in dirs {
            match classify_app(&dir) {
                Some(app) => index.apps.entry(app).or_default().push(dir),
                None => index.unclassified.push(dir),
            }
        }
        for (app, dirs) in &index.apps {
            debug!("{}: {} result dirs", app, dirs.len());
        }
        Ok(index)
    }

    /// Apps to process, optionally narrowed to one name.
    pub fn apps<'a>(
        &'a self,
        only: Option<&'a str>,
    ) -> impl Iterator<Item = (&'static str, &'a [PathBuf])> + 'a {
        self.apps
            .iter()
            .filter(move |(app, _)| only.map_or(true, |o| o == **app))
            .map(|(app, dirs)| (*app, dirs.as_slice()))
    }
}

/// Group result directories by the APK they exercised.
pub fn cluster_by_apk(dirs: &[PathBuf]) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut clusters: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for dir in dirs {
        clusters.entry(apk_name(dir)?).or_default().push(dir.clone());
    }
    Ok(clusters)
}
