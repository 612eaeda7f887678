//! File and format discovery.
//!
//! Given a directory, a list of base names and an ordered list of format
//! extensions, find the first existing config file and hand it to the
//! reader for its format. Probing order is base name first, then format:
//! `config.toml`, `config.json`, ..., `<app>.toml`, `<app>.json`, ...

use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::format::Format;
use crate::readers::{ReadError, ReaderRegistry};

/// What probing a location produced.
#[derive(Debug)]
pub enum FileOutcome {
    /// No candidate file exists.
    Missing,
    /// A file was found and is a valid but empty document.
    Empty(PathBuf),
    /// A file was found and parsed.
    Loaded { path: PathBuf, tree: Value },
    /// A file was found but could not be read or parsed.
    Failed { path: PathBuf, error: ReadError },
}

impl FileOutcome {
    pub fn is_missing(&self) -> bool {
        matches!(self, FileOutcome::Missing)
    }

    /// Path of the file that was found, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileOutcome::Missing => None,
            FileOutcome::Empty(path)
            | FileOutcome::Loaded { path, .. }
            | FileOutcome::Failed { path, .. } => Some(path),
        }
    }
}

/// File discovery for one resolution run.
#[derive(Debug, Clone, Copy)]
pub struct Discovery<'a> {
    registry: &'a ReaderRegistry,
    /// Extensions in priority order, paired with their format.
    formats: &'a [(String, Format)],
    file_names: &'a [String],
    app_name: &'a str,
    use_app_name_as_dir: bool,
}

impl<'a> Discovery<'a> {
    pub fn new(
        registry: &'a ReaderRegistry,
        formats: &'a [(String, Format)],
        file_names: &'a [String],
        app_name: &'a str,
    ) -> Self {
        Self {
            registry,
            formats,
            file_names,
            app_name,
            use_app_name_as_dir: false,
        }
    }

    /// Probe `<dir>/<app_name>/` before `<dir>/`.
    pub fn with_app_name_as_dir(mut self, enabled: bool) -> Self {
        self.use_app_name_as_dir = enabled;
        self
    }

    /// Find the first config file in `dir`, without reading it.
    pub fn find_in_dir(&self, dir: &Path) -> Option<(PathBuf, Format)> {
        if self.use_app_name_as_dir
            && let Some(found) = self.probe_names(&dir.join(self.app_name))
        {
            return Some(found);
        }
        self.probe_names(dir)
    }

    fn probe_names(&self, dir: &Path) -> Option<(PathBuf, Format)> {
        for base in self.file_names {
            for (ext, format) in self.formats {
                let path = dir.join(format!("{}.{}", base, ext));
                trace!(path = %path.display(), "probing");
                if path.is_file() {
                    return Some((path, *format));
                }
            }
        }
        None
    }

    /// Find a file for an extensionless base path: `<base>.<ext>` in format
    /// order. A base that already names an existing file with a known
    /// extension is taken as-is.
    pub fn find_base(&self, base: &Path) -> Option<(PathBuf, Format)> {
        if base.is_file()
            && let Some(format) = self.format_of(base)
        {
            return Some((base.to_path_buf(), format));
        }

        for (ext, format) in self.formats {
            let path = with_extension(base, ext);
            trace!(path = %path.display(), "probing");
            if path.is_file() {
                return Some((path, *format));
            }
        }
        None
    }

    /// Format of `path` if its extension is one of the probed formats.
    fn format_of(&self, path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        self.formats
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    /// Read a found file with the reader for its format.
    pub fn load(&self, path: PathBuf, format: Format) -> FileOutcome {
        match self.registry.read(format, &path) {
            Ok(Some(tree)) => {
                debug!(path = %path.display(), %format, "loaded config file");
                FileOutcome::Loaded { path, tree }
            }
            Ok(None) => {
                debug!(path = %path.display(), %format, "config file is empty");
                FileOutcome::Empty(path)
            }
            Err(error) => {
                debug!(path = %path.display(), %format, %error, "config file failed to load");
                FileOutcome::Failed { path, error }
            }
        }
    }

    /// Find and read the config file in `dir`.
    ///
    /// The first existing file wins whether or not it parses.
    pub fn discover_dir(&self, dir: &Path) -> FileOutcome {
        match self.find_in_dir(dir) {
            Some((path, format)) => self.load(path, format),
            None => FileOutcome::Missing,
        }
    }

    /// Find and read the file for an extensionless base path.
    pub fn load_base(&self, base: &Path) -> FileOutcome {
        match self.find_base(base) {
            Some((path, format)) => self.load(path, format),
            None => FileOutcome::Missing,
        }
    }

    /// Try every file in `dir` with a probed extension, in file name order,
    /// until one reads successfully. Failures along the way are skipped.
    pub fn scan_dir(&self, dir: &Path) -> FileOutcome {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return FileOutcome::Missing;
        };

        let mut candidates: Vec<(PathBuf, Format)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| self.format_of(&path).map(|format| (path, format)))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, format) in candidates {
            match self.load(path, format) {
                FileOutcome::Failed { path, error } => {
                    debug!(path = %path.display(), %error, "skipping unreadable file during scan");
                }
                outcome => return outcome,
            }
        }
        FileOutcome::Missing
    }
}

/// `base` + `.` + `ext`, without replacing an existing extension.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn formats() -> Vec<(String, Format)> {
        crate::format::DEFAULT_FORMATS
            .iter()
            .filter_map(|ext| Format::from_extension(ext).map(|f| (ext.to_string(), f)))
            .collect()
    }

    fn names() -> Vec<String> {
        vec!["config".to_string(), "demo".to_string()]
    }

    #[test]
    fn test_base_name_order_beats_format_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("demo.toml"), "from = \"demo\"").unwrap();
        fs::write(temp.path().join("config.yaml"), "from: config").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        let (path, format) = discovery.find_in_dir(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("config.yaml"));
        assert_eq!(format, Format::Yaml);
    }

    #[test]
    fn test_format_order_within_a_base_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.json"), r#"{"from": "json"}"#).unwrap();
        fs::write(temp.path().join("config.toml"), "from = \"toml\"").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        match discovery.discover_dir(temp.path()) {
            FileOutcome::Loaded { tree, .. } => assert_eq!(tree, json!({"from": "toml"})),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_app_name_dir_is_probed_first() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("demo")).unwrap();
        fs::write(temp.path().join("demo/config.toml"), "where = \"nested\"").unwrap();
        fs::write(temp.path().join("config.toml"), "where = \"flat\"").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        let (flat, _) = discovery.find_in_dir(temp.path()).unwrap();
        assert_eq!(flat, temp.path().join("config.toml"));

        let (nested, _) = discovery
            .with_app_name_as_dir(true)
            .find_in_dir(temp.path())
            .unwrap();
        assert_eq!(nested, temp.path().join("demo/config.toml"));
    }

    #[test]
    fn test_app_name_dir_falls_back_to_flat() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.toml"), "where = \"flat\"").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo").with_app_name_as_dir(true);

        let (path, _) = discovery.find_in_dir(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("config.toml"));
    }

    #[test]
    fn test_first_existing_file_wins_even_if_broken() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.toml"), "broken = ").unwrap();
        fs::write(temp.path().join("config.json"), r#"{"ok": true}"#).unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        let outcome = discovery.discover_dir(temp.path());
        assert!(matches!(outcome, FileOutcome::Failed { .. }));
        assert_eq!(outcome.path(), Some(temp.path().join("config.toml").as_path()));
    }

    #[test]
    fn test_missing_dir_is_missing() {
        let temp = TempDir::new().unwrap();
        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        assert!(discovery.discover_dir(&temp.path().join("nope")).is_missing());
        assert!(discovery.scan_dir(&temp.path().join("nope")).is_missing());
    }

    #[test]
    fn test_find_base_appends_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("settings.json"), r#"{"a": 1}"#).unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        let (path, format) = discovery.find_base(&temp.path().join("settings")).unwrap();
        assert_eq!(path, temp.path().join("settings.json"));
        assert_eq!(format, Format::Json);
    }

    #[test]
    fn test_find_base_accepts_full_file_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("defaults.toml"), "a = 1").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        match discovery.load_base(&temp.path().join("defaults.toml")) {
            FileOutcome::Loaded { tree, .. } => assert_eq!(tree, json!({"a": 1})),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(discovery.load_base(&temp.path().join("missing.toml")).is_missing());
    }

    #[test]
    fn test_scan_dir_skips_broken_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.json"), "{ nope").unwrap();
        fs::write(temp.path().join("b.yaml"), "found: yes").unwrap();
        fs::write(temp.path().join("c.toml"), "later = 1").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let registry = ReaderRegistry::default();
        let (formats, names) = (formats(), names());
        let discovery = Discovery::new(&registry, &formats, &names, "demo");

        match discovery.scan_dir(temp.path()) {
            FileOutcome::Loaded { path, tree } => {
                assert_eq!(path, temp.path().join("b.yaml"));
                assert_eq!(tree, json!({"found": "yes"}));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_with_extension_keeps_existing_suffix() {
        assert_eq!(
            with_extension(Path::new("./missing.toml"), "json"),
            PathBuf::from("./missing.toml.json")
        );
    }
}
