//! `pmap validate` command implementation.
//!
//! Walks a directory tree, decodes every record file it finds as a
//! [`ResourceMapping`] and runs the [`MappingValidator`] on it. Each file is
//! checked on its own; one bad file never hides problems in another.

use anyhow::Result;
use pmap_core::{Record, ResourceMapping};
use pmap_validate::MappingValidator;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions treated as record files.
const RECORD_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Stage at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Read,
    Decode,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Read => write!(f, "read"),
            Stage::Decode => write!(f, "decode"),
            Stage::Validate => write!(f, "validate"),
        }
    }
}

/// One problem found in one file.
#[derive(Debug, Clone)]
pub struct FileFinding {
    pub file: PathBuf,
    pub stage: Stage,
    pub message: String,
}

/// Results of validating a directory.
#[derive(Debug, Default)]
pub struct ValidateResults {
    pub files_checked: usize,
    pub findings: Vec<FileFinding>,
}

impl ValidateResults {
    /// Number of distinct files with at least one finding.
    pub fn failed_files(&self) -> usize {
        let mut files: Vec<_> = self.findings.iter().map(|f| &f.file).collect();
        files.sort();
        files.dedup();
        files.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Print findings grouped by file, then a summary line.
    pub fn print_summary(&self) {
        let mut current: Option<&Path> = None;
        for finding in &self.findings {
            if current != Some(finding.file.as_path()) {
                println!("\n✗ {}", finding.file.display());
                current = Some(finding.file.as_path());
            }
            println!("    [{}] {}", finding.stage, finding.message);
        }

        println!();
        println!("{}", "═".repeat(60));
        if self.has_failures() {
            println!(
                "Summary: {} of {} file(s) failed, {} problem(s)",
                self.failed_files(),
                self.files_checked,
                self.findings.len()
            );
        } else {
            println!("✅ All {} file(s) passed", self.files_checked);
        }
    }
}

/// Files found under a directory.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Record files, in a stable order.
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read. Their contents were never checked.
    pub unreadable: Vec<FileFinding>,
}

/// Find record files under `dir`.
pub fn discover(dir: &Path) -> Discovered {
    let mut discovered = Discovered::default();
    for entry in WalkDir::new(dir).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_record_file(entry.path()) => {
                discovered.files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => discovered.unreadable.push(FileFinding {
                file: e.path().unwrap_or(dir).to_path_buf(),
                stage: Stage::Read,
                message: e.to_string(),
            }),
        }
    }
    discovered.files.sort();
    discovered
}

fn is_record_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RECORD_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Check one file, returning its findings.
pub fn check_file(path: &Path, validator: &MappingValidator) -> Vec<FileFinding> {
    let finding = |stage: Stage, message: String| FileFinding {
        file: path.to_path_buf(),
        stage,
        message,
    };

    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => return vec![finding(Stage::Read, e.to_string())],
    };

    let mapping = match ResourceMapping::decode(&content) {
        Ok(mapping) => mapping,
        Err(e) => return vec![finding(Stage::Decode, e.to_string())],
    };

    match validator.validate(&mapping) {
        Ok(()) => Vec::new(),
        Err(report) => report
            .errors
            .into_iter()
            .map(|e| finding(Stage::Validate, e.to_string()))
            .collect(),
    }
}

/// Validate every record file under `dir` without printing.
pub fn run_quiet(dir: &Path) -> Result<ValidateResults> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    let validator = MappingValidator::new();
    let discovered = discover(dir);
    let mut results = ValidateResults::default();
    for finding in &discovered.unreadable {
        tracing::warn!(path = %finding.file.display(), error = %finding.message, "Skipping unreadable entry");
    }
    for path in discovered.files {
        tracing::debug!(file = %path.display(), "Validating record file");
        results.files_checked += 1;
        results.findings.extend(check_file(&path, &validator));
    }
    results.findings.extend(discovered.unreadable);
    Ok(results)
}

/// Run the validate command.
pub fn run(dir: &Path, quiet: bool) -> Result<()> {
    if !quiet {
        println!("Validating record files under {}...", dir.display());
    }

    let results = run_quiet(dir)?;
    results.print_summary();

    if results.has_failures() {
        anyhow::bail!(
            "{} of {} record file(s) failed validation",
            results.failed_files(),
            results.files_checked
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = r#"
resource:
  provider: gcp
  name: //storage.googleapis.com/bucket1
contacts:
  emails: [owner@example.com]
"#;

    fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_filters_extensions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.yaml", VALID);
        write(&dir, "nested/b.yml", VALID);
        write(&dir, "nested/deeper/c.JSON", "{}");
        write(&dir, "README.md", "# notes");

        let discovered = discover(dir.path());
        assert!(discovered.unreadable.is_empty());
        let names: Vec<_> = discovered
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(!names.contains(&"README.md".to_string()));
    }

    #[test]
    fn test_all_valid() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.yaml", VALID);
        write(
            &dir,
            "b.json",
            r#"{"resource": {"provider": "aws", "name": "arn:aws:s3:::b"}, "contacts": {"emails": []}}"#,
        );

        let results = run_quiet(dir.path()).unwrap();
        assert_eq!(results.files_checked, 2);
        assert!(!results.has_failures());
        run(dir.path(), true).unwrap();
    }

    #[test]
    fn test_failures_are_per_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "good.yaml", VALID);
        write(&dir, "undecodable.yaml", "resource: {colour: blue}\n");
        write(
            &dir,
            "invalid.yaml",
            r#"
resource:
  provider: gcp
  name: ""
annotations:
  assetInfo: {}
"#,
        );

        let results = run_quiet(dir.path()).unwrap();
        assert_eq!(results.files_checked, 3);
        assert_eq!(results.failed_files(), 2);

        let invalid: Vec<_> = results
            .findings
            .iter()
            .filter(|f| f.file.ends_with("invalid.yaml"))
            .collect();
        assert_eq!(invalid.len(), 2);
        assert!(invalid.iter().all(|f| f.stage == Stage::Validate));

        let undecodable: Vec<_> = results
            .findings
            .iter()
            .filter(|f| f.file.ends_with("undecodable.yaml"))
            .collect();
        assert_eq!(undecodable.len(), 1);
        assert_eq!(undecodable[0].stage, Stage::Decode);

        let err = run(dir.path(), true).unwrap_err();
        assert!(err.to_string().contains("2 of 3"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(run_quiet(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_walk_errors_become_read_findings() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let discovered = discover(&missing);
        assert!(discovered.files.is_empty());
        assert_eq!(discovered.unreadable.len(), 1);
        assert_eq!(discovered.unreadable[0].stage, Stage::Read);
        assert_eq!(discovered.unreadable[0].file, missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_fails_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(&dir, "good.yaml", VALID);
        let locked = dir.path().join("locked");
        write(&dir, "locked/hidden.yaml", VALID);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not restrict root, so there is nothing to observe.
        let readable = fs::read_dir(&locked).is_ok();
        let results = run_quiet(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        let results = results.unwrap();
        assert_eq!(results.files_checked, 1);
        assert!(results.has_failures());
        assert!(results.findings.iter().any(|f| f.stage == Stage::Read && f.file == locked));
        assert!(run(dir.path(), true).is_err());
    }
}
