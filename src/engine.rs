use crate::config::Config;
use crate::models::{RenameOutcome, RenameStatus};
use crate::sanitize::{sanitize_title, SanitizePolicy};
use crate::tags::TitleReader;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Renames files in place to their sanitized title tag.
///
/// Each file is handled on its own: a failure is recorded in that file's
/// outcome and the pass carries on. Nothing is retried or rolled back, and an
/// existing file is never overwritten.
pub struct RenameEngine<R: TitleReader> {
    reader: R,
    policy: SanitizePolicy,
    lowercase_extension: bool,
    dry_run: bool,
    // targets handed out earlier in this pass; matters for dry runs where
    // nothing lands on disk
    claimed: HashSet<PathBuf>,
}

impl<R: TitleReader> RenameEngine<R> {
    pub fn new(reader: R, policy: SanitizePolicy) -> Self {
        Self { reader, policy, lowercase_extension: false, dry_run: false, claimed: HashSet::new() }
    }

    pub fn from_config(reader: R, cfg: &Config) -> Self {
        Self::new(reader, cfg.sanitize_policy()).lowercase_extension(cfg.lowercase_extension)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn lowercase_extension(mut self, on: bool) -> Self {
        self.lowercase_extension = on;
        self
    }

    /// Run one pass over a selection snapshot.
    pub fn run(&mut self, paths: &[PathBuf]) -> Vec<RenameOutcome> {
        self.claimed.clear();
        let outcomes: Vec<RenameOutcome> = paths.iter().map(|p| self.rename_one(p)).collect();
        info!(
            "Rename pass finished: {} file(s), {} renamed",
            outcomes.len(),
            outcomes.iter().filter(|o| o.status == RenameStatus::Renamed).count()
        );
        outcomes
    }

    pub fn rename_one(&mut self, path: &Path) -> RenameOutcome {
        let outcome = self.attempt(path);
        match outcome.status {
            RenameStatus::Renamed | RenameStatus::Planned => {
                info!("{} {} -> {:?}", outcome.status, path.display(), outcome.new_name.as_deref().unwrap_or(""));
            }
            s if s.is_failure() => {
                warn!("{} {}: {}", s, path.display(), outcome.detail.as_deref().unwrap_or(""));
            }
            s => debug!("{} {}", s, path.display()),
        }
        outcome
    }

    fn attempt(&mut self, path: &Path) -> RenameOutcome {
        let original = path.to_path_buf();

        let title = match self.reader.read_title(path) {
            Ok(t) => t,
            Err(e) => return RenameOutcome::new(original, None, RenameStatus::FailedTagRead).with_detail(e.to_string()),
        };
        let title = match title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return RenameOutcome::new(original, None, RenameStatus::SkippedNoTitle).with_detail("no title tag"),
        };
        let stem = match sanitize_title(&title, &self.policy) {
            Some(s) => s,
            None => {
                return RenameOutcome::new(original, None, RenameStatus::SkippedNoTitle)
                    .with_detail(format!("title {:?} is empty once sanitized", title))
            }
        };

        // built as an OsString so a non-UTF-8 extension keeps its exact bytes
        let mut target_name = OsString::from(&stem);
        if let Some(ext) = path.extension() {
            target_name.push(".");
            match ext.to_str() {
                Some(e) if self.lowercase_extension => target_name.push(e.to_lowercase()),
                _ => target_name.push(ext),
            }
        }
        let new_name = target_name.to_string_lossy().into_owned();

        if path.file_name() == Some(target_name.as_os_str()) {
            self.claimed.insert(original.clone());
            return RenameOutcome::new(original, Some(new_name), RenameStatus::Unchanged);
        }

        let target = original.with_file_name(&target_name);
        if self.claimed.contains(&target) {
            return RenameOutcome::new(original, Some(new_name), RenameStatus::FailedCollision)
                .with_detail(format!("{} was already taken in this pass", target.display()));
        }
        if target_taken(path, &target) {
            return RenameOutcome::new(original, Some(new_name), RenameStatus::FailedCollision)
                .with_detail(format!("{} already exists", target.display()));
        }

        if self.dry_run {
            self.claimed.insert(target);
            return RenameOutcome::new(original, Some(new_name), RenameStatus::Planned);
        }

        match std::fs::rename(path, &target) {
            Ok(()) => {
                self.claimed.insert(target.clone());
                RenameOutcome::new(original, Some(new_name), RenameStatus::Renamed).with_target(target)
            }
            Err(e) => RenameOutcome::new(original, Some(new_name), RenameStatus::FailedIo).with_detail(e.to_string()),
        }
    }
}

/// True when `target` names a different existing file. A target that differs
/// from the source only by letter case and is the same file on disk (a
/// case-insensitive filesystem) is not taken.
fn target_taken(source: &Path, target: &Path) -> bool {
    if std::fs::symlink_metadata(target).is_err() {
        return false;
    }
    let case_only = match (source.file_name(), target.file_name()) {
        (Some(a), Some(b)) => a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase(),
        _ => false,
    };
    !(case_only && same_file(source, target))
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(x), Ok(y)) => x.dev() == y.dev() && x.ino() == y.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{LoftyTitleReader, StaticTitleReader};
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn renames_to_title_and_keeps_extension() {
        let td = tempdir().unwrap();
        let p = td.path().join("01 Track.mp3");
        File::create(&p).unwrap();
        let mut engine = RenameEngine::new(StaticTitleReader::new().with("01 Track.mp3", "Midnight Drive"), SanitizePolicy::default());
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::Renamed);
        assert_eq!(o.new_name.as_deref(), Some("Midnight Drive.mp3"));
        assert!(!p.exists());
        assert!(td.path().join("Midnight Drive.mp3").exists());
    }

    #[test]
    fn lowercase_extension_is_optional() {
        let td = tempdir().unwrap();
        let p = td.path().join("a.FLAC");
        File::create(&p).unwrap();
        let mut engine =
            RenameEngine::new(StaticTitleReader::new().with("a.FLAC", "Song"), SanitizePolicy::default()).lowercase_extension(true);
        let o = engine.rename_one(&p);
        assert_eq!(o.new_name.as_deref(), Some("Song.flac"));
        assert!(td.path().join("Song.flac").exists());
    }

    #[test]
    fn whitespace_title_is_skipped() {
        let td = tempdir().unwrap();
        let p = td.path().join("02 Track.mp3");
        File::create(&p).unwrap();
        let mut engine = RenameEngine::new(StaticTitleReader::new().with("02 Track.mp3", "   "), SanitizePolicy::default());
        assert_eq!(engine.rename_one(&p).status, RenameStatus::SkippedNoTitle);
        assert!(p.exists());
    }

    #[test]
    fn title_of_only_dots_is_skipped() {
        let td = tempdir().unwrap();
        let p = td.path().join("dots.mp3");
        File::create(&p).unwrap();
        let mut engine = RenameEngine::new(StaticTitleReader::new().with("dots.mp3", "..."), SanitizePolicy::default());
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::SkippedNoTitle);
        assert!(o.detail.unwrap().contains("sanitized"));
    }

    #[test]
    fn tag_read_error_is_reported() {
        let td = tempdir().unwrap();
        let p = td.path().join("bad.flac");
        fs::write(&p, b"not a flac stream").unwrap();
        let mut engine = RenameEngine::new(LoftyTitleReader::new(), SanitizePolicy::default());
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::FailedTagRead);
        assert!(o.status.is_failure());
        assert!(p.exists());
    }

    #[test]
    fn existing_target_is_never_overwritten() {
        let td = tempdir().unwrap();
        let p = td.path().join("a.mp3");
        let existing = td.path().join("Song.mp3");
        fs::write(&p, b"a").unwrap();
        fs::write(&existing, b"keep me").unwrap();
        let mut engine = RenameEngine::new(StaticTitleReader::new().with("a.mp3", "Song"), SanitizePolicy::default());
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::FailedCollision);
        assert_eq!(fs::read(&existing).unwrap(), b"keep me");
        assert_eq!(fs::read(&p).unwrap(), b"a");
    }

    #[test]
    fn rename_failure_is_io_error() {
        let td = tempdir().unwrap();
        // never created, so the rename call itself fails
        let p = td.path().join("ghost.mp3");
        let mut engine = RenameEngine::new(StaticTitleReader::new().with("ghost.mp3", "Song"), SanitizePolicy::default());
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::FailedIo);
        assert!(o.detail.is_some());
    }

    /// Gives every file the same title.
    struct FixedTitle(&'static str);

    impl TitleReader for FixedTitle {
        fn read_title(&self, _path: &Path) -> Result<Option<String>, crate::tags::TagError> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_extension_keeps_its_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let td = tempdir().unwrap();
        let p = td.path().join(OsStr::from_bytes(b"track.m\xffp3"));
        fs::write(&p, b"x").unwrap();
        let mut engine = RenameEngine::new(FixedTitle("Song"), SanitizePolicy::default()).lowercase_extension(true);
        let o = engine.rename_one(&p);
        assert_eq!(o.status, RenameStatus::Renamed);
        assert!(!p.exists());
        let expected = td.path().join(OsStr::from_bytes(b"Song.m\xffp3"));
        assert_eq!(o.new_path().as_deref(), Some(expected.as_path()));
        assert_eq!(fs::read(&expected).unwrap(), b"x");
    }

    #[cfg(unix)]
    #[test]
    fn same_file_under_other_case_is_not_a_collision() {
        let td = tempdir().unwrap();
        let source = td.path().join("song.mp3");
        let target = td.path().join("Song.mp3");
        fs::write(&source, b"x").unwrap();
        // a hard link stands in for the case-insensitive alias
        fs::hard_link(&source, &target).unwrap();
        assert!(!target_taken(&source, &target));

        // same inode but not a case-only change: still taken
        let other = td.path().join("Other.mp3");
        fs::hard_link(&source, &other).unwrap();
        assert!(target_taken(&source, &other));
    }

    #[test]
    fn different_file_under_other_case_is_a_collision() {
        let td = tempdir().unwrap();
        let source = td.path().join("song.mp3");
        let target = td.path().join("Song.mp3");
        fs::write(&source, b"a").unwrap();
        fs::write(&target, b"b").unwrap();
        // on a case-insensitive filesystem both names are one file
        if fs::read(&source).unwrap() == b"b" {
            return;
        }
        assert!(target_taken(&source, &target));
        assert!(!target_taken(&source, &td.path().join("missing.mp3")));
    }

    #[test]
    fn dry_run_plans_without_touching_disk() {
        let td = tempdir().unwrap();
        let a = td.path().join("a.mp3");
        let b = td.path().join("b.mp3");
        File::create(&a).unwrap();
        File::create(&b).unwrap();
        let reader = StaticTitleReader::new().with("a.mp3", "Same").with("b.mp3", "Same");
        let mut engine = RenameEngine::new(reader, SanitizePolicy::default()).dry_run(true);
        let outcomes = engine.run(&[a.clone(), b.clone()]);
        assert_eq!(outcomes[0].status, RenameStatus::Planned);
        assert_eq!(outcomes[1].status, RenameStatus::FailedCollision);
        assert!(a.exists() && b.exists());
        assert!(!td.path().join("Same.mp3").exists());
    }
}
