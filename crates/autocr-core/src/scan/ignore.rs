//! Ignore-pattern matching for scan candidates.
//!
//! Each candidate is tested twice: as its POSIX-normalised absolute path
//! and as its path relative to the directory the ignore file was loaded
//! from. Dot files are matched like any other name.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::IgnoreConfig;
use crate::reporter::Notification;

pub struct IgnoreMatcher {
    set: GlobSet,
    base_dir: std::path::PathBuf,
}

impl IgnoreMatcher {
    /// Build a matcher; malformed patterns are dropped with a warning.
    pub fn build(config: &IgnoreConfig) -> (Self, Vec<Notification>) {
        let mut warnings = Vec::new();
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.patterns {
            match GlobBuilder::new(pattern).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => warnings.push(
                    Notification::warn(format!("invalid ignore pattern '{pattern}'"))
                        .with_detail(err.to_string()),
                ),
            }
        }
        let set = builder.build().unwrap_or_else(|_| GlobSet::empty());
        (
            Self {
                set,
                base_dir: config.base_dir.clone(),
            },
            warnings,
        )
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }
        let absolute = to_posix(path);
        if self.set.is_match(absolute.as_str()) {
            return true;
        }
        if let Ok(relative) = path.strip_prefix(&self.base_dir) {
            if self.set.is_match(to_posix(relative).as_str()) {
                return true;
            }
        }
        false
    }
}

fn to_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn matcher(patterns: &[&str], base: &str) -> IgnoreMatcher {
        let config = IgnoreConfig::new(
            patterns.iter().map(|s| s.to_string()).collect(),
            PathBuf::from(base),
        );
        IgnoreMatcher::build(&config).0
    }

    #[test]
    fn relative_pattern_matches_below_base_dir() {
        let m = matcher(&["dist/**"], "/proj");
        assert!(m.is_ignored(Path::new("/proj/dist/out.js")));
        assert!(!m.is_ignored(Path::new("/proj/src/out.js")));
    }

    #[test]
    fn absolute_pattern_matches_absolute_path() {
        let m = matcher(&["/proj/vendor/**"], "/proj");
        assert!(m.is_ignored(Path::new("/proj/vendor/lib.js")));
    }

    #[test]
    fn dot_files_are_matched() {
        let m = matcher(&["**/.cache/**"], "/proj");
        assert!(m.is_ignored(Path::new("/proj/a/.cache/x.ts")));
    }

    #[test]
    fn star_does_not_cross_separators() {
        let m = matcher(&["build/*.js"], "/proj");
        assert!(m.is_ignored(Path::new("/proj/build/a.js")));
        assert!(!m.is_ignored(Path::new("/proj/build/nested/a.js")));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let m = matcher(&[], "/proj");
        assert!(!m.is_ignored(Path::new("/proj/anything.ts")));
    }

    #[test]
    fn invalid_pattern_warns_and_is_skipped() {
        let config = IgnoreConfig::new(vec!["a[".to_string()], PathBuf::from("/proj"));
        let (m, warnings) = IgnoreMatcher::build(&config);
        assert_eq!(warnings.len(), 1);
        assert!(!m.is_ignored(Path::new("/proj/a.ts")));
    }

    #[test]
    fn matching_is_stable_under_normalisation() {
        let m = matcher(&["dist/**"], "/proj");
        assert_eq!(
            m.is_ignored(Path::new("/proj/dist/a.js")),
            m.is_ignored(&crate::resolver::normalize_lexically(Path::new(
                "/proj/./dist/a.js"
            )))
        );
    }
}
