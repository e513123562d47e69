//! Workspace package discovery and package.json `exports` resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

/// Cap on expanded workspace directories; guards against a glob like `**`
/// exploding over a large tree.
pub const MAX_WORKSPACE_DIRS: usize = 256;

const DEFAULT_PATTERNS: &[&str] = &["packages/*", "apps/*"];

/// Condition preference for conditional `exports` entries.
const EXPORT_CONDITIONS: &[&str] = &["import", "require", "default", "types"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    pub exports: Option<Value>,
    pub workspaces: Option<WorkspacesField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    Patterns(Vec<String>),
    Detailed { packages: Vec<String> },
}

impl WorkspacesField {
    fn patterns(&self) -> &[String] {
        match self {
            WorkspacesField::Patterns(patterns) => patterns,
            WorkspacesField::Detailed { packages } => packages,
        }
    }
}

#[derive(Debug)]
pub struct WorkspacePackage {
    pub dir: PathBuf,
    pub manifest: PackageManifest,
}

/// Workspace packages indexed by their declared name.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    packages: HashMap<String, WorkspacePackage>,
}

impl WorkspaceIndex {
    pub fn get(&self, name: &str) -> Option<&WorkspacePackage> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

pub fn read_manifest(path: &Path) -> Option<PackageManifest> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Discover workspace packages under `project_root`.
///
/// Patterns come from the root package.json `workspaces` field, falling
/// back to `packages/*` and `apps/*`. A directory counts when it matches a
/// pattern and contains a package.json with a `name`.
pub fn discover(project_root: &Path) -> WorkspaceIndex {
    let root_manifest = read_manifest(&project_root.join("package.json"));
    let patterns: Vec<String> = root_manifest
        .as_ref()
        .and_then(|m| m.workspaces.as_ref())
        .map(|w| w.patterns().to_vec())
        .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect());

    let glob_set = build_glob_set(&patterns);
    let max_depth = patterns
        .iter()
        .map(|p| {
            if p.contains("**") {
                12
            } else {
                p.split('/').count() + 1
            }
        })
        .max()
        .unwrap_or(2);

    let mut packages = HashMap::new();
    let walker = WalkDir::new(project_root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|name| name != "node_modules" && !name.starts_with('.'))
                .unwrap_or(false)
        });

    for entry in walker.filter_map(Result::ok) {
        if packages.len() >= MAX_WORKSPACE_DIRS {
            tracing::debug!("workspace expansion hit the directory cap");
            break;
        }
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(project_root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if !glob_set.is_match(rel.as_str()) {
            continue;
        }
        let Some(manifest) = read_manifest(&entry.path().join("package.json")) else {
            continue;
        };
        let Some(name) = manifest.name.clone() else {
            continue;
        };
        packages.entry(name).or_insert_with(|| WorkspacePackage {
            dir: entry.path().to_path_buf(),
            manifest,
        });
    }

    WorkspaceIndex { packages }
}

fn build_glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = GlobBuilder::new(pattern).literal_separator(true).build() {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Resolve a subpath (`.` or `./sub`) through a package.json `exports`
/// value, returning the package-relative target.
pub fn resolve_exports(exports: &Value, subpath: &str) -> Option<String> {
    match exports {
        Value::String(target) => (subpath == ".").then(|| target.clone()),
        Value::Object(map) => {
            if map.keys().any(|k| k.starts_with('.')) {
                if let Some(entry) = map.get(subpath) {
                    return resolve_conditions(entry);
                }
                for (key, entry) in map {
                    let Some((prefix, suffix)) = key.split_once('*') else {
                        continue;
                    };
                    if subpath.len() >= prefix.len() + suffix.len()
                        && subpath.starts_with(prefix)
                        && subpath.ends_with(suffix)
                    {
                        let captured = &subpath[prefix.len()..subpath.len() - suffix.len()];
                        return resolve_conditions(entry).map(|t| t.replace('*', captured));
                    }
                }
                None
            } else if subpath == "." {
                resolve_conditions(exports)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn resolve_conditions(value: &Value) -> Option<String> {
    match value {
        Value::String(target) => Some(target.clone()),
        Value::Object(map) => EXPORT_CONDITIONS
            .iter()
            .find_map(|condition| map.get(*condition).and_then(resolve_conditions)),
        _ => None,
    }
}
