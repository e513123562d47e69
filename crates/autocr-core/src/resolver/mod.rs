//! Module resolution: map an import specifier to an on-disk file given the
//! project root, tsconfig aliases, and workspace packages.
//!
//! Caches (tsconfig per directory, the workspace index, resolved imports
//! per file) are plain values owned by one worker; no cross-worker
//! coherence is needed because every cached value is a pure function of
//! filesystem state observed during the scan.

pub mod tsconfig;
pub mod workspace;

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use tsconfig::TsConfig;
use workspace::WorkspaceIndex;

const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub resolved: Option<PathBuf>,
    /// True when an alias or workspace rule matched but produced no file.
    pub should_warn: bool,
}

impl Resolution {
    fn found(path: PathBuf) -> Self {
        Self {
            resolved: Some(path),
            should_warn: false,
        }
    }

    fn missing(attempted: bool) -> Self {
        Self {
            resolved: None,
            should_warn: attempted,
        }
    }
}

pub struct Resolver {
    project_root: PathBuf,
    tsconfig_override: Option<PathBuf>,
    override_config: OnceCell<Option<Arc<TsConfig>>>,
    /// Directory -> config defined in that directory, if any. At most one
    /// filesystem probe per directory.
    configs_by_dir: RefCell<HashMap<PathBuf, Option<Arc<TsConfig>>>>,
    workspace: OnceCell<WorkspaceIndex>,
    known_node_packages: RefCell<HashMap<String, bool>>,
    file_imports: RefCell<HashMap<PathBuf, Arc<Vec<PathBuf>>>>,
}

impl Resolver {
    pub fn new(project_root: &Path, tsconfig_override: Option<PathBuf>) -> Self {
        Self {
            project_root: normalize_lexically(project_root),
            tsconfig_override,
            override_config: OnceCell::new(),
            configs_by_dir: RefCell::new(HashMap::new()),
            workspace: OnceCell::new(),
            known_node_packages: RefCell::new(HashMap::new()),
            file_imports: RefCell::new(HashMap::new()),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Resolution {
        let spec = strip_query_and_hash(specifier);
        if spec.is_empty() {
            return Resolution::missing(false);
        }
        if spec.starts_with('.') {
            return Resolution {
                resolved: self.resolve_relative(from_file, spec),
                should_warn: false,
            };
        }
        self.resolve_bare(from_file, spec)
    }

    fn resolve_relative(&self, from_file: &Path, spec: &str) -> Option<PathBuf> {
        let dir = from_file.parent()?;
        let base = normalize_lexically(&dir.join(spec));
        // a path escaping the project root is never a scan target
        if !base.starts_with(&self.project_root) {
            return None;
        }
        if let Some(found) = resolve_path_candidate(&base) {
            return Some(found);
        }
        // rootDirs act as one virtual directory: retry the suffix against
        // each sibling root
        let config = self.tsconfig_for(dir)?;
        for root in &config.root_dirs {
            let Ok(suffix) = base.strip_prefix(root) else {
                continue;
            };
            for other in &config.root_dirs {
                if other == root {
                    continue;
                }
                if let Some(found) = resolve_path_candidate(&other.join(suffix)) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn resolve_bare(&self, from_file: &Path, spec: &str) -> Resolution {
        let mut attempted = false;
        let dir = from_file
            .parent()
            .unwrap_or(&self.project_root)
            .to_path_buf();

        if let Some(config) = self.tsconfig_for(&dir) {
            for (pattern, targets) in &config.paths {
                let Some(captured) = match_alias_pattern(pattern, spec) else {
                    continue;
                };
                attempted = true;
                for target in targets {
                    let substituted = substitute_wildcard(target, captured);
                    if let Some(found) = resolve_path_candidate(&substituted) {
                        return Resolution::found(found);
                    }
                }
            }
            if let Some(base_url) = &config.base_url {
                if looks_path_like(spec) && !self.names_known_package(&dir, spec) {
                    if let Some(found) =
                        resolve_path_candidate(&normalize_lexically(&base_url.join(spec)))
                    {
                        return Resolution::found(found);
                    }
                }
            }
        }

        let (package_name, subpath) = split_package_specifier(spec);
        if let Some(package) = self.workspace().get(package_name) {
            attempted = true;
            if let Some(found) = resolve_in_package(package, subpath) {
                return Resolution::found(found);
            }
        }

        Resolution::missing(attempted)
    }

    /// Resolved import targets of a file, via a cheap lexical scan of its
    /// source. Cached for the resolver's lifetime.
    pub fn resolved_imports_of(&self, file: &Path) -> Arc<Vec<PathBuf>> {
        if let Some(cached) = self.file_imports.borrow().get(file) {
            return Arc::clone(cached);
        }
        let mut targets: Vec<PathBuf> = Vec::new();
        if let Ok(source) = std::fs::read_to_string(file) {
            for spec in scan_import_specifiers(&source) {
                if let Some(resolved) = self.resolve(file, &spec).resolved {
                    if !targets.contains(&resolved) {
                        targets.push(resolved);
                    }
                }
            }
        }
        let targets = Arc::new(targets);
        self.file_imports
            .borrow_mut()
            .insert(file.to_path_buf(), Arc::clone(&targets));
        targets
    }

    fn tsconfig_for(&self, dir: &Path) -> Option<Arc<TsConfig>> {
        if let Some(override_path) = &self.tsconfig_override {
            return self
                .override_config
                .get_or_init(|| tsconfig::load_tsconfig(override_path).map(Arc::new))
                .clone();
        }
        let mut current = Some(dir);
        while let Some(d) = current {
            if !d.starts_with(&self.project_root) {
                break;
            }
            if let Some(cached) = self.configs_by_dir.borrow().get(d) {
                if let Some(config) = cached {
                    return Some(Arc::clone(config));
                }
                current = d.parent();
                continue;
            }
            let candidate = d.join("tsconfig.json");
            let loaded = candidate
                .is_file()
                .then(|| tsconfig::load_tsconfig(&candidate))
                .flatten()
                .map(Arc::new);
            self.configs_by_dir
                .borrow_mut()
                .insert(d.to_path_buf(), loaded.clone());
            if let Some(config) = loaded {
                return Some(config);
            }
            if d == self.project_root {
                break;
            }
            current = d.parent();
        }
        None
    }

    fn workspace(&self) -> &WorkspaceIndex {
        self.workspace
            .get_or_init(|| workspace::discover(&self.project_root))
    }

    /// Whether the specifier's first segment names a known package, either
    /// a workspace member or something installed under node_modules.
    fn names_known_package(&self, from_dir: &Path, spec: &str) -> bool {
        let (name, _) = split_package_specifier(spec);
        if self.workspace().contains(name) {
            return true;
        }
        if let Some(known) = self.known_node_packages.borrow().get(name) {
            return *known;
        }
        let mut found = false;
        let mut current = Some(from_dir);
        while let Some(d) = current {
            if d.join("node_modules").join(name).is_dir() {
                found = true;
                break;
            }
            if d == self.project_root {
                break;
            }
            current = d.parent();
        }
        self.known_node_packages
            .borrow_mut()
            .insert(name.to_string(), found);
        found
    }
}

fn resolve_in_package(package: &workspace::WorkspacePackage, subpath: &str) -> Option<PathBuf> {
    let subpath_key = if subpath.is_empty() {
        ".".to_string()
    } else {
        format!("./{subpath}")
    };
    if let Some(exports) = &package.manifest.exports {
        if let Some(target) = workspace::resolve_exports(exports, &subpath_key) {
            if let Some(found) =
                resolve_path_candidate(&normalize_lexically(&package.dir.join(target)))
            {
                return Some(found);
            }
        }
    }
    if subpath.is_empty() {
        for field in [
            &package.manifest.module,
            &package.manifest.main,
            &package.manifest.types,
        ]
        .into_iter()
        .flatten()
        {
            if let Some(found) = resolve_path_candidate(&package.dir.join(field)) {
                return Some(found);
            }
        }
        resolve_path_candidate(&package.dir)
    } else {
        resolve_path_candidate(&package.dir.join(subpath))
    }
}

/// Try the path as written, with appended extensions, then as a directory
/// with an index file. Declaration files never resolve.
fn resolve_path_candidate(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return accept(path.to_path_buf());
    }
    let name = path.as_os_str().to_os_string();
    for ext in RESOLVE_EXTENSIONS {
        let mut with_ext = name.clone();
        with_ext.push(format!(".{ext}"));
        let candidate = PathBuf::from(&with_ext);
        if candidate.is_file() {
            return accept(candidate);
        }
    }
    if path.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let candidate = path.join(format!("index.{ext}"));
            if candidate.is_file() {
                return accept(candidate);
            }
        }
    }
    None
}

fn accept(path: PathBuf) -> Option<PathBuf> {
    if is_declaration_file(&path) {
        None
    } else {
        Some(path)
    }
}

fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts"))
}

fn strip_query_and_hash(specifier: &str) -> &str {
    specifier
        .split(['?', '#'])
        .next()
        .unwrap_or(specifier)
}

/// Match a tsconfig `paths` pattern: exact (captures the empty string) or
/// a single `*` wildcard.
fn match_alias_pattern<'s>(pattern: &str, spec: &'s str) -> Option<&'s str> {
    match pattern.split_once('*') {
        None => (pattern == spec).then_some(""),
        Some((prefix, suffix)) => {
            if suffix.contains('*') {
                return None;
            }
            if spec.len() >= prefix.len() + suffix.len()
                && spec.starts_with(prefix)
                && spec.ends_with(suffix)
            {
                Some(&spec[prefix.len()..spec.len() - suffix.len()])
            } else {
                None
            }
        }
    }
}

fn substitute_wildcard(target: &Path, captured: &str) -> PathBuf {
    let target_str = target.to_string_lossy();
    if target_str.contains('*') {
        PathBuf::from(target_str.replace('*', captured))
    } else {
        target.to_path_buf()
    }
}

fn looks_path_like(spec: &str) -> bool {
    spec.contains('/') || spec.starts_with('@')
}

fn split_package_specifier(spec: &str) -> (&str, &str) {
    if spec.starts_with('@') {
        let mut slashes = spec.match_indices('/').map(|(i, _)| i);
        if slashes.next().is_none() {
            return (spec, "");
        }
        match slashes.next() {
            Some(second) => (&spec[..second], &spec[second + 1..]),
            None => (spec, ""),
        }
    } else {
        spec.split_once('/').unwrap_or((spec, ""))
    }
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

static STATIC_OR_EXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^.\w])(?:import|export)\s[^'"]*?from\s*['"]([^'"]+)['"]"#)
        .expect("static import pattern")
});
static BARE_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|[^.\w])import\s*['"]([^'"]+)['"]"#).expect("bare import pattern"));
static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\s*\(\s*['"]([^'"]+)['"]"#).expect("dynamic import pattern")
});
static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^.\w])require\s*\(\s*['"]([^'"]+)['"]"#).expect("require pattern")
});

/// Lexical specifier scan used for neighbour expansion in the import
/// graph. Deliberately regex-based: parsing every transitive neighbour
/// would dominate scan time.
pub fn scan_import_specifiers(source: &str) -> Vec<String> {
    let mut specs: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        if !specs.iter().any(|existing| existing == value) {
            specs.push(value.to_string());
        }
    };
    for regex in [
        &*STATIC_OR_EXPORT_FROM,
        &*BARE_IMPORT,
        &*DYNAMIC_IMPORT,
        &*REQUIRE_CALL,
    ] {
        for capture in regex.captures_iter(source) {
            if let Some(m) = capture.get(1) {
                push(m.as_str());
            }
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export {};\n").unwrap();
        path
    }

    #[test]
    fn relative_specifier_resolves_with_extension() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "src/b.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "./b");
        assert_eq!(resolution.resolved, Some(target));
        assert!(!resolution.should_warn);
    }

    #[test]
    fn relative_specifier_resolves_index_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "src/lib/index.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(resolver.resolve(&from, "./lib").resolved, Some(target));
    }

    #[test]
    fn query_and_hash_suffixes_are_stripped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "src/b.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(resolver.resolve(&from, "./b?raw").resolved, Some(target));
    }

    #[test]
    fn declaration_files_do_not_resolve() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let from = touch(root, "src/a.ts");
        touch(root, "src/types.d.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(resolver.resolve(&from, "./types").resolved, None);
        assert_eq!(resolver.resolve(&from, "./types.d.ts").resolved, None);
    }

    #[test]
    fn escaping_the_project_root_does_not_resolve() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let from = touch(&root, "src/a.ts");
        touch(parent.path(), "outside.ts");

        let resolver = Resolver::new(&root, None);
        assert_eq!(
            resolver.resolve(&from, "../../outside").resolved,
            None
        );
    }

    #[test]
    fn tsconfig_paths_alias_resolves() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
        )
        .unwrap();
        let from = touch(root, "src/pages/home.ts");
        let target = touch(root, "src/shared/util.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "@/shared/util");
        assert_eq!(resolution.resolved, Some(target));
    }

    #[test]
    fn matched_alias_without_file_warns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
        )
        .unwrap();
        let from = touch(root, "src/a.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "@/missing/file");
        assert_eq!(resolution.resolved, None);
        assert!(resolution.should_warn);
    }

    #[test]
    fn unmatched_bare_specifier_does_not_warn() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let from = touch(root, "src/a.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "react");
        assert_eq!(resolution.resolved, None);
        assert!(!resolution.should_warn);
    }

    #[test]
    fn base_url_resolves_path_like_specifiers() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "baseUrl": "./src" } }"#,
        )
        .unwrap();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "src/components/button.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(
            resolver.resolve(&from, "components/button").resolved,
            Some(target)
        );
    }

    #[test]
    fn root_dirs_retry_sibling_roots() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "rootDirs": ["src", "generated"] } }"#,
        )
        .unwrap();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "generated/messages.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(
            resolver.resolve(&from, "./messages").resolved,
            Some(target)
        );
    }

    #[test]
    fn workspace_package_root_resolves_through_main() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/core/src")).unwrap();
        fs::write(
            root.join("packages/core/package.json"),
            r#"{ "name": "@acme/core", "main": "src/index.ts" }"#,
        )
        .unwrap();
        let target = touch(root, "packages/core/src/index.ts");
        let from = touch(root, "apps/web/main.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "@acme/core");
        assert_eq!(resolution.resolved, Some(target));
    }

    #[test]
    fn workspace_package_exports_map_resolves_subpath() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/core/dist")).unwrap();
        fs::write(
            root.join("packages/core/package.json"),
            r#"{ "name": "@acme/core", "exports": { "./utils": { "import": "./dist/utils.ts" } } }"#,
        )
        .unwrap();
        let target = touch(root, "packages/core/dist/utils.ts");
        let from = touch(root, "apps/web/main.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(
            resolver.resolve(&from, "@acme/core/utils").resolved,
            Some(target)
        );
    }

    #[test]
    fn workspace_subpath_falls_back_to_directory_lookup() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/core")).unwrap();
        fs::write(
            root.join("packages/core/package.json"),
            r#"{ "name": "core" }"#,
        )
        .unwrap();
        let target = touch(root, "packages/core/helpers.ts");
        let from = touch(root, "apps/web/main.ts");

        let resolver = Resolver::new(root, None);
        assert_eq!(
            resolver.resolve(&from, "core/helpers").resolved,
            Some(target)
        );
    }

    #[test]
    fn unresolved_workspace_subpath_warns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/core")).unwrap();
        fs::write(
            root.join("packages/core/package.json"),
            r#"{ "name": "core" }"#,
        )
        .unwrap();
        let from = touch(root, "apps/web/main.ts");

        let resolver = Resolver::new(root, None);
        let resolution = resolver.resolve(&from, "core/nope");
        assert_eq!(resolution.resolved, None);
        assert!(resolution.should_warn);
    }

    #[test]
    fn split_package_specifier_handles_scopes() {
        assert_eq!(split_package_specifier("react"), ("react", ""));
        assert_eq!(split_package_specifier("lodash/get"), ("lodash", "get"));
        assert_eq!(split_package_specifier("@acme/core"), ("@acme/core", ""));
        assert_eq!(
            split_package_specifier("@acme/core/utils/x"),
            ("@acme/core", "utils/x")
        );
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn scan_finds_all_specifier_forms() {
        let source = r#"
import a from './a';
import './side-effect';
export { b } from "./b";
const c = await import('./c');
const d = require('./d');
"#;
        let specs = scan_import_specifiers(source);
        assert!(specs.contains(&"./a".to_string()));
        assert!(specs.contains(&"./side-effect".to_string()));
        assert!(specs.contains(&"./b".to_string()));
        assert!(specs.contains(&"./c".to_string()));
        assert!(specs.contains(&"./d".to_string()));
    }

    #[test]
    fn resolved_imports_are_cached_per_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let target = touch(root, "src/b.ts");
        let from = root.join("src/a.ts");
        fs::create_dir_all(from.parent().unwrap()).unwrap();
        fs::write(&from, "import './b';\n").unwrap();

        let resolver = Resolver::new(root, None);
        let first = resolver.resolved_imports_of(&from);
        assert_eq!(first.as_slice(), &[target]);
        // second call must hit the cache even if the file disappears
        fs::remove_file(&from).unwrap();
        let second = resolver.resolved_imports_of(&from);
        assert_eq!(first, second);
    }

    #[test]
    fn tsconfig_override_wins_over_directory_lookup() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "paths": { "$lib/*": ["src/lib_wrong/*"] } } }"#,
        )
        .unwrap();
        fs::write(
            root.join("tsconfig.override.json"),
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "$lib/*": ["src/lib/*"] } } }"#,
        )
        .unwrap();
        let from = touch(root, "src/a.ts");
        let target = touch(root, "src/lib/x.ts");

        let resolver = Resolver::new(root, Some(root.join("tsconfig.override.json")));
        assert_eq!(resolver.resolve(&from, "$lib/x").resolved, Some(target));
    }
}
