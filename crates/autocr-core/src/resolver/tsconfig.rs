//! tsconfig.json loading for path-alias resolution.
//!
//! Accepts the JSONC dialect tsconfig actually uses (comments, trailing
//! commas) and follows `extends` chains with a recursion guard. Only the
//! compiler options the resolver consumes are kept: `baseUrl`, `paths`,
//! and `rootDirs`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::normalize_lexically;

#[derive(Debug, Default)]
pub struct TsConfig {
    /// Directory of the config file the lookup started from.
    pub dir: PathBuf,
    /// Absolute `baseUrl`, resolved against the defining config.
    pub base_url: Option<PathBuf>,
    /// Alias patterns with absolute targets, in deterministic key order.
    pub paths: Vec<(String, Vec<PathBuf>)>,
    /// Absolute `rootDirs`, resolved against the defining config.
    pub root_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawTsConfig {
    extends: Option<String>,
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<RawCompilerOptions>,
}

#[derive(Debug, Deserialize, Default)]
struct RawCompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "rootDirs")]
    root_dirs: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct MergedOptions {
    base_url: Option<PathBuf>,
    paths: BTreeMap<String, Vec<PathBuf>>,
    root_dirs: Vec<PathBuf>,
}

pub fn load_tsconfig(path: &Path) -> Option<TsConfig> {
    let mut guard = HashSet::new();
    let merged = load_file(path, &mut guard)?;
    Some(TsConfig {
        dir: path.parent()?.to_path_buf(),
        base_url: merged.base_url,
        paths: merged.paths.into_iter().collect(),
        root_dirs: merged.root_dirs,
    })
}

fn load_file(path: &Path, guard: &mut HashSet<PathBuf>) -> Option<MergedOptions> {
    let path = normalize_lexically(path);
    if !guard.insert(path.clone()) {
        // extends cycle
        return None;
    }
    let content = std::fs::read_to_string(&path).ok()?;
    let raw: RawTsConfig = serde_json::from_str(&strip_jsonc(&content)).ok()?;
    let dir = path.parent()?.to_path_buf();

    let mut merged = raw
        .extends
        .as_deref()
        .and_then(|reference| resolve_extends(&dir, reference))
        .and_then(|parent| load_file(&parent, guard))
        .unwrap_or_default();

    if let Some(options) = raw.compiler_options {
        if let Some(base_url) = options.base_url {
            merged.base_url = Some(normalize_lexically(&dir.join(base_url)));
        }
        if let Some(paths) = options.paths {
            // paths are relative to the defining config's baseUrl, falling
            // back to the config directory
            let base = merged.base_url.clone().unwrap_or_else(|| dir.clone());
            merged.paths = paths
                .into_iter()
                .map(|(pattern, targets)| {
                    let absolute = targets
                        .into_iter()
                        .map(|t| normalize_lexically(&base.join(t)))
                        .collect();
                    (pattern, absolute)
                })
                .collect();
        }
        if let Some(root_dirs) = options.root_dirs {
            merged.root_dirs = root_dirs
                .into_iter()
                .map(|d| normalize_lexically(&dir.join(d)))
                .collect();
        }
    }
    Some(merged)
}

/// Resolve an `extends` reference: relative path or module-style lookup in
/// an ancestor node_modules directory.
fn resolve_extends(dir: &Path, reference: &str) -> Option<PathBuf> {
    if reference.starts_with('.') {
        let direct = dir.join(reference);
        if direct.is_file() {
            return Some(direct);
        }
        let with_json = append_json(&direct);
        return with_json.is_file().then_some(with_json);
    }
    let mut current = Some(dir);
    while let Some(d) = current {
        let base = d.join("node_modules").join(reference);
        if base.is_file() {
            return Some(base);
        }
        let with_json = append_json(&base);
        if with_json.is_file() {
            return Some(with_json);
        }
        let nested = base.join("tsconfig.json");
        if nested.is_file() {
            return Some(nested);
        }
        current = d.parent();
    }
    None
}

fn append_json(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

/// Drop `//`, `/* */` comments and trailing commas so serde_json accepts
/// the content.
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(skipped) = chars.next() {
                        if skipped == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => out.push('/'),
            },
            ',' => {
                // drop the comma when the next significant char closes a
                // container
                let mut lookahead = chars.clone();
                let mut next_significant = None;
                for la in lookahead.by_ref() {
                    if !la.is_whitespace() {
                        next_significant = Some(la);
                        break;
                    }
                }
                match next_significant {
                    Some('}') | Some(']') => {}
                    _ => out.push(c),
                }
            }
            _ => out.push(c),
        }
    }
    out
}
