//! no-circular-dependencies: cross-file import cycle detection.
//!
//! The import graph is never materialised: starting from each resolved
//! import target, a depth-limited DFS expands neighbours lazily through
//! the resolver's cached lexical import scan. The node and depth caps
//! bound worst-case time on pathological repositories and are load-bearing
//! rather than tunable.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::resolver::{Resolver, normalize_lexically};
use crate::rules::{Rule, RuleError, RuleMetadata};

const MAX_GRAPH_NODES: usize = 2000;
const MAX_GRAPH_DEPTH: usize = 80;

declare_rule!(
    CircularDependencies,
    name = "no-circular-dependencies",
    tag = Base,
    severity = Warning,
    description = "Disallow import cycles between modules"
);

struct GraphSearch<'a> {
    resolver: &'a Resolver,
    origin: &'a Path,
    visiting: HashSet<PathBuf>,
    dead_ends: HashSet<PathBuf>,
    budget: usize,
}

impl GraphSearch<'_> {
    /// Depth-first search for a path from `node` back to the origin.
    /// On success the stack holds the intermediate nodes `[t, …, last]`.
    fn dfs(&mut self, node: &Path, depth: usize, stack: &mut Vec<PathBuf>) -> bool {
        if depth >= MAX_GRAPH_DEPTH || self.budget == 0 {
            return false;
        }
        self.budget -= 1;
        stack.push(node.to_path_buf());
        self.visiting.insert(node.to_path_buf());

        let neighbors = self.resolver.resolved_imports_of(node);
        for neighbor in neighbors.iter() {
            if neighbor == self.origin {
                self.visiting.remove(node);
                return true;
            }
            if self.visiting.contains(neighbor) || self.dead_ends.contains(neighbor) {
                continue;
            }
            if self.dfs(neighbor, depth + 1, stack) {
                self.visiting.remove(node);
                return true;
            }
        }

        self.visiting.remove(node);
        stack.pop();
        self.dead_ends.insert(node.to_path_buf());
        false
    }
}

/// Rotation-minimal key over the cycle's distinct nodes, used to report
/// each cycle once regardless of which import uncovered it.
fn canonical_cycle_key(nodes: &[PathBuf]) -> String {
    let names: Vec<String> = nodes
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let mut best: Option<Vec<&str>> = None;
    for start in 0..names.len() {
        let rotation: Vec<&str> = (0..names.len())
            .map(|i| names[(start + i) % names.len()].as_str())
            .collect();
        if best.as_ref().is_none_or(|current| rotation < *current) {
            best = Some(rotation);
        }
    }
    best.unwrap_or_default().join("->")
}

fn display_chain(nodes: &[PathBuf], project_root: &Path) -> String {
    let mut parts: Vec<String> = nodes
        .iter()
        .map(|node| {
            node.strip_prefix(project_root)
                .unwrap_or(node)
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    if let Some(first) = parts.first().cloned() {
        parts.push(first);
    }
    parts.join(" -> ")
}

impl Rule for CircularDependencies {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        let origin = normalize_lexically(ctx.file_path);
        let mut reported_keys: HashSet<String> = HashSet::new();
        let mut warned_specifiers: HashSet<String> = HashSet::new();

        for import in ctx.imports() {
            let resolution = ctx.resolver.resolve(&origin, &import.value);
            let Some(target) = resolution.resolved else {
                if resolution.should_warn && warned_specifiers.insert(import.value.clone()) {
                    reporter.report(ViolationDetails {
                        description: ctx.messages.format(
                            "rule.circular-dependencies.unresolved",
                            &[("specifier", import.value.as_str())],
                        ),
                        code: Some(import.value.clone()),
                        span: Some(import.span),
                        ..Default::default()
                    });
                }
                continue;
            };

            let mut cycle = vec![origin.clone()];
            if target == origin {
                // a module importing itself is the degenerate cycle
            } else {
                let mut search = GraphSearch {
                    resolver: ctx.resolver,
                    origin: &origin,
                    visiting: HashSet::new(),
                    dead_ends: HashSet::new(),
                    budget: MAX_GRAPH_NODES,
                };
                let mut stack = Vec::new();
                if !search.dfs(&target, 0, &mut stack) {
                    continue;
                }
                cycle.extend(stack);
            }

            if !reported_keys.insert(canonical_cycle_key(&cycle)) {
                continue;
            }
            let chain = display_chain(&cycle, ctx.resolver.project_root());
            reporter.report(ViolationDetails {
                description: ctx
                    .messages
                    .format("rule.circular-dependencies.message", &[("chain", &chain)]),
                code: Some(chain.clone()),
                suggestions: vec![Suggestion::new(
                    ctx.messages.get("rule.circular-dependencies.suggestion"),
                )],
                span: Some(import.span),
                ..Default::default()
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::analysis::analyze;
    use crate::messages::{Locale, MessageCatalog};
    use crate::parser::parse_source;
    use crate::reporter::{FileReporter, Violation};
    use crate::source_index::SourceIndex;

    fn run_on_file(root: &Path, file: &Path) -> Vec<Violation> {
        let source = fs::read_to_string(file).unwrap();
        let parsed = parse_source(&file.to_string_lossy(), &source).unwrap();
        let analysis = analyze(&parsed.module);
        let index = SourceIndex::new(&parsed.source, parsed.module_start);
        let catalog = MessageCatalog::for_locale(Locale::En);
        let resolver = Resolver::new(root, None);
        let ctx = RuleContext {
            module: &parsed.module,
            file_path: file,
            source: &parsed.source,
            analysis: &analysis,
            source_index: &index,
            messages: &catalog,
            resolver: &resolver,
        };
        let rule = CircularDependencies::new();
        let mut reporter = FileReporter::new(file.to_string_lossy());
        {
            let meta = rule.metadata();
            let mut scoped = reporter.for_rule(meta.name, meta.tag.as_str(), meta.severity, &index);
            rule.run(&ctx, &mut scoped).unwrap();
        }
        reporter.flush().violations
    }

    #[test]
    fn direct_cycle_is_reported_once_with_chain() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        let b = root.join("b.ts");
        fs::write(&a, "import './b';\nexport const a = 1;\n").unwrap();
        fs::write(&b, "import './a';\nexport const b = 1;\n").unwrap();

        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.rule_name, "no-circular-dependencies");
        assert_eq!(v.line, Some(1));
        let chain = v.code.as_deref().unwrap();
        assert!(chain.contains("a.ts"));
        assert!(chain.contains("b.ts"));
    }

    #[test]
    fn both_cycle_members_report_when_scanned() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        let b = root.join("b.ts");
        fs::write(&a, "import './b';\n").unwrap();
        fs::write(&b, "import './a';\n").unwrap();

        assert_eq!(run_on_file(root, &a).len(), 1);
        assert_eq!(run_on_file(root, &b).len(), 1);
    }

    #[test]
    fn indirect_cycle_through_three_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        fs::write(&a, "import './b';\n").unwrap();
        fs::write(root.join("b.ts"), "import './c';\n").unwrap();
        fs::write(root.join("c.ts"), "import './a';\n").unwrap();

        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 1);
        let chain = violations[0].code.as_deref().unwrap();
        assert!(chain.contains("b.ts"));
        assert!(chain.contains("c.ts"));
    }

    #[test]
    fn acyclic_imports_stay_silent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        fs::write(&a, "import './b';\n").unwrap();
        fs::write(root.join("b.ts"), "export const b = 1;\n").unwrap();

        assert!(run_on_file(root, &a).is_empty());
    }

    #[test]
    fn distinct_cycles_each_report() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        fs::write(&a, "import './b';\nimport './c';\n").unwrap();
        fs::write(root.join("b.ts"), "import './d';\n").unwrap();
        fs::write(root.join("c.ts"), "import './d';\n").unwrap();
        fs::write(root.join("d.ts"), "import './a';\n").unwrap();

        // a->b->d->a and a->c->d->a have different node sets, so both
        // canonical keys survive deduplication
        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 2);
        let keys: HashSet<_> = violations
            .iter()
            .map(|v| v.code.clone().unwrap())
            .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn repeated_imports_of_one_cycle_dedupe_by_canonical_key() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        fs::write(&a, "import './b';\nimport { x } from './b';\n").unwrap();
        fs::write(root.join("b.ts"), "import './a';\nexport const x = 1;\n").unwrap();

        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn unresolved_alias_import_warns_once_per_specifier() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
        )
        .unwrap();
        let a = root.join("src/a.ts");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::write(
            &a,
            "import x from '@/missing';\nimport y from '@/missing';\n",
        )
        .unwrap();

        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code.as_deref(), Some("@/missing"));
        assert!(violations[0].message.contains("@/missing"));
    }

    #[test]
    fn self_import_is_the_degenerate_cycle() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.ts");
        fs::write(&a, "import './a';\n").unwrap();

        let violations = run_on_file(root, &a);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn canonical_key_is_rotation_invariant() {
        let a = PathBuf::from("/p/a.ts");
        let b = PathBuf::from("/p/b.ts");
        let c = PathBuf::from("/p/c.ts");
        let from_a = canonical_cycle_key(&[a.clone(), b.clone(), c.clone()]);
        let from_b = canonical_cycle_key(&[b.clone(), c.clone(), a.clone()]);
        let from_c = canonical_cycle_key(&[c, a, b]);
        assert_eq!(from_a, from_b);
        assert_eq!(from_b, from_c);
    }

    #[test]
    fn chain_uses_project_relative_paths_and_closes_the_loop() {
        let nodes = vec![PathBuf::from("/proj/src/a.ts"), PathBuf::from("/proj/src/b.ts")];
        let chain = display_chain(&nodes, Path::new("/proj"));
        assert_eq!(chain, "src/a.ts -> src/b.ts -> src/a.ts");
    }
}
