//! Rule context construction and rule dispatch.

use std::path::Path;

use swc_ecma_ast::Module;

use crate::analysis::{Analysis, ImportReference};
use crate::messages::MessageCatalog;
use crate::reporter::{FileReporter, Notification};
use crate::resolver::Resolver;
use crate::rules::PreparedRule;
use crate::source_index::SourceIndex;

/// Non-owning view handed to every rule for one file.
pub struct RuleContext<'a> {
    pub module: &'a Module,
    pub file_path: &'a Path,
    pub source: &'a str,
    pub analysis: &'a Analysis,
    pub source_index: &'a SourceIndex,
    pub messages: &'a MessageCatalog,
    pub resolver: &'a Resolver,
}

impl RuleContext<'_> {
    pub fn imports(&self) -> &[ImportReference] {
        &self.analysis.imports
    }

    pub fn is_relative_path(&self, specifier: &str) -> bool {
        specifier.starts_with('.')
    }

    /// Count of literal `../` segments. Intentionally a plain substring
    /// count, matching the behaviour rules were tuned against; paths like
    /// `./a/../b` overcount.
    pub fn relative_depth(&self, specifier: &str) -> usize {
        specifier.matches("../").count()
    }
}

/// Run rules in list order against a shared context.
///
/// A failing rule is converted to an error notification; the file's scan
/// continues with the remaining rules.
pub fn run_rules(
    ctx: &RuleContext<'_>,
    rules: &[PreparedRule],
    reporter: &mut FileReporter,
    notifications: &mut Vec<Notification>,
) {
    for prepared in rules {
        let meta = prepared.rule.metadata();
        let mut scoped = reporter.for_rule(
            meta.name,
            meta.tag.as_str(),
            prepared.severity,
            ctx.source_index,
        );
        if let Err(err) = prepared.rule.run(ctx, &mut scoped) {
            notifications.push(
                Notification::error(format!(
                    "rule execution failed: {} at {}",
                    meta.name,
                    ctx.file_path.display()
                ))
                .with_detail(err.to_string()),
            );
        }
    }
}
