//! no-deep-relative-imports: flags relative specifiers that climb more than
//! two directory levels.

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::rules::{Rule, RuleError, RuleMetadata, helpers};

const MAX_RELATIVE_DEPTH: usize = 2;

declare_rule!(
    DeepRelativeImports,
    name = "no-deep-relative-imports",
    tag = Base,
    severity = Warning,
    description = "Disallow relative imports that climb more than two directory levels"
);

impl Rule for DeepRelativeImports {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        for import in ctx.imports() {
            if !ctx.is_relative_path(&import.value) {
                continue;
            }
            let depth = ctx.relative_depth(&import.value);
            if depth <= MAX_RELATIVE_DEPTH {
                continue;
            }

            // The span already names a line; a text search guards against
            // the span landing inside a leading comment. Keep the larger.
            let span_line = ctx.source_index.line_of_byte(import.span.lo.0);
            let line = helpers::line_containing_all(ctx.source, &["import", &import.value])
                .map_or(span_line, |text_line| span_line.max(text_line));

            let message = ctx.messages.format(
                "rule.deep-relative-imports.message",
                &[
                    ("specifier", import.value.as_str()),
                    ("depth", &depth.to_string()),
                ],
            );
            reporter.report(ViolationDetails {
                description: message,
                code: Some(import.value.clone()),
                suggestions: vec![
                    Suggestion::new(
                        ctx.messages
                            .get("rule.deep-relative-imports.suggestion.alias"),
                    ),
                    Suggestion::new(
                        ctx.messages
                            .get("rule.deep-relative-imports.suggestion.aggregate"),
                    ),
                ],
                line: Some(line),
                span: None,
            });
        }
        Ok(())
    }
}
