//! no-swallowed-errors: try statements whose catch and finally blocks both
//! contain no executable statements.

use swc_ecma_ast::{BlockStmt, Stmt};

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::rules::{Rule, RuleError, RuleMetadata, helpers};

declare_rule!(
    SwallowedErrors,
    name = "no-swallowed-errors",
    tag = Base,
    severity = Warning,
    description = "Disallow try statements that silently discard errors"
);

fn stmt_is_executable(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Empty(_) => false,
        Stmt::Block(block) => block.stmts.iter().any(stmt_is_executable),
        _ => true,
    }
}

fn block_has_executable(block: &BlockStmt) -> bool {
    block.stmts.iter().any(stmt_is_executable)
}

impl Rule for SwallowedErrors {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        for try_stmt in &ctx.analysis.try_statements {
            let catch_block = try_stmt.handler.as_ref().map(|handler| &handler.body);
            let finally_block = try_stmt.finalizer.as_ref();

            let catch_handles = catch_block.is_some_and(block_has_executable);
            let finally_handles = finally_block.is_some_and(block_has_executable);
            if catch_handles || finally_handles {
                continue;
            }

            // Point at the catch block when there is one, else finally,
            // else the try itself.
            let (span, keyword) = match (catch_block, finally_block) {
                (Some(block), _) => (block.span, "catch"),
                (None, Some(block)) => (block.span, "finally"),
                (None, None) => (try_stmt.span, "try"),
            };
            let span_line = ctx.source_index.line_of_byte(span.lo.0);
            let line = helpers::keyword_line_at_or_after(ctx.source, span_line, keyword)
                .map_or(span_line, |keyword_line| span_line.max(keyword_line));

            reporter.report(ViolationDetails {
                description: ctx.messages.get("rule.swallowed-errors.message").to_string(),
                suggestions: vec![Suggestion::new(
                    ctx.messages.get("rule.swallowed-errors.suggestion"),
                )],
                line: Some(line),
                ..Default::default()
            });
        }
        Ok(())
    }
}
