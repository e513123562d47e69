//! no-deep-clone-in-loop: structuredClone and JSON round-trip clones on
//! hot paths.

use swc_ecma_ast::{CallExpr, Expr};

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::rules::{Rule, RuleError, RuleMetadata, helpers};

declare_rule!(
    DeepCloneInLoop,
    name = "no-deep-clone-in-loop",
    tag = Performance,
    severity = Optimizing,
    description = "Disallow per-iteration deep clones on hot paths"
);

fn is_structured_clone(call: &CallExpr) -> bool {
    if helpers::callee_ident_name(call) == Some("structuredClone") {
        return true;
    }
    matches!(
        helpers::callee_member(call),
        Some((obj, "structuredClone")) if helpers::ident_name(obj) == Some("globalThis")
    )
}

fn is_json_round_trip(call: &CallExpr) -> bool {
    let Some((obj, "parse")) = helpers::callee_member(call) else {
        return false;
    };
    if helpers::ident_name(obj) != Some("JSON") {
        return false;
    }
    let Some(first) = call.args.first() else {
        return false;
    };
    if first.spread.is_some() {
        return false;
    }
    let Expr::Call(inner) = first.expr.as_ref() else {
        return false;
    };
    matches!(
        helpers::callee_member(inner),
        Some((inner_obj, "stringify")) if helpers::ident_name(inner_obj) == Some("JSON")
    )
}

impl Rule for DeepCloneInLoop {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        for call in &ctx.analysis.hot_path.call_expressions {
            let code = if is_structured_clone(call) {
                "structuredClone(...)"
            } else if is_json_round_trip(call) {
                "JSON.parse(JSON.stringify(...))"
            } else {
                continue;
            };
            reporter.report(ViolationDetails {
                description: ctx
                    .messages
                    .format("rule.deep-clone-in-loop.message", &[("code", code)]),
                code: Some(code.to_string()),
                suggestions: vec![Suggestion::new(
                    ctx.messages.get("rule.deep-clone-in-loop.suggestion"),
                )],
                span: Some(call.span),
                ..Default::default()
            });
        }
        Ok(())
    }
}
