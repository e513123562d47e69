//! no-n2-array-lookup: linear array searches inside hot paths.

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::rules::{Rule, RuleError, RuleMetadata, helpers};

const LINEAR_LOOKUP_METHODS: &[&str] = &[
    "find",
    "findIndex",
    "filter",
    "some",
    "every",
    "includes",
    "indexOf",
    "lastIndexOf",
];

declare_rule!(
    N2ArrayLookup,
    name = "no-n2-array-lookup",
    tag = Performance,
    severity = Optimizing,
    description = "Disallow linear array searches on hot paths"
);

impl Rule for N2ArrayLookup {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        for call in &ctx.analysis.hot_path.call_expressions {
            let Some((_, method)) = helpers::callee_member(call) else {
                continue;
            };
            if !LINEAR_LOOKUP_METHODS.contains(&method) {
                continue;
            }
            reporter.report(ViolationDetails {
                description: ctx
                    .messages
                    .format("rule.n2-array-lookup.message", &[("method", method)]),
                code: Some(method.to_string()),
                suggestions: vec![Suggestion::new(
                    ctx.messages.get("rule.n2-array-lookup.suggestion"),
                )],
                span: Some(call.span),
                ..Default::default()
            });
        }
        Ok(())
    }
}
