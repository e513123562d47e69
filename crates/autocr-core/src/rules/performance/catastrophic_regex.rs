//! no-catastrophic-regex: nested unbounded quantifiers in hot-path regular
//! expressions.
//!
//! The scanner walks the pattern with a group stack: a leaf token followed
//! by an unbounded quantifier marks its enclosing group, and a group that
//! both contains such a token and carries an unbounded quantifier itself is
//! reported. Bounded quantifiers like `{1,3}` never trigger.

use swc_ecma_ast::NewExpr;

use crate::context::RuleContext;
use crate::declare_rule;
use crate::reporter::{ScopedReporter, Suggestion, ViolationDetails};
use crate::rules::{Rule, RuleError, RuleMetadata, helpers};

declare_rule!(
    CatastrophicRegex,
    name = "no-catastrophic-regex",
    tag = Performance,
    severity = Optimizing,
    description = "Disallow regular expressions with nested unbounded quantifiers on hot paths"
);

#[derive(Debug, Clone, Copy)]
struct Quantifier {
    unbounded: bool,
}

/// Read a quantifier starting at `i`, including the optional trailing
/// lazy/possessive marker. Returns the quantifier (if any) and the index
/// after it.
fn read_quantifier(chars: &[char], i: usize) -> (Option<Quantifier>, usize) {
    match chars.get(i) {
        Some('*') | Some('+') => (Some(Quantifier { unbounded: true }), skip_marker(chars, i + 1)),
        Some('?') => (
            Some(Quantifier { unbounded: false }),
            skip_marker(chars, i + 1),
        ),
        Some('{') => read_braced_quantifier(chars, i),
        _ => (None, i),
    }
}

fn skip_marker(chars: &[char], i: usize) -> usize {
    match chars.get(i) {
        Some('?') | Some('+') => i + 1,
        _ => i,
    }
}

fn read_braced_quantifier(chars: &[char], start: usize) -> (Option<Quantifier>, usize) {
    let mut i = start + 1;
    let lower_start = i;
    while chars.get(i).is_some_and(char::is_ascii_digit) {
        i += 1;
    }
    if i == lower_start {
        // `{` without digits is a literal brace
        return (None, start);
    }
    let mut has_comma = false;
    let mut upper_digits = 0;
    if chars.get(i) == Some(&',') {
        has_comma = true;
        i += 1;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            upper_digits += 1;
            i += 1;
        }
    }
    if chars.get(i) != Some(&'}') {
        return (None, start);
    }
    let unbounded = has_comma && upper_digits == 0;
    (Some(Quantifier { unbounded }), skip_marker(chars, i + 1))
}

/// Consume the quantifier following a leaf token and mark the enclosing
/// group when it is unbounded.
fn mark_leaf(chars: &[char], i: usize, stack: &mut [bool]) -> usize {
    let (quantifier, next) = read_quantifier(chars, i);
    if quantifier.is_some_and(|q| q.unbounded) {
        if let Some(top) = stack.last_mut() {
            *top = true;
        }
    }
    next
}

pub(crate) fn has_nested_unbounded_quantifier(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut stack: Vec<bool> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_class {
            match c {
                '\\' => i += 2,
                ']' => {
                    in_class = false;
                    i = mark_leaf(&chars, i + 1, &mut stack);
                }
                _ => i += 1,
            }
            continue;
        }
        match c {
            '\\' => {
                i = mark_leaf(&chars, i + 2, &mut stack);
            }
            '[' => {
                in_class = true;
                i += 1;
            }
            '(' => {
                stack.push(false);
                i += 1;
            }
            ')' => {
                let frame_has_unbounded = stack.pop().unwrap_or(false);
                let (quantifier, next) = read_quantifier(&chars, i + 1);
                i = next.max(i + 1);
                if quantifier.is_some_and(|q| q.unbounded) {
                    if frame_has_unbounded {
                        return true;
                    }
                    if let Some(top) = stack.last_mut() {
                        *top = true;
                    }
                }
            }
            _ => {
                i = mark_leaf(&chars, i + 1, &mut stack);
            }
        }
    }
    false
}

impl Rule for CatastrophicRegex {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError> {
        let mut report = |pattern: &str, span: swc_common::Span| {
            if !has_nested_unbounded_quantifier(pattern) {
                return;
            }
            reporter.report(ViolationDetails {
                description: ctx
                    .messages
                    .format("rule.catastrophic-regex.message", &[("pattern", pattern)]),
                code: Some(pattern.to_string()),
                suggestions: vec![Suggestion::new(
                    ctx.messages.get("rule.catastrophic-regex.suggestion"),
                )],
                span: Some(span),
                ..Default::default()
            });
        };

        for regex in &ctx.analysis.hot_path.regexp_literals {
            report(regex.exp.as_ref(), regex.span);
        }
        for call in &ctx.analysis.hot_path.call_expressions {
            if helpers::callee_ident_name(call) == Some("RegExp") {
                if let Some(pattern) = helpers::static_string_arg(&call.args) {
                    report(&pattern, call.span);
                }
            }
        }
        for new_expr in &ctx.analysis.hot_path.new_expressions {
            if let Some(pattern) = new_regexp_pattern(new_expr) {
                report(&pattern, new_expr.span);
            }
        }
        Ok(())
    }
}

fn new_regexp_pattern(new_expr: &NewExpr) -> Option<String> {
    if helpers::new_callee_ident_name(new_expr) != Some("RegExp") {
        return None;
    }
    helpers::static_string_arg(new_expr.args.as_deref()?)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::analyze;
    use crate::messages::{Locale, MessageCatalog};
    use crate::parser::parse_source;
    use crate::reporter::{FileReporter, Severity, Violation};
    use crate::resolver::Resolver;
    use crate::source_index::SourceIndex;

    fn run_rule(source: &str) -> Vec<Violation> {
        let parsed = parse_source("/proj/src/a.ts", source).unwrap();
        let analysis = analyze(&parsed.module);
        let index = SourceIndex::new(&parsed.source, parsed.module_start);
        let catalog = MessageCatalog::for_locale(Locale::En);
        let resolver = Resolver::new(Path::new("/proj"), None);
        let ctx = RuleContext {
            module: &parsed.module,
            file_path: Path::new("/proj/src/a.ts"),
            source: &parsed.source,
            analysis: &analysis,
            source_index: &index,
            messages: &catalog,
            resolver: &resolver,
        };
        let rule = CatastrophicRegex::new();
        let mut reporter = FileReporter::new("/proj/src/a.ts");
        {
            let meta = rule.metadata();
            let mut scoped = reporter.for_rule(meta.name, meta.tag.as_str(), meta.severity, &index);
            rule.run(&ctx, &mut scoped).unwrap();
        }
        reporter.flush().violations
    }

    #[test]
    fn scanner_detects_nested_plus() {
        assert!(has_nested_unbounded_quantifier("(a+)+"));
        assert!(has_nested_unbounded_quantifier("(a+)+$"));
        assert!(has_nested_unbounded_quantifier("(a*)*"));
        assert!(has_nested_unbounded_quantifier("(.*)+"));
        assert!(has_nested_unbounded_quantifier("(a{1,})*"));
    }

    #[test]
    fn scanner_handles_classes_and_escapes() {
        assert!(has_nested_unbounded_quantifier("([a-z]+)+"));
        assert!(has_nested_unbounded_quantifier(r"(\d+)*"));
        // the + inside the class is a literal
        assert!(!has_nested_unbounded_quantifier("([+])+"));
    }

    #[test]
    fn scanner_accepts_bounded_quantifiers() {
        assert!(!has_nested_unbounded_quantifier("(a+){1,3}"));
        assert!(!has_nested_unbounded_quantifier("(a{2,4})+"));
        assert!(!has_nested_unbounded_quantifier("(a?)+"));
        assert!(!has_nested_unbounded_quantifier("[a-z]+@[a-z]+"));
        assert!(!has_nested_unbounded_quantifier("(abc)+"));
    }

    #[test]
    fn scanner_handles_lazy_and_possessive_markers() {
        assert!(has_nested_unbounded_quantifier("(a+?)+"));
        assert!(has_nested_unbounded_quantifier("(a++)+"));
        assert!(has_nested_unbounded_quantifier("(a+)*?"));
    }

    #[test]
    fn hot_regex_literal_is_reported() {
        let violations = run_rule("for (const s of xs) { /(a+)+$/.test(s); }");
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.rule_name, "no-catastrophic-regex");
        assert_eq!(v.severity, Severity::Optimizing);
        assert_eq!(v.code.as_deref(), Some("(a+)+$"));
    }

    #[test]
    fn cold_regex_literal_is_ignored() {
        let violations = run_rule("const re = /(a+)+$/;");
        assert!(violations.is_empty());
    }

    #[test]
    fn regexp_constructor_in_loop_is_reported() {
        let violations = run_rule("while (next()) { const re = new RegExp('(a+)+'); }");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code.as_deref(), Some("(a+)+"));
    }

    #[test]
    fn regexp_call_with_template_is_reported() {
        let violations = run_rule("items.map(s => RegExp(`(.*)+`).test(s));");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn regexp_with_dynamic_pattern_is_ignored() {
        let violations = run_rule("for (const s of xs) { new RegExp(s).test(s); }");
        assert!(violations.is_empty());
    }

    #[test]
    fn benign_hot_regex_is_ignored() {
        let violations = run_rule("for (const s of xs) { /^[a-z]+$/.test(s); }");
        assert!(violations.is_empty());
    }
}
