//! Shared helpers for rule implementations.

use swc_ecma_ast::{CallExpr, Callee, Expr, ExprOrSpread, Lit, NewExpr};

pub use crate::analysis::member_prop_name;

/// Callee identifier name of a plain `name(...)` call.
pub fn callee_ident_name(call: &CallExpr) -> Option<&str> {
    let Callee::Expr(expr) = &call.callee else {
        return None;
    };
    match expr.as_ref() {
        Expr::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

/// Object expression and property name of a `obj.prop(...)` call.
pub fn callee_member(call: &CallExpr) -> Option<(&Expr, &str)> {
    let Callee::Expr(expr) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = expr.as_ref() else {
        return None;
    };
    Some((member.obj.as_ref(), member_prop_name(&member.prop)?))
}

/// Identifier name of a member-expression object, when it is one.
pub fn ident_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

/// Callee identifier of `new Name(...)`.
pub fn new_callee_ident_name(new_expr: &NewExpr) -> Option<&str> {
    ident_name(new_expr.callee.as_ref())
}

/// First argument as a statically known string: a string literal, or a
/// template literal without interpolation.
pub fn static_string_arg(args: &[ExprOrSpread]) -> Option<String> {
    let first = args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match first.expr.as_ref() {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            tpl.quasis.first().map(|q| q.raw.to_string())
        }
        _ => None,
    }
}

/// 1-based number of the first source line containing every needle.
pub fn line_containing_all(source: &str, needles: &[&str]) -> Option<usize> {
    source
        .lines()
        .position(|line| needles.iter().all(|needle| line.contains(needle)))
        .map(|idx| idx + 1)
}

/// 1-based number of the first line at or after `from_line` containing the
/// keyword. Used to steer span-derived lines past leading comments.
pub fn keyword_line_at_or_after(source: &str, from_line: usize, keyword: &str) -> Option<usize> {
    let start = from_line.saturating_sub(1);
    source
        .lines()
        .enumerate()
        .skip(start)
        .find(|(_, line)| line.contains(keyword))
        .map(|(idx, _)| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse_source;

    fn hot_calls(source: &str) -> Vec<CallExpr> {
        let parsed = parse_source("t.ts", source).unwrap();
        analyze(&parsed.module).hot_path.call_expressions
    }

    #[test]
    fn callee_shapes() {
        let calls = hot_calls("for (;;) { plain(); obj.method(); JSON.parse(x); }");
        assert_eq!(callee_ident_name(&calls[0]), Some("plain"));
        let (obj, prop) = callee_member(&calls[1]).unwrap();
        assert_eq!(ident_name(obj), Some("obj"));
        assert_eq!(prop, "method");
        let (obj, prop) = callee_member(&calls[2]).unwrap();
        assert_eq!(ident_name(obj), Some("JSON"));
        assert_eq!(prop, "parse");
    }

    #[test]
    fn static_string_arg_accepts_literals_and_plain_templates() {
        let calls = hot_calls("for (;;) { f('abc'); f(`xyz`); f(`a${b}`); f(v); }");
        assert_eq!(static_string_arg(&calls[0].args), Some("abc".into()));
        assert_eq!(static_string_arg(&calls[1].args), Some("xyz".into()));
        assert_eq!(static_string_arg(&calls[2].args), None);
        assert_eq!(static_string_arg(&calls[3].args), None);
    }

    #[test]
    fn line_containing_all_finds_first_match() {
        let source = "// import nothing\nimport { x } from './x';\n";
        assert_eq!(line_containing_all(source, &["import", "./x"]), Some(2));
        assert_eq!(line_containing_all(source, &["import", "./y"]), None);
    }

    #[test]
    fn keyword_line_searches_forward_only() {
        let source = "try {\n  work();\n} catch (e) {\n}\n";
        assert_eq!(keyword_line_at_or_after(source, 1, "catch"), Some(3));
        assert_eq!(keyword_line_at_or_after(source, 4, "catch"), None);
    }
}
