//! Export-pattern matcher over the token stream.
//!
//! Walks the tokens produced by [`crate::lexer::tokenize`] and collects the
//! names a CommonJS module assigns to its exports object, plus the specifiers
//! it re-exports wholesale. Recognized forms:
//!
//! - `exports.name = ...` / `module.exports.name = ...`
//! - `exports["name"] = ...` / `module.exports['name'] = ...`
//! - `Object.defineProperty(exports, "name", ...)`
//! - `module.exports = { a, b: ..., "c": ..., d() {} }`
//! - `module.exports = require("spec")`
//! - `Object.assign(module.exports, { ... }, require("spec"), ...)`
//! - `__exportStar(require("spec"), exports)` / `__export(require("spec"))`
//!
//! Names that are not valid, non-reserved ECMAScript identifiers are dropped
//! so downstream synthesis can emit them as bindings without escaping.

use crate::lexer::{tokenize, Token};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use thiserror::Error;
use unicode_xid::UnicodeXID;

/// Errors from export extraction.
///
/// Tokenization itself never fails; the matcher only gives up when a
/// delimiter region it must traverse (object literal, call arguments) is
/// never closed, which indicates source too malformed to trust.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// An object literal or argument list was never closed.
    #[error("unbalanced delimiters in export expression")]
    UnbalancedDelimiters,
}

/// Raw lexical facts extracted from one module's source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleExports {
    /// Directly assigned export names, in source order, deduplicated.
    pub exports: Vec<String>,
    /// Specifiers whose entire export objects are forwarded, in source order.
    pub reexports: Vec<String>,
}

/// Words that can never be static export binding names: ES2015+ keywords,
/// the strict-mode future reserved words, and the strict-mode restricted
/// names `eval` / `arguments` (synthesized modules are always strict).
static RESERVED_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "arguments",
        "await",
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "eval",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "implements",
        "import",
        "in",
        "instanceof",
        "interface",
        "let",
        "new",
        "null",
        "package",
        "private",
        "protected",
        "public",
        "return",
        "static",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` may appear as a static export binding: a valid ECMAScript
/// identifier that is not a reserved word.
pub fn is_valid_export_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let head_ok = first == '$' || first == '_' || first.is_xid_start();
    head_ok
        && chars.all(|c| c == '$' || c.is_xid_continue())
        && !RESERVED_WORDS.contains(name)
}

/// Extract the export names and re-export specifiers from CommonJS source.
pub fn parse_exports(source: &str) -> Result<ModuleExports, LexError> {
    let tokens = tokenize(source);
    let mut exports = Vec::new();
    let mut reexports = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        match_at(&tokens, i, &mut exports, &mut reexports)?;
        i += 1;
    }

    let mut seen = FxHashSet::default();
    exports.retain(|name: &String| is_valid_export_name(name) && seen.insert(name.clone()));

    Ok(ModuleExports { exports, reexports })
}

/// Try every recognized pattern anchored at token `i`.
fn match_at(
    tokens: &[Token],
    i: usize,
    exports: &mut Vec<String>,
    reexports: &mut Vec<String>,
) -> Result<(), LexError> {
    if let Some(after) = exports_head(tokens, i) {
        // exports.name = ... (but not exports.name ==, handled by the lexer
        // keeping comparison operators distinct from Assign)
        if matches!(tokens.get(after), Some(Token::Dot)) {
            if let (Some(name), Some(Token::Assign)) =
                (ident_at(tokens, after + 1), tokens.get(after + 2))
            {
                exports.push(name.to_owned());
            }
        }

        // exports["name"] = ...
        if matches!(tokens.get(after), Some(Token::LBracket)) {
            if let (Some(name), Some(Token::RBracket), Some(Token::Assign)) = (
                str_at(tokens, after + 1),
                tokens.get(after + 2),
                tokens.get(after + 3),
            ) {
                exports.push(name.to_owned());
            }
        }

        // Whole-object assignment only applies to `module.exports = ...`;
        // a bare `exports = ...` rebinds the local and exports nothing.
        let is_module_exports = after == i + 3;
        if is_module_exports && matches!(tokens.get(after), Some(Token::Assign)) {
            let rhs = after + 1;
            if let Some((spec, _)) = require_call(tokens, rhs) {
                reexports.push(spec.to_owned());
            } else if matches!(tokens.get(rhs), Some(Token::LBrace)) {
                object_literal_keys(tokens, rhs, exports)?;
            } else if object_member(tokens, rhs, "assign").is_some() {
                // module.exports = Object.assign(target, sources...)
                let lparen = rhs + 3;
                if matches!(tokens.get(lparen), Some(Token::LParen)) {
                    assign_arguments(tokens, lparen, exports, reexports)?;
                }
            }
        }
    }

    // Object.defineProperty(exports, "name", ...)
    if let Some(lparen) = object_member(tokens, i, "defineProperty") {
        if matches!(tokens.get(lparen), Some(Token::LParen)) {
            if let Some(after_target) = exports_head(tokens, lparen + 1) {
                if let (Some(Token::Comma), Some(name)) =
                    (tokens.get(after_target), str_at(tokens, after_target + 1))
                {
                    exports.push(name.to_owned());
                }
            }
        }
    }

    // Object.assign(module.exports, ...) outside an assignment
    if let Some(lparen) = object_member(tokens, i, "assign") {
        if matches!(tokens.get(lparen), Some(Token::LParen)) {
            if let Some(after_target) = exports_head(tokens, lparen + 1) {
                if matches!(tokens.get(after_target), Some(Token::Comma)) {
                    assign_arguments(tokens, lparen, exports, reexports)?;
                }
            }
        }
    }

    // __exportStar(require("spec"), exports) and the older __export form
    // emitted by the TypeScript CJS transform, bare or via the tslib import.
    if let Some(helper) = ident_at(tokens, i) {
        if helper == "__exportStar" || helper == "__export" {
            let qualified_ok = match prev_token(tokens, i) {
                Some(Token::Dot) => {
                    i >= 2 && ident_at(tokens, i - 2).is_some_and(|q| q.contains("tslib"))
                }
                _ => true,
            };
            if qualified_ok && matches!(tokens.get(i + 1), Some(Token::LParen)) {
                if let Some((spec, _)) = require_call(tokens, i + 2) {
                    reexports.push(spec.to_owned());
                }
            }
        }
    }

    Ok(())
}

/// Match `exports` or `module.exports` anchored at `i`, rejecting member
/// tails like `foo.exports`. Returns the index just past the matched head.
fn exports_head(tokens: &[Token], i: usize) -> Option<usize> {
    if matches!(prev_token(tokens, i), Some(Token::Dot)) {
        return None;
    }
    match ident_at(tokens, i)? {
        "exports" => Some(i + 1),
        "module"
            if matches!(tokens.get(i + 1), Some(Token::Dot))
                && ident_at(tokens, i + 2) == Some("exports") =>
        {
            Some(i + 3)
        }
        _ => None,
    }
}

/// Match `Object.<member>` anchored at `i`; returns the index of the token
/// after the member name (the expected `(`).
fn object_member(tokens: &[Token], i: usize, member: &str) -> Option<usize> {
    if matches!(prev_token(tokens, i), Some(Token::Dot)) {
        return None;
    }
    (ident_at(tokens, i) == Some("Object")
        && matches!(tokens.get(i + 1), Some(Token::Dot))
        && ident_at(tokens, i + 2) == Some(member))
    .then_some(i + 3)
}

/// Match `require("spec")` anchored at `i`; returns the specifier and the
/// index just past the closing paren.
fn require_call(tokens: &[Token], i: usize) -> Option<(&str, usize)> {
    if ident_at(tokens, i) == Some("require")
        && matches!(tokens.get(i + 1), Some(Token::LParen))
        && matches!(tokens.get(i + 3), Some(Token::RParen))
    {
        str_at(tokens, i + 2).map(|spec| (spec, i + 4))
    } else {
        None
    }
}

/// Collect keys from an object literal starting at `at` (the `{`).
/// Returns the index just past the matching `}`.
fn object_literal_keys(
    tokens: &[Token],
    at: usize,
    exports: &mut Vec<String>,
) -> Result<usize, LexError> {
    let mut i = at + 1;
    loop {
        match tokens.get(i) {
            None => return Err(LexError::UnbalancedDelimiters),
            Some(Token::RBrace) => return Ok(i + 1),
            Some(Token::Comma) => i += 1,
            _ => {
                let key = ident_at(tokens, i).or_else(|| str_at(tokens, i));
                match (key, tokens.get(i + 1)) {
                    // key: value
                    (Some(name), Some(Token::Colon)) => {
                        exports.push(name.to_owned());
                        i = skip_value(tokens, i + 2)?;
                    }
                    // shorthand
                    (Some(name), Some(Token::Comma) | Some(Token::RBrace)) => {
                        exports.push(name.to_owned());
                        i += 1;
                    }
                    // method shorthand: name(params) { body }
                    (Some(name), Some(Token::LParen)) => {
                        exports.push(name.to_owned());
                        i = skip_balanced(tokens, i + 1, &Token::LParen, &Token::RParen)?;
                        if matches!(tokens.get(i), Some(Token::LBrace)) {
                            i = skip_balanced(tokens, i, &Token::LBrace, &Token::RBrace)?;
                        }
                    }
                    // spread, computed key, getter/setter - skip the entry
                    _ => i = skip_value(tokens, i)?,
                }
            }
        }
    }
}

/// Collect export names and re-export specifiers from the argument list of an
/// `Object.assign` call whose target is the exports object. `at` is the `(`.
fn assign_arguments(
    tokens: &[Token],
    at: usize,
    exports: &mut Vec<String>,
    reexports: &mut Vec<String>,
) -> Result<(), LexError> {
    let mut depth = 1usize;
    let mut i = at + 1;
    while depth > 0 {
        match tokens.get(i) {
            None => return Err(LexError::UnbalancedDelimiters),
            Some(Token::LParen) | Some(Token::LBracket) => {
                depth += 1;
                i += 1;
            }
            Some(Token::RParen) | Some(Token::RBracket) => {
                depth -= 1;
                i += 1;
            }
            Some(Token::LBrace) if depth == 1 => {
                i = object_literal_keys(tokens, i, exports)?;
            }
            Some(Token::LBrace) => {
                depth += 1;
                i += 1;
            }
            Some(Token::RBrace) => {
                depth -= 1;
                i += 1;
            }
            Some(_) => {
                if depth == 1 {
                    if let Some((spec, next)) = require_call(tokens, i) {
                        reexports.push(spec.to_owned());
                        i = next;
                        continue;
                    }
                }
                i += 1;
            }
        }
    }
    Ok(())
}

/// Skip one value expression inside an object literal: everything up to the
/// next `,` or `}` at the entry's own nesting depth. Returns the index of
/// that delimiter.
fn skip_value(tokens: &[Token], mut i: usize) -> Result<usize, LexError> {
    let mut depth = 0usize;
    loop {
        match tokens.get(i) {
            None => return Err(LexError::UnbalancedDelimiters),
            Some(Token::Comma) | Some(Token::RBrace) if depth == 0 => return Ok(i),
            Some(Token::LParen) | Some(Token::LBracket) | Some(Token::LBrace) => {
                depth += 1;
                i += 1;
            }
            Some(Token::RParen) | Some(Token::RBracket) | Some(Token::RBrace) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(LexError::UnbalancedDelimiters)?;
                i += 1;
            }
            Some(_) => i += 1,
        }
    }
}

/// Skip a balanced `open ... close` region starting at `at` (the opener).
/// Returns the index just past the closer.
fn skip_balanced(
    tokens: &[Token],
    at: usize,
    open: &Token,
    close: &Token,
) -> Result<usize, LexError> {
    debug_assert_eq!(tokens.get(at), Some(open));
    let mut depth = 0usize;
    let mut i = at;
    loop {
        match tokens.get(i) {
            None => return Err(LexError::UnbalancedDelimiters),
            Some(t) if t == open => {
                depth += 1;
                i += 1;
            }
            Some(t) if t == close => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            Some(_) => i += 1,
        }
    }
}

fn ident_at(tokens: &[Token], i: usize) -> Option<&str> {
    match tokens.get(i) {
        Some(Token::Ident(name)) => Some(name),
        _ => None,
    }
}

fn str_at(tokens: &[Token], i: usize) -> Option<&str> {
    match tokens.get(i) {
        Some(Token::Str(value)) => Some(value),
        _ => None,
    }
}

fn prev_token(tokens: &[Token], i: usize) -> Option<&Token> {
    if i == 0 {
        None
    } else {
        tokens.get(i - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exports_of(source: &str) -> Vec<String> {
        parse_exports(source).unwrap().exports
    }

    fn reexports_of(source: &str) -> Vec<String> {
        parse_exports(source).unwrap().reexports
    }

    #[test]
    fn property_assignments() {
        let src = "exports.foo = 1;\nmodule.exports.bar = function () {};\n";
        assert_eq!(exports_of(src), vec!["foo", "bar"]);
    }

    #[test]
    fn bracket_assignments() {
        let src = "exports['alpha'] = 1; module.exports[\"beta\"] = 2;";
        assert_eq!(exports_of(src), vec!["alpha", "beta"]);
    }

    #[test]
    fn define_property() {
        let src = "Object.defineProperty(exports, 'gamma', { get() { return 1; } });";
        assert_eq!(exports_of(src), vec!["gamma"]);
        let src = "Object.defineProperty(module.exports, \"delta\", { value: 2 });";
        assert_eq!(exports_of(src), vec!["delta"]);
    }

    #[test]
    fn object_literal_assignment() {
        let src = r#"module.exports = {
            shorthand,
            keyed: compute(1, 2),
            'quoted': true,
            method(a, b) { return { nested: a }; },
        };"#;
        assert_eq!(
            exports_of(src),
            vec!["shorthand", "keyed", "quoted", "method"]
        );
    }

    #[test]
    fn object_literal_skips_computed_and_spread() {
        let src = "module.exports = { [key]: 1, ...rest, ok: 2 };";
        assert_eq!(exports_of(src), vec!["ok"]);
    }

    #[test]
    fn whole_object_reexport() {
        assert_eq!(reexports_of("module.exports = require('./other');"), vec![
            "./other"
        ]);
    }

    #[test]
    fn object_assign_reexports_and_names() {
        let src = "Object.assign(module.exports, { a: 1 }, require('dep'), require('./b'));";
        assert_eq!(exports_of(src), vec!["a"]);
        assert_eq!(reexports_of(src), vec!["dep", "./b"]);
    }

    #[test]
    fn module_exports_object_assign() {
        let src = "module.exports = Object.assign({ x: 1 }, require('y'));";
        assert_eq!(exports_of(src), vec!["x"]);
        assert_eq!(reexports_of(src), vec!["y"]);
    }

    #[test]
    fn typescript_export_star_helpers() {
        assert_eq!(
            reexports_of("__exportStar(require(\"./impl\"), exports);"),
            vec!["./impl"]
        );
        assert_eq!(reexports_of("__export(require('./legacy'));"), vec![
            "./legacy"
        ]);
        assert_eq!(
            reexports_of("tslib_1.__exportStar(require('./ts'), exports);"),
            vec!["./ts"]
        );
    }

    #[test]
    fn member_tails_are_not_heads() {
        // `foo.exports.x = 1` is not an export; `other.__exportStar(...)` is
        // not the tslib helper.
        assert!(exports_of("foo.exports.x = 1;").is_empty());
        assert!(reexports_of("custom.__exportStar(require('./x'), exports);").is_empty());
    }

    #[test]
    fn comparison_is_not_assignment() {
        assert!(exports_of("if (exports.foo === 1) {}").is_empty());
        assert!(exports_of("exports.foo == bar;").is_empty());
    }

    #[test]
    fn matches_inside_strings_and_comments_ignored() {
        let src = r#"
            // exports.commented = 1
            /* exports.blocked = 2 */
            var s = "exports.stringed = 3";
            var t = `exports.templated = ${4}`;
            exports.real = 5;
        "#;
        assert_eq!(exports_of(src), vec!["real"]);
    }

    #[test]
    fn invalid_and_reserved_names_dropped() {
        let src = r#"
            exports['not-an-ident'] = 1;
            exports['has space'] = 2;
            exports['default'] = 3;
            exports['0leading'] = 4;
            exports.valid$_ = 5;
        "#;
        assert_eq!(exports_of(src), vec!["valid$_"]);
    }

    #[test]
    fn duplicates_deduplicated_in_order() {
        let src = "exports.a = 1; exports.b = 2; exports.a = 3;";
        assert_eq!(exports_of(src), vec!["a", "b"]);
    }

    #[test]
    fn bare_exports_rebind_is_not_a_reexport() {
        assert!(reexports_of("exports = require('./nope');").is_empty());
    }

    #[test]
    fn unbalanced_object_literal_is_an_error() {
        let src = "module.exports = { a: 1, ";
        assert_eq!(
            parse_exports(src),
            Err(LexError::UnbalancedDelimiters)
        );
    }

    #[test]
    fn empty_source() {
        assert_eq!(parse_exports(""), Ok(ModuleExports::default()));
    }

    #[test]
    fn valid_export_name_rules() {
        assert!(is_valid_export_name("foo"));
        assert!(is_valid_export_name("_private"));
        assert!(is_valid_export_name("$dollar"));
        assert!(is_valid_export_name("__esModule"));
        assert!(!is_valid_export_name(""));
        assert!(!is_valid_export_name("default"));
        assert!(!is_valid_export_name("class"));
        assert!(!is_valid_export_name("eval"));
        assert!(!is_valid_export_name("arguments"));
        assert!(!is_valid_export_name("1abc"));
        assert!(!is_valid_export_name("a-b"));
    }
}
