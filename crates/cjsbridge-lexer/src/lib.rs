//! CommonJS export lexer for cjsbridge.
//!
//! Recovers the export surface of a CommonJS module from its source text
//! alone, without executing it. Two stages: a logos-based tokenizer that
//! strips comments, strings, and template literals down to a flat token
//! stream, and a pattern matcher over that stream that recognizes the
//! imperative export idioms (`exports.x = ...`, `module.exports = {...}`,
//! `Object.defineProperty(exports, ...)`, re-export helpers).
//!
//! This is a static approximation: names assigned through computed keys or
//! aliased exports objects are invisible to it, by design.

pub mod lexer;
pub mod parse;

pub use lexer::{tokenize, Token};
pub use parse::{is_valid_export_name, parse_exports, LexError, ModuleExports};
