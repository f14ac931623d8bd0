//! Synthetic ES module synthesis.
//!
//! Turns a resolved export-name set into replacement ES module source: the
//! real CommonJS namespace object is imported under a private binding from
//! the `?cjsoriginal`-marked variant of the module's own address (which the
//! loader routes back to the untouched file), each discovered name becomes an
//! immutable `const` binding off that object, and the whole object is
//! re-exported as the default binding.

use indexmap::IndexSet;

use crate::loader::ORIGINAL_MARKER;

/// Produce ES module source republishing `names` from the module at
/// `module_url`.
///
/// With names `a, b` the output is:
///
/// ```text
/// import exports from '<module_url>?cjsoriginal';
/// export const a = exports.a, b = exports.b;
/// export default exports;
/// ```
///
/// An empty name set emits only the import and the default export. Names are
/// emitted verbatim: the extractor guarantees they are valid, non-reserved
/// identifiers, so no escaping is performed here.
pub fn synthesize(module_url: &str, names: &IndexSet<String>) -> String {
    let mut source = format!("import exports from '{module_url}{ORIGINAL_MARKER}';\n");

    if !names.is_empty() {
        source.push_str("export const ");
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                source.push_str(", ");
            }
            source.push_str(name);
            source.push_str(" = exports.");
            source.push_str(name);
        }
        source.push_str(";\n");
    }

    source.push_str("export default exports;\n");
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn named_bindings_and_default() {
        let source = synthesize("file:///mod.js", &set(&["a", "b"]));
        assert_eq!(
            source,
            "import exports from 'file:///mod.js?cjsoriginal';\n\
             export const a = exports.a, b = exports.b;\n\
             export default exports;\n"
        );
    }

    #[test]
    fn empty_set_emits_default_only() {
        let source = synthesize("file:///mod.js", &set(&[]));
        assert_eq!(
            source,
            "import exports from 'file:///mod.js?cjsoriginal';\n\
             export default exports;\n"
        );
    }

    #[test]
    fn single_name() {
        let source = synthesize("file:///x.cjs", &set(&["only"]));
        assert!(source.contains("export const only = exports.only;\n"));
    }

    #[test]
    fn preserves_discovery_order() {
        let source = synthesize("file:///m.js", &set(&["z", "a", "m"]));
        assert!(source.contains("z = exports.z, a = exports.a, m = exports.m"));
    }
}
