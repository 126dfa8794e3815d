//! Artifact rendering
//!
//! A grammar is shipped either as Rust source, which embeds the table as a
//! sorted static slice with a lookup function, or as JSON for tools that load
//! grammars at runtime.

use crate::settings::VariantId;
use crate::table::GrammarTable;

const HEADER: &str = "// Code generated by ngxplane generate. DO NOT EDIT.\n";

/// Render `table` as a Rust module.
///
/// Entries come out in byte order of the directive name, which is what the
/// generated binary search relies on.
pub fn render_rust(table: &GrammarTable, id: &VariantId) -> String {
    let const_name = id.const_name();
    let mut out = String::with_capacity(64 * table.len() + 512);

    out.push_str(HEADER);
    out.push('\n');
    out.push_str("use ngxplane_grammar::Symbol;\n");
    out.push_str("use ngxplane_grammar::Symbol::*;\n\n");

    out.push_str(&format!("/// Directive grammar for `{}`\n", id));
    out.push_str(&format!("pub static {}: &[(&str, &[&[Symbol]])] = &[\n", const_name));
    for (name, rules) in table.iter() {
        out.push_str(&format!("    ({:?}, &[\n", name));
        for rule in rules {
            let symbols: Vec<String> = rule.symbols().iter().map(|s| format!("{:?}", s)).collect();
            out.push_str(&format!("        &[{}],\n", symbols.join(", ")));
        }
        out.push_str("    ]),\n");
    }
    out.push_str("];\n\n");

    out.push_str(&format!(
        "/// Rules for `directive`, or `None` when `{}` does not define it\n",
        id
    ));
    out.push_str(&format!(
        "pub fn {}(directive: &str) -> Option<&'static [&'static [Symbol]]> {{\n",
        id.fn_name()
    ));
    out.push_str(&format!("    {}\n", const_name));
    out.push_str("        .binary_search_by(|(name, _)| (*name).cmp(directive))\n");
    out.push_str("        .ok()\n");
    out.push_str(&format!("        .map(|i| {}[i].1)\n", const_name));
    out.push_str("}\n");

    out
}

/// Render `table` as pretty-printed JSON
pub fn render_json(table: &GrammarTable) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(table)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol::{self, *};

    static SAMPLE: &[(&str, &[&[Symbol]])] = &[
        ("server", &[&[HttpMain, Block, NoArgs], &[HttpUpstream, OneMore]]),
        ("if", &[&[HttpServer, HttpLocation, Block, Expr, OneMore]]),
        ("access_log", &[&[HttpMain, HttpServer, OneMore]]),
    ];

    #[test]
    fn test_render_rust() {
        let table = GrammarTable::from_static(SAMPLE);
        let id = VariantId::new("oss", Some("1.27"));
        let code = render_rust(&table, &id);

        assert!(code.starts_with(HEADER));
        assert!(code.contains("pub static OSS_1_27_DIRECTIVES: &[(&str, &[&[Symbol]])] = &["));
        assert!(code.contains("pub fn match_oss_1_27(directive: &str)"));
        assert!(code.contains("        &[HttpServer, HttpLocation, Block, Expr, OneMore],\n"));
        assert!(code.contains(
            "    (\"server\", &[\n        &[HttpMain, Block, NoArgs],\n        &[HttpUpstream, OneMore],\n    ]),\n"
        ));
    }

    #[test]
    fn test_render_lookup_fn() {
        let table = GrammarTable::from_static(SAMPLE);
        let code = render_rust(&table, &VariantId::new("lua", None));
        assert!(code.ends_with(concat!(
            "/// Rules for `directive`, or `None` when `lua` does not define it\n",
            "pub fn match_lua(directive: &str) -> Option<&'static [&'static [Symbol]]> {\n",
            "    LUA_DIRECTIVES\n",
            "        .binary_search_by(|(name, _)| (*name).cmp(directive))\n",
            "        .ok()\n",
            "        .map(|i| LUA_DIRECTIVES[i].1)\n",
            "}\n",
        )));
    }

    #[test]
    fn test_render_rust_sorted_and_stable() {
        let table = GrammarTable::from_static(SAMPLE);
        let id = VariantId::new("oss", None);
        let first = render_rust(&table, &id);
        assert_eq!(first, render_rust(&table.clone(), &id));

        let access = first.find("(\"access_log\"").unwrap();
        let cond = first.find("(\"if\"").unwrap();
        let server = first.find("(\"server\"").unwrap();
        assert!(access < cond && cond < server);
    }

    #[test]
    fn test_render_json() {
        let table = GrammarTable::from_static(SAMPLE);
        let json = render_json(&table).unwrap();
        let back: GrammarTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert!(json.contains("\"expr\""));
    }
}
