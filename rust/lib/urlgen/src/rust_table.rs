//! Rust URL table built on `pmp_query`.
//!
//! Every directory becomes a `pub mod`, every page a function returning its
//! `PageUrl` or `PageQueryUrl`. Page and directory names are snake-cased.
//! `cStringUnion(toGenre)` and custom codecs such as `cGenre` resolve to
//! `<decoders>::to_genre` and `<decoders>::c_genre()` respectively.

use std::collections::HashMap;

use heck::ToSnakeCase;

use crate::error::GenError;
use crate::ir::{CodecExpr, PageNode, QueryDecl, pathname};
use crate::Codegen;

const INDENT: &str = "    ";

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

pub struct RustTableGenerator {
    /// Path of the module holding caller-defined decoders and codecs.
    pub decoders_path: String,
}

impl Default for RustTableGenerator {
    fn default() -> Self {
        Self {
            decoders_path: "crate::decoders".to_string(),
        }
    }
}

impl Codegen for RustTableGenerator {
    fn generate(&self, pages: &[PageNode]) -> Result<String, GenError> {
        let mut out = String::new();
        out.push_str("//! @generated by generate-url. Do not edit.\n\n");
        out.push_str("#[allow(unused_imports)]\n");
        out.push_str(
            "use pmp_query::{\n    CArray, CBool, CInt, CNat, CPk, CString, CStringUnion, CTimestamp, CType, PageQueryUrl,\n    PageUrl, QueryDefinition,\n};\n",
        );
        self.emit_nodes(&mut out, pages, &[], 0)?;
        Ok(out)
    }

    fn language(&self) -> &str {
        "rust"
    }
}

impl RustTableGenerator {
    fn emit_nodes(
        &self,
        out: &mut String,
        nodes: &[PageNode],
        parents: &[&str],
        depth: usize,
    ) -> Result<(), GenError> {
        let pad = INDENT.repeat(depth);
        let mut seen: HashMap<String, &str> = HashMap::new();
        for node in nodes {
            let ident = rust_ident(node.name());
            if let Some(first) = seen.insert(ident.clone(), node.name()) {
                return Err(GenError::NameClash {
                    ident,
                    first: first.to_string(),
                    second: node.name().to_string(),
                });
            }

            out.push('\n');
            match node {
                PageNode::Page(page) => {
                    let path = pathname(parents, node);
                    out.push_str(&format!("{}/// `{}`\n", pad, path));
                    match &page.query {
                        None => {
                            out.push_str(&format!(
                                "{pad}pub const fn {ident}() -> PageUrl {{\n{pad}{INDENT}PageUrl::new({path:?})\n{pad}}}\n"
                            ));
                        }
                        Some(query) => {
                            let definition = self.definition(query, &path, depth + 2)?;
                            out.push_str(&format!(
                                "{pad}pub fn {ident}() -> PageQueryUrl {{\n{pad}{INDENT}PageQueryUrl::new(\n{pad}{INDENT}{INDENT}{path:?},\n{definition}\n{pad}{INDENT})\n{pad}}}\n"
                            ));
                        }
                    }
                }
                PageNode::Dir(dir) => {
                    out.push_str(&format!("{pad}pub mod {ident} {{\n"));
                    out.push_str(&format!("{pad}{INDENT}#[allow(unused_imports)]\n"));
                    out.push_str(&format!("{pad}{INDENT}use super::*;\n"));
                    let mut nested = parents.to_vec();
                    nested.push(node.segment());
                    self.emit_nodes(out, &dir.children, &nested, depth + 1)?;
                    out.push_str(&format!("{pad}}}\n"));
                }
            }
        }
        Ok(())
    }

    fn definition(&self, query: &QueryDecl, path: &str, depth: usize) -> Result<String, GenError> {
        let pad = INDENT.repeat(depth);
        let mut lines = vec![format!("{pad}QueryDefinition::builder()")];
        for field in &query.fields {
            let codec = self.codec(&field.codec, path)?;
            lines.push(format!("{pad}{INDENT}.field({:?}, {})", field.name, codec));
        }
        lines.push(format!("{pad}{INDENT}.build(),"));
        Ok(lines.join("\n"))
    }

    fn codec(&self, expr: &CodecExpr, path: &str) -> Result<String, GenError> {
        Ok(match expr {
            CodecExpr::String => "CString".to_string(),
            CodecExpr::Type => "CType".to_string(),
            CodecExpr::Int => "CInt".to_string(),
            CodecExpr::Nat => "CNat".to_string(),
            CodecExpr::Bool => "CBool".to_string(),
            CodecExpr::Moment => "CTimestamp".to_string(),
            CodecExpr::Pk => "CPk".to_string(),
            CodecExpr::Array(inner) => format!("CArray::new({})", self.codec(inner, path)?),
            CodecExpr::StringUnion(decoder) => {
                if !is_js_ident(decoder) {
                    return Err(GenError::Untranslatable {
                        page: path.to_string(),
                        expr: decoder.clone(),
                    });
                }
                format!(
                    "CStringUnion::new({}::{})",
                    self.decoders_path,
                    rust_ident(decoder)
                )
            }
            CodecExpr::Custom(name) => format!("{}::{}()", self.decoders_path, rust_ident(name)),
        })
    }
}

fn is_js_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Snake-cased, keyword-safe identifier for a page, directory or decoder.
fn rust_ident(name: &str) -> String {
    let snake = name.to_snake_case();
    let snake = match snake.chars().next() {
        None => "page".to_string(),
        Some(c) if c.is_ascii_digit() => format!("page_{}", snake),
        Some(_) => snake,
    };
    match snake.as_str() {
        "self" | "super" | "crate" => format!("{}_", snake),
        s if KEYWORDS.contains(&s) => format!("r#{}", snake),
        _ => snake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Dir, Page, QueryField};

    fn page(name: &str) -> PageNode {
        PageNode::Page(Page {
            name: name.into(),
            query: None,
        })
    }

    fn query_page(name: &str, fields: Vec<(&str, CodecExpr)>) -> PageNode {
        PageNode::Page(Page {
            name: name.into(),
            query: Some(QueryDecl {
                source: String::new(),
                fields: fields
                    .into_iter()
                    .map(|(name, codec)| QueryField {
                        name: name.into(),
                        codec,
                    })
                    .collect(),
            }),
        })
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    #[test]
    fn identifiers() {
        assert_eq!(rust_ident("signIn"), "sign_in");
        assert_eq!(rust_ident("[id]"), "id");
        assert_eq!(rust_ident("404"), "page_404");
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
        assert_eq!(rust_ident("toGenre"), "to_genre");
    }

    // ========================================================================
    // Emission
    // ========================================================================

    #[test]
    fn plain_and_nested_pages() {
        let pages = vec![
            page("index"),
            PageNode::Dir(Dir {
                name: "sign".into(),
                children: vec![page("signIn")],
            }),
        ];
        let out = RustTableGenerator::default().generate(&pages).unwrap();
        assert!(out.starts_with("//! @generated"));
        assert!(out.contains("pub const fn index() -> PageUrl {\n    PageUrl::new(\"/\")\n}\n"));
        assert!(out.contains("pub mod sign {\n"));
        assert!(out.contains(
            "    /// `/sign/signIn`\n    pub const fn sign_in() -> PageUrl {\n        PageUrl::new(\"/sign/signIn\")\n    }\n"
        ));
    }

    #[test]
    fn query_pages_build_definitions() {
        let pages = vec![query_page(
            "scene",
            vec![
                ("category", CodecExpr::String),
                ("page", CodecExpr::Nat),
                (
                    "genres",
                    CodecExpr::Array(Box::new(CodecExpr::StringUnion("toGenre".into()))),
                ),
                ("kind", CodecExpr::Custom("cKind".into())),
            ],
        )];
        let out = RustTableGenerator::default().generate(&pages).unwrap();
        assert!(out.contains("pub fn scene() -> PageQueryUrl {"));
        assert!(out.contains("            .field(\"category\", CString)\n"));
        assert!(out.contains("            .field(\"page\", CNat)\n"));
        assert!(out.contains(
            "            .field(\"genres\", CArray::new(CStringUnion::new(crate::decoders::to_genre)))\n"
        ));
        assert!(out.contains("            .field(\"kind\", crate::decoders::c_kind())\n"));
        assert!(out.contains("            .build(),\n    )\n}\n"));
    }

    #[test]
    fn decoder_path_is_configurable() {
        let pages = vec![query_page(
            "scene",
            vec![("g", CodecExpr::StringUnion("toGenre".into()))],
        )];
        let generator = RustTableGenerator {
            decoders_path: "app::enums".into(),
        };
        let out = generator.generate(&pages).unwrap();
        assert!(out.contains("CStringUnion::new(app::enums::to_genre)"));
    }

    #[test]
    fn inline_decoder_expression_is_rejected() {
        let pages = vec![query_page(
            "scene",
            vec![("g", CodecExpr::StringUnion("createToStringEnum([\"A\"])".into()))],
        )];
        let err = RustTableGenerator::default().generate(&pages).unwrap_err();
        assert!(matches!(err, GenError::Untranslatable { .. }));
        assert!(err.to_string().contains("/scene"));
    }

    #[test]
    fn clashing_names_are_rejected() {
        let pages = vec![page("sign_in"), page("signIn")];
        let err = RustTableGenerator::default().generate(&pages).unwrap_err();
        assert!(matches!(err, GenError::NameClash { .. }));
    }
}
