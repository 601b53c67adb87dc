//! TypeScript URL table (`url.g.ts`).

use crate::error::GenError;
use crate::ir::{PageNode, pathname};
use crate::Codegen;

const INDENT: &str = "  ";

pub struct TypeScriptGenerator {
    /// Module exporting `PageUrl` / `PageQueryUrl`.
    pub url_module: String,
    /// Module exporting `defineQuery` and the codecs.
    pub query_module: String,
}

impl Default for TypeScriptGenerator {
    fn default() -> Self {
        Self {
            url_module: "./url".to_string(),
            query_module: "../../ex/query".to_string(),
        }
    }
}

impl Codegen for TypeScriptGenerator {
    fn generate(&self, pages: &[PageNode]) -> Result<String, GenError> {
        let mut out = String::new();
        out.push_str("/* tslint:disable */\n");
        out.push_str("/* eslint-disable */\n");
        out.push_str("// Generated by generate-url. Do not edit.\n");
        out.push_str(&format!(
            "import {{ PageUrl, PageQueryUrl }} from {};\n",
            quote(&self.url_module)
        ));
        out.push_str(&format!(
            "import {{ defineQuery, cArray, cBool, cInt, cMoment, cNat, cPk, cString, cStringUnion, cType }} from {};\n",
            quote(&self.query_module)
        ));
        out.push('\n');
        out.push_str("export const Urls = {\n");
        emit_nodes(&mut out, pages, &[], 1);
        out.push_str("};\n");
        Ok(out)
    }

    fn language(&self) -> &str {
        "typescript"
    }
}

fn emit_nodes(out: &mut String, nodes: &[PageNode], parents: &[&str], depth: usize) {
    let pad = INDENT.repeat(depth);
    for node in nodes {
        match node {
            PageNode::Page(page) => {
                let path = quote(&pathname(parents, node));
                let value = match &page.query {
                    Some(query) => format!(
                        "new PageQueryUrl({}, defineQuery({}))",
                        path, query.source
                    ),
                    None => format!("new PageUrl({})", path),
                };
                out.push_str(&format!("{}{}: {},\n", pad, quote(&page.name), value));
            }
            PageNode::Dir(dir) => {
                out.push_str(&format!("{}{}: {{\n", pad, object_key(&dir.name)));
                let mut nested = parents.to_vec();
                nested.push(node.segment());
                emit_nodes(out, &dir.children, &nested, depth + 1);
                out.push_str(&format!("{}}},\n", pad));
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn object_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        quote(name)
    }
}
