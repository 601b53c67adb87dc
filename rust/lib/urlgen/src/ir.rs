//! Page tree produced by the scanner and consumed by the emitters.

use serde::{Deserialize, Serialize};

/// Page name that routes to its parent directory's path.
pub const INDEX_PAGE: &str = "index";

/// One node of the scanned pages directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageNode {
    Page(Page),
    Dir(Dir),
}

/// A routable page file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// File name without the page extension.
    pub name: String,
    pub query: Option<QueryDecl>,
}

/// A directory holding at least one page, directly or below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dir {
    pub name: String,
    pub children: Vec<PageNode>,
}

/// A page's `defineQuery({...})` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDecl {
    /// The object literal exactly as written, braces included.
    pub source: String,
    pub fields: Vec<QueryField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryField {
    pub name: String,
    pub codec: CodecExpr,
}

/// A codec expression from the declaration literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecExpr {
    String,
    Type,
    Int,
    Nat,
    Bool,
    Moment,
    Pk,
    Array(Box<CodecExpr>),
    /// `cStringUnion(<decoder>)`, holding the decoder argument as written.
    StringUnion(String),
    /// Any other codec constant, by name.
    Custom(String),
}

impl CodecExpr {
    /// Map a bare codec name to its expression.
    pub fn from_name(name: &str) -> Self {
        match name {
            "cString" => CodecExpr::String,
            "cType" => CodecExpr::Type,
            "cInt" => CodecExpr::Int,
            "cNat" => CodecExpr::Nat,
            "cBool" => CodecExpr::Bool,
            "cMoment" => CodecExpr::Moment,
            "cPk" => CodecExpr::Pk,
            other => CodecExpr::Custom(other.to_string()),
        }
    }
}

impl PageNode {
    pub fn name(&self) -> &str {
        match self {
            PageNode::Page(p) => &p.name,
            PageNode::Dir(d) => &d.name,
        }
    }

    /// Path segment this node contributes; `index` contributes an empty one.
    pub fn segment(&self) -> &str {
        match self.name() {
            INDEX_PAGE => "",
            name => name,
        }
    }

    /// Number of page leaves under (and including) this node.
    pub fn page_count(&self) -> usize {
        match self {
            PageNode::Page(_) => 1,
            PageNode::Dir(d) => d.children.iter().map(PageNode::page_count).sum(),
        }
    }
}

/// Routed path for a node below `parents` (ancestor segments, root first).
pub fn pathname(parents: &[&str], node: &PageNode) -> String {
    let mut segments: Vec<&str> = parents.to_vec();
    segments.push(node.segment());
    format!("/{}", segments.join("/"))
}
