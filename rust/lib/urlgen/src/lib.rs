//! Build-time URL table generator.
//!
//! Scans a pages directory, reads each page's `defineQuery({...})`
//! declaration and emits one self-contained table of typed URLs, either as
//! TypeScript (`url.g.ts`) or as a Rust module on top of `pmp_query`.

pub mod error;
pub mod extract;
pub mod ir;
pub mod rust_table;
pub mod scan;
pub mod typescript;
pub mod writer;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::GenError;
pub use ir::*;
pub use rust_table::RustTableGenerator;
pub use scan::scan_pages;
pub use typescript::TypeScriptGenerator;
pub use writer::{is_up_to_date, write_if_changed};

/// One output target.
pub trait Codegen {
    fn generate(&self, pages: &[PageNode]) -> Result<String, GenError>;
    fn language(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    TypeScript,
    Rust,
}

impl Target {
    pub fn default_output(self) -> PathBuf {
        match self {
            Target::TypeScript => PathBuf::from("src/url/url.g.ts"),
            Target::Rust => PathBuf::from("src/url/url_g.rs"),
        }
    }
}

impl FromStr for Target {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Target::TypeScript),
            "rust" | "rs" => Ok(Target::Rust),
            _ => Err(GenError::UnsupportedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::TypeScript => f.write_str("typescript"),
            Target::Rust => f.write_str("rust"),
        }
    }
}

/// Generator settings. `Default` matches the conventional project layout.
#[derive(Debug, Clone)]
pub struct GenConfig {
    pub pages_dir: PathBuf,
    pub output: PathBuf,
    pub target: Target,
    /// Page file extension, without the dot.
    pub extension: String,
    pub url_module: String,
    pub query_module: String,
    pub decoders_path: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        let ts = TypeScriptGenerator::default();
        Self {
            pages_dir: PathBuf::from("src/pages"),
            output: Target::TypeScript.default_output(),
            target: Target::TypeScript,
            extension: "tsx".to_string(),
            url_module: ts.url_module,
            query_module: ts.query_module,
            decoders_path: RustTableGenerator::default().decoders_path,
        }
    }
}

impl GenConfig {
    pub fn codegen(&self) -> Box<dyn Codegen> {
        match self.target {
            Target::TypeScript => Box::new(TypeScriptGenerator {
                url_module: self.url_module.clone(),
                query_module: self.query_module.clone(),
            }),
            Target::Rust => Box::new(RustTableGenerator {
                decoders_path: self.decoders_path.clone(),
            }),
        }
    }
}

/// Scan the pages directory and render the URL table. Nothing is written.
pub fn generate(config: &GenConfig) -> Result<GeneratedFile, GenError> {
    let pages = scan_pages(&config.pages_dir, &config.extension)?;
    let page_count: usize = pages.iter().map(PageNode::page_count).sum();
    let codegen = config.codegen();
    info!(
        pages_dir = %config.pages_dir.display(),
        pages = page_count,
        target = codegen.language(),
        "generating url table"
    );
    let content = codegen.generate(&pages)?;
    Ok(GeneratedFile {
        path: config.output.clone(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse() {
        assert_eq!("typescript".parse::<Target>().unwrap(), Target::TypeScript);
        assert_eq!("TS".parse::<Target>().unwrap(), Target::TypeScript);
        assert_eq!("rust".parse::<Target>().unwrap(), Target::Rust);
        assert!(matches!(
            "go".parse::<Target>(),
            Err(GenError::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn default_config() {
        let config = GenConfig::default();
        assert_eq!(config.pages_dir, PathBuf::from("src/pages"));
        assert_eq!(config.output, PathBuf::from("src/url/url.g.ts"));
        assert_eq!(config.extension, "tsx");
        assert_eq!(config.codegen().language(), "typescript");
    }
}
