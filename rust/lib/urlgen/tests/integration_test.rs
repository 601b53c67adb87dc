//! End-to-end generation over a pages directory on disk.

use std::fs;
use std::path::Path;

use pmp_urlgen::*;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("src/pages");
    touch(&pages, "index.tsx", "export default function Home() { return null; }\n");
    touch(
        &pages,
        "scene.tsx",
        "import { defineQuery, cString } from \"../../ex/query\";\n\nconst Query = defineQuery({category: cString});\n",
    );
    touch(
        &pages,
        "sign/signIn.tsx",
        "// const Query = defineQuery({ returnTo: cString });\nexport default function SignIn() {}\n",
    );
    touch(&pages, "_app.tsx", "const Query = defineQuery({ ignored: cInt });\n");
    touch(&pages, "components/Button.ts", "export {};\n");
    dir
}

fn config(root: &Path, target: Target) -> GenConfig {
    GenConfig {
        pages_dir: root.join("src/pages"),
        output: root.join(target.default_output()),
        target,
        ..GenConfig::default()
    }
}

#[test]
fn typescript_table_end_to_end() {
    let dir = project();
    let file = generate(&config(dir.path(), Target::TypeScript)).unwrap();

    let expected_body = "export const Urls = {\n  \"index\": new PageUrl(\"/\"),\n  \"scene\": new PageQueryUrl(\"/scene\", defineQuery({category: cString})),\n  sign: {\n    \"signIn\": new PageUrl(\"/sign/signIn\"),\n  },\n};\n";
    assert!(file.content.ends_with(expected_body), "{}", file.content);
    assert!(!file.content.contains("components"));
    assert!(!file.content.contains("_app"));

    assert!(write_if_changed(&file).unwrap());
    assert!(dir.path().join("src/url/url.g.ts").exists());

    // Regenerating an unchanged tree yields identical bytes and no write.
    let again = generate(&config(dir.path(), Target::TypeScript)).unwrap();
    assert_eq!(again, file);
    assert!(!write_if_changed(&again).unwrap());
}

#[test]
fn rust_table_end_to_end() {
    let dir = project();
    let file = generate(&config(dir.path(), Target::Rust)).unwrap();
    assert!(file.path.ends_with("src/url/url_g.rs"));
    assert!(file.content.contains("pub const fn index() -> PageUrl"));
    assert!(file.content.contains("pub fn scene() -> PageQueryUrl"));
    assert!(file.content.contains(".field(\"category\", CString)"));
    assert!(file.content.contains("pub mod sign {"));
    assert!(file.content.contains("PageUrl::new(\"/sign/signIn\")"));
}

#[test]
fn duplicate_declaration_aborts_with_file_name() {
    let dir = project();
    touch(
        &dir.path().join("src/pages"),
        "sign/signUp.tsx",
        "const Query = defineQuery({ a: cInt });\nconst Query = defineQuery({ b: cInt });\n",
    );
    let cfg = config(dir.path(), Target::TypeScript);
    let err = generate(&cfg).unwrap_err();
    assert!(matches!(err, GenError::DuplicateQuery { .. }));
    assert!(err.to_string().contains("signUp.tsx"), "{}", err);
    assert!(!cfg.output.exists());
}

#[test]
fn page_tree_serializes() {
    let dir = project();
    let pages = scan_pages(&dir.path().join("src/pages"), "tsx").unwrap();
    let json = serde_json::to_value(&pages).unwrap();
    assert_eq!(json[0]["kind"], "page");
    assert_eq!(json[0]["name"], "index");
    assert_eq!(json[1]["query"]["fields"][0]["name"], "category");
    assert_eq!(json[2]["kind"], "dir");
    assert_eq!(json[2]["children"][0]["name"], "signIn");
}
