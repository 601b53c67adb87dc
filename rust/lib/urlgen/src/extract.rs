//! Finds a page's query declaration in its source text.
//!
//! Recognized form, one per file:
//!
//! ```text
//! const Query = defineQuery({ category: cString, page: cNat, tags: cArray(cString) });
//! ```
//!
//! Lines whose first non-blank characters are `//` are ignored. The object
//! literal is parsed into [`QueryDecl`] fields and also kept verbatim.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::GenError;
use crate::ir::{CodecExpr, QueryDecl, QueryField};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconst\s+Query\s*=\s*defineQuery\s*\(").expect("declaration pattern is valid")
});

/// Drop comment-only lines.
pub fn strip_comment_lines(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the query declaration of the page at `path`, if it has one.
pub fn extract_query(path: &Path, source: &str) -> Result<Option<QueryDecl>, GenError> {
    let code = strip_comment_lines(source);
    let starts: Vec<usize> = DECLARATION.find_iter(&code).map(|m| m.end()).collect();
    if starts.len() > 1 {
        return Err(GenError::DuplicateQuery {
            path: path.to_path_buf(),
        });
    }
    let Some(&start) = starts.first() else {
        return Ok(None);
    };
    parse_declaration(&code[start..])
        .map(Some)
        .map_err(|message| GenError::InvalidQuery {
            path: path.to_path_buf(),
            message,
        })
}

/// Parse `{ ... })`, the text following `defineQuery(`.
pub fn parse_declaration(text: &str) -> Result<QueryDecl, String> {
    let mut cursor = Cursor::new(text);
    cursor.skip_ws();
    let open = cursor.pos;
    cursor.expect('{')?;

    let mut fields: Vec<QueryField> = Vec::new();
    loop {
        cursor.skip_ws();
        if cursor.eat('}') {
            break;
        }
        let name = cursor.key()?;
        if fields.iter().any(|f| f.name == name) {
            return Err(format!("field `{}` is declared twice", name));
        }
        cursor.skip_ws();
        cursor.expect(':')?;
        let codec = cursor.codec()?;
        fields.push(QueryField { name, codec });

        cursor.skip_ws();
        if cursor.eat(',') {
            continue;
        }
        cursor.expect('}')?;
        break;
    }
    let source = text[open..cursor.pos].to_string();

    cursor.skip_ws();
    cursor.expect(')')?;
    Ok(QueryDecl { source, fields })
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        if self.eat(c) {
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(format!("expected `{}`, found `{}`", c, found)),
            None => Err(format!("expected `{}`, found end of file", c)),
        }
    }

    fn ident(&mut self) -> Result<&'a str, String> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(i, c)| {
                let ok = c.is_ascii_alphanumeric() || *c == '_' || *c == '$';
                !ok || (*i == 0 && c.is_ascii_digit())
            })
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(match self.peek() {
                Some(found) => format!("expected identifier, found `{}`", found),
                None => "expected identifier, found end of file".to_string(),
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Field key: identifier or quoted string.
    fn key(&mut self) -> Result<String, String> {
        for quote in ['"', '\''] {
            if self.eat(quote) {
                let rest = self.rest();
                let end = rest
                    .find(quote)
                    .ok_or_else(|| "unterminated field name".to_string())?;
                self.pos += end + quote.len_utf8();
                return Ok(rest[..end].to_string());
            }
        }
        self.ident().map(str::to_string)
    }

    fn codec(&mut self) -> Result<CodecExpr, String> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        match name {
            "cArray" => {
                self.expect('(')?;
                let inner = self.codec()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(CodecExpr::Array(Box::new(inner)))
            }
            "cStringUnion" => {
                self.expect('(')?;
                let arg = self.balanced_argument()?;
                Ok(CodecExpr::StringUnion(arg.trim().to_string()))
            }
            _ if self.peek() == Some('(') => Err(format!("unknown codec combinator `{}`", name)),
            _ => Ok(CodecExpr::from_name(name)),
        }
    }

    /// Text up to the `)` closing an already consumed `(`.
    fn balanced_argument(&mut self) -> Result<&'a str, String> {
        let rest = self.rest();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        for (i, c) in rest.char_indices() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' | '`' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth > 0 => depth -= 1,
                ')' => {
                    self.pos += i + 1;
                    let arg = &rest[..i];
                    if arg.trim().is_empty() {
                        return Err("cStringUnion needs a decoder argument".to_string());
                    }
                    return Ok(arg);
                }
                _ => {}
            }
        }
        Err("unterminated cStringUnion argument".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn extract(source: &str) -> Result<Option<QueryDecl>, GenError> {
        extract_query(&PathBuf::from("pages/scene.tsx"), source)
    }

    // ========================================================================
    // Declaration discovery
    // ========================================================================

    #[test]
    fn no_declaration() {
        let src = "export default function Ott() { return null; }";
        assert_eq!(extract(src).unwrap(), None);
    }

    #[test]
    fn single_declaration_kept_verbatim() {
        let src = "import x from 'y';\nconst Query = defineQuery({category: cString});\n";
        let decl = extract(src).unwrap().unwrap();
        assert_eq!(decl.source, "{category: cString}");
        assert_eq!(
            decl.fields,
            vec![QueryField {
                name: "category".into(),
                codec: CodecExpr::String
            }]
        );
    }

    #[test]
    fn commented_out_declaration_is_ignored() {
        let src = "// const Query = defineQuery({ old: cInt });\nconst Query = defineQuery({ page: cNat });";
        let decl = extract(src).unwrap().unwrap();
        assert_eq!(decl.fields[0].name, "page");
    }

    #[test]
    fn duplicate_declaration_names_file() {
        let src = "const Query = defineQuery({ a: cInt });\nconst Query = defineQuery({ b: cInt });";
        let err = extract(src).unwrap_err();
        assert!(matches!(err, GenError::DuplicateQuery { .. }));
        assert!(err.to_string().contains("pages/scene.tsx"));
    }

    #[test]
    fn multiline_literal() {
        let src = "const Query = defineQuery({\n  category: cString,\n  page: cNat,\n});";
        let decl = extract(src).unwrap().unwrap();
        assert_eq!(decl.source, "{\n  category: cString,\n  page: cNat,\n}");
        assert_eq!(decl.fields.len(), 2);
    }

    // ========================================================================
    // Literal parsing
    // ========================================================================

    #[test]
    fn all_builtin_codecs() {
        let decl = parse_declaration(
            "{ s: cString, t: cType, i: cInt, n: cNat, b: cBool, m: cMoment, pk: cPk })",
        )
        .unwrap();
        let codecs: Vec<CodecExpr> = decl.fields.into_iter().map(|f| f.codec).collect();
        assert_eq!(
            codecs,
            vec![
                CodecExpr::String,
                CodecExpr::Type,
                CodecExpr::Int,
                CodecExpr::Nat,
                CodecExpr::Bool,
                CodecExpr::Moment,
                CodecExpr::Pk,
            ]
        );
    }

    #[test]
    fn combinators_and_custom() {
        let decl = parse_declaration(
            "{ tags: cArray(cStringUnion(toGenre)), kinds: cArray(cArray(cInt)), g: cGenre, 'raw-key': cStringUnion(createToStringEnum([\"A\", \"B)\"])) })",
        )
        .unwrap();
        assert_eq!(
            decl.fields[0].codec,
            CodecExpr::Array(Box::new(CodecExpr::StringUnion("toGenre".into())))
        );
        assert_eq!(
            decl.fields[1].codec,
            CodecExpr::Array(Box::new(CodecExpr::Array(Box::new(CodecExpr::Int))))
        );
        assert_eq!(decl.fields[2].codec, CodecExpr::Custom("cGenre".into()));
        assert_eq!(decl.fields[3].name, "raw-key");
        assert_eq!(
            decl.fields[3].codec,
            CodecExpr::StringUnion("createToStringEnum([\"A\", \"B)\"])".into())
        );
    }

    #[test]
    fn empty_object() {
        let decl = parse_declaration("{})").unwrap();
        assert!(decl.fields.is_empty());
        assert_eq!(decl.source, "{}");
    }

    #[test]
    fn malformed_literals() {
        assert!(parse_declaration("category)").is_err());
        assert!(parse_declaration("{ category cString })").is_err());
        assert!(parse_declaration("{ a: cInt, a: cNat })").is_err());
        assert!(parse_declaration("{ a: cUnknown(cInt) })").is_err());
        assert!(parse_declaration("{ a: cStringUnion() })").is_err());
        assert!(parse_declaration("{ a: cInt }").is_err());
    }

    #[test]
    fn invalid_literal_reports_file() {
        let err = extract("const Query = defineQuery(notAnObject);").unwrap_err();
        assert!(matches!(err, GenError::InvalidQuery { .. }));
        assert!(err.to_string().contains("pages/scene.tsx"));
    }
}
