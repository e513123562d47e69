//! Parser integration for JavaScript/TypeScript source files.
//!
//! Wraps SWC so the rest of the engine only sees a parsed module with
//! UTF-8 byte spans and the module start offset.

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_parser::{EsSyntax, StringInput, Syntax, TsSyntax, lexer::Lexer};

pub use swc_ecma_ast::Module;

/// Syntax family selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_syntax(filename: &str) -> SyntaxKind {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => SyntaxKind::TypeScript,
        "tsx" => SyntaxKind::Tsx,
        "jsx" => SyntaxKind::Jsx,
        _ => SyntaxKind::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A successfully parsed source file.
///
/// `module_start` is the byte offset SWC assigned to the start of the file;
/// all spans in `module` are relative to the same coordinate space.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: String,
    pub source: String,
    pub module: Module,
    pub module_start: u32,
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn for_file(filename: &str) -> Self {
        let syntax = match detect_syntax(filename) {
            SyntaxKind::JavaScript => Syntax::Es(EsSyntax {
                jsx: false,
                ..Default::default()
            }),
            SyntaxKind::Jsx => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
            SyntaxKind::TypeScript => Syntax::Typescript(TsSyntax {
                tsx: false,
                ..Default::default()
            }),
            SyntaxKind::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
        };
        Self { syntax }
    }

    pub fn parse(&self, path: &str, source: &str) -> Result<ParsedFile, ParseError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom(path.to_string()).into(), source.to_string());
        let module_start = fm.start_pos.0;

        let lexer = Lexer::new(
            self.syntax,
            Default::default(),
            StringInput::from(&*fm),
            None,
        );
        let mut parser = swc_ecma_parser::Parser::new_from(lexer);

        let module = parser.parse_module().map_err(|e| {
            let span = e.span();
            let loc = source_map.lookup_char_pos(span.lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                message: e.kind().msg().to_string(),
            }
        })?;

        Ok(ParsedFile {
            path: path.to_string(),
            source: source.to_string(),
            module,
            module_start,
        })
    }
}

/// Parse `source` with the syntax implied by `path`.
pub fn parse_source(path: &str, source: &str) -> Result<ParsedFile, ParseError> {
    Parser::for_file(path).parse(path, source)
}
