//! Parser module for JavaScript/TypeScript source code
//!
//! Integrates with SWC for parsing source files into AST. The export-map builder
//! reaches the parser through the [`SourceParser`] seam so hosts can swap it out.

use std::ops::Range;
use std::path::Path;

use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax, parse_file_as_module};

use crate::disable_comments::DisableDirectives;

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Byte offset to 1-based line/column conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    pub fn location(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    pub fn line_range(&self, line_number: usize) -> Option<Range<usize>> {
        if line_number == 0 {
            return None;
        }
        let start = *self.line_starts.get(line_number - 1)?;
        if start == self.len && line_number > 1 {
            return None;
        }
        let end = self
            .line_starts
            .get(line_number)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some(start..end)
    }
}

pub struct ParseResult {
    pub module: Option<Module>,
    pub errors: Vec<ParseError>,
    pub comments: SingleThreadedComments,
    /// Position of the first byte of the source inside the swc source map.
    pub base: u32,
}

impl std::fmt::Debug for ParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseResult")
            .field("has_module", &self.module.is_some())
            .field("errors", &self.errors)
            .finish()
    }
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.module.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn offset(&self, span: Span) -> usize {
        span.lo.0.saturating_sub(self.base) as usize
    }
}

/// Source-to-AST collaborator used by the export-map registry.
pub trait SourceParser {
    fn parse(&self, path: &Path, source: &str) -> ParseResult;
}

/// Default [`SourceParser`] picking the syntax from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwcParser;

impl SourceParser for SwcParser {
    fn parse(&self, path: &Path, source: &str) -> ParseResult {
        Parser::for_file(&path.to_string_lossy()).parse_module_recovering(source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub filename: String,
    pub language: Language,
    pub line_count: usize,
    pub has_errors: bool,
}

pub struct ParsedFile {
    source: String,
    metadata: FileMetadata,
    ast_module: Option<Module>,
    errors: Vec<ParseError>,
    base: u32,
    line_index: LineIndex,
    disable_directives: DisableDirectives,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("metadata", &self.metadata)
            .field("has_module", &self.ast_module.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(filename: &str, source: &str) -> Self {
        let language = detect_language(filename);
        let parser = Parser::for_file(filename);
        let parse_result = parser.parse_module_recovering(source);
        let disable_directives = DisableDirectives::from_source(source);

        let line_count = if source.is_empty() {
            0
        } else {
            source.lines().count()
        };

        let metadata = FileMetadata {
            filename: filename.to_string(),
            language,
            line_count,
            has_errors: parse_result.has_errors(),
        };

        Self {
            source: source.to_string(),
            metadata,
            ast_module: parse_result.module,
            errors: parse_result.errors,
            base: parse_result.base,
            line_index: LineIndex::new(source),
            disable_directives,
        }
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.metadata.filename)
    }

    pub fn module(&self) -> Option<&Module> {
        self.ast_module.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn disable_directives(&self) -> &DisableDirectives {
        &self.disable_directives
    }

    /// Byte offset of a span's start within [`ParsedFile::source`].
    pub fn offset(&self, pos: swc_common::BytePos) -> usize {
        pos.0.saturating_sub(self.base) as usize
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        self.line_index
            .line_range(line_number)
            .map(|range| &self.source[range])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
    decorators: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn decorators(mut self, enabled: bool) -> Self {
        self.decorators = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn for_file(filename: &str) -> Self {
        let language = detect_language(filename);
        match language {
            Language::JavaScript => Self::new(),
            Language::TypeScript => Self::builder().typescript(true).decorators(true).build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder()
                .typescript(true)
                .jsx(true)
                .decorators(true)
                .build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn parse_module_recovering(&self, code: &str) -> ParseResult {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.js".into()).into(), code.to_string());
        let base = fm.start_pos.0;
        let line_index = LineIndex::new(code);
        let comments = SingleThreadedComments::default();

        let mut recovered_errors = Vec::new();

        let result = parse_file_as_module(
            &fm,
            self.syntax,
            EsVersion::latest(),
            Some(&comments as &dyn Comments),
            &mut recovered_errors,
        );

        let to_parse_error = |e: swc_ecma_parser::error::Error| {
            let span = e.span();
            let (line, column) = line_index.location(span.lo.0.saturating_sub(base) as usize);
            ParseError {
                line,
                column,
                message: e.kind().msg().to_string(),
            }
        };

        let mut errors: Vec<ParseError> = recovered_errors.into_iter().map(&to_parse_error).collect();

        let module = match result {
            Ok(module) => Some(module),
            Err(e) => {
                errors.push(to_parse_error(e));
                None
            }
        };

        ParseResult {
            module,
            errors,
            comments,
            base,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
