//! Visitor context providing file information during AST traversal.

use swc_common::Span;

use crate::parser::ParsedFile;

pub struct VisitorContext<'a> {
    file: &'a ParsedFile,
}

impl<'a> VisitorContext<'a> {
    pub fn new(file: &'a ParsedFile) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &ParsedFile {
        self.file
    }

    pub fn filename(&self) -> &str {
        &self.file.metadata().filename
    }

    pub fn span_to_location(&self, span: Span) -> (usize, usize) {
        self.file
            .line_index()
            .location(self.file.offset(span.lo))
    }

    /// Start and end positions of a span as `(line, column, end_line, end_column)`.
    pub fn span_to_range(&self, span: Span) -> (usize, usize, usize, usize) {
        let (line, column) = self.span_to_location(span);
        let (end_line, end_column) = self
            .file
            .line_index()
            .location(self.file.offset(span.hi));
        (line, column, end_line, end_column)
    }

    pub fn get_source_text(&self, span: Span) -> Option<&str> {
        let source = self.file.source();
        let lo = self.file.offset(span.lo);
        let hi = self.file.offset(span.hi);

        if lo <= hi && hi <= source.len() {
            source.get(lo..hi)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::Spanned;

    #[test]
    fn context_provides_file_reference() {
        let parsed = ParsedFile::from_source("test.js", "const x = 1;");
        let ctx = VisitorContext::new(&parsed);

        assert_eq!(ctx.filename(), "test.js");
    }

    #[test]
    fn span_to_location_second_line() {
        let code = "const x = 1;\nimport y from './y';";
        let parsed = ParsedFile::from_source("test.js", code);
        let ctx = VisitorContext::new(&parsed);
        let span = parsed.module().unwrap().body[1].span();

        assert_eq!(ctx.span_to_location(span), (2, 1));
    }

    #[test]
    fn span_to_range_covers_statement() {
        let code = "import y from './y';";
        let parsed = ParsedFile::from_source("test.js", code);
        let ctx = VisitorContext::new(&parsed);
        let span = parsed.module().unwrap().body[0].span();

        assert_eq!(ctx.span_to_range(span), (1, 1, 1, 21));
    }

    #[test]
    fn get_source_text_returns_span_content() {
        let code = "import y from './y';";
        let parsed = ParsedFile::from_source("test.js", code);
        let ctx = VisitorContext::new(&parsed);
        let span = parsed.module().unwrap().body[0].span();

        assert_eq!(ctx.get_source_text(span), Some(code));
    }
}
