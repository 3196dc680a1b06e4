//! JSDoc extraction for exported declarations

use swc_common::BytePos;
use swc_common::comments::{Comment, CommentKind, Comments, SingleThreadedComments};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocInfo {
    pub description: String,
    /// Reason given by `@deprecated`; empty when the tag carries no text.
    pub deprecated: Option<String>,
    pub tags: Vec<DocTag>,
}

impl DocInfo {
    /// Parses the body of a `/** ... */` block (the text between the delimiters).
    pub fn parse(body: &str) -> Self {
        let mut description = Vec::new();
        let mut tags: Vec<DocTag> = Vec::new();

        for line in body.lines() {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line).trim();

            if let Some(tag) = line.strip_prefix('@') {
                let (name, text) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
                tags.push(DocTag {
                    name: name.to_string(),
                    text: text.trim().to_string(),
                });
            } else if let Some(last) = tags.last_mut() {
                if !line.is_empty() {
                    if !last.text.is_empty() {
                        last.text.push(' ');
                    }
                    last.text.push_str(line);
                }
            } else {
                description.push(line);
            }
        }

        let deprecated = tags
            .iter()
            .find(|tag| tag.name == "deprecated")
            .map(|tag| tag.text.clone());

        Self {
            description: description.join("\n").trim().to_string(),
            deprecated,
            tags,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }
}

fn is_jsdoc(comment: &Comment) -> bool {
    comment.kind == CommentKind::Block && comment.text.starts_with('*') && !comment.text.starts_with("**")
}

/// The JSDoc block closest to `pos`, if any.
pub(crate) fn leading_doc(comments: &SingleThreadedComments, pos: BytePos) -> Option<DocInfo> {
    let leading = comments.get_leading(pos)?;
    leading
        .iter()
        .rev()
        .find(|comment| is_jsdoc(comment))
        .map(|comment| DocInfo::parse(&comment.text[1..]))
}

/// A leading JSDoc block tagged `@module`, documenting the file as a whole.
pub(crate) fn module_doc(comments: &SingleThreadedComments, pos: BytePos) -> Option<DocInfo> {
    let leading = comments.get_leading(pos)?;
    leading
        .iter()
        .filter(|comment| is_jsdoc(comment))
        .map(|comment| DocInfo::parse(&comment.text[1..]))
        .find(|doc| doc.has_tag("module"))
}
