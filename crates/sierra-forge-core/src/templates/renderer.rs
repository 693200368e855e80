//! Identity-token substitution for render units.
//!
//! Replacement is whole-token: only a complete `${IDENT}` is ever replaced, so
//! `APPLICATION_NAME` appearing as plain text, or inside a longer identifier,
//! is left alone. After substitution the result is scanned again and any
//! token still present fails the render. There is no partial output: a unit
//! either renders completely or returns [`ForgeError::UnresolvedToken`].
//!
//! ## Usage
//!
//! ```ignore
//! use crate::templates::renderer::TemplateRenderer;
//!
//! let renderer = TemplateRenderer::new(&tokens);
//! let rendered = renderer.render_all(&files)?;
//! ```

use std::fs::Permissions;
use std::ops::Range;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::assembler;
use crate::error::{ForgeError, Result};
use crate::templates::resolver::{TemplateContent, TemplateFile};
use crate::tokens::{Token, TokenMapping};

const TOKEN_OPEN: &str = "${";
const ESCAPED_OPEN: &str = "$${";

/// A render unit after substitution. Holds no reference to its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Output path relative to the project root, after path-segment renames.
    pub output_path: PathBuf,
    pub content: Vec<u8>,
    /// Whether the content went through substitution.
    pub rendered: bool,
    pub permissions: Option<Permissions>,
}

/// Renders template files against a read-only token mapping.
pub struct TemplateRenderer<'a> {
    tokens: &'a TokenMapping,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(tokens: &'a TokenMapping) -> Self {
        Self { tokens }
    }

    /// Render one unit: substitute its content (or copy it, if opaque) and
    /// compute its output path.
    pub fn render(&self, file: &TemplateFile) -> Result<RenderedFile> {
        let output_path = assembler::output_path(file.relative_path(), self.tokens)?;
        let (content, rendered) = match file.content() {
            TemplateContent::Text(text) => (
                self.render_str(text, file.relative_path())?.into_bytes(),
                true,
            ),
            TemplateContent::Opaque(bytes) => (bytes.clone(), false),
        };

        Ok(RenderedFile {
            output_path,
            content,
            rendered,
            permissions: file.permissions().cloned(),
        })
    }

    /// Render every unit on the rayon pool.
    ///
    /// Each result lands in the slot of its unit, so output order matches input
    /// order and, when several units fail, the error of the lowest-ordered unit
    /// is the one reported.
    pub fn render_all(&self, files: &[TemplateFile]) -> Result<Vec<RenderedFile>> {
        let slots: Vec<Result<RenderedFile>> =
            files.par_iter().map(|file| self.render(file)).collect();
        slots.into_iter().collect()
    }

    /// Substitute tokens in `template`. `origin` is only used for error context.
    pub fn render_str(&self, template: &str, origin: &Path) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut literal_spans: Vec<Range<usize>> = Vec::new();
        let mut cursor = 0;

        while let Some(found) = template[cursor..].find('$') {
            let at = cursor + found;
            out.push_str(&template[cursor..at]);
            let rest = &template[at..];

            if rest.starts_with(ESCAPED_OPEN) {
                if let Some(len) = token_len(&rest[1..]) {
                    // vocabulary names cannot be escaped into the output
                    let name = &rest[ESCAPED_OPEN.len()..len];
                    if Token::from_name(name).is_some() {
                        return Err(ForgeError::UnresolvedToken {
                            token: name.to_string(),
                            path: origin.to_path_buf(),
                            offset: at,
                        });
                    }
                    let start = out.len();
                    out.push_str(&rest[1..=len]);
                    literal_spans.push(start..out.len());
                    cursor = at + 1 + len;
                    continue;
                }
            } else if let Some(len) = token_len(rest) {
                let name = &rest[TOKEN_OPEN.len()..len - 1];
                let value = self
                    .tokens
                    .lookup(name)
                    .ok_or_else(|| ForgeError::UnresolvedToken {
                        token: name.to_string(),
                        path: origin.to_path_buf(),
                        offset: at,
                    })?;
                out.push_str(value);
                cursor = at + len;
                continue;
            }

            out.push('$');
            cursor = at + 1;
        }
        out.push_str(&template[cursor..]);

        ensure_total(&out, &literal_spans, origin)?;
        Ok(out)
    }
}

/// Render a single unit with the given mapping.
pub fn render(file: &TemplateFile, tokens: &TokenMapping) -> Result<RenderedFile> {
    TemplateRenderer::new(tokens).render(file)
}

/// Byte length of a `${IDENT}` token at the start of `s`, if one is there.
///
/// `IDENT` is `[A-Z][A-Z0-9_]*`. Anything else after `${` (lowercase names,
/// dotted paths, unterminated braces) is not a generator token.
pub(crate) fn token_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix(TOKEN_OPEN)?.as_bytes();
    if !body.first()?.is_ascii_uppercase() {
        return None;
    }
    let ident_len = body
        .iter()
        .take_while(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || **b == b'_')
        .count();
    (body.get(ident_len) == Some(&b'}')).then_some(TOKEN_OPEN.len() + ident_len + 1)
}

/// Fail if any generator token survived substitution outside escaped spans.
fn ensure_total(rendered: &str, literal_spans: &[Range<usize>], origin: &Path) -> Result<()> {
    let mut spans = literal_spans.iter().peekable();
    for (at, _) in rendered.match_indices(TOKEN_OPEN) {
        while spans.next_if(|span| span.end <= at).is_some() {}
        if spans.peek().is_some_and(|span| span.contains(&at)) {
            continue;
        }
        if let Some(len) = token_len(&rendered[at..]) {
            return Err(ForgeError::UnresolvedToken {
                token: rendered[at + TOKEN_OPEN.len()..at + len - 1].to_string(),
                path: origin.to_path_buf(),
                offset: at,
            });
        }
    }
    Ok(())
}
