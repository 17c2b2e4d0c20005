//! Renders an operation stream back into annotated XML.
//!
//! Inserted and deleted elements carry a `diff="ins"` / `diff="del"`
//! attribute; changed text is wrapped in `<ins>` / `<del>` elements.
//! Matched content is written as-is, so an all-match stream reproduces the
//! source markup.

use std::io::{self, Write};

use quick_xml::escape::escape;

use crate::op::{OperationSink, Operator};
use crate::token::{Attribute, StartTag, Token};

/// A sink that serializes operations as XML.
///
/// The start tag is held back until the first non-attribute operation so
/// attributes land inside the tag. Write failures are sticky: the first
/// error stops all further output and is returned by
/// [`finish`](Self::finish).
pub struct XmlDiffOutput<W: Write> {
    writer: W,
    pending: Option<(Operator, StartTag, Vec<Attribute>)>,
    error: Option<io::Error>,
}

impl<W: Write> XmlDiffOutput<W> {
    /// Creates an output sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        XmlDiffOutput {
            writer,
            pending: None,
            error: None,
        }
    }

    /// Flushes any pending tag and returns the writer, or the first write
    /// error encountered.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_pending();
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.writer),
        }
    }

    fn write(&mut self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.error.is_none() {
            if let Err(error) = f(&mut self.writer) {
                self.error = Some(error);
            }
        }
    }

    fn flush_pending(&mut self) {
        if let Some((operator, start, attributes)) = self.pending.take() {
            self.write(|w| {
                write!(w, "<{}", start.name)?;
                for attribute in &attributes {
                    write!(w, " {}=\"{}\"", attribute.name, escape(&*attribute.value))?;
                }
                match operator {
                    Operator::Ins => write!(w, " diff=\"ins\"")?,
                    Operator::Del => write!(w, " diff=\"del\"")?,
                    Operator::Match => {}
                }
                write!(w, ">")
            });
        }
    }
}

impl<W: Write> OperationSink for XmlDiffOutput<W> {
    fn handle(&mut self, operator: Operator, token: Token) {
        match token {
            Token::Start(start) => {
                self.flush_pending();
                self.pending = Some((operator, start, Vec::new()));
            }
            Token::Attr(attribute) => {
                // Deleted attributes exist only in the source version
                if operator != Operator::Del {
                    if let Some((_, _, attributes)) = &mut self.pending {
                        attributes.push(attribute);
                    }
                }
            }
            Token::End(end) => {
                self.flush_pending();
                self.write(|w| write!(w, "</{}>", end.name));
            }
            Token::Text(text) => {
                self.flush_pending();
                self.write(|w| match operator {
                    Operator::Ins => write!(w, "<ins>{}</ins>", escape(&*text.value)),
                    Operator::Del => write!(w, "<del>{}</del>", escape(&*text.value)),
                    Operator::Match => write!(w, "{}", escape(&*text.value)),
                });
            }
            Token::Element(element) => {
                // Composites are normally unfolded upstream
                for token in element.tokens() {
                    self.handle(operator, token);
                }
            }
        }
    }

    fn end(&mut self) {
        self.flush_pending();
    }
}

/// Renders an operation stream to a string.
pub fn to_string(operations: &[crate::op::Operation]) -> io::Result<String> {
    let mut output = XmlDiffOutput::new(Vec::new());
    output.start();
    for operation in operations {
        output.handle(operation.operator, operation.token.clone());
    }
    output.end();
    let bytes = output.finish()?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}
