//! XML loader producing token sequences.
//!
//! Uses quick-xml's streaming API. Character data is split according to
//! the configured [`TextGranularity`]; whitespace is preserved as-is so
//! the stripping policy can be applied separately.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use crate::config::TextGranularity;
use crate::error::{Error, Result};
use crate::token::Token;

/// XML loader producing flat token sequences.
pub struct XmlLoader {
    granularity: TextGranularity,
}

impl XmlLoader {
    /// Creates a loader with the given text granularity.
    pub fn new(granularity: TextGranularity) -> Self {
        XmlLoader { granularity }
    }

    /// Loads tokens from a string.
    pub fn load_str(&self, xml: &str) -> Result<Vec<Token>> {
        let mut reader = Reader::from_str(xml);
        // Don't trim text - whitespace handling is a separate policy
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.load_reader(&mut reader)
    }

    /// Loads tokens from a file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Token>> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.load_reader(&mut reader)
    }

    fn load_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut buf = Vec::new();
        // Text, CDATA and entity references accumulate into one run so a
        // reference never splits the surrounding character data.
        let mut text = String::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    self.flush_text(&mut text, &mut tokens);
                    self.push_element(e, reader, &mut tokens)?;
                }
                Ok(Event::End(ref e)) => {
                    self.flush_text(&mut text, &mut tokens);
                    let name = reader
                        .decoder()
                        .decode(e.name().as_ref())
                        .map_err(quick_xml::Error::from)?
                        .to_string();
                    tokens.push(Token::end(name));
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tag, treated as start + end
                    self.flush_text(&mut text, &mut tokens);
                    let name = self.push_element(e, reader, &mut tokens)?;
                    tokens.push(Token::end(name));
                }
                Ok(Event::Text(ref e)) => {
                    let raw = reader
                        .decoder()
                        .decode(e.as_ref())
                        .map_err(quick_xml::Error::from)?;
                    let unescaped = unescape(&raw).map_err(quick_xml::Error::from)?;
                    text.push_str(&unescaped);
                }
                Ok(Event::CData(ref e)) => {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(ref e)) => {
                    text.push_str(&resolve_reference(e, reader)?);
                }
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_))
                | Ok(Event::Decl(_))
                | Ok(Event::PI(_))
                | Ok(Event::DocType(_)) => {}
                Err(e) => return Err(e.into()),
            }
            buf.clear();
        }
        self.flush_text(&mut text, &mut tokens);
        Ok(tokens)
    }

    fn flush_text(&self, text: &mut String, tokens: &mut Vec<Token>) {
        if !text.is_empty() {
            self.push_text(text, tokens);
            text.clear();
        }
    }

    /// Pushes a start tag and its attributes, returning the element name.
    fn push_element<R: BufRead>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
        tokens: &mut Vec<Token>,
    ) -> Result<String> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(quick_xml::Error::from)?
            .to_string();
        tokens.push(Token::start(&*name));
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(quick_xml::Error::from)?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(quick_xml::Error::from)?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .to_string();
            tokens.push(Token::attr(key, value));
        }
        Ok(name)
    }

    fn push_text(&self, text: &str, tokens: &mut Vec<Token>) {
        match self.granularity {
            TextGranularity::Text => {
                if !text.is_empty() {
                    tokens.push(Token::text(text));
                }
            }
            TextGranularity::Word => {
                for word in split_words(text) {
                    tokens.push(Token::text(word));
                }
            }
            TextGranularity::Character => {
                for c in text.chars() {
                    tokens.push(Token::text(c.to_string()));
                }
            }
        }
    }
}

impl Default for XmlLoader {
    fn default() -> Self {
        XmlLoader::new(TextGranularity::default())
    }
}

/// Resolves a general entity reference to its replacement text.
///
/// Character references (`&#38;`, `&#x26;`) and the five predefined
/// entities are resolved; anything else would need a DTD and is rejected.
fn resolve_reference<R: BufRead>(e: &BytesRef, reader: &Reader<R>) -> Result<String> {
    if let Some(c) = e.resolve_char_ref().map_err(quick_xml::Error::from)? {
        return Ok(c.to_string());
    }
    let name = reader
        .decoder()
        .decode(e.as_ref())
        .map_err(quick_xml::Error::from)?;
    match resolve_predefined_entity(&name) {
        Some(replacement) => Ok(replacement.to_string()),
        None => Err(Error::Parse(format!("unresolved entity reference: &{name};"))),
    }
}

/// Splits text into word tokens, each carrying its trailing whitespace.
///
/// `"Hello world"` becomes `["Hello ", "world"]`; leading whitespace forms
/// a token of its own.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = false;
    for c in text.chars() {
        if !c.is_whitespace() && in_whitespace {
            words.push(std::mem::take(&mut current));
            in_whitespace = false;
        }
        if c.is_whitespace() {
            in_whitespace = true;
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Loads tokens from a string at word granularity.
pub fn load_str(xml: &str) -> Result<Vec<Token>> {
    XmlLoader::default().load_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_simple_document() {
        let tokens = load_str("<para>Hello world</para>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::start("para"),
                Token::text("Hello "),
                Token::text("world"),
                Token::end("para"),
            ]
        );
    }

    #[test]
    fn test_load_attributes() {
        let tokens = load_str(r#"<cell colspan="2">x</cell>"#).unwrap();
        assert_eq!(tokens[0], Token::start("cell"));
        assert_eq!(tokens[1], Token::attr("colspan", "2"));
        assert_eq!(tokens[2], Token::text("x"));
    }

    #[test]
    fn test_load_self_closing() {
        let tokens = load_str(r#"<para><br/>x</para>"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::start("para"),
                Token::start("br"),
                Token::end("br"),
                Token::text("x"),
                Token::end("para"),
            ]
        );
    }

    #[test]
    fn test_load_preserves_whitespace() {
        let tokens = load_str("<list>\n  <item>x</item>\n</list>").unwrap();
        assert!(tokens[1].is_whitespace());
    }

    #[test]
    fn test_text_granularity() {
        let loader = XmlLoader::new(TextGranularity::Text);
        let tokens = loader.load_str("<para>Hello world</para>").unwrap();
        assert_eq!(tokens[1], Token::text("Hello world"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_character_granularity() {
        let loader = XmlLoader::new(TextGranularity::Character);
        let tokens = loader.load_str("<para>abc</para>").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[1], Token::text("a"));
    }

    #[test]
    fn test_entities_are_unescaped() {
        let tokens = load_str("<para>a&amp;b</para>").unwrap();
        assert_eq!(tokens[1], Token::text("a&b"));
    }

    #[test]
    fn test_entity_does_not_split_words() {
        // The reference merges into the surrounding run before word
        // splitting, so "a&b c" tokenizes the same as literal text.
        let tokens = load_str("<para>a&amp;b c</para>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::start("para"),
                Token::text("a&b "),
                Token::text("c"),
                Token::end("para"),
            ]
        );
    }

    #[test]
    fn test_character_references_are_resolved() {
        let tokens = load_str("<para>a&#38;b&#x26;c</para>").unwrap();
        assert_eq!(tokens[1], Token::text("a&b&c"));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let err = load_str("<para>&undefined;</para>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_malformed_markup_is_an_xml_error() {
        let err = load_str("<para>x</other>").unwrap_err();
        assert!(matches!(err, Error::Xml(_)), "got {err:?}");
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("Hello world"), vec!["Hello ", "world"]);
        assert_eq!(split_words(" a b"), vec![" ", "a ", "b"]);
        assert_eq!(split_words("one"), vec!["one"]);
        assert!(split_words("").is_empty());
    }
}
