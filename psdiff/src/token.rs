//! Token model.
//!
//! Tokens are the atomic units the whole engine operates on: start tags,
//! end tags, attributes, text, and the composite `Element` produced by
//! folding a block-level run into a single unit.
//!
//! Equality is structural (name, namespace, value). Pseudo tags inserted
//! by the paragraph-wrapping normalizer carry a `synthetic` flag that is
//! excluded from equality, so a pseudo wrapper compares equal to the real
//! tag it stands for while remaining distinguishable to the differ.

/// A start tag.
#[derive(Debug, Clone, Eq)]
pub struct StartTag {
    /// Local element name.
    pub name: String,
    /// Namespace URI, empty for the default namespace.
    pub namespace: String,
    /// Whether this tag was synthesized by normalization.
    pub synthetic: bool,
}

impl StartTag {
    /// Creates a start tag in the default namespace.
    pub fn new(name: impl Into<String>) -> Self {
        StartTag {
            name: name.into(),
            namespace: String::new(),
            synthetic: false,
        }
    }

    /// Creates a synthetic (pseudo) start tag in the default namespace.
    pub fn pseudo(name: impl Into<String>) -> Self {
        StartTag {
            name: name.into(),
            namespace: String::new(),
            synthetic: true,
        }
    }
}

impl PartialEq for StartTag {
    fn eq(&self, other: &Self) -> bool {
        // The synthetic flag does not affect matching
        self.name == other.name && self.namespace == other.namespace
    }
}

/// An end tag.
#[derive(Debug, Clone, Eq)]
pub struct EndTag {
    /// Local element name.
    pub name: String,
    /// Namespace URI, empty for the default namespace.
    pub namespace: String,
    /// Whether this tag was synthesized by normalization.
    pub synthetic: bool,
}

impl EndTag {
    /// Creates an end tag in the default namespace.
    pub fn new(name: impl Into<String>) -> Self {
        EndTag {
            name: name.into(),
            namespace: String::new(),
            synthetic: false,
        }
    }

    /// Creates a synthetic (pseudo) end tag in the default namespace.
    pub fn pseudo(name: impl Into<String>) -> Self {
        EndTag {
            name: name.into(),
            namespace: String::new(),
            synthetic: true,
        }
    }

    /// Creates the end tag closing the given start tag.
    pub fn closing(start: &StartTag) -> Self {
        EndTag {
            name: start.name.clone(),
            namespace: start.namespace.clone(),
            synthetic: start.synthetic,
        }
    }
}

impl PartialEq for EndTag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.namespace == other.namespace
    }
}

/// An attribute of the most recent start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    /// The character data.
    pub value: String,
    /// Whether the value consists entirely of whitespace.
    pub whitespace: bool,
}

impl TextToken {
    /// Creates a text token, deriving the whitespace flag from the value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let whitespace = !value.is_empty() && value.chars().all(char::is_whitespace);
        TextToken { value, whitespace }
    }
}

/// A composite token owning a whole block-level subtree.
///
/// Produced by folding; the children are the flat tokens between the start
/// and end tag, with nested blocks left unfolded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// The opening tag.
    pub start: StartTag,
    /// The closing tag.
    pub end: EndTag,
    /// The flat tokens between start and end.
    pub children: Vec<Token>,
}

impl Element {
    /// Creates an element from its start tag, end tag and children.
    pub fn new(start: StartTag, end: EndTag, children: Vec<Token>) -> Self {
        Element {
            start,
            end,
            children,
        }
    }

    /// Unfolds the element into its flat constituent tokens:
    /// `start, children…, end`.
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = Vec::with_capacity(self.children.len() + 2);
        out.push(Token::Start(self.start.clone()));
        out.extend(self.children.iter().cloned());
        out.push(Token::End(self.end.clone()));
        out
    }
}

/// A token in a document sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Start tag.
    Start(StartTag),
    /// End tag.
    End(EndTag),
    /// Attribute of the preceding start tag.
    Attr(Attribute),
    /// Character data.
    Text(TextToken),
    /// Folded block-level subtree.
    Element(Element),
}

impl Token {
    /// Convenience constructor for a start tag token.
    pub fn start(name: impl Into<String>) -> Self {
        Token::Start(StartTag::new(name))
    }

    /// Convenience constructor for an end tag token.
    pub fn end(name: impl Into<String>) -> Self {
        Token::End(EndTag::new(name))
    }

    /// Convenience constructor for an attribute token.
    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Token::Attr(Attribute::new(name, value))
    }

    /// Convenience constructor for a text token.
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text(TextToken::new(value))
    }

    /// Returns the tag or attribute name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Start(s) => Some(&s.name),
            Token::End(e) => Some(&e.name),
            Token::Attr(a) => Some(&a.name),
            Token::Element(el) => Some(&el.start.name),
            Token::Text(_) => None,
        }
    }

    /// Returns `true` for a whitespace-only text token.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Text(t) if t.whitespace)
    }
}
