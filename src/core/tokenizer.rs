//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end/empty tags
//! - Text content, split at entity references
//! - Entity references (`&name;`), one token each
//! - CDATA sections, comments, processing instructions
//! - XML and DOCTYPE declarations
//!
//! Tokens borrow from the input and carry their byte span, so a tokenizer
//! can be dropped and later resumed at `span.1` with [`Tokenizer::at`].

use super::scanner::Scanner;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content, free of markup and entity references
    Text,
    /// Entity or character reference: &name;
    EntityRef,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// A `<!` declaration other than comment, CDATA or DOCTYPE
    Unknown,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags: the qualified element name
    pub name: &'a str,
    /// Tags: the attribute region. Text/CDATA/comment: the content.
    /// EntityRef: the name between `&` and `;`. PI: the raw `target data`.
    /// DocType: everything after the `DOCTYPE` keyword.
    pub content: &'a str,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: "",
            content: "",
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    fn with_content(mut self, content: &'a str) -> Self {
        self.content = content;
        self
    }
}

/// Malformed input detected by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset in the input
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a str) -> Self {
        Self::at(input, 0)
    }

    /// Resume tokenizing at byte offset `pos`
    pub fn at(input: &'a str, pos: usize) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::at(input.as_bytes(), pos),
        }
    }

    /// Get the current position in the input
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::new(message, self.scanner.position()))
    }

    /// Get the next token. After the end of input every call yields `Eof`.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        let pos = self.scanner.position();
        match self.scanner.peek() {
            None => Ok(Token::new(TokenKind::Eof, (pos, pos))),
            Some(b'<') => self.parse_markup(),
            Some(b'&') => self.parse_entity_ref(),
            Some(_) => Ok(self.parse_text()),
        }
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => self.error("Unexpected end of input after '<'"),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let Some((name_start, name_end)) = self.scanner.read_name() else {
            return self.error("Invalid element name: must start with letter, underscore, or colon");
        };

        // Find the end of the tag, handling quoted attributes
        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return self.error("Unterminated start tag");
        };

        let is_empty = self.input.as_bytes()[end - 1] == b'/' && end - 1 >= name_end;
        let attrs_end = if is_empty { end - 1 } else { end };

        self.scanner.set_position(end + 1);
        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1))
            .with_name(&self.input[name_start..name_end])
            .with_content(&self.input[name_end..attrs_end]))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '/'

        let Some((name_start, name_end)) = self.scanner.read_name() else {
            return self.error("Invalid element name in end tag");
        };

        // End tag can only have whitespace after name
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return self.error("End tag cannot have attributes or other content");
        }
        self.scanner.advance(1);

        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position()))
            .with_name(&self.input[name_start..name_end]))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with(b"--") {
            self.parse_delimited(start, 2, b"-->", TokenKind::Comment, "Unterminated comment")
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_delimited(start, 7, b"]]>", TokenKind::CData, "Unterminated CDATA section")
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            // Hand it to the reader as an unknown token
            let Some(end) = self.scanner.find_tag_end_quoted() else {
                return self.error("Unterminated declaration");
            };
            let name_start = self.scanner.position();
            let name_end = self.scanner.read_name().map_or(name_start, |(_, e)| e);
            self.scanner.set_position(end + 1);
            Ok(Token::new(TokenKind::Unknown, (start, end + 1))
                .with_name(&self.input[name_start..name_end])
                .with_content(&self.input[start + 2..end]))
        }
    }

    /// Parse a construct whose content runs up to a fixed terminator
    fn parse_delimited(
        &mut self,
        start: usize,
        opener: usize,
        terminator: &[u8],
        kind: TokenKind,
        unterminated: &str,
    ) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(opener);
        let content_start = self.scanner.position();
        let Some(pos) = self.scanner.find_seq(terminator) else {
            return self.error(unterminated);
        };
        if kind == TokenKind::Comment && self.input[content_start..pos].contains("--") {
            return Err(ParseError::new("'--' is not allowed inside a comment", content_start));
        }
        self.scanner.set_position(pos + terminator.len());
        Ok(Token::new(kind, (start, self.scanner.position()))
            .with_content(&self.input[content_start..pos]))
    }

    /// Parse a DOCTYPE declaration, skipping over an internal subset.
    /// Format: <!DOCTYPE name [internal subset]> or <!DOCTYPE name SYSTEM "uri">
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // Skip "DOCTYPE"
        let content_start = self.scanner.position();
        let bytes = self.input.as_bytes();

        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut pos = content_start;
        while pos < bytes.len() {
            let b = bytes[pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => {
                        self.scanner.set_position(pos + 1);
                        let content = &self.input[content_start..pos];
                        let name = content.split_ascii_whitespace().next().unwrap_or("");
                        let name = name.split('[').next().unwrap_or("");
                        return Ok(Token::new(TokenKind::DocType, (start, pos + 1))
                            .with_name(name)
                            .with_content(content));
                    }
                    _ => {}
                },
            }
            pos += 1;
        }
        self.error("Unterminated DOCTYPE declaration")
    }

    /// Parse a processing instruction or XML declaration
    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '?'
        let content_start = self.scanner.position();

        let Some((target_start, target_end)) = self.scanner.read_name() else {
            return self.error("Processing instruction target cannot be empty");
        };
        match self.scanner.peek() {
            Some(b' ' | b'\t' | b'\n' | b'\r') => {}
            Some(b'?') if self.scanner.peek_at(1) == Some(b'>') => {}
            _ => return self.error("Invalid character after PI target name"),
        }

        let Some(pos) = self.scanner.find_seq(b"?>") else {
            return self.error("Unterminated processing instruction");
        };
        let target = &self.input[target_start..target_end];
        self.scanner.set_position(pos + 2);

        let kind = if target == "xml" {
            if start != 0 {
                return Err(ParseError::new(
                    "XML declaration is only allowed at the start of the document",
                    start,
                ));
            }
            TokenKind::XmlDeclaration
        } else if target.eq_ignore_ascii_case("xml") {
            return Err(ParseError::new(
                "Processing instruction target cannot be 'xml' (reserved name)",
                target_start,
            ));
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Token::new(kind, (start, pos + 2))
            .with_name(target)
            .with_content(&self.input[content_start..pos]))
    }

    /// Parse an entity or character reference
    fn parse_entity_ref(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        let Some(semi) = self.scanner.find_byte(b';') else {
            return self.error("Unterminated entity reference");
        };
        let name = &self.input[start + 1..semi];
        if name.is_empty() || name.bytes().any(|b| matches!(b, b'<' | b'&') || b.is_ascii_whitespace()) {
            return self.error("Malformed entity reference");
        }
        self.scanner.set_position(semi + 1);
        Ok(Token::new(TokenKind::EntityRef, (start, semi + 1)).with_content(name))
    }

    /// Parse text content up to the next '<' or '&'
    fn parse_text(&mut self) -> Token<'a> {
        let start = self.scanner.position();
        let end = self.scanner.find_text_boundary().unwrap_or(self.input.len());
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, (start, end)).with_content(&self.input[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(input);
        let mut kinds = Vec::new();
        loop {
            let t = tok.next_token().unwrap();
            if t.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(t.kind);
        }
    }

    #[test]
    fn test_simple_element() {
        let mut tok = Tokenizer::new("<root a=\"1\">content</root>");

        let t1 = tok.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name, "root");
        assert_eq!(t1.content, " a=\"1\"");

        let t2 = tok.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::Text);
        assert_eq!(t2.content, "content");

        let t3 = tok.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EndTag);
        assert_eq!(t3.name, "root");
        assert_eq!(tok.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(tok.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_empty_element() {
        let mut tok = Tokenizer::new("<br x='/'/>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::EmptyTag);
        assert_eq!(t.name, "br");
        assert_eq!(t.content, " x='/'");
    }

    #[test]
    fn test_text_split_at_entities() {
        assert_eq!(
            kinds("<a>x &lt; y&#65;</a>"),
            [
                TokenKind::StartTag,
                TokenKind::Text,
                TokenKind::EntityRef,
                TokenKind::Text,
                TokenKind::EntityRef,
                TokenKind::EndTag
            ]
        );
    }

    #[test]
    fn test_cdata() {
        let mut tok = Tokenizer::new("<![CDATA[<script>code</script>]]>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::CData);
        assert_eq!(t.content, "<script>code</script>");
    }

    #[test]
    fn test_comment() {
        let mut tok = Tokenizer::new("<!-- comment -->");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Comment);
        assert_eq!(t.content, " comment ");
        assert!(Tokenizer::new("<!-- a -- b -->").next_token().is_err());
    }

    #[test]
    fn test_processing_instruction() {
        let mut tok = Tokenizer::new("<?xml version=\"1.0\"?><?magic  some data?><?bare?>");
        let decl = tok.next_token().unwrap();
        assert_eq!(decl.kind, TokenKind::XmlDeclaration);

        let pi = tok.next_token().unwrap();
        assert_eq!(pi.kind, TokenKind::ProcessingInstruction);
        assert_eq!(pi.name, "magic");
        assert_eq!(pi.content, "magic  some data");

        let bare = tok.next_token().unwrap();
        assert_eq!(bare.content, "bare");
        assert_eq!(bare.span, (41, 49));
    }

    #[test]
    fn test_doctype_with_subset() {
        let input = "<!DOCTYPE doc [<!ENTITY x \"a>b\"> <!ELEMENT doc ANY>]><doc/>";
        let mut tok = Tokenizer::new(input);
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::DocType);
        assert_eq!(t.name, "doc");
        assert_eq!(tok.next_token().unwrap().kind, TokenKind::EmptyTag);
    }

    #[test]
    fn test_unknown_declaration() {
        let t = Tokenizer::new("<!ELEMENT doc ANY>").next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Unknown);
        assert_eq!(t.name, "ELEMENT");
    }

    #[test]
    fn test_resume() {
        let input = "<a><b/></a>";
        let first = Tokenizer::new(input).next_token().unwrap();
        let second = Tokenizer::at(input, first.span.1).next_token().unwrap();
        assert_eq!(second.kind, TokenKind::EmptyTag);
        assert_eq!(second.name, "b");
    }

    #[test]
    fn test_malformed() {
        let err = Tokenizer::new("<a").next_token().unwrap_err();
        assert_eq!(err.message, "Unterminated start tag");
        assert!(Tokenizer::new("</a b>").next_token().is_err());
        assert!(Tokenizer::new("<1a>").next_token().is_err());
        assert!(Tokenizer::new("&amp").next_token().is_err());
        assert!(Tokenizer::new("<? x?>").next_token().is_err());
        assert!(Tokenizer::new("<a/><?xml version='1.0'?>").nth_error());
    }

    impl<'a> Tokenizer<'a> {
        fn nth_error(&mut self) -> bool {
            loop {
                match self.next_token() {
                    Err(_) => return true,
                    Ok(t) if t.kind == TokenKind::Eof => return false,
                    Ok(_) => {}
                }
            }
        }
    }
}
