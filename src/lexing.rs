use decoded_char::DecodedChar;
use iref::IriBuf;
use langtag::LangTagBuf;
use locspan::{Meta, Span};
use std::{collections::VecDeque, convert::Infallible, fmt, iter::Peekable};

/// Position of a token in the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Location {
	/// Byte span of the lexeme.
	pub span: Span,

	/// Line of the first character, starting at 1.
	pub line: usize,

	/// Column of the first character, starting at 1.
	pub column: usize,
}

impl Location {
	/// Extends this location up to the end of `other`.
	pub fn with(self, other: Location) -> Self {
		Self {
			span: self.span.union(other.span),
			..self
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// Token kind, as reported in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
	IriRef,
	PrefixedName,
	BlankNodeLabel,
	StringLiteral,
	LangTag,
	Numeric,
	Keyword,
	Dot,
	Comma,
	Semicolon,
	Carets,
	OpenBracket,
	CloseBracket,
	OpenParenthesis,
	CloseParenthesis,
	Element,
	Attribute,
	Text,
	EndOfInput,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let name = match self {
			Self::IriRef => "IRI reference",
			Self::PrefixedName => "prefixed name",
			Self::BlankNodeLabel => "blank node label",
			Self::StringLiteral => "string literal",
			Self::LangTag => "language tag",
			Self::Numeric => "numeric literal",
			Self::Keyword => "keyword",
			Self::Dot => "dot",
			Self::Comma => "comma",
			Self::Semicolon => "semicolon",
			Self::Carets => "carets",
			Self::OpenBracket => "opening bracket",
			Self::CloseBracket => "closing bracket",
			Self::OpenParenthesis => "opening parenthesis",
			Self::CloseParenthesis => "closing parenthesis",
			Self::Element => "XML element",
			Self::Attribute => "XML attribute",
			Self::Text => "XML text",
			Self::EndOfInput => "end of input",
		};

		f.write_str(name)
	}
}

/// Token that can be reported in a diagnostic.
pub trait Lexeme: fmt::Display {
	fn kind(&self) -> TokenKind;
}

/// Lexing error.
#[derive(Debug)]
pub enum Error<E = Infallible> {
	InvalidLangTag,
	InvalidCodepoint(u32),
	InvalidIri(String),
	Unexpected(Option<char>),
	UnknownKeyword(String),
	Markup(String),
	Stream(E),
}

impl<E: fmt::Display> fmt::Display for Error<E> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::InvalidLangTag => write!(f, "invalid language tag"),
			Self::InvalidCodepoint(c) => write!(f, "invalid character code point {c:x}"),
			Self::InvalidIri(iri) => write!(f, "invalid IRI <{iri}>"),
			Self::Unexpected(None) => write!(f, "unexpected end of file"),
			Self::Unexpected(Some(c)) => write!(f, "unexpected character `{}`", c.escape_debug()),
			Self::UnknownKeyword(word) => write!(f, "unknown keyword `{word}`"),
			Self::Markup(e) => write!(f, "malformed XML: {e}"),
			Self::Stream(e) => e.fmt(f),
		}
	}
}

impl<E: 'static + std::error::Error> std::error::Error for Error<E> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Stream(e) => Some(e),
			_ => None,
		}
	}
}

/// Malformed lexeme.
///
/// Carries the raw text read from the start of the lexeme up to
/// the faulty character.
#[derive(Debug)]
pub struct Malformed<E> {
	pub error: Error<E>,
	pub text: String,
}

/// Fallible token stream.
///
/// The end of the input is signaled by a `None` token, and a lexical error
/// by a located [`Malformed`] lexeme. Streams never rewind.
pub trait Tokens {
	type Token: Lexeme;

	/// Error of the underlying character stream.
	type Error;

	#[allow(clippy::type_complexity)]
	fn next_token(
		&mut self,
	) -> Result<Meta<Option<Self::Token>, Location>, Meta<Malformed<Self::Error>, Location>>;
}

/// N-Triples/N-Quads token.
#[derive(Debug)]
pub enum Token {
	LangTag(LangTagBuf),
	Iri(IriBuf),
	StringLiteral(String),
	BlankNodeLabel(String),
	Dot,
	Carets,
}

impl Lexeme for Token {
	fn kind(&self) -> TokenKind {
		match self {
			Self::LangTag(_) => TokenKind::LangTag,
			Self::Iri(_) => TokenKind::IriRef,
			Self::StringLiteral(_) => TokenKind::StringLiteral,
			Self::BlankNodeLabel(_) => TokenKind::BlankNodeLabel,
			Self::Dot => TokenKind::Dot,
			Self::Carets => TokenKind::Carets,
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::LangTag(tag) => write!(f, "language tag `{tag}`"),
			Self::Iri(iri) => write!(f, "IRI <{iri}>"),
			Self::StringLiteral(string) => {
				write!(f, "string literal \"{}\"", DisplayStringLiteral(string))
			}
			Self::BlankNodeLabel(label) => write!(f, "blank node label `_:{label}`"),
			Self::Dot => write!(f, "dot `.`"),
			Self::Carets => write!(f, "carets `^^`"),
		}
	}
}

/// Wrapper to display string literals.
pub struct DisplayStringLiteral<'a>(pub &'a str);

impl<'a> fmt::Display for DisplayStringLiteral<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for c in self.0.chars() {
			match c {
				'"' => write!(f, "\\\""),
				'\\' => write!(f, "\\\\"),
				'\n' => write!(f, "\\n"),
				'\r' => write!(f, "\\r"),
				'\t' => write!(f, "\\t"),
				'\u{08}' => write!(f, "\\b"),
				'\u{0c}' => write!(f, "\\f"),
				c => c.fmt(f),
			}?
		}

		Ok(())
	}
}

/// Character stream over a string slice.
pub type StrChars<'a> = std::iter::Map<
	decoded_char::Utf8Decoded<std::str::Chars<'a>>,
	fn(DecodedChar) -> Result<DecodedChar, Infallible>,
>;

/// Creates an infallible character stream from a string slice.
pub fn str_chars(input: &str) -> StrChars<'_> {
	decoded_char::Utf8Decoded::new(input.chars())
		.map(Ok as fn(DecodedChar) -> Result<DecodedChar, Infallible>)
}

/// Cursor position.
#[derive(Clone, Copy, Debug)]
struct Cursor {
	offset: usize,
	line: usize,
	column: usize,
}

impl Default for Cursor {
	fn default() -> Self {
		Self {
			offset: 0,
			line: 1,
			column: 1,
		}
	}
}

impl Cursor {
	fn advance(&mut self, c: DecodedChar) {
		self.offset += c.len();
		if c.into_char() == '\n' {
			self.line += 1;
			self.column = 1
		} else {
			self.column += 1
		}
	}

	fn until(self, end: Cursor) -> Location {
		Location {
			span: Span::new(self.offset, end.offset),
			line: self.line,
			column: self.column,
		}
	}

	fn here(self) -> Location {
		self.until(self)
	}
}

/// Character scanner shared by the text lexers.
///
/// Keeps track of the current lexeme start and raw text so that
/// malformed lexemes can be reported where they begin.
pub(crate) struct Scanner<C: Iterator> {
	chars: Peekable<C>,
	cursor: Cursor,
	start: Cursor,
	end: Option<Cursor>,
	lexeme: String,
	dots: VecDeque<Location>,
}

pub(crate) type ScanResult<T, E> = Result<T, Meta<Malformed<E>, Location>>;

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Scanner<C> {
	pub fn new(chars: C) -> Self {
		Self {
			chars: chars.peekable(),
			cursor: Cursor::default(),
			start: Cursor::default(),
			end: None,
			lexeme: String::new(),
			dots: VecDeque::new(),
		}
	}

	pub fn peek_char(&mut self) -> ScanResult<Option<char>, E> {
		match self.chars.peek() {
			None => Ok(None),
			Some(Ok(c)) => Ok(Some(c.into_char())),
			Some(Err(_)) => self.next_char(),
		}
	}

	pub fn next_char(&mut self) -> ScanResult<Option<char>, E> {
		match self.chars.next() {
			Some(Ok(c)) => {
				self.cursor.advance(c);
				let c = c.into_char();
				self.lexeme.push(c);
				Ok(Some(c))
			}
			Some(Err(e)) => Err(self.fault(Error::Stream(e))),
			None => Ok(None),
		}
	}

	pub fn expect_char(&mut self) -> ScanResult<char, E> {
		self.next_char()?
			.ok_or_else(|| self.fault(Error::Unexpected(None)))
	}

	/// Returns a dot split off the end of the previous lexeme, if any.
	pub fn take_dot(&mut self) -> Option<Location> {
		self.dots.pop_front()
	}

	/// Begins a new lexeme.
	///
	/// Skips white spaces and comments first.
	pub fn begin(&mut self) -> ScanResult<(), E> {
		loop {
			self.start = self.cursor;
			self.end = None;
			self.lexeme.clear();

			match self.peek_char()? {
				Some(c) if c.is_whitespace() => {
					self.next_char()?;
				}
				Some('#') => self.skip_comment()?,
				_ => break Ok(()),
			}
		}
	}

	/// Location of the current lexeme.
	pub fn location(&self) -> Location {
		self.start.until(self.end.unwrap_or(self.cursor))
	}

	/// Empty location at the cursor.
	pub fn here(&self) -> Location {
		self.cursor.here()
	}

	pub fn fault(&self, error: Error<E>) -> Meta<Malformed<E>, Location> {
		Meta(
			Malformed {
				error,
				text: self.lexeme.clone(),
			},
			self.location(),
		)
	}

	/// Skips a comment, from `#` to the end of the line.
	fn skip_comment(&mut self) -> ScanResult<(), E> {
		loop {
			if matches!(self.next_char()?, None | Some('\n')) {
				break Ok(());
			}
		}
	}

	/// Consumes a run of dots inside a name.
	///
	/// If the name continues after the dots (as decided by `continues`),
	/// the dots are appended to `name` and `true` is returned. Otherwise the
	/// name ends before the dots, which are queued as separate tokens.
	pub fn name_dots(
		&mut self,
		name: &mut String,
		continues: impl Fn(char) -> bool,
	) -> ScanResult<bool, E> {
		let end = self.cursor;
		let mut dots = Vec::new();
		while let Some('.') = self.peek_char()? {
			let at = self.cursor;
			self.next_char()?;
			dots.push(at.until(self.cursor));
		}

		match self.peek_char()? {
			Some(c) if continues(c) => {
				name.extend(dots.iter().map(|_| '.'));
				Ok(true)
			}
			_ => {
				self.end = Some(end);
				self.dots.extend(dots);
				Ok(false)
			}
		}
	}

	/// Parses the rest of a language tag, after the first `@` character.
	pub fn next_langtag_text(&mut self) -> ScanResult<String, E> {
		let mut tag = String::new();

		while let Some(c) = self.peek_char()? {
			if c.is_ascii_alphabetic() {
				tag.push(self.expect_char()?)
			} else {
				break;
			}
		}

		if tag.is_empty() {
			return Err(self.fault(Error::InvalidLangTag));
		}

		while let Some('-') = self.peek_char()? {
			tag.push(self.expect_char()?);
			let mut empty_subtag = true;
			while let Some(c) = self.peek_char()? {
				if c.is_ascii_alphanumeric() {
					empty_subtag = false;
					tag.push(self.expect_char()?)
				} else {
					break;
				}
			}

			if empty_subtag {
				return Err(self.fault(Error::InvalidLangTag));
			}
		}

		Ok(tag)
	}

	pub fn next_langtag(&mut self) -> ScanResult<LangTagBuf, E> {
		let tag = self.next_langtag_text()?;
		LangTagBuf::new(tag).map_err(|_| self.fault(Error::InvalidLangTag))
	}

	/// Parses the content of an IRI, starting after the first `<` until the
	/// closing `>`.
	pub fn next_iri_content(&mut self) -> ScanResult<String, E> {
		let mut iri = String::new();

		loop {
			match self.next_char()? {
				Some('>') => break,
				Some('\\') => {
					let c = match self.next_char()? {
						Some('u') => self.next_uchar(4)?,
						Some('U') => self.next_uchar(8)?,
						unexpected => return Err(self.fault(Error::Unexpected(unexpected))),
					};

					iri.push(c)
				}
				Some(c) => {
					if matches!(
						c,
						'\u{00}'..='\u{20}' | '<' | '"' | '{' | '}' | '|' | '^' | '`'
					) {
						return Err(self.fault(Error::Unexpected(Some(c))));
					}

					iri.push(c)
				}
				None => return Err(self.fault(Error::Unexpected(None))),
			}
		}

		Ok(iri)
	}

	fn next_uchar(&mut self, len: u8) -> ScanResult<char, E> {
		let mut codepoint = 0;

		for _ in 0..len {
			let c = self.expect_char()?;
			match c.to_digit(16) {
				Some(d) => codepoint = codepoint << 4 | d,
				None => return Err(self.fault(Error::Unexpected(Some(c)))),
			}
		}

		char::try_from(codepoint).map_err(|_| self.fault(Error::InvalidCodepoint(codepoint)))
	}

	fn next_echar(&mut self) -> ScanResult<char, E> {
		match self.next_char()? {
			Some('u') => self.next_uchar(4),
			Some('U') => self.next_uchar(8),
			Some('t') => Ok('\t'),
			Some('b') => Ok('\u{08}'),
			Some('n') => Ok('\n'),
			Some('r') => Ok('\r'),
			Some('f') => Ok('\u{0c}'),
			Some('\'') => Ok('\''),
			Some('"') => Ok('"'),
			Some('\\') => Ok('\\'),
			unexpected => Err(self.fault(Error::Unexpected(unexpected))),
		}
	}

	/// Parses a single-line string literal, starting after the opening
	/// `quote` until the closing one.
	pub fn next_string_literal(&mut self, quote: char) -> ScanResult<String, E> {
		let mut string = String::new();

		loop {
			match self.next_char()? {
				Some(c) if c == quote => break,
				Some('\\') => string.push(self.next_echar()?),
				Some(c) => {
					if matches!(c, '\n' | '\r') {
						return Err(self.fault(Error::Unexpected(Some(c))));
					}

					string.push(c)
				}
				None => return Err(self.fault(Error::Unexpected(None))),
			}
		}

		Ok(string)
	}

	/// Parses a long string literal, starting after the three opening
	/// `quote` characters until the three closing ones.
	pub fn next_long_string_literal(&mut self, quote: char) -> ScanResult<String, E> {
		let mut string = String::new();

		loop {
			match self.next_char()? {
				Some(c) if c == quote => {
					let mut quotes = 1;
					while quotes < 3 && self.peek_char()? == Some(quote) {
						self.next_char()?;
						quotes += 1
					}

					if quotes == 3 {
						break;
					}

					string.extend(std::iter::repeat(quote).take(quotes))
				}
				Some('\\') => string.push(self.next_echar()?),
				Some(c) => string.push(c),
				None => return Err(self.fault(Error::Unexpected(None))),
			}
		}

		Ok(string)
	}

	/// Parses a blank node label, starting after the first `_`.
	///
	/// The returned label does not include the `_:` prefix. Dots ending the
	/// label are split off and queued as separate tokens.
	pub fn next_blank_node_label(&mut self) -> ScanResult<String, E> {
		match self.next_char()? {
			Some(':') => match self.next_char()? {
				Some(c) if c.is_ascii_digit() || is_pn_chars_u(c) => {
					let mut label = String::new();
					label.push(c);
					loop {
						match self.peek_char()? {
							Some(c) if is_pn_chars(c) => label.push(self.expect_char()?),
							Some('.') => {
								if !self.name_dots(&mut label, is_pn_chars)? {
									break;
								}
							}
							_ => break,
						}
					}

					Ok(label)
				}
				unexpected => Err(self.fault(Error::Unexpected(unexpected))),
			},
			unexpected => Err(self.fault(Error::Unexpected(unexpected))),
		}
	}
}

/// N-Triples/N-Quads lexer.
///
/// Changes a character iterator into a `Token` iterator.
pub struct Lexer<C: Iterator<Item = Result<DecodedChar, E>>, E> {
	scanner: Scanner<C>,
}

impl<C: Iterator<Item = Result<DecodedChar, E>>, E> Lexer<C, E> {
	pub fn new(chars: C) -> Self {
		Self {
			scanner: Scanner::new(chars),
		}
	}
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Lexer<C, E> {
	fn next_iri(&mut self) -> ScanResult<IriBuf, E> {
		let iri = self.scanner.next_iri_content()?;
		IriBuf::new(iri).map_err(|e| self.scanner.fault(Error::InvalidIri(e.0)))
	}

	#[allow(clippy::type_complexity)]
	pub fn consume(&mut self) -> Result<Meta<Option<Token>, Location>, Meta<Malformed<E>, Location>> {
		if let Some(dot) = self.scanner.take_dot() {
			return Ok(Meta(Some(Token::Dot), dot));
		}

		self.scanner.begin()?;
		let token = match self.scanner.next_char()? {
			Some('@') => Token::LangTag(self.scanner.next_langtag()?),
			Some('<') => Token::Iri(self.next_iri()?),
			Some('"') => Token::StringLiteral(self.scanner.next_string_literal('"')?),
			Some('_') => Token::BlankNodeLabel(self.scanner.next_blank_node_label()?),
			Some('.') => Token::Dot,
			Some('^') => match self.scanner.next_char()? {
				Some('^') => Token::Carets,
				unexpected => return Err(self.scanner.fault(Error::Unexpected(unexpected))),
			},
			None => return Ok(Meta(None, self.scanner.here())),
			unexpected => return Err(self.scanner.fault(Error::Unexpected(unexpected))),
		};

		Ok(Meta(Some(token), self.scanner.location()))
	}
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Tokens for Lexer<C, E> {
	type Token = Token;
	type Error = E;

	fn next_token(&mut self) -> Result<Meta<Option<Token>, Location>, Meta<Malformed<E>, Location>> {
		self.consume()
	}
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Iterator for Lexer<C, E> {
	type Item = Result<Meta<Token, Location>, Meta<Malformed<E>, Location>>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.consume() {
			Ok(Meta(Some(token), loc)) => Some(Ok(Meta(token, loc))),
			Ok(Meta(None, _)) => None,
			Err(e) => Some(Err(e)),
		}
	}
}

pub(crate) fn is_pn_chars_base(c: char) -> bool {
	matches!(c, 'A'..='Z' | 'a'..='z' | '\u{00c0}'..='\u{00d6}' | '\u{00d8}'..='\u{00f6}' | '\u{00f8}'..='\u{02ff}' | '\u{0370}'..='\u{037d}' | '\u{037f}'..='\u{1fff}' | '\u{200c}'..='\u{200d}' | '\u{2070}'..='\u{218f}' | '\u{2c00}'..='\u{2fef}' | '\u{3001}'..='\u{d7ff}' | '\u{f900}'..='\u{fdcf}' | '\u{fdf0}'..='\u{fffd}' | '\u{10000}'..='\u{effff}')
}

pub(crate) fn is_pn_chars_u(c: char) -> bool {
	is_pn_chars_base(c) || matches!(c, '_' | ':')
}

pub(crate) fn is_pn_chars(c: char) -> bool {
	is_pn_chars_u(c)
		|| matches!(c, '-' | '0'..='9' | '\u{00b7}' | '\u{0300}'..='\u{036f}' | '\u{203f}'..='\u{2040}')
}
