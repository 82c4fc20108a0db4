use crate::{
	lexing::{
		is_pn_chars, is_pn_chars_base, is_pn_chars_u, DisplayStringLiteral, Error, Lexeme, Location,
		Malformed, ScanResult, Scanner, TokenKind, Tokens,
	},
	vocab,
};
use decoded_char::DecodedChar;
use iref::IriRefBuf;
use langtag::LangTagBuf;
use locspan::Meta;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
	/// `a`, short for `rdf:type`.
	A,
	True,
	False,

	/// `@prefix`.
	Prefix,

	/// `@base`.
	Base,

	/// `PREFIX`, case insensitive.
	SparqlPrefix,

	/// `BASE`, case insensitive.
	SparqlBase,
}

impl fmt::Display for Keyword {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let s = match self {
			Self::A => "a",
			Self::True => "true",
			Self::False => "false",
			Self::Prefix => "@prefix",
			Self::Base => "@base",
			Self::SparqlPrefix => "PREFIX",
			Self::SparqlBase => "BASE",
		};

		f.write_str(s)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punct {
	Period,
	Semicolon,
	Comma,
	Carets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
	Bracket,
	Parenthesis,
}

impl Delimiter {
	pub fn begin(&self) -> char {
		match self {
			Self::Bracket => '[',
			Self::Parenthesis => '(',
		}
	}

	pub fn end(&self) -> char {
		match self {
			Self::Bracket => ']',
			Self::Parenthesis => ')',
		}
	}
}

/// Numeric literal, kept in its lexical form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Numeric {
	Integer(String),
	Decimal(String),
	Double(String),
}

impl Numeric {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Integer(s) | Self::Decimal(s) | Self::Double(s) => s,
		}
	}

	pub fn into_string(self) -> String {
		match self {
			Self::Integer(s) | Self::Decimal(s) | Self::Double(s) => s,
		}
	}

	/// Datatype IRI of the literal.
	pub fn datatype(&self) -> &'static str {
		match self {
			Self::Integer(_) => vocab::XSD_INTEGER,
			Self::Decimal(_) => vocab::XSD_DECIMAL,
			Self::Double(_) => vocab::XSD_DOUBLE,
		}
	}
}

/// Turtle token.
#[derive(Debug)]
pub enum Token {
	IriRef(IriRefBuf),

	/// Prefixed name, as a prefix and a local part.
	///
	/// Escape sequences of the local part are already decoded.
	CompactIri(String, String),
	BlankNodeLabel(String),
	StringLiteral(String),
	LangTag(LangTagBuf),
	Numeric(Numeric),
	Keyword(Keyword),
	Punct(Punct),
	Begin(Delimiter),
	End(Delimiter),
}

impl Lexeme for Token {
	fn kind(&self) -> TokenKind {
		match self {
			Self::IriRef(_) => TokenKind::IriRef,
			Self::CompactIri(_, _) => TokenKind::PrefixedName,
			Self::BlankNodeLabel(_) => TokenKind::BlankNodeLabel,
			Self::StringLiteral(_) => TokenKind::StringLiteral,
			Self::LangTag(_) => TokenKind::LangTag,
			Self::Numeric(_) => TokenKind::Numeric,
			Self::Keyword(_) => TokenKind::Keyword,
			Self::Punct(Punct::Period) => TokenKind::Dot,
			Self::Punct(Punct::Semicolon) => TokenKind::Semicolon,
			Self::Punct(Punct::Comma) => TokenKind::Comma,
			Self::Punct(Punct::Carets) => TokenKind::Carets,
			Self::Begin(Delimiter::Bracket) => TokenKind::OpenBracket,
			Self::Begin(Delimiter::Parenthesis) => TokenKind::OpenParenthesis,
			Self::End(Delimiter::Bracket) => TokenKind::CloseBracket,
			Self::End(Delimiter::Parenthesis) => TokenKind::CloseParenthesis,
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::IriRef(iri_ref) => write!(f, "IRI reference <{iri_ref}>"),
			Self::CompactIri(prefix, local) => write!(f, "prefixed name `{prefix}:{local}`"),
			Self::BlankNodeLabel(label) => write!(f, "blank node label `_:{label}`"),
			Self::StringLiteral(string) => {
				write!(f, "string literal \"{}\"", DisplayStringLiteral(string))
			}
			Self::LangTag(tag) => write!(f, "language tag `{tag}`"),
			Self::Numeric(n) => write!(f, "numeric literal `{}`", n.as_str()),
			Self::Keyword(k) => write!(f, "keyword `{k}`"),
			Self::Punct(Punct::Period) => write!(f, "dot `.`"),
			Self::Punct(Punct::Semicolon) => write!(f, "semicolon `;`"),
			Self::Punct(Punct::Comma) => write!(f, "comma `,`"),
			Self::Punct(Punct::Carets) => write!(f, "carets `^^`"),
			Self::Begin(d) => write!(f, "opening `{}`", d.begin()),
			Self::End(d) => write!(f, "closing `{}`", d.end()),
		}
	}
}

/// Turtle lexer.
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
	fn next_iri_ref(&mut self) -> ScanResult<IriRefBuf, E> {
		let iri_ref = self.scanner.next_iri_content()?;
		IriRefBuf::new(iri_ref).map_err(|e| self.scanner.fault(Error::InvalidIri(e.0)))
	}

	/// Parses a string literal in any of the four quoting styles, after the
	/// first `quote`.
	fn next_string(&mut self, quote: char) -> ScanResult<String, E> {
		if self.scanner.peek_char()? == Some(quote) {
			self.scanner.next_char()?;
			if self.scanner.peek_char()? == Some(quote) {
				self.scanner.next_char()?;
				self.scanner.next_long_string_literal(quote)
			} else {
				Ok(String::new())
			}
		} else {
			self.scanner.next_string_literal(quote)
		}
	}

	/// Parses a language tag or the `@prefix`/`@base` keywords, after `@`.
	fn next_at(&mut self) -> ScanResult<Token, E> {
		let word = self.scanner.next_langtag_text()?;
		match word.as_str() {
			"prefix" => Ok(Token::Keyword(Keyword::Prefix)),
			"base" => Ok(Token::Keyword(Keyword::Base)),
			_ => match LangTagBuf::new(word) {
				Ok(tag) => Ok(Token::LangTag(tag)),
				Err(_) => Err(self.scanner.fault(Error::InvalidLangTag)),
			},
		}
	}

	fn digits(&mut self, lexical: &mut String) -> ScanResult<usize, E> {
		let mut count = 0;
		while let Some(c) = self.scanner.peek_char()? {
			if c.is_ascii_digit() {
				lexical.push(self.scanner.expect_char()?);
				count += 1
			} else {
				break;
			}
		}

		Ok(count)
	}

	/// Parses a numeric literal starting with `first`: a sign, a digit or a
	/// dot followed by a digit.
	fn next_numeric(&mut self, first: char) -> ScanResult<Numeric, E> {
		let mut lexical = String::new();
		lexical.push(first);

		let mut integer_digits = usize::from(first.is_ascii_digit());
		let mut fraction_digits = 0;
		let mut decimal = first == '.';

		if decimal {
			fraction_digits = self.digits(&mut lexical)?;
		} else {
			integer_digits += self.digits(&mut lexical)?;
			if self.scanner.peek_char()? == Some('.') {
				let has_integer = integer_digits > 0;
				let continues = |c: char| c.is_ascii_digit() || (has_integer && matches!(c, 'e' | 'E'));
				if self.scanner.name_dots(&mut lexical, continues)? {
					if lexical.ends_with("..") {
						return Err(self.scanner.fault(Error::Unexpected(Some('.'))));
					}

					decimal = true;
					fraction_digits = self.digits(&mut lexical)?;
				}
			}
		}

		if integer_digits == 0 && fraction_digits == 0 {
			let unexpected = self.scanner.next_char()?;
			return Err(self.scanner.fault(Error::Unexpected(unexpected)));
		}

		match self.scanner.peek_char()? {
			Some(e @ ('e' | 'E')) => {
				self.scanner.next_char()?;
				lexical.push(e);
				if let Some(sign @ ('+' | '-')) = self.scanner.peek_char()? {
					self.scanner.next_char()?;
					lexical.push(sign)
				}

				if self.digits(&mut lexical)? == 0 {
					let unexpected = self.scanner.next_char()?;
					return Err(self.scanner.fault(Error::Unexpected(unexpected)));
				}

				Ok(Numeric::Double(lexical))
			}
			_ if decimal => Ok(Numeric::Decimal(lexical)),
			_ => Ok(Numeric::Integer(lexical)),
		}
	}

	/// Parses a prefixed name or a keyword starting with `first`.
	fn next_name(&mut self, first: char) -> ScanResult<Token, E> {
		let mut prefix = String::new();
		prefix.push(first);

		let in_prefix = |c: char| is_pn_chars(c) && c != ':';
		loop {
			match self.scanner.peek_char()? {
				Some(':') => {
					self.scanner.next_char()?;
					return self.next_local(prefix);
				}
				Some(c) if in_prefix(c) => prefix.push(self.scanner.expect_char()?),
				Some('.') => {
					if !self.scanner.name_dots(&mut prefix, in_prefix)? {
						break;
					}
				}
				_ => break,
			}
		}

		match prefix.as_str() {
			"a" => Ok(Token::Keyword(Keyword::A)),
			"true" => Ok(Token::Keyword(Keyword::True)),
			"false" => Ok(Token::Keyword(Keyword::False)),
			word if word.eq_ignore_ascii_case("prefix") => Ok(Token::Keyword(Keyword::SparqlPrefix)),
			word if word.eq_ignore_ascii_case("base") => Ok(Token::Keyword(Keyword::SparqlBase)),
			_ => Err(self.scanner.fault(Error::UnknownKeyword(prefix))),
		}
	}

	/// Parses the local part of a prefixed name, after the `:`.
	fn next_local(&mut self, prefix: String) -> ScanResult<Token, E> {
		let mut local = String::new();
		let in_local = |c: char| is_pn_chars(c) || matches!(c, ':' | '%' | '\\');

		loop {
			match self.scanner.peek_char()? {
				Some(c) if local.is_empty() && !(is_pn_chars_u(c) || c.is_ascii_digit() || matches!(c, '%' | '\\')) => break,
				Some('%') => {
					local.push(self.scanner.expect_char()?);
					for _ in 0..2 {
						let c = self.scanner.expect_char()?;
						if !c.is_ascii_hexdigit() {
							return Err(self.scanner.fault(Error::Unexpected(Some(c))));
						}

						local.push(c)
					}
				}
				Some('\\') => {
					self.scanner.next_char()?;
					match self.scanner.expect_char()? {
						c @ ('_' | '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*'
						| '+' | ',' | ';' | '=' | '/' | '?' | '#' | '@' | '%') => local.push(c),
						c => return Err(self.scanner.fault(Error::Unexpected(Some(c)))),
					}
				}
				Some(c) if is_pn_chars(c) || c == ':' => local.push(self.scanner.expect_char()?),
				Some('.') => {
					if !self.scanner.name_dots(&mut local, in_local)? {
						break;
					}
				}
				_ => break,
			}
		}

		Ok(Token::CompactIri(prefix, local))
	}

	#[allow(clippy::type_complexity)]
	pub fn consume(&mut self) -> Result<Meta<Option<Token>, Location>, Meta<Malformed<E>, Location>> {
		if let Some(dot) = self.scanner.take_dot() {
			return Ok(Meta(Some(Token::Punct(Punct::Period)), dot));
		}

		self.scanner.begin()?;
		let token = match self.scanner.next_char()? {
			Some('<') => Token::IriRef(self.next_iri_ref()?),
			Some('@') => self.next_at()?,
			Some(quote @ ('"' | '\'')) => Token::StringLiteral(self.next_string(quote)?),
			Some('_') => Token::BlankNodeLabel(self.scanner.next_blank_node_label()?),
			Some('.') => match self.scanner.peek_char()? {
				Some(c) if c.is_ascii_digit() => Token::Numeric(self.next_numeric('.')?),
				_ => Token::Punct(Punct::Period),
			},
			Some(';') => Token::Punct(Punct::Semicolon),
			Some(',') => Token::Punct(Punct::Comma),
			Some('^') => match self.scanner.next_char()? {
				Some('^') => Token::Punct(Punct::Carets),
				unexpected => return Err(self.scanner.fault(Error::Unexpected(unexpected))),
			},
			Some('[') => Token::Begin(Delimiter::Bracket),
			Some(']') => Token::End(Delimiter::Bracket),
			Some('(') => Token::Begin(Delimiter::Parenthesis),
			Some(')') => Token::End(Delimiter::Parenthesis),
			Some(c @ ('+' | '-' | '0'..='9')) => Token::Numeric(self.next_numeric(c)?),
			Some(':') => self.next_local(String::new())?,
			Some(c) if is_pn_chars_base(c) => self.next_name(c)?,
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
