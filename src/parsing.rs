use crate::{
	lexing::{Lexeme, Location, Malformed, Token, TokenKind, Tokens},
	vocab, BlankNode, BlankNodes, GraphLabel, Literal, Quad, Subject, Term, TermError, Triple,
};
use iref::{IriBuf, IriRefBuf};
use locspan::Meta;
use std::collections::VecDeque;

/// Parsing error.
#[derive(Debug)]
pub enum Error<E> {
	Lexer(Malformed<E>),
	Unexpected {
		found: TokenKind,
		text: String,
		expecting: &'static str,
	},
	Term(TermError),
}

pub type MetaError<E> = Meta<Box<Error<E>>, Location>;

impl<E> Error<E> {
	pub fn unexpected<T: Lexeme>(
		token: Option<&T>,
		location: Location,
		expecting: &'static str,
	) -> MetaError<E> {
		let (found, text) = match token {
			Some(token) => (token.kind(), token.to_string()),
			None => (TokenKind::EndOfInput, TokenKind::EndOfInput.to_string()),
		};

		Meta(
			Box::new(Self::Unexpected {
				found,
				text,
				expecting,
			}),
			location,
		)
	}

	pub fn term(cause: TermError, location: Location) -> MetaError<E> {
		Meta(Box::new(Self::Term(cause)), location)
	}

	fn from_lexer(Meta(e, location): Meta<Malformed<E>, Location>) -> MetaError<E> {
		Meta(Box::new(Self::Lexer(e)), location)
	}
}

/// Resolves an IRI reference against an optional base IRI.
pub(crate) fn resolve(iri_ref: IriRefBuf, base: Option<&IriBuf>) -> Result<IriBuf, TermError> {
	match base {
		Some(base) => Ok(iri_ref.resolved(base)),
		None => IriBuf::new(iri_ref.as_str().to_owned()).map_err(|e| TermError::RelativeIri(e.0)),
	}
}

/// Queues the `rdf:first`/`rdf:rest` triples describing a list of `items`,
/// and returns the head of the list.
///
/// The head of the empty list is `rdf:nil`.
pub(crate) fn list(
	triples: &mut VecDeque<Triple>,
	blank_nodes: &mut BlankNodes,
	items: Vec<Term>,
) -> Subject {
	let cells: Vec<BlankNode> = items.iter().map(|_| blank_nodes.fresh()).collect();
	for (i, item) in items.into_iter().enumerate() {
		let rest = match cells.get(i + 1) {
			Some(next) => Term::Blank(next.clone()),
			None => Term::Iri(vocab::iri(vocab::RDF_NIL)),
		};

		let cell = Subject::Blank(cells[i].clone());
		triples.push_back(Triple::new(cell.clone(), vocab::iri(vocab::RDF_FIRST), item));
		triples.push_back(Triple::new(cell, vocab::iri(vocab::RDF_REST), rest));
	}

	match cells.into_iter().next() {
		Some(head) => Subject::Blank(head),
		None => Subject::Iri(vocab::iri(vocab::RDF_NIL)),
	}
}

/// Capacity of the [`Lookahead`] buffer.
pub const LOOKAHEAD: usize = 3;

type Item<L> = Result<
	Meta<Option<<L as Tokens>::Token>, Location>,
	Meta<Malformed<<L as Tokens>::Error>, Location>,
>;

/// Token lookahead buffer.
///
/// Pulls tokens from the lexer only when the parser needs one that is not
/// buffered yet. Once the lexer reached the end of the input, it is never
/// pulled again.
pub struct Lookahead<L: Tokens> {
	lexer: L,
	buffer: VecDeque<Item<L>>,
	end: Option<Location>,
}

impl<L: Tokens> Lookahead<L> {
	pub fn new(lexer: L) -> Self {
		Self {
			lexer,
			buffer: VecDeque::with_capacity(LOOKAHEAD),
			end: None,
		}
	}

	fn pull(&mut self) -> Item<L> {
		if let Some(end) = self.end {
			return Ok(Meta(None, end));
		}

		let item = self.lexer.next_token();
		match &item {
			Ok(Meta(Some(token), loc)) => log::trace!("{loc}: {token}"),
			Ok(Meta(None, loc)) => {
				log::trace!("{loc}: end of input");
				self.end = Some(*loc)
			}
			Err(Meta(e, loc)) => log::trace!("{loc}: malformed lexeme `{}`", e.text.escape_debug()),
		}

		item
	}

	/// Consumes the next token.
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Result<Meta<Option<L::Token>, Location>, MetaError<L::Error>> {
		let item = match self.buffer.pop_front() {
			Some(item) => item,
			None => self.pull(),
		};

		item.map_err(Error::from_lexer)
	}

	/// Returns the next token without consuming it.
	#[allow(clippy::type_complexity)]
	pub fn peek(&mut self) -> Result<Meta<Option<&L::Token>, Location>, MetaError<L::Error>> {
		self.peek_nth(0)
	}

	/// Returns the token `n` positions after the next one, without
	/// consuming anything.
	///
	/// If a malformed lexeme comes first, it is removed from the buffer and
	/// returned as an error. Tokens before it stay buffered.
	///
	/// # Panics
	///
	/// Panics if `n` is not lower than [`LOOKAHEAD`].
	#[allow(clippy::type_complexity)]
	pub fn peek_nth(
		&mut self,
		n: usize,
	) -> Result<Meta<Option<&L::Token>, Location>, MetaError<L::Error>> {
		assert!(
			n < LOOKAHEAD,
			"lookahead of {} tokens exceeds the buffer capacity",
			n + 1
		);

		while self.buffer.len() <= n && !matches!(self.buffer.back(), Some(Err(_))) {
			let item = self.pull();
			self.buffer.push_back(item);
		}

		if let Some(i) = self.buffer.iter().take(n + 1).position(Result::is_err) {
			if let Some(Err(e)) = self.buffer.remove(i) {
				return Err(Error::from_lexer(e));
			}
		}

		match self.buffer.get(n) {
			Some(Ok(Meta(token, loc))) => Ok(Meta(token.as_ref(), *loc)),
			_ => unreachable!("lookahead buffer holds {} tokens", n + 1),
		}
	}
}

/// Element of the N-Triples/N-Quads grammar.
pub trait Parse: Sized {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>>;
}

impl Parse for IriBuf {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>> {
		match parser.next()? {
			Meta(Some(Token::Iri(iri)), loc) => Ok(Meta(iri, loc)),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "predicate")),
		}
	}
}

impl Parse for Subject {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>> {
		match parser.next()? {
			Meta(Some(Token::Iri(iri)), loc) => Ok(Meta(Self::Iri(iri), loc)),
			Meta(Some(Token::BlankNodeLabel(label)), loc) => {
				Ok(Meta(Self::Blank(BlankNode::Label(label)), loc))
			}
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "subject")),
		}
	}
}

/// Parses the optional language tag or datatype following a string literal.
#[allow(clippy::type_complexity)]
fn parse_literal<L: Tokens<Token = Token>>(
	parser: &mut Lookahead<L>,
	string: String,
	string_loc: Location,
) -> Result<Meta<Literal, Location>, MetaError<L::Error>> {
	match parser.peek()? {
		Meta(Some(Token::LangTag(_)), _) => match parser.next()? {
			Meta(Some(Token::LangTag(tag)), tag_loc) => Ok(Meta(
				Literal::LangString(string, tag),
				string_loc.with(tag_loc),
			)),
			Meta(unexpected, loc) => {
				Err(Error::unexpected(unexpected.as_ref(), loc, "language tag"))
			}
		},
		Meta(Some(Token::Carets), _) => {
			parser.next()?;
			match parser.next()? {
				Meta(Some(Token::Iri(iri)), iri_loc) => Ok(Meta(
					Literal::TypedString(string, iri),
					string_loc.with(iri_loc),
				)),
				Meta(unexpected, loc) => {
					Err(Error::unexpected(unexpected.as_ref(), loc, "datatype IRI"))
				}
			}
		}
		_ => Ok(Meta(Literal::String(string), string_loc)),
	}
}

impl Parse for Term {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>> {
		match parser.next()? {
			Meta(Some(Token::Iri(iri)), loc) => Ok(Meta(Self::Iri(iri), loc)),
			Meta(Some(Token::BlankNodeLabel(label)), loc) => {
				Ok(Meta(Self::Blank(BlankNode::Label(label)), loc))
			}
			Meta(Some(Token::StringLiteral(string)), string_loc) => {
				let Meta(lit, loc) = parse_literal(parser, string, string_loc)?;
				Ok(Meta(Self::Literal(lit), loc))
			}
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "object")),
		}
	}
}

fn expect_dot<L: Tokens<Token = Token>>(
	parser: &mut Lookahead<L>,
	expecting: &'static str,
) -> Result<Location, MetaError<L::Error>> {
	match parser.next()? {
		Meta(Some(Token::Dot), loc) => Ok(loc),
		Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, expecting)),
	}
}

impl Parse for Triple {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>> {
		let Meta(subject, loc) = Subject::parse(parser)?;
		let Meta(predicate, _) = IriBuf::parse(parser)?;
		let Meta(object, _) = Term::parse(parser)?;
		let dot_loc = expect_dot(parser, "`.`")?;

		Ok(Meta(
			Triple {
				subject,
				predicate,
				object,
			},
			loc.with(dot_loc),
		))
	}
}

impl Parse for Quad {
	fn parse<L: Tokens<Token = Token>>(
		parser: &mut Lookahead<L>,
	) -> Result<Meta<Self, Location>, MetaError<L::Error>> {
		let Meta(subject, loc) = Subject::parse(parser)?;
		let Meta(predicate, _) = IriBuf::parse(parser)?;
		let Meta(object, _) = Term::parse(parser)?;
		let (graph, end) = match parser.next()? {
			Meta(Some(Token::Dot), dot_loc) => (GraphLabel::default_graph(), dot_loc),
			Meta(Some(Token::Iri(iri)), _) => (GraphLabel::Iri(iri), expect_dot(parser, "`.`")?),
			Meta(Some(Token::BlankNodeLabel(label)), _) => (
				GraphLabel::Blank(BlankNode::Label(label)),
				expect_dot(parser, "`.`")?,
			),
			Meta(unexpected, loc) => {
				return Err(Error::unexpected(
					unexpected.as_ref(),
					loc,
					"graph label or `.`",
				))
			}
		};

		Ok(Meta(
			Quad {
				subject,
				predicate,
				object,
				graph,
			},
			loc.with(end),
		))
	}
}

/// N-Triples/N-Quads statement parser.
pub struct Parser<L: Tokens> {
	tokens: Lookahead<L>,
}

impl<L: Tokens<Token = Token>> Parser<L> {
	pub fn new(lexer: L) -> Self {
		Self {
			tokens: Lookahead::new(lexer),
		}
	}

	/// Parses the next statement, or returns `None` at the end of the input.
	#[allow(clippy::type_complexity)]
	pub fn next_statement<T: Parse>(
		&mut self,
	) -> Result<Option<Meta<T, Location>>, MetaError<L::Error>> {
		match self.tokens.peek()? {
			Meta(None, _) => Ok(None),
			Meta(Some(_), _) => T::parse(&mut self.tokens).map(Some),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexing;
	use std::{convert::Infallible, fmt};

	#[derive(Debug, PartialEq)]
	struct Word(&'static str);

	impl fmt::Display for Word {
		fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
			write!(f, "word `{}`", self.0)
		}
	}

	impl Lexeme for Word {
		fn kind(&self) -> TokenKind {
			TokenKind::Keyword
		}
	}

	/// Lexer over a fixed list of words, where `Err` entries are malformed.
	struct Words {
		words: Vec<Result<&'static str, &'static str>>,
		pulled: usize,
	}

	impl Words {
		fn new(words: Vec<Result<&'static str, &'static str>>) -> Self {
			Self { words, pulled: 0 }
		}
	}

	impl Tokens for Words {
		type Token = Word;
		type Error = Infallible;

		fn next_token(
			&mut self,
		) -> Result<Meta<Option<Word>, Location>, Meta<Malformed<Infallible>, Location>> {
			let loc = Location {
				line: 1,
				column: self.pulled + 1,
				..Default::default()
			};

			let item = self.words.get(self.pulled).copied();
			self.pulled += 1;
			match item {
				None => Ok(Meta(None, loc)),
				Some(Ok(word)) => Ok(Meta(Some(Word(word)), loc)),
				Some(Err(text)) => Err(Meta(
					Malformed {
						error: lexing::Error::Unexpected(None),
						text: text.to_owned(),
					},
					loc,
				)),
			}
		}
	}

	fn next_word(tokens: &mut Lookahead<Words>) -> Option<&'static str> {
		tokens.next().unwrap().0.map(|Word(w)| w)
	}

	#[test]
	fn peek_does_not_consume() {
		let mut tokens = Lookahead::new(Words::new(vec![Ok("a"), Ok("b")]));
		assert_eq!(tokens.peek().unwrap().0, Some(&Word("a")));
		assert_eq!(tokens.peek().unwrap().0, Some(&Word("a")));
		assert_eq!(tokens.lexer.pulled, 1);
		assert_eq!(next_word(&mut tokens), Some("a"));
		assert_eq!(tokens.lexer.pulled, 1);
		assert_eq!(next_word(&mut tokens), Some("b"));
	}

	#[test]
	fn peek_nth_keeps_order() {
		let mut tokens = Lookahead::new(Words::new(vec![Ok("a"), Ok("b"), Ok("c"), Ok("d")]));
		assert_eq!(tokens.peek_nth(2).unwrap().0, Some(&Word("c")));
		assert_eq!(tokens.lexer.pulled, 3);
		assert_eq!(tokens.peek_nth(1).unwrap().0, Some(&Word("b")));
		assert_eq!(next_word(&mut tokens), Some("a"));
		assert_eq!(next_word(&mut tokens), Some("b"));
		assert_eq!(next_word(&mut tokens), Some("c"));
		assert_eq!(next_word(&mut tokens), Some("d"));
		assert_eq!(next_word(&mut tokens), None);
	}

	#[test]
	#[should_panic]
	fn peek_beyond_capacity() {
		let mut tokens = Lookahead::new(Words::new(vec![Ok("a")]));
		let _ = tokens.peek_nth(LOOKAHEAD);
	}

	#[test]
	fn malformed_lexeme_is_reported_once() {
		let mut tokens = Lookahead::new(Words::new(vec![Ok("a"), Err("\"x"), Ok("b")]));
		match tokens.peek_nth(2) {
			Err(Meta(e, loc)) => {
				assert!(matches!(*e, Error::Lexer(Malformed { ref text, .. }) if text == "\"x"));
				assert_eq!(loc.column, 2)
			}
			Ok(_) => panic!("expected a lexical error"),
		}

		assert_eq!(next_word(&mut tokens), Some("a"));
		assert_eq!(next_word(&mut tokens), Some("b"));
	}

	#[test]
	fn end_of_input_is_pulled_once() {
		let mut tokens = Lookahead::new(Words::new(vec![Ok("a")]));
		assert_eq!(tokens.peek_nth(2).unwrap().0, None);
		assert_eq!(tokens.lexer.pulled, 2);
		assert_eq!(next_word(&mut tokens), Some("a"));
		assert_eq!(next_word(&mut tokens), None);
		assert_eq!(next_word(&mut tokens), None);
		assert_eq!(next_word(&mut tokens), None);
		assert_eq!(tokens.lexer.pulled, 2);
	}
}
