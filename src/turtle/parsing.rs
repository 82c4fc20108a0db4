use super::lexing::{Delimiter, Keyword, Punct, Token};
use crate::{
	lexing::{Location, Tokens},
	parsing::{self, Error, Lookahead, MetaError},
	vocab, BlankNode, BlankNodes, Literal, Subject, Term, TermError, Triple,
};
use iref::{IriBuf, IriRefBuf};
use locspan::Meta;
use std::collections::{HashMap, VecDeque};

type Result<T, E> = std::result::Result<T, MetaError<E>>;

/// Turtle parser.
///
/// A statement may describe many triples. They are queued and handed out
/// one at a time, nested descriptions first.
pub struct Parser<L: Tokens> {
	tokens: Lookahead<L>,
	base: Option<IriBuf>,
	prefixes: HashMap<String, IriBuf>,
	blank_nodes: BlankNodes,
	triples: VecDeque<Triple>,
}

impl<L: Tokens<Token = Token>> Parser<L> {
	pub fn new(lexer: L) -> Self {
		Self {
			tokens: Lookahead::new(lexer),
			base: None,
			prefixes: HashMap::new(),
			blank_nodes: BlankNodes::default(),
			triples: VecDeque::new(),
		}
	}

	/// Sets the base IRI used to resolve the IRI references parsed from now
	/// on.
	pub fn set_base(&mut self, base: IriBuf) {
		self.base = Some(base)
	}

	pub fn base(&self) -> Option<&IriBuf> {
		self.base.as_ref()
	}

	/// Returns the IRI bound to `prefix`, if any.
	pub fn prefix(&self, prefix: &str) -> Option<&IriBuf> {
		self.prefixes.get(prefix)
	}

	/// Returns the next triple, or `None` at the end of the input.
	///
	/// On error, the triples already built for the faulty statement are
	/// discarded.
	pub fn next_triple(&mut self) -> Result<Option<Triple>, L::Error> {
		loop {
			if let Some(triple) = self.triples.pop_front() {
				return Ok(Some(triple));
			}

			if self.tokens.peek()?.0.is_none() {
				return Ok(None);
			}

			if let Err(e) = self.statement() {
				self.triples.clear();
				return Err(e);
			}
		}
	}

	fn statement(&mut self) -> Result<(), L::Error> {
		match self.tokens.peek()? {
			Meta(Some(Token::Keyword(Keyword::Prefix)), _) => {
				self.tokens.next()?;
				self.prefix_directive()?;
				self.expect_period()
			}
			Meta(Some(Token::Keyword(Keyword::Base)), _) => {
				self.tokens.next()?;
				self.base_directive()?;
				self.expect_period()
			}
			Meta(Some(Token::Keyword(Keyword::SparqlPrefix)), _) => {
				self.tokens.next()?;
				self.prefix_directive()
			}
			Meta(Some(Token::Keyword(Keyword::SparqlBase)), _) => {
				self.tokens.next()?;
				self.base_directive()
			}
			_ => {
				self.triples_statement()?;
				self.expect_period()
			}
		}
	}

	fn prefix_directive(&mut self) -> Result<(), L::Error> {
		let prefix = match self.tokens.next()? {
			Meta(Some(Token::CompactIri(prefix, local)), _) if local.is_empty() => prefix,
			Meta(unexpected, loc) => {
				return Err(Error::unexpected(unexpected.as_ref(), loc, "prefix name"))
			}
		};

		let iri = match self.tokens.next()? {
			Meta(Some(Token::IriRef(iri_ref)), loc) => self.resolve(iri_ref, loc)?,
			Meta(unexpected, loc) => {
				return Err(Error::unexpected(unexpected.as_ref(), loc, "IRI reference"))
			}
		};

		log::debug!("prefix `{prefix}:` bound to <{iri}>");
		self.prefixes.insert(prefix, iri);
		Ok(())
	}

	fn base_directive(&mut self) -> Result<(), L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::IriRef(iri_ref)), loc) => {
				let base = self.resolve(iri_ref, loc)?;
				log::debug!("base IRI set to <{base}>");
				self.base = Some(base);
				Ok(())
			}
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "IRI reference")),
		}
	}

	/// Resolves an IRI reference against the current base IRI.
	fn resolve(&self, iri_ref: IriRefBuf, loc: Location) -> Result<IriBuf, L::Error> {
		parsing::resolve(iri_ref, self.base.as_ref()).map_err(|e| Error::term(e, loc))
	}

	/// Expands a prefixed name through the prefix table.
	fn expand(&self, prefix: String, local: String, loc: Location) -> Result<IriBuf, L::Error> {
		match self.prefixes.get(&prefix) {
			Some(namespace) => {
				let mut iri = namespace.as_str().to_owned();
				iri.push_str(&local);
				IriBuf::new(iri).map_err(|e| Error::term(TermError::InvalidIri(e.0), loc))
			}
			None => Err(Error::term(TermError::UndefinedPrefix(prefix), loc)),
		}
	}

	fn triples_statement(&mut self) -> Result<(), L::Error> {
		let is_property_list = matches!(self.tokens.peek()?.0, Some(Token::Begin(Delimiter::Bracket)))
			&& !matches!(self.tokens.peek_nth(1)?.0, Some(Token::End(Delimiter::Bracket)));

		if is_property_list {
			self.tokens.next()?;
			let subject = Subject::Blank(self.blank_node_property_list()?);
			if matches!(self.tokens.peek()?.0, Some(Token::Punct(Punct::Period))) {
				Ok(())
			} else {
				self.predicate_object_list(&subject)
			}
		} else {
			let subject = self.subject()?;
			self.predicate_object_list(&subject)
		}
	}

	fn subject(&mut self) -> Result<Subject, L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::IriRef(iri_ref)), loc) => Ok(Subject::Iri(self.resolve(iri_ref, loc)?)),
			Meta(Some(Token::CompactIri(prefix, local)), loc) => {
				Ok(Subject::Iri(self.expand(prefix, local, loc)?))
			}
			Meta(Some(Token::BlankNodeLabel(label)), _) => Ok(Subject::Blank(BlankNode::Label(label))),
			Meta(Some(Token::Begin(Delimiter::Bracket)), _) => {
				self.expect_end(Delimiter::Bracket, "`]`")?;
				Ok(Subject::Blank(self.blank_nodes.fresh()))
			}
			Meta(Some(Token::Begin(Delimiter::Parenthesis)), _) => self.collection(),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "subject")),
		}
	}

	/// Parses the content of a blank node property list, after the `[`.
	fn blank_node_property_list(&mut self) -> Result<BlankNode, L::Error> {
		let node = self.blank_nodes.fresh();
		if !self.eat_end(Delimiter::Bracket)? {
			self.predicate_object_list(&Subject::Blank(node.clone()))?;
			self.expect_end(Delimiter::Bracket, "`]`")?;
		}

		Ok(node)
	}

	fn predicate_object_list(&mut self, subject: &Subject) -> Result<(), L::Error> {
		loop {
			let predicate = self.verb()?;
			self.object_list(subject, &predicate)?;

			if !self.eat_punct(Punct::Semicolon)? {
				break Ok(());
			}

			while self.eat_punct(Punct::Semicolon)? {}

			if matches!(
				self.tokens.peek()?.0,
				None | Some(Token::Punct(Punct::Period)) | Some(Token::End(Delimiter::Bracket))
			) {
				break Ok(());
			}
		}
	}

	fn verb(&mut self) -> Result<IriBuf, L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::Keyword(Keyword::A)), _) => Ok(vocab::iri(vocab::RDF_TYPE)),
			Meta(Some(Token::IriRef(iri_ref)), loc) => self.resolve(iri_ref, loc),
			Meta(Some(Token::CompactIri(prefix, local)), loc) => self.expand(prefix, local, loc),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "predicate")),
		}
	}

	fn object_list(&mut self, subject: &Subject, predicate: &IriBuf) -> Result<(), L::Error> {
		loop {
			let object = self.object()?;
			self.triples
				.push_back(Triple::new(subject.clone(), predicate.clone(), object));

			if !self.eat_punct(Punct::Comma)? {
				break Ok(());
			}
		}
	}

	fn object(&mut self) -> Result<Term, L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::IriRef(iri_ref)), loc) => Ok(Term::Iri(self.resolve(iri_ref, loc)?)),
			Meta(Some(Token::CompactIri(prefix, local)), loc) => {
				Ok(Term::Iri(self.expand(prefix, local, loc)?))
			}
			Meta(Some(Token::BlankNodeLabel(label)), _) => Ok(Term::Blank(BlankNode::Label(label))),
			Meta(Some(Token::Begin(Delimiter::Bracket)), _) => {
				Ok(Term::Blank(self.blank_node_property_list()?))
			}
			Meta(Some(Token::Begin(Delimiter::Parenthesis)), _) => Ok(self.collection()?.into()),
			Meta(Some(Token::StringLiteral(string)), _) => Ok(Term::Literal(self.literal(string)?)),
			Meta(Some(Token::Numeric(n)), _) => {
				let datatype = vocab::iri(n.datatype());
				Ok(Term::Literal(Literal::TypedString(n.into_string(), datatype)))
			}
			Meta(Some(Token::Keyword(Keyword::True)), _) => Ok(boolean("true")),
			Meta(Some(Token::Keyword(Keyword::False)), _) => Ok(boolean("false")),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "object")),
		}
	}

	/// Parses the optional language tag or datatype following a string.
	fn literal(&mut self, string: String) -> Result<Literal, L::Error> {
		match self.tokens.peek()? {
			Meta(Some(Token::LangTag(_)), _) => match self.tokens.next()? {
				Meta(Some(Token::LangTag(tag)), _) => Ok(Literal::LangString(string, tag)),
				Meta(unexpected, loc) => {
					Err(Error::unexpected(unexpected.as_ref(), loc, "language tag"))
				}
			},
			Meta(Some(Token::Punct(Punct::Carets)), _) => {
				self.tokens.next()?;
				let datatype = match self.tokens.next()? {
					Meta(Some(Token::IriRef(iri_ref)), loc) => self.resolve(iri_ref, loc)?,
					Meta(Some(Token::CompactIri(prefix, local)), loc) => {
						self.expand(prefix, local, loc)?
					}
					Meta(unexpected, loc) => {
						return Err(Error::unexpected(unexpected.as_ref(), loc, "datatype IRI"))
					}
				};

				Ok(Literal::TypedString(string, datatype))
			}
			_ => Ok(Literal::String(string)),
		}
	}

	/// Parses a collection, after the `(`.
	///
	/// Returns the head of the list, `rdf:nil` if it is empty.
	fn collection(&mut self) -> Result<Subject, L::Error> {
		let mut items = Vec::new();
		while !self.eat_end(Delimiter::Parenthesis)? {
			items.push(self.object()?);
		}

		Ok(parsing::list(&mut self.triples, &mut self.blank_nodes, items))
	}

	fn eat_punct(&mut self, punct: Punct) -> Result<bool, L::Error> {
		let found = matches!(self.tokens.peek()?.0, Some(Token::Punct(p)) if *p == punct);
		if found {
			self.tokens.next()?;
		}

		Ok(found)
	}

	fn eat_end(&mut self, delimiter: Delimiter) -> Result<bool, L::Error> {
		let found = matches!(self.tokens.peek()?.0, Some(Token::End(d)) if *d == delimiter);
		if found {
			self.tokens.next()?;
		}

		Ok(found)
	}

	fn expect_end(&mut self, delimiter: Delimiter, expecting: &'static str) -> Result<(), L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::End(d)), _) if d == delimiter => Ok(()),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, expecting)),
		}
	}

	fn expect_period(&mut self) -> Result<(), L::Error> {
		match self.tokens.next()? {
			Meta(Some(Token::Punct(Punct::Period)), _) => Ok(()),
			Meta(unexpected, loc) => Err(Error::unexpected(unexpected.as_ref(), loc, "`.`")),
		}
	}
}

fn boolean(value: &str) -> Term {
	Term::Literal(Literal::TypedString(
		value.to_owned(),
		vocab::iri(vocab::XSD_BOOLEAN),
	))
}
