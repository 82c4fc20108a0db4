use crate::{
	lexing::{self, Location, StrChars},
	parsing::{self, MetaError},
	rdfxml, turtle, Error, Format, Quad, Triple,
};
use decoded_char::DecodedChar;
use iref::IriBuf;
use locspan::{Meta, Span};
use std::{convert::Infallible, iter::FusedIterator};

/// RDF decoder.
pub trait Decode {
	type Item;
	type Error;

	/// Decodes the next item, or returns `None` at the end of the input.
	fn decode(&mut self) -> Result<Option<Self::Item>, Self::Error>;

	/// Decodes every remaining item, in order.
	///
	/// Nothing is returned but the error if any item fails to decode.
	fn decode_all(&mut self) -> Result<Vec<Self::Item>, Self::Error> {
		let mut items = Vec::new();
		while let Some(item) = self.decode()? {
			items.push(item)
		}

		Ok(items)
	}

	/// Sets the base IRI against which relative IRI references are resolved
	/// from now on.
	///
	/// Does nothing for formats without relative IRI references.
	fn set_base(&mut self, base: IriBuf);

	/// Iterates over the remaining items.
	///
	/// The iterator ends after the first error.
	fn iter(&mut self) -> DecodeIter<'_, Self>
	where
		Self: Sized,
	{
		DecodeIter {
			decoder: self,
			done: false,
		}
	}
}

/// Iterator over the items of a [`Decode`]r.
pub struct DecodeIter<'a, D> {
	decoder: &'a mut D,
	done: bool,
}

impl<'a, D: Decode> Iterator for DecodeIter<'a, D> {
	type Item = Result<D::Item, D::Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		match self.decoder.decode() {
			Ok(Some(item)) => Some(Ok(item)),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(e) => {
				self.done = true;
				Some(Err(e))
			}
		}
	}
}

impl<'a, D: Decode> FusedIterator for DecodeIter<'a, D> {}

fn fault<E>(format: Format, e: MetaError<E>) -> Error<E> {
	let e = Error::from(e);
	if let Some(loc) = e.location() {
		log::debug!("{format} decoding fault at {loc}")
	}

	e
}

/// Reads a whole character stream.
fn collect<E>(chars: impl Iterator<Item = Result<DecodedChar, E>>) -> Result<String, Error<E>> {
	let mut source = String::new();
	let mut line = 1;
	let mut column = 1;

	for c in chars {
		match c {
			Ok(c) => {
				let c = c.into_char();
				source.push(c);
				if c == '\n' {
					line += 1;
					column = 1
				} else {
					column += 1
				}
			}
			Err(e) => {
				return Err(Error::Lexical {
					location: Location {
						span: Span::new(source.len(), source.len()),
						line,
						column,
					},
					text: String::new(),
					cause: lexing::Error::Stream(e),
				})
			}
		}
	}

	Ok(source)
}

enum TripleGrammar<C: Iterator<Item = Result<DecodedChar, E>>, E> {
	NTriples(parsing::Parser<lexing::Lexer<C, E>>),
	Turtle(turtle::Parser<turtle::Lexer<C, E>>),
	RdfXml(Box<rdfxml::Parser>),
}

/// Triple decoder.
///
/// Decodes N-Triples, Turtle and RDF/XML.
pub struct TripleDecoder<C: Iterator<Item = Result<DecodedChar, E>>, E> {
	format: Format,
	grammar: TripleGrammar<C, E>,
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> TripleDecoder<C, E> {
	/// Creates a decoder for the given format.
	///
	/// Fails with [`Error::Configuration`] if `format` has named graphs.
	/// RDF/XML documents are read entirely before decoding starts, so a
	/// failure of the character stream is reported here.
	pub fn new(chars: C, format: Format) -> Result<Self, Error<E>> {
		let grammar = match format {
			Format::NTriples => {
				TripleGrammar::NTriples(parsing::Parser::new(lexing::Lexer::new(chars)))
			}
			Format::Turtle => TripleGrammar::Turtle(turtle::Parser::new(turtle::Lexer::new(chars))),
			Format::RdfXml => TripleGrammar::RdfXml(Box::new(rdfxml::Parser::new(collect(chars)?))),
			Format::NQuads => {
				log::debug!("no triple decoder for {format}");
				return Err(Error::Configuration(format));
			}
		};

		log::debug!("{format} triple decoder created");
		Ok(Self { format, grammar })
	}

	pub fn format(&self) -> Format {
		self.format
	}
}

impl<'a> TripleDecoder<StrChars<'a>, Infallible> {
	/// Creates a decoder reading the given text.
	pub fn from_text(input: &'a str, format: Format) -> Result<Self, Error> {
		Self::new(lexing::str_chars(input), format)
	}
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Decode for TripleDecoder<C, E> {
	type Item = Triple;
	type Error = Error<E>;

	fn decode(&mut self) -> Result<Option<Triple>, Error<E>> {
		let result = match &mut self.grammar {
			TripleGrammar::NTriples(parser) => parser
				.next_statement::<Triple>()
				.map(|triple| triple.map(|Meta(triple, _)| triple)),
			TripleGrammar::Turtle(parser) => parser.next_triple(),
			TripleGrammar::RdfXml(parser) => parser.next_triple(),
		};

		result.map_err(|e| fault(self.format, e))
	}

	fn set_base(&mut self, base: IriBuf) {
		match &mut self.grammar {
			TripleGrammar::NTriples(_) => (),
			TripleGrammar::Turtle(parser) => parser.set_base(base),
			TripleGrammar::RdfXml(parser) => parser.set_base(base),
		}
	}
}

enum QuadGrammar<C: Iterator<Item = Result<DecodedChar, E>>, E> {
	Triples(TripleDecoder<C, E>),
	NQuads(parsing::Parser<lexing::Lexer<C, E>>),
}

/// Quad decoder.
///
/// Decodes every format. Triples of triple formats are placed in the
/// default graph.
pub struct QuadDecoder<C: Iterator<Item = Result<DecodedChar, E>>, E> {
	format: Format,
	grammar: QuadGrammar<C, E>,
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> QuadDecoder<C, E> {
	pub fn new(chars: C, format: Format) -> Result<Self, Error<E>> {
		let grammar = match format {
			Format::NQuads => {
				log::debug!("{format} quad decoder created");
				QuadGrammar::NQuads(parsing::Parser::new(lexing::Lexer::new(chars)))
			}
			_ => QuadGrammar::Triples(TripleDecoder::new(chars, format)?),
		};

		Ok(Self { format, grammar })
	}

	pub fn format(&self) -> Format {
		self.format
	}
}

impl<'a> QuadDecoder<StrChars<'a>, Infallible> {
	/// Creates a decoder reading the given text.
	pub fn from_text(input: &'a str, format: Format) -> Result<Self, Error> {
		Self::new(lexing::str_chars(input), format)
	}
}

impl<E, C: Iterator<Item = Result<DecodedChar, E>>> Decode for QuadDecoder<C, E> {
	type Item = Quad;
	type Error = Error<E>;

	fn decode(&mut self) -> Result<Option<Quad>, Error<E>> {
		match &mut self.grammar {
			QuadGrammar::Triples(decoder) => Ok(decoder.decode()?.map(Quad::from)),
			QuadGrammar::NQuads(parser) => parser
				.next_statement::<Quad>()
				.map(|quad| quad.map(|Meta(quad, _)| quad))
				.map_err(|e| fault(self.format, e)),
		}
	}

	fn set_base(&mut self, base: IriBuf) {
		if let QuadGrammar::Triples(decoder) = &mut self.grammar {
			decoder.set_base(base)
		}
	}
}

/// Decoder options.
#[derive(Clone, Debug)]
pub struct Options {
	pub format: Format,

	/// Initial base IRI.
	pub base: Option<IriBuf>,
}

impl Options {
	pub fn new(format: Format) -> Self {
		Self { format, base: None }
	}

	pub fn with_base(mut self, base: IriBuf) -> Self {
		self.base = Some(base);
		self
	}

	pub fn triples<E, C: Iterator<Item = Result<DecodedChar, E>>>(
		&self,
		chars: C,
	) -> Result<TripleDecoder<C, E>, Error<E>> {
		let mut decoder = TripleDecoder::new(chars, self.format)?;
		if let Some(base) = &self.base {
			decoder.set_base(base.clone())
		}

		Ok(decoder)
	}

	pub fn quads<E, C: Iterator<Item = Result<DecodedChar, E>>>(
		&self,
		chars: C,
	) -> Result<QuadDecoder<C, E>, Error<E>> {
		let mut decoder = QuadDecoder::new(chars, self.format)?;
		if let Some(base) = &self.base {
			decoder.set_base(base.clone())
		}

		Ok(decoder)
	}
}

impl From<Format> for Options {
	fn from(format: Format) -> Self {
		Self::new(format)
	}
}
