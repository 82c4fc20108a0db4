//! Streaming RDF decoders.
//!
//! This library decodes RDF triples and quads written in N-Triples,
//! N-Quads, Turtle or RDF/XML into a small term model. Each serialization
//! has its own lexer and recursive-descent grammar, all sharing the same
//! token [lookahead buffer](parsing::Lookahead) and the same positioned
//! error reporting.
//!
//! ## Basic usage
//!
//! ```rust
//! use rdf_decode::{Decode, Format, GraphLabel, QuadDecoder};
//!
//! let input = "<http://a> <http://b> \"x\" .\n<http://a> <http://b> \"y\" <http://g> .";
//! let mut decoder = QuadDecoder::from_text(input, Format::NQuads).unwrap();
//!
//! let quads = decoder.decode_all().unwrap();
//! assert_eq!(quads.len(), 2);
//! assert!(quads[0].graph.is_default_graph());
//! assert!(matches!(&quads[1].graph, GraphLabel::Iri(iri) if iri.as_str() == "http://g"));
//! ```
//!
//! Errors carry the line and column of the faulty lexeme:
//!
//! ```rust
//! use rdf_decode::{Decode, Format, TripleDecoder};
//!
//! let mut decoder = TripleDecoder::from_text("<http://a> <http://b> .", Format::NTriples).unwrap();
//! let error = decoder.decode().unwrap_err();
//! assert_eq!(error.to_string(), "1:23: unexpected dot `.` while expecting object");
//! ```
use iref::IriBuf;
use langtag::LangTagBuf;
use std::fmt;

mod decoder;
mod error;
mod format;
pub mod lexing;
pub mod parsing;
pub mod rdfxml;
pub mod turtle;
pub mod vocab;

pub use decoder::{Decode, DecodeIter, Options, QuadDecoder, TripleDecoder};
pub use error::{Error, TermError};
pub use format::{Format, UnknownFormat};
pub use lexing::{Location, TokenKind};

/// Blank node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlankNode {
	/// Labeled blank node, `_:label`.
	///
	/// The label does not include the `_:` prefix.
	Label(String),

	/// Blank node allocated by a decoder session.
	Anonymous(u64),

	/// Default graph.
	///
	/// Never produced from a parsed blank node.
	DefaultGraph,
}

impl BlankNode {
	pub fn is_default_graph(&self) -> bool {
		matches!(self, Self::DefaultGraph)
	}
}

impl fmt::Display for BlankNode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Label(label) => write!(f, "_:{label}"),
			Self::Anonymous(n) => write!(f, "_:@{n}"),
			Self::DefaultGraph => write!(f, "_:@default"),
		}
	}
}

/// Per-session allocator of anonymous blank nodes.
#[derive(Clone, Debug, Default)]
pub struct BlankNodes {
	count: u64,
}

impl BlankNodes {
	pub fn fresh(&mut self) -> BlankNode {
		let id = self.count;
		self.count += 1;
		BlankNode::Anonymous(id)
	}
}

/// Literal value.
///
/// A literal never has both a datatype and a language tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
	String(String),
	TypedString(String, IriBuf),
	LangString(String, LangTagBuf),
}

impl Literal {
	pub fn lexical_form(&self) -> &str {
		match self {
			Self::String(s) | Self::TypedString(s, _) | Self::LangString(s, _) => s,
		}
	}

	pub fn datatype(&self) -> Option<&IriBuf> {
		match self {
			Self::TypedString(_, ty) => Some(ty),
			_ => None,
		}
	}

	pub fn language(&self) -> Option<&LangTagBuf> {
		match self {
			Self::LangString(_, tag) => Some(tag),
			_ => None,
		}
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let value = lexing::DisplayStringLiteral(self.lexical_form());
		match self {
			Self::String(_) => write!(f, "\"{value}\""),
			Self::TypedString(_, ty) => write!(f, "\"{value}\"^^<{ty}>"),
			Self::LangString(_, tag) => write!(f, "\"{value}\"@{tag}"),
		}
	}
}

/// RDF term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
	Iri(IriBuf),
	Blank(BlankNode),
	Literal(Literal),
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{iri}>"),
			Self::Blank(b) => b.fmt(f),
			Self::Literal(l) => l.fmt(f),
		}
	}
}

impl From<Subject> for Term {
	fn from(value: Subject) -> Self {
		match value {
			Subject::Iri(iri) => Self::Iri(iri),
			Subject::Blank(b) => Self::Blank(b),
		}
	}
}

impl From<Literal> for Term {
	fn from(value: Literal) -> Self {
		Self::Literal(value)
	}
}

/// Subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
	Iri(IriBuf),
	Blank(BlankNode),
}

impl fmt::Display for Subject {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{iri}>"),
			Self::Blank(b) => b.fmt(f),
		}
	}
}

impl From<BlankNode> for Subject {
	fn from(value: BlankNode) -> Self {
		Self::Blank(value)
	}
}

/// Graph Label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphLabel {
	Iri(IriBuf),
	Blank(BlankNode),
}

impl GraphLabel {
	/// Label of the default graph.
	pub fn default_graph() -> Self {
		Self::Blank(BlankNode::DefaultGraph)
	}

	pub fn is_default_graph(&self) -> bool {
		matches!(self, Self::Blank(BlankNode::DefaultGraph))
	}
}

impl Default for GraphLabel {
	fn default() -> Self {
		Self::default_graph()
	}
}

impl fmt::Display for GraphLabel {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{iri}>"),
			Self::Blank(b) => b.fmt(f),
		}
	}
}

/// RDF Triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
	pub subject: Subject,
	pub predicate: IriBuf,
	pub object: Term,
}

impl Triple {
	pub fn new(subject: Subject, predicate: IriBuf, object: impl Into<Term>) -> Self {
		Self {
			subject,
			predicate,
			object: object.into(),
		}
	}

	/// Places this triple in the given graph.
	pub fn in_graph(self, graph: GraphLabel) -> Quad {
		Quad {
			subject: self.subject,
			predicate: self.predicate,
			object: self.object,
			graph,
		}
	}
}

impl fmt::Display for Triple {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
	}
}

/// RDF Quad.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quad {
	pub subject: Subject,
	pub predicate: IriBuf,
	pub object: Term,
	pub graph: GraphLabel,
}

impl Quad {
	pub fn triple(&self) -> Triple {
		Triple {
			subject: self.subject.clone(),
			predicate: self.predicate.clone(),
			object: self.object.clone(),
		}
	}

	pub fn into_triple(self) -> Triple {
		Triple {
			subject: self.subject,
			predicate: self.predicate,
			object: self.object,
		}
	}
}

impl From<Triple> for Quad {
	fn from(value: Triple) -> Self {
		value.in_graph(GraphLabel::default_graph())
	}
}

impl fmt::Display for Quad {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)?;
		if !self.graph.is_default_graph() {
			write!(f, " {}", self.graph)?;
		}

		write!(f, " .")
	}
}
