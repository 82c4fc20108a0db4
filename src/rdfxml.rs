//! RDF/XML decoding.
//!
//! The document is read as a stream of XML events. Each open element adds a
//! scope on a stack, remembering what the element stands for (node,
//! property, collection...) together with its namespace declarations,
//! language and base IRI.
use crate::{
	lexing::{self, Lexeme, Location, Malformed, TokenKind},
	parsing::{self, Error, MetaError},
	vocab, BlankNode, BlankNodes, Literal, Subject, Term, TermError, Triple,
};
use iref::{IriBuf, IriRefBuf};
use langtag::LangTagBuf;
use locspan::{Meta, Span};
use quick_xml::{
	events::{BytesStart, Event as XmlEvent},
	Reader,
};
use std::{collections::VecDeque, fmt, io};

type Result<T, E> = std::result::Result<T, MetaError<E>>;

/// RDF attributes also accepted without prefix.
const UNQUALIFIED_ATTRIBUTES: [&str; 7] = [
	"about",
	"ID",
	"nodeID",
	"resource",
	"datatype",
	"parseType",
	"type",
];

/// Names of the RDF vocabulary that are neither node nor property names.
const SYNTAX_TERMS: [&str; 10] = [
	"RDF",
	"ID",
	"about",
	"parseType",
	"resource",
	"nodeID",
	"datatype",
	"aboutEach",
	"aboutEachPrefix",
	"bagID",
];

/// Markup found where it does not belong.
#[derive(Debug)]
enum Markup<'a> {
	Element(&'a str),
	Attribute(&'a str),
	Text(&'a str),
}

impl<'a> Lexeme for Markup<'a> {
	fn kind(&self) -> TokenKind {
		match self {
			Self::Element(_) => TokenKind::Element,
			Self::Attribute(_) => TokenKind::Attribute,
			Self::Text(_) => TokenKind::Text,
		}
	}
}

impl<'a> fmt::Display for Markup<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Element(name) => write!(f, "XML element `<{name}>`"),
			Self::Attribute(name) => write!(f, "XML attribute `{name}`"),
			Self::Text(text) => write!(f, "XML text `{}`", text.trim().escape_debug()),
		}
	}
}

#[derive(Debug)]
struct Element {
	name: String,

	/// Name and attributes, as written in the document.
	raw: String,
	attributes: Vec<(String, String)>,
}

#[derive(Debug)]
enum Event {
	Start(Element),
	Empty(Element),
	End(String),
	Text { raw: String, text: String },

	/// Comment or processing instruction, as written in the document.
	Markup(String),
	Eof,
	Ignored,
}

fn lossy(bytes: &[u8]) -> String {
	String::from_utf8_lossy(bytes).into_owned()
}

fn element(e: &BytesStart) -> std::result::Result<Element, String> {
	let mut attributes = Vec::new();
	for attr in e.attributes() {
		let attr = attr.map_err(|e| e.to_string())?;
		let value = attr.unescape_value().map_err(|e| e.to_string())?;
		attributes.push((lossy(attr.key.as_ref()), value.into_owned()));
	}

	Ok(Element {
		name: lossy(e.name().as_ref()),
		raw: lossy(e),
		attributes,
	})
}

fn read_event(
	reader: &mut Reader<io::Cursor<Vec<u8>>>,
	buf: &mut Vec<u8>,
) -> std::result::Result<Event, String> {
	let event = match reader.read_event_into(buf).map_err(|e| e.to_string())? {
		XmlEvent::Start(e) => Event::Start(element(&e)?),
		XmlEvent::Empty(e) => Event::Empty(element(&e)?),
		XmlEvent::End(e) => Event::End(lossy(e.name().as_ref())),
		XmlEvent::Text(e) => Event::Text {
			raw: lossy(&e),
			text: e.unescape().map_err(|e| e.to_string())?.into_owned(),
		},
		XmlEvent::CData(e) => {
			let text = lossy(&e);
			Event::Text {
				raw: format!("<![CDATA[{text}]]>"),
				text,
			}
		}
		XmlEvent::Comment(e) => Event::Markup(format!("<!--{}-->", lossy(&e))),
		XmlEvent::PI(e) => Event::Markup(format!("<?{}?>", lossy(&e))),
		XmlEvent::Eof => Event::Eof,
		_ => Event::Ignored,
	};

	Ok(event)
}

fn malformed<E>(message: String, loc: Location) -> MetaError<E> {
	Meta(
		Box::new(Error::Lexer(Malformed {
			error: lexing::Error::Markup(message),
			text: String::new(),
		})),
		loc,
	)
}

fn resolve<E>(value: &str, base: Option<&IriBuf>, loc: Location) -> Result<IriBuf, E> {
	let iri_ref = IriRefBuf::new(value.to_owned())
		.map_err(|e| Error::term(TermError::InvalidIri(e.0), loc))?;
	parsing::resolve(iri_ref, base).map_err(|e| Error::term(e, loc))
}

fn rdf_name(iri: &IriBuf) -> Option<&str> {
	iri.as_str().strip_prefix(vocab::RDF)
}

fn literal(value: String, lang: Option<&LangTagBuf>) -> Term {
	match lang {
		Some(tag) => Term::Literal(Literal::LangString(value, tag.clone())),
		None => Term::Literal(Literal::String(value)),
	}
}

/// RDF attributes of an element.
#[derive(Default)]
struct Attributes {
	about: Option<String>,
	id: Option<String>,
	node_id: Option<String>,
	resource: Option<String>,
	datatype: Option<String>,
	parse_type: Option<String>,

	/// Property attributes.
	properties: Vec<(IriBuf, String)>,
}

enum Frame {
	/// Content of `rdf:RDF`.
	Root,

	/// Node element, whose content is property elements.
	Node { subject: Subject, li: u64 },

	/// Property element, whose object is either its text or a node element.
	Property {
		subject: Subject,
		predicate: IriBuf,
		datatype: Option<IriBuf>,
		text: String,
		object: Option<Term>,
	},

	/// Property element whose object is given by its attributes.
	Resource,

	/// `rdf:parseType="Collection"` property element.
	Collection {
		subject: Subject,
		predicate: IriBuf,
		items: Vec<Term>,
	},

	/// `rdf:parseType="Literal"` property element.
	Literal {
		subject: Subject,
		predicate: IriBuf,
		depth: usize,
		xml: String,
	},

	/// Element in error, skipped with all its content.
	Skip { depth: usize },
}

struct Scope {
	frame: Frame,

	/// Number of namespace declarations in scope before this element.
	namespaces: usize,
	base: Option<IriBuf>,
	lang: Option<LangTagBuf>,
}

/// Kind of element expected at the current position.
enum Expected {
	Document,
	Node,
	Object,
	Item,
	Property(Subject, IriBuf),
}

/// RDF/XML parser.
pub struct Parser {
	reader: Reader<io::Cursor<Vec<u8>>>,
	buf: Vec<u8>,

	/// Offset of the first byte of each line.
	lines: Vec<usize>,
	base: Option<IriBuf>,
	namespaces: Vec<(String, String)>,
	stack: Vec<Scope>,
	blank_nodes: BlankNodes,
	triples: VecDeque<Triple>,
	finished: bool,
}

impl Parser {
	pub fn new(source: String) -> Self {
		let lines = std::iter::once(0)
			.chain(source.match_indices('\n').map(|(i, _)| i + 1))
			.collect();

		let mut reader = Reader::from_reader(io::Cursor::new(source.into_bytes()));
		reader.config_mut().trim_text(false);

		Self {
			reader,
			buf: Vec::new(),
			lines,
			base: None,
			namespaces: Vec::new(),
			stack: Vec::new(),
			blank_nodes: BlankNodes::default(),
			triples: VecDeque::new(),
			finished: false,
		}
	}

	/// Sets the base IRI of the elements opened from now on.
	///
	/// Superseded by `xml:base` attributes.
	pub fn set_base(&mut self, base: IriBuf) {
		self.base = Some(base)
	}

	pub fn base(&self) -> Option<&IriBuf> {
		self.base.as_ref()
	}

	/// Returns the next triple, or `None` at the end of the document.
	///
	/// An element in error is skipped with its content. Malformed XML ends
	/// the document.
	pub fn next_triple<E>(&mut self) -> Result<Option<Triple>, E> {
		loop {
			if let Some(triple) = self.triples.pop_front() {
				return Ok(Some(triple));
			}

			if self.finished {
				return Ok(None);
			}

			self.step()?;
		}
	}

	fn locate(&self, start: usize, end: usize) -> Location {
		let line = self.lines.partition_point(|&offset| offset <= start);
		let line_start = self.lines[line - 1];
		let source = self.reader.get_ref().get_ref();
		let column = source
			.get(line_start..start)
			.map(|prefix| String::from_utf8_lossy(prefix).chars().count())
			.unwrap_or_default();

		Location {
			span: Span::new(start, end),
			line,
			column: column + 1,
		}
	}

	fn step<E>(&mut self) -> Result<(), E> {
		let start = self.reader.buffer_position() as usize;
		let event = read_event(&mut self.reader, &mut self.buf);
		self.buf.clear();
		let end = self.reader.buffer_position() as usize;

		match event {
			Err(message) => {
				self.finished = true;
				Err(malformed(message, self.locate(start, end)))
			}
			Ok(Event::Start(element)) => {
				let loc = self.locate(start, end);
				self.open(element, loc, false)
			}
			Ok(Event::Empty(element)) => {
				let loc = self.locate(start, end);
				self.open(element, loc, true)
			}
			Ok(Event::End(name)) => {
				let loc = self.locate(start, end);
				self.close(&name, loc)
			}
			Ok(Event::Text { raw, text }) => {
				let skipped = raw.len() - raw.trim_start().len();
				let loc = self.locate(start + skipped, end);
				self.text(raw, text, loc)
			}
			Ok(Event::Eof) => {
				self.finished = true;
				if self.stack.is_empty() {
					Ok(())
				} else {
					Err(malformed(
						"unexpected end of document".to_owned(),
						self.locate(start, end),
					))
				}
			}
			Ok(Event::Markup(raw)) => {
				if let Some(Scope {
					frame: Frame::Literal { xml, .. },
					..
				}) = self.stack.last_mut()
				{
					xml.push_str(&raw)
				}

				Ok(())
			}
			Ok(Event::Ignored) => Ok(()),
		}
	}

	fn namespace(&self, prefix: &str) -> Option<&str> {
		if prefix == "xml" {
			return Some(vocab::XML);
		}

		self.namespaces
			.iter()
			.rev()
			.find(|(p, _)| p == prefix)
			.map(|(_, namespace)| namespace.as_str())
	}

	/// Turns a qualified XML name into an IRI.
	fn qualify<E>(&self, name: &str, loc: Location) -> Result<IriBuf, E> {
		let (prefix, local) = name.split_once(':').unwrap_or(("", name));
		match self.namespace(prefix) {
			Some(namespace) => IriBuf::new(format!("{namespace}{local}"))
				.map_err(|e| Error::term(TermError::InvalidIri(e.0), loc)),
			None if prefix.is_empty() => {
				Err(Error::term(TermError::UnqualifiedName(name.to_owned()), loc))
			}
			None => Err(Error::term(TermError::UndefinedPrefix(prefix.to_owned()), loc)),
		}
	}

	fn attributes<E>(&self, attributes: &[(String, String)], loc: Location) -> Result<Attributes, E> {
		let mut result = Attributes::default();

		for (key, value) in attributes {
			if key.starts_with("xml") {
				continue;
			}

			let iri = if key.contains(':') {
				self.qualify(key, loc)?
			} else if UNQUALIFIED_ATTRIBUTES.contains(&key.as_str()) {
				IriBuf::new(format!("{}{key}", vocab::RDF))
					.map_err(|e| Error::term(TermError::InvalidIri(e.0), loc))?
			} else {
				log::debug!("{loc}: ignoring unqualified attribute `{key}`");
				continue;
			};

			match rdf_name(&iri) {
				Some("about") => result.about = Some(value.clone()),
				Some("ID") => result.id = Some(value.clone()),
				Some("nodeID") => result.node_id = Some(value.clone()),
				Some("resource") => result.resource = Some(value.clone()),
				Some("datatype") => result.datatype = Some(value.clone()),
				Some("parseType") => result.parse_type = Some(value.clone()),
				Some(name) if name == "li" || name == "Description" || SYNTAX_TERMS.contains(&name) => {
					return Err(Error::unexpected(
						Some(&Markup::Attribute(key)),
						loc,
						"property attribute",
					))
				}
				_ => result.properties.push((iri, value.clone())),
			}
		}

		Ok(result)
	}

	/// Emits the triples of property attributes.
	fn property_attributes<E>(
		&mut self,
		subject: &Subject,
		properties: Vec<(IriBuf, String)>,
		base: Option<&IriBuf>,
		lang: Option<&LangTagBuf>,
		loc: Location,
	) -> Result<(), E> {
		for (predicate, value) in properties {
			let object = if predicate.as_str() == vocab::RDF_TYPE {
				Term::Iri(resolve(&value, base, loc)?)
			} else {
				literal(value, lang)
			};

			self.triples
				.push_back(Triple::new(subject.clone(), predicate, object));
		}

		Ok(())
	}

	fn open<E>(&mut self, element: Element, loc: Location, empty: bool) -> Result<(), E> {
		match self.stack.last_mut().map(|scope| &mut scope.frame) {
			Some(Frame::Literal { depth, xml, .. }) => {
				xml.push('<');
				xml.push_str(&element.raw);
				if empty {
					xml.push_str("/>")
				} else {
					xml.push('>');
					*depth += 1
				}

				return Ok(());
			}
			Some(Frame::Skip { depth }) => {
				if !empty {
					*depth += 1
				}

				return Ok(());
			}
			_ => (),
		}

		let mark = self.namespaces.len();
		let queued = self.triples.len();
		match self.element(&element, loc, mark) {
			Ok(()) if empty => self.close(&element.name, loc),
			Ok(()) => Ok(()),
			Err(e) => {
				self.triples.truncate(queued);
				if empty {
					self.namespaces.truncate(mark)
				} else {
					self.stack.push(Scope {
						frame: Frame::Skip { depth: 0 },
						namespaces: mark,
						base: None,
						lang: None,
					})
				}

				Err(e)
			}
		}
	}

	/// Opens an element, pushing its scope on the stack.
	fn element<E>(&mut self, element: &Element, loc: Location, mark: usize) -> Result<(), E> {
		for (key, value) in &element.attributes {
			if key == "xmlns" {
				self.namespaces.push((String::new(), value.clone()))
			} else if let Some(prefix) = key.strip_prefix("xmlns:") {
				self.namespaces.push((prefix.to_owned(), value.clone()))
			}
		}

		let (mut base, mut lang) = match self.stack.last() {
			Some(scope) => (scope.base.clone(), scope.lang.clone()),
			None => (self.base.clone(), None),
		};

		for (key, value) in &element.attributes {
			match key.as_str() {
				"xml:base" => base = Some(resolve(value, base.as_ref(), loc)?),
				"xml:lang" if value.is_empty() => lang = None,
				"xml:lang" => {
					lang = Some(LangTagBuf::new(value.clone()).map_err(|_| {
						Error::term(TermError::InvalidLangTag(value.clone()), loc)
					})?)
				}
				_ => (),
			}
		}

		let name = self.qualify(&element.name, loc)?;
		let attributes = self.attributes(&element.attributes, loc)?;
		let unexpected = Markup::Element(&element.name);

		let expected = match self.stack.last_mut().map(|scope| &mut scope.frame) {
			None => Expected::Document,
			Some(Frame::Root) => Expected::Node,
			Some(Frame::Collection { .. }) => Expected::Item,
			Some(Frame::Property { text, object: None, .. }) if text.trim().is_empty() => {
				Expected::Object
			}
			Some(Frame::Node { subject, li }) => {
				let predicate = if name.as_str() == vocab::RDF_LI {
					let n = *li;
					*li += 1;
					IriBuf::new(format!("{}_{n}", vocab::RDF))
						.map_err(|e| Error::term(TermError::InvalidIri(e.0), loc))?
				} else {
					name.clone()
				};

				Expected::Property(subject.clone(), predicate)
			}
			Some(_) => {
				return Err(Error::unexpected(
					Some(&unexpected),
					loc,
					"end of property element",
				))
			}
		};

		let frame = match expected {
			Expected::Document if name.as_str() == vocab::RDF_RDF => Frame::Root,
			Expected::Document | Expected::Node => {
				let subject =
					self.node_element(&name, attributes, base.as_ref(), lang.as_ref(), &unexpected, loc)?;
				Frame::Node { subject, li: 1 }
			}
			Expected::Object => {
				let subject =
					self.node_element(&name, attributes, base.as_ref(), lang.as_ref(), &unexpected, loc)?;
				if let Some(Scope {
					frame: Frame::Property { object, .. },
					..
				}) = self.stack.last_mut()
				{
					*object = Some(subject.clone().into())
				}

				Frame::Node { subject, li: 1 }
			}
			Expected::Item => {
				let subject =
					self.node_element(&name, attributes, base.as_ref(), lang.as_ref(), &unexpected, loc)?;
				if let Some(Scope {
					frame: Frame::Collection { items, .. },
					..
				}) = self.stack.last_mut()
				{
					items.push(subject.clone().into())
				}

				Frame::Node { subject, li: 1 }
			}
			Expected::Property(subject, predicate) => self.property_element(
				subject,
				predicate,
				attributes,
				base.as_ref(),
				lang.as_ref(),
				&unexpected,
				loc,
			)?,
		};

		self.stack.push(Scope {
			frame,
			namespaces: mark,
			base,
			lang,
		});

		Ok(())
	}

	fn node_element<E>(
		&mut self,
		name: &IriBuf,
		attributes: Attributes,
		base: Option<&IriBuf>,
		lang: Option<&LangTagBuf>,
		unexpected: &Markup,
		loc: Location,
	) -> Result<Subject, E> {
		if let Some(local) = rdf_name(name) {
			if local == "li" || SYNTAX_TERMS.contains(&local) {
				return Err(Error::unexpected(Some(unexpected), loc, "node element"));
			}
		}

		let identifiers = [
			("rdf:about", attributes.about.is_some()),
			("rdf:ID", attributes.id.is_some()),
			("rdf:nodeID", attributes.node_id.is_some()),
		];
		if let Some((conflicting, _)) = identifiers.iter().filter(|(_, present)| *present).nth(1) {
			return Err(Error::unexpected(
				Some(&Markup::Attribute(conflicting)),
				loc,
				"a single node identifier",
			));
		}

		let subject = if let Some(about) = &attributes.about {
			Subject::Iri(resolve(about, base, loc)?)
		} else if let Some(id) = &attributes.id {
			Subject::Iri(resolve(&format!("#{id}"), base, loc)?)
		} else if let Some(node_id) = attributes.node_id {
			Subject::Blank(BlankNode::Label(node_id))
		} else {
			Subject::Blank(self.blank_nodes.fresh())
		};

		if name.as_str() != vocab::RDF_DESCRIPTION {
			self.triples.push_back(Triple::new(
				subject.clone(),
				vocab::iri(vocab::RDF_TYPE),
				Term::Iri(name.clone()),
			))
		}

		self.property_attributes(&subject, attributes.properties, base, lang, loc)?;
		Ok(subject)
	}

	#[allow(clippy::too_many_arguments)]
	fn property_element<E>(
		&mut self,
		subject: Subject,
		predicate: IriBuf,
		attributes: Attributes,
		base: Option<&IriBuf>,
		lang: Option<&LangTagBuf>,
		unexpected: &Markup,
		loc: Location,
	) -> Result<Frame, E> {
		if let Some(local) = rdf_name(&predicate) {
			if local == "Description" || SYNTAX_TERMS.contains(&local) {
				return Err(Error::unexpected(Some(unexpected), loc, "property element"));
			}
		}

		if let Some(id) = &attributes.id {
			log::debug!("{loc}: ignoring statement identifier `{id}`")
		}

		match attributes.parse_type.as_deref() {
			Some("Resource") => {
				let node = Subject::Blank(self.blank_nodes.fresh());
				self.triples
					.push_back(Triple::new(subject, predicate, node.clone()));
				Ok(Frame::Node {
					subject: node,
					li: 1,
				})
			}
			Some("Collection") => Ok(Frame::Collection {
				subject,
				predicate,
				items: Vec::new(),
			}),
			Some(_) => Ok(Frame::Literal {
				subject,
				predicate,
				depth: 0,
				xml: String::new(),
			}),
			None if attributes.resource.is_some()
				|| attributes.node_id.is_some()
				|| !attributes.properties.is_empty() =>
			{
				let object = if let Some(resource) = &attributes.resource {
					Subject::Iri(resolve(resource, base, loc)?)
				} else if let Some(node_id) = attributes.node_id {
					Subject::Blank(BlankNode::Label(node_id))
				} else {
					Subject::Blank(self.blank_nodes.fresh())
				};

				self.triples
					.push_back(Triple::new(subject, predicate, object.clone()));
				self.property_attributes(&object, attributes.properties, base, lang, loc)?;
				Ok(Frame::Resource)
			}
			None => {
				let datatype = match &attributes.datatype {
					Some(datatype) => Some(resolve(datatype, base, loc)?),
					None => None,
				};

				Ok(Frame::Property {
					subject,
					predicate,
					datatype,
					text: String::new(),
					object: None,
				})
			}
		}
	}

	fn close<E>(&mut self, name: &str, loc: Location) -> Result<(), E> {
		match self.stack.last_mut().map(|scope| &mut scope.frame) {
			Some(Frame::Literal { depth, xml, .. }) if *depth > 0 => {
				*depth -= 1;
				xml.push_str("</");
				xml.push_str(name);
				xml.push('>');
				return Ok(());
			}
			Some(Frame::Skip { depth }) if *depth > 0 => {
				*depth -= 1;
				return Ok(());
			}
			_ => (),
		}

		let scope = match self.stack.pop() {
			Some(scope) => scope,
			None => return Err(malformed(format!("unexpected closing tag `</{name}>`"), loc)),
		};

		self.namespaces.truncate(scope.namespaces);
		match scope.frame {
			Frame::Property {
				subject,
				predicate,
				datatype,
				text,
				object,
			} => {
				let object = match (object, datatype) {
					(Some(object), _) => object,
					(None, Some(datatype)) => Term::Literal(Literal::TypedString(text, datatype)),
					(None, None) => literal(text, scope.lang.as_ref()),
				};

				self.triples
					.push_back(Triple::new(subject, predicate, object))
			}
			Frame::Collection {
				subject,
				predicate,
				items,
			} => {
				let head = parsing::list(&mut self.triples, &mut self.blank_nodes, items);
				self.triples
					.push_back(Triple::new(subject, predicate, head))
			}
			Frame::Literal {
				subject,
				predicate,
				xml,
				..
			} => self.triples.push_back(Triple::new(
				subject,
				predicate,
				Literal::TypedString(xml, vocab::iri(vocab::RDF_XML_LITERAL)),
			)),
			Frame::Root | Frame::Node { .. } | Frame::Resource | Frame::Skip { .. } => (),
		}

		Ok(())
	}

	fn text<E>(&mut self, raw: String, text: String, loc: Location) -> Result<(), E> {
		match self.stack.last_mut().map(|scope| &mut scope.frame) {
			Some(Frame::Literal { xml, .. }) => {
				xml.push_str(&raw);
				Ok(())
			}
			Some(Frame::Property {
				text: content,
				object: None,
				..
			}) => {
				content.push_str(&text);
				Ok(())
			}
			Some(Frame::Skip { .. }) => Ok(()),
			_ if text.trim().is_empty() => Ok(()),
			Some(Frame::Property { .. } | Frame::Resource) => Err(Error::unexpected(
				Some(&Markup::Text(&text)),
				loc,
				"end of property element",
			)),
			Some(Frame::Node { .. }) => Err(Error::unexpected(
				Some(&Markup::Text(&text)),
				loc,
				"property element",
			)),
			Some(Frame::Root | Frame::Collection { .. }) | None => Err(Error::unexpected(
				Some(&Markup::Text(&text)),
				loc,
				"node element",
			)),
		}
	}
}
