use decoded_char::DecodedChar;
use rdf_decode::{
	lexing, BlankNode, Decode, Error, Format, GraphLabel, Literal, Options, QuadDecoder, Subject,
	Term, TokenKind, TripleDecoder,
};
use std::fmt;

fn quads(input: &str) -> QuadDecoder<lexing::StrChars<'_>, std::convert::Infallible> {
	stderrlog::new().init().ok();
	QuadDecoder::from_text(input, Format::NQuads).unwrap()
}

fn iri(s: &str) -> iref::IriBuf {
	iref::IriBuf::new(s.to_owned()).unwrap()
}

#[test]
fn single_statement_then_end_of_stream() {
	let mut decoder = quads("<http://a> <http://b> \"x\" .");
	let quad = decoder.decode().unwrap().unwrap();
	assert_eq!(quad.subject, Subject::Iri(iri("http://a")));
	assert_eq!(quad.predicate, iri("http://b"));
	assert_eq!(quad.object, Term::Literal(Literal::String("x".to_owned())));
	assert_eq!(quad.graph, GraphLabel::Blank(BlankNode::DefaultGraph));
	assert!(decoder.decode().unwrap().is_none());
	assert!(decoder.decode().unwrap().is_none());
}

#[test]
fn named_graph() {
	let mut decoder = quads("<http://a> <http://b> \"x\" <http://g> .");
	let quad = decoder.decode().unwrap().unwrap();
	assert_eq!(quad.graph, GraphLabel::Iri(iri("http://g")));
	assert_eq!(
		quad.into_triple().to_string(),
		"<http://a> <http://b> \"x\" ."
	);
}

#[test]
fn decode_all_in_order() {
	let mut decoder = quads(
		"<http://a> <http://p> \"1\" .\n\
		 <http://b> <http://p> \"2\" _:g .\n\
		 <http://c> <http://p> \"3\" <http://g> .\n",
	);

	let subjects: Vec<_> = decoder
		.decode_all()
		.unwrap()
		.into_iter()
		.map(|quad| quad.subject.to_string())
		.collect();
	assert_eq!(subjects, ["<http://a>", "<http://b>", "<http://c>"]);
}

#[test]
fn malformed_statement_at_any_position() {
	let valid = "<http://a> <http://p> <http://o> .";
	for k in 0..4 {
		let mut lines = vec![valid; 3];
		lines.insert(k, "<http://a> <http://p> .");
		let input = lines.join("\n");
		match quads(&input).decode_all() {
			Err(Error::Syntax { location, .. }) => assert_eq!(location.line, k + 1),
			other => panic!("expected a syntax error, got {other:?}"),
		}
	}
}

#[test]
fn default_graph_is_shared() {
	let quads = quads("_:a <http://p> _:b .\n_:b <http://p> _:a .")
		.decode_all()
		.unwrap();
	assert_eq!(quads[0].graph, quads[1].graph);
	assert!(quads[0].graph.is_default_graph());
}

#[test]
fn default_graph_differs_from_parsed_labels() {
	let quads = quads("_:a <http://p> _:b _:DefaultGraph .\n_:a <http://p> _:b .")
		.decode_all()
		.unwrap();
	assert_ne!(quads[0].graph, quads[1].graph);
	assert!(!quads[0].graph.is_default_graph());
}

#[test]
fn empty_input() {
	assert!(quads("").decode().unwrap().is_none());
	assert!(quads("  \n# only a comment\n\n").decode().unwrap().is_none());
}

#[test]
fn unterminated_literal() {
	match quads("<http://a> <http://b> \"x").decode() {
		Err(Error::Lexical {
			location,
			text,
			cause: lexing::Error::Unexpected(None),
		}) => {
			assert_eq!((location.line, location.column), (1, 23));
			assert_eq!(text, "\"x")
		}
		other => panic!("expected a lexical error, got {other:?}"),
	}
}

#[test]
fn dot_in_object_position() {
	let e = quads("<http://a> <http://b> .").decode().unwrap_err();
	assert!(matches!(
		e,
		Error::Syntax {
			found: TokenKind::Dot,
			expecting: "object",
			..
		}
	));
	assert_eq!(e.to_string(), "1:23: unexpected dot `.` while expecting object");
}

#[test]
fn missing_predicate() {
	let e = quads("<http://a> \"b\" <http://c> .").decode().unwrap_err();
	assert!(matches!(
		e,
		Error::Syntax {
			found: TokenKind::StringLiteral,
			expecting: "predicate",
			..
		}
	));
}

#[test]
fn literal_suffixes() {
	let quads = quads(
		"<http://a> <http://b> \"chat\"@fr .\n\
		 <http://a> <http://b> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .",
	)
	.decode_all()
	.unwrap();

	match &quads[0].object {
		Term::Literal(lit) => assert_eq!(lit.language().unwrap().as_str(), "fr"),
		other => panic!("expected a literal, got {other}"),
	}

	match &quads[1].object {
		Term::Literal(lit) => assert_eq!(
			lit.datatype().unwrap().as_str(),
			"http://www.w3.org/2001/XMLSchema#integer"
		),
		other => panic!("expected a literal, got {other}"),
	}
}

#[test]
fn iterator_stops_after_error() {
	let mut decoder = quads("<http://a> <http://b> <http://c> .\n<http://a> .\n<http://a> <http://b> <http://c> .");
	let items: Vec<_> = decoder.iter().collect();
	assert_eq!(items.len(), 2);
	assert!(items[0].is_ok());
	assert!(items[1].is_err());
}

#[test]
fn triple_decoder_rejects_quads() {
	assert!(matches!(
		TripleDecoder::from_text("", Format::NQuads),
		Err(Error::Configuration(Format::NQuads))
	));

	let e = Options::new(Format::NQuads)
		.triples(lexing::str_chars(""))
		.err()
		.unwrap();
	assert_eq!(
		e.to_string(),
		"decoder for serialization format N-Quads not implemented"
	);
}

#[test]
fn triple_formats_decode_to_default_graph() {
	let mut decoder = QuadDecoder::from_text("<http://a> <http://b> <http://c> .", Format::NTriples).unwrap();
	assert!(decoder.decode().unwrap().unwrap().graph.is_default_graph());
}

#[test]
fn n_triples_has_no_graph_label() {
	let e = TripleDecoder::from_text("<http://a> <http://b> <http://c> <http://g> .", Format::NTriples)
		.unwrap()
		.decode()
		.unwrap_err();
	assert!(matches!(
		e,
		Error::Syntax {
			found: TokenKind::IriRef,
			expecting: "`.`",
			..
		}
	));
}

#[test]
fn set_base_is_ignored() {
	let mut decoder = quads("<http://a> <http://b> <http://c> .");
	decoder.set_base(iri("http://example.org/"));
	assert_eq!(
		decoder.decode().unwrap().unwrap().object,
		Term::Iri(iri("http://c"))
	);
}

#[test]
fn relative_iri_is_a_lexical_error() {
	let e = quads("<a> <http://b> <http://c> .").decode().unwrap_err();
	assert!(matches!(
		e,
		Error::Lexical {
			cause: lexing::Error::InvalidIri(_),
			..
		}
	));
}

#[derive(Debug)]
struct Broken;

impl fmt::Display for Broken {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "broken stream")
	}
}

#[test]
fn stream_failure() {
	let chars = decoded_char::Utf8Decoded::new("<http://a> ".chars())
		.map(Ok::<DecodedChar, Broken>)
		.chain(std::iter::once(Err(Broken)));

	let mut decoder = QuadDecoder::new(chars, Format::NQuads).unwrap();
	match decoder.decode() {
		Err(Error::Lexical {
			location,
			cause: lexing::Error::Stream(Broken),
			..
		}) => assert_eq!((location.line, location.column), (1, 12)),
		other => panic!("expected a stream error, got {other:?}"),
	}
}
