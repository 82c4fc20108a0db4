use rdf_decode::{
	lexing, vocab, BlankNode, Decode, Error, Format, Literal, Options, Subject, Term, TermError,
	Triple, TripleDecoder,
};

fn decode(input: &str) -> Vec<Triple> {
	stderrlog::new().init().ok();
	match TripleDecoder::from_text(input, Format::Turtle).unwrap().decode_all() {
		Ok(triples) => triples,
		Err(e) => panic!("parse error: {e}"),
	}
}

fn decode_err(input: &str) -> Error {
	stderrlog::new().init().ok();
	TripleDecoder::from_text(input, Format::Turtle)
		.unwrap()
		.decode_all()
		.unwrap_err()
}

fn iri(s: &str) -> iref::IriBuf {
	iref::IriBuf::new(s.to_owned()).unwrap()
}

fn ex(local: &str) -> iref::IriBuf {
	iri(&format!("http://example.org/{local}"))
}

fn typed(value: &str, datatype: &str) -> Term {
	Term::Literal(Literal::TypedString(value.to_owned(), iri(datatype)))
}

#[test]
fn prefixes_and_rdf_type() {
	let triples = decode("@prefix ex: <http://example.org/> .\nex:s a ex:C .");
	assert_eq!(
		triples,
		[Triple::new(
			Subject::Iri(ex("s")),
			iri(vocab::RDF_TYPE),
			Term::Iri(ex("C"))
		)]
	);
}

#[test]
fn sparql_directives() {
	let triples = decode(
		"prefix ex: <http://example.org/>\n\
		 BaSe <http://example.org/dir/>\n\
		 ex:s ex:p <o> .",
	);
	assert_eq!(triples[0].object, Term::Iri(ex("dir/o")));
}

#[test]
fn predicate_and_object_lists() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 ex:s ex:p ex:a, ex:b ; ex:q ex:c ;; .",
	);
	let objects: Vec<_> = triples.iter().map(|t| t.object.to_string()).collect();
	assert_eq!(
		objects,
		[
			"<http://example.org/a>",
			"<http://example.org/b>",
			"<http://example.org/c>"
		]
	);
	assert_eq!(triples[2].predicate, ex("q"));
}

#[test]
fn nested_descriptions_come_first() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 ex:s ex:p [ ex:q ex:o ] .",
	);
	assert_eq!(
		triples,
		[
			Triple::new(
				Subject::Blank(BlankNode::Anonymous(0)),
				ex("q"),
				Term::Iri(ex("o"))
			),
			Triple::new(
				Subject::Iri(ex("s")),
				ex("p"),
				Term::Blank(BlankNode::Anonymous(0))
			),
		]
	);
}

#[test]
fn blank_node_subjects() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 [ ex:p ex:o ] .\n\
		 [ ex:p ex:o ] ex:q ex:r .\n\
		 [] ex:p _:label .",
	);
	let subjects: Vec<_> = triples.iter().map(|t| t.subject.to_string()).collect();
	assert_eq!(subjects, ["_:@0", "_:@1", "_:@1", "_:@2"]);
	assert_eq!(
		triples[3].object,
		Term::Blank(BlankNode::Label("label".to_owned()))
	);
}

#[test]
fn collections() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 ex:s ex:p (ex:a ex:b) .\n\
		 ex:s ex:q () .",
	);
	let rendered: Vec<_> = triples.iter().map(Triple::to_string).collect();
	assert_eq!(
		rendered,
		[
			format!("_:@0 <{}> <http://example.org/a> .", vocab::RDF_FIRST),
			format!("_:@0 <{}> _:@1 .", vocab::RDF_REST),
			format!("_:@1 <{}> <http://example.org/b> .", vocab::RDF_FIRST),
			format!("_:@1 <{}> <{}> .", vocab::RDF_REST, vocab::RDF_NIL),
			"<http://example.org/s> <http://example.org/p> _:@0 .".to_owned(),
			format!("<http://example.org/s> <http://example.org/q> <{}> .", vocab::RDF_NIL),
		]
	);
}

#[test]
fn numbers_and_booleans() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 ex:s ex:p 1, -2.5, 3E4, .5, +7, 1.e2, true, false .\n\
		 ex:s ex:q 42.",
	);
	let objects: Vec<_> = triples.into_iter().map(|t| t.object).collect();
	assert_eq!(
		objects,
		[
			typed("1", vocab::XSD_INTEGER),
			typed("-2.5", vocab::XSD_DECIMAL),
			typed("3E4", vocab::XSD_DOUBLE),
			typed(".5", vocab::XSD_DECIMAL),
			typed("+7", vocab::XSD_INTEGER),
			typed("1.e2", vocab::XSD_DOUBLE),
			typed("true", vocab::XSD_BOOLEAN),
			typed("false", vocab::XSD_BOOLEAN),
			typed("42", vocab::XSD_INTEGER),
		]
	);
}

#[test]
fn strings() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
		 ex:s ex:p 'single', \"\"\"long \"quoted\"\n\
		 text\"\"\", '''x''', \"\", \"chat\"@fr, \"1\"^^xsd:integer .",
	);
	let objects: Vec<_> = triples.into_iter().map(|t| t.object).collect();
	assert_eq!(objects[0], Term::Literal(Literal::String("single".to_owned())));
	assert_eq!(
		objects[1],
		Term::Literal(Literal::String("long \"quoted\"\ntext".to_owned()))
	);
	assert_eq!(objects[2], Term::Literal(Literal::String("x".to_owned())));
	assert_eq!(objects[3], Term::Literal(Literal::String(String::new())));
	assert_eq!(objects[4].to_string(), "\"chat\"@fr");
	assert_eq!(objects[5], typed("1", vocab::XSD_INTEGER));
}

#[test]
fn local_names() {
	let triples = decode(
		"@prefix ex: <http://example.org/> .\n\
		 ex:a\\.b ex:p.q ex:%41.",
	);
	assert_eq!(triples[0].subject, Subject::Iri(ex("a.b")));
	assert_eq!(triples[0].predicate, ex("p.q"));
	assert_eq!(triples[0].object, Term::Iri(ex("%41")));
}

#[test]
fn base_resolution() {
	let triples = decode(
		"@base <http://example.org/dir/> .\n\
		 <a> <b> <../c> .\n\
		 @base <sub/> .\n\
		 <d> <#e> <> .",
	);
	assert_eq!(triples[0].subject, Subject::Iri(ex("dir/a")));
	assert_eq!(triples[0].object, Term::Iri(ex("c")));
	assert_eq!(triples[1].subject, Subject::Iri(ex("dir/sub/d")));
	assert_eq!(triples[1].predicate, ex("dir/sub/#e"));
	assert_eq!(triples[1].object, Term::Iri(ex("dir/sub/")));
}

#[test]
fn set_base() {
	let mut decoder = TripleDecoder::from_text("<a> <b> <c> .", Format::Turtle).unwrap();
	decoder.set_base(ex(""));
	assert_eq!(decoder.decode().unwrap().unwrap().subject, Subject::Iri(ex("a")));

	let mut decoder = Options::new(Format::Turtle)
		.with_base(ex("x/"))
		.triples(lexing::str_chars("<a> <b> <c> ."))
		.unwrap();
	assert_eq!(
		decoder.decode().unwrap().unwrap().subject,
		Subject::Iri(ex("x/a"))
	);
}

#[test]
fn relative_iri_without_base() {
	match decode_err("<a> <http://b> <http://c> .") {
		Error::Term {
			location,
			cause: TermError::RelativeIri(iri),
		} => {
			assert_eq!((location.line, location.column), (1, 1));
			assert_eq!(iri, "a")
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn undefined_prefix() {
	match decode_err("@prefix ex: <http://example.org/> .\nex:s ex:p foo:o .") {
		Error::Term {
			location,
			cause: TermError::UndefinedPrefix(prefix),
		} => {
			assert_eq!((location.line, location.column), (2, 11));
			assert_eq!(prefix, "foo")
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn unknown_keyword() {
	match decode_err("<http://a> <http://b> maybe .") {
		Error::Lexical {
			location,
			cause: lexing::Error::UnknownKeyword(word),
			..
		} => {
			assert_eq!(location.column, 23);
			assert_eq!(word, "maybe")
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn faulty_statement_yields_nothing() {
	let mut decoder = TripleDecoder::from_text(
		"@prefix ex: <http://example.org/> .\n\
		 ex:s ex:p ex:o1, ex:o2 ; ex:q .\n\
		 ex:s ex:p ex:o3 .",
		Format::Turtle,
	)
	.unwrap();

	assert!(matches!(
		decoder.decode(),
		Err(Error::Syntax {
			expecting: "object",
			..
		})
	));
	assert_eq!(decoder.decode().unwrap().unwrap().object, Term::Iri(ex("o3")));
	assert!(decoder.decode().unwrap().is_none());
}

#[test]
fn missing_period() {
	let e = decode_err("<http://a> <http://b> <http://c>");
	assert_eq!(
		e.to_string(),
		"1:33: unexpected end of input while expecting `.`"
	);
}
