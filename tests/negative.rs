use rdf_decode::{Decode, Error, Format, TokenKind, TripleDecoder};
use std::path::Path;

fn fail<P: AsRef<Path>>(path: P, format: Format) -> Error {
	stderrlog::new().init().ok();
	let buffer = match std::fs::read_to_string(&path) {
		Ok(buffer) => buffer,
		Err(e) => panic!("unable to read file `{}`: {e:?}", path.as_ref().display()),
	};

	let format = match format {
		Format::NQuads => return fail_quads(&buffer),
		format => format,
	};

	match TripleDecoder::from_text(&buffer, format).unwrap().decode_all() {
		Ok(triples) => panic!("decoded {} triples from invalid input", triples.len()),
		Err(e) => {
			log::debug!("expected error: {e}");
			e
		}
	}
}

fn fail_quads(buffer: &str) -> Error {
	match rdf_decode::QuadDecoder::from_text(buffer, Format::NQuads)
		.unwrap()
		.decode_all()
	{
		Ok(quads) => panic!("decoded {} quads from invalid input", quads.len()),
		Err(e) => {
			log::debug!("expected error: {e}");
			e
		}
	}
}

#[test]
fn n01() {
	match fail("tests/negative/01.nq", Format::NQuads) {
		Error::Lexical { location, text, .. } => {
			assert_eq!((location.line, location.column), (2, 23));
			assert!(text.starts_with("\"unterminated ."))
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn n02() {
	match fail("tests/negative/02.nq", Format::NQuads) {
		Error::Syntax {
			location,
			found,
			expecting,
			..
		} => {
			assert_eq!((location.line, location.column), (1, 23));
			assert_eq!(found, TokenKind::Dot);
			assert_eq!(expecting, "object")
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn n03() {
	let e = fail("tests/negative/03.ttl", Format::Turtle);
	assert!(matches!(e, Error::Term { .. }));
	assert_eq!(e.to_string(), "3:1: undefined prefix `foo:`")
}

#[test]
fn n04() {
	match fail("tests/negative/04.rdf", Format::RdfXml) {
		Error::Lexical { location, .. } => assert_eq!(location.line, 3),
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn n05() {
	match fail("tests/negative/05.ttl", Format::Turtle) {
		Error::Syntax {
			location,
			found,
			expecting,
			..
		} => {
			assert_eq!((location.line, location.column), (4, 1));
			assert_eq!(found, TokenKind::PrefixedName);
			assert_eq!(expecting, "`.`")
		}
		e => panic!("unexpected error {e:?}"),
	}
}

#[test]
fn n06() {
	match fail("tests/negative/06.rdf", Format::RdfXml) {
		Error::Syntax {
			location,
			found,
			expecting,
			..
		} => {
			assert_eq!(location.line, 3);
			assert_eq!(found, TokenKind::Text);
			assert_eq!(expecting, "property element")
		}
		e => panic!("unexpected error {e:?}"),
	}
}
