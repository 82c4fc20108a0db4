use rdf_decode::{Decode, Format, QuadDecoder};
use std::path::Path;

fn decode<P: AsRef<Path>>(path: P, format: Format) -> usize {
	stderrlog::new().init().ok();
	match std::fs::read_to_string(&path) {
		Ok(buffer) => {
			let mut decoder = match QuadDecoder::from_text(&buffer, format) {
				Ok(decoder) => decoder,
				Err(e) => panic!("configuration error: {e}"),
			};

			match decoder.decode_all() {
				Ok(quads) => {
					for quad in &quads {
						log::debug!("{quad}")
					}

					quads.len()
				}
				Err(e) => {
					log::error!("parse error: {e}");
					panic!("parse error: {e:?}")
				}
			}
		}
		Err(e) => {
			log::error!("unable to read file `{}`: {}", path.as_ref().display(), e);
			panic!("IO error: {e:?}")
		}
	}
}

#[test]
fn p01() {
	assert_eq!(decode("tests/positive/01.nq", Format::NQuads), 4)
}

#[test]
fn p02() {
	assert_eq!(decode("tests/positive/02.nq", Format::NQuads), 3)
}

#[test]
fn p03() {
	assert_eq!(decode("tests/positive/03.nt", Format::NTriples), 2)
}

#[test]
fn p04() {
	assert_eq!(decode("tests/positive/04.ttl", Format::Turtle), 16)
}

#[test]
fn p05() {
	assert_eq!(decode("tests/positive/05.rdf", Format::RdfXml), 10)
}
