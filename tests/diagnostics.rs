use codespan_reporting::{
	diagnostic::{Diagnostic, Label},
	files::SimpleFiles,
	term::{self, termcolor::NoColor},
};
use rdf_decode::{Decode, Error, Format, QuadDecoder};

fn render(name: &str, input: &str, format: Format) -> (Error, String) {
	stderrlog::new().init().ok();
	let e = QuadDecoder::from_text(input, format)
		.unwrap()
		.decode_all()
		.unwrap_err();

	let mut files = SimpleFiles::new();
	let file_id = files.add(name, input);

	let location = e.location().copied().unwrap();
	let diagnostic = Diagnostic::error()
		.with_message(e.to_string())
		.with_labels(vec![Label::primary(file_id, location.span.start()..location.span.end())]);

	let mut writer = NoColor::new(Vec::new());
	let config = term::Config::default();
	term::emit(&mut writer, &config, &files, &diagnostic).unwrap();

	let output = String::from_utf8(writer.into_inner()).unwrap();
	log::debug!("{output}");
	(e, output)
}

#[test]
fn syntax_error() {
	let (_, output) = render(
		"input.nq",
		"<http://a> <http://b> \"x\" .\n<http://a> <http://b> .\n",
		Format::NQuads,
	);

	assert!(output.contains("input.nq:2:23"));
	assert!(output.contains("unexpected dot `.` while expecting object"));
}

#[test]
fn lexical_error() {
	let (e, output) = render(
		"input.nq",
		"<http://a> <http://b> \"x\n",
		Format::NQuads,
	);

	assert!(matches!(e, Error::Lexical { .. }));
	assert!(output.contains("input.nq:1:23"));
}

#[test]
fn term_error() {
	let (e, output) = render(
		"input.ttl",
		"@prefix ex: <http://example.org/> .\n\nex:s ex:p undefined:o .\n",
		Format::Turtle,
	);

	assert!(matches!(e, Error::Term { .. }));
	assert!(output.contains("input.ttl:3:11"));
	assert!(output.contains("undefined prefix `undefined:`"));
}
