use std::{fmt, str::FromStr};

/// RDF serialization format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
	NTriples,
	NQuads,
	Turtle,
	RdfXml,
}

impl Format {
	pub const ALL: [Self; 4] = [Self::NTriples, Self::NQuads, Self::Turtle, Self::RdfXml];

	pub fn name(&self) -> &'static str {
		match self {
			Self::NTriples => "N-Triples",
			Self::NQuads => "N-Quads",
			Self::Turtle => "Turtle",
			Self::RdfXml => "RDF/XML",
		}
	}

	pub fn media_type(&self) -> &'static str {
		match self {
			Self::NTriples => "application/n-triples",
			Self::NQuads => "application/n-quads",
			Self::Turtle => "text/turtle",
			Self::RdfXml => "application/rdf+xml",
		}
	}

	/// Usual file extension, without the leading dot.
	pub fn extension(&self) -> &'static str {
		match self {
			Self::NTriples => "nt",
			Self::NQuads => "nq",
			Self::Turtle => "ttl",
			Self::RdfXml => "rdf",
		}
	}

	/// Finds the format of the given media type.
	///
	/// Media type parameters such as `charset` are ignored.
	pub fn from_media_type(media_type: &str) -> Option<Self> {
		let essence = media_type.split(';').next().unwrap_or_default().trim();
		Self::ALL
			.into_iter()
			.find(|f| f.media_type().eq_ignore_ascii_case(essence))
	}

	/// Finds the format of the given file extension, with or without the
	/// leading dot.
	pub fn from_extension(extension: &str) -> Option<Self> {
		let extension = extension.strip_prefix('.').unwrap_or(extension);
		match extension.to_ascii_lowercase().as_str() {
			"nt" => Some(Self::NTriples),
			"nq" => Some(Self::NQuads),
			"ttl" => Some(Self::Turtle),
			"rdf" | "xml" => Some(Self::RdfXml),
			_ => None,
		}
	}

	/// Checks if statements of this format may name a graph.
	pub fn is_quad_format(&self) -> bool {
		matches!(self, Self::NQuads)
	}

	/// Checks if this format resolves relative IRI references against a base
	/// IRI.
	pub fn allows_relative_iris(&self) -> bool {
		matches!(self, Self::Turtle | Self::RdfXml)
	}
}

impl fmt::Display for Format {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Unknown format name.
#[derive(Debug, thiserror::Error)]
#[error("unknown RDF serialization format `{0}`")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
	type Err = UnknownFormat;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
			"nquads" | "n-quads" | "nq" => Ok(Self::NQuads),
			"turtle" | "ttl" => Ok(Self::Turtle),
			"rdfxml" | "rdf/xml" | "rdf" | "xml" => Ok(Self::RdfXml),
			_ => Err(UnknownFormat(s.to_owned())),
		}
	}
}
