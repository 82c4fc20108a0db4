use crate::{lexing, parsing, Format, Location, TokenKind};
use locspan::Meta;
use std::{convert::Infallible, fmt};

/// Term construction error.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
	#[error("undefined prefix `{0}:`")]
	UndefinedPrefix(String),

	#[error("relative IRI reference <{0}> without base IRI")]
	RelativeIri(String),

	#[error("invalid IRI <{0}>")]
	InvalidIri(String),

	#[error("invalid language tag `{0}`")]
	InvalidLangTag(String),

	#[error("XML name `{0}` is not in any namespace")]
	UnqualifiedName(String),
}

/// Decoding error.
///
/// Input-driven errors are positioned at the first character of the faulty
/// lexeme or token.
#[derive(Debug)]
pub enum Error<E = Infallible> {
	/// Malformed lexeme.
	Lexical {
		location: Location,
		text: String,
		cause: lexing::Error<E>,
	},

	/// Token of an unexpected kind.
	Syntax {
		location: Location,
		found: TokenKind,
		text: String,
		expecting: &'static str,
	},

	/// Term that cannot be built, such as a prefixed name with an undefined
	/// prefix.
	Term { location: Location, cause: TermError },

	/// Unsupported serialization format, detected when building the decoder.
	Configuration(Format),
}

impl<E> Error<E> {
	pub fn location(&self) -> Option<&Location> {
		match self {
			Self::Lexical { location, .. }
			| Self::Syntax { location, .. }
			| Self::Term { location, .. } => Some(location),
			Self::Configuration(_) => None,
		}
	}
}

impl<E> From<parsing::MetaError<E>> for Error<E> {
	fn from(Meta(e, location): parsing::MetaError<E>) -> Self {
		match *e {
			parsing::Error::Lexer(lexing::Malformed { error, text }) => Self::Lexical {
				location,
				text,
				cause: error,
			},
			parsing::Error::Unexpected {
				found,
				text,
				expecting,
			} => Self::Syntax {
				location,
				found,
				text,
				expecting,
			},
			parsing::Error::Term(cause) => Self::Term { location, cause },
		}
	}
}

impl<E: fmt::Display> fmt::Display for Error<E> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Lexical {
				location,
				text,
				cause,
			} => {
				write!(f, "{location}: {cause}")?;
				if !text.is_empty() {
					write!(f, " in `{}`", text.escape_debug())?;
				}

				Ok(())
			}
			Self::Syntax {
				location,
				text,
				expecting,
				..
			} => write!(f, "{location}: unexpected {text} while expecting {expecting}"),
			Self::Term { location, cause } => write!(f, "{location}: {cause}"),
			Self::Configuration(format) => {
				write!(f, "decoder for serialization format {format} not implemented")
			}
		}
	}
}

impl<E: 'static + std::error::Error> std::error::Error for Error<E> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Lexical { cause, .. } => Some(cause),
			Self::Term { cause, .. } => Some(cause),
			_ => None,
		}
	}
}
