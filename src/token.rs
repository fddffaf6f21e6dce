/// Classification of a single topic or filter level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
	/// Literal text, possibly empty.
	Valid,
	/// The level failed validation.
	Invalid,
	/// The `#` wildcard.
	MultiLevel,
	/// The `+` wildcard.
	SingleLevel,
}

/// One `/`-delimited level of a [`Topic`] or [`Filter`].
///
/// A trailing `/` in the source string produces an empty [`TokenKind::Valid`]
/// token, so `"a/"` and `"a"` tokenize differently and do not match the same
/// filters.
///
/// [`Topic`]: crate::topic::Topic
/// [`Filter`]: crate::filter::Filter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
	text: String,
	kind: TokenKind,
}

impl Token {
	pub(crate) fn new(text: impl Into<String>, kind: TokenKind) -> Self {
		Self {
			text: text.into(),
			kind,
		}
	}

	/// Returns the level text as it appeared in the source string.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	#[inline]
	pub fn kind(&self) -> TokenKind {
		self.kind
	}
}
