use crate::token::{Token, TokenKind};
use core::fmt;

/// A validated MQTT topic.
///
/// Topics are tokenized into `/`-delimited levels on construction. Empty
/// levels are preserved, so `"a/"` has two levels and `"/"` is a valid
/// two-level topic. Wildcard characters are never valid in a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
	text: String,
	tokens: Vec<Token>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTopic {
	#[error("topic cannot be empty")]
	Empty,
	#[error("topic cannot exceed maximum mqtt string length")]
	TooLong,
	#[error("topic cannot contain wildcard characters")]
	WildcardCharacter,
}

impl Topic {
	/// Creates a new Topic.
	pub fn new(topic: impl Into<String>) -> Result<Self, InvalidTopic> {
		let text = topic.into();

		if text.is_empty() {
			return Err(InvalidTopic::Empty);
		}

		if text.len() > u16::MAX as usize {
			return Err(InvalidTopic::TooLong);
		}

		let mut tokens = Vec::new();
		for level in text.split('/') {
			if level.contains('#') || level.contains('+') {
				return Err(InvalidTopic::WildcardCharacter);
			}
			tokens.push(Token::new(level, TokenKind::Valid));
		}

		Ok(Self { text, tokens })
	}

	/// Returns the inner topic str.
	#[inline]
	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// Returns the length of the topic in bytes when encoded as UTF-8.
	#[inline]
	pub fn len(&self) -> usize {
		self.text.len()
	}

	/// Returns `true` if the topic has length of zero bytes.
	///
	/// Empty topics are not valid, so this should *always* be `false`.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Returns the `/`-delimited levels of the topic.
	#[inline]
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}
}

impl TryFrom<&str> for Topic {
	type Error = InvalidTopic;

	#[inline]
	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl TryFrom<String> for Topic {
	type Error = InvalidTopic;

	#[inline]
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl fmt::Display for Topic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.text.fmt(f)
	}
}

impl AsRef<str> for Topic {
	#[inline]
	fn as_ref(&self) -> &str {
		&self.text
	}
}
