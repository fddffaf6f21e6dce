use crate::{
	token::{Token, TokenKind},
	topic::Topic,
};
use core::fmt;

/// A validated MQTT topic filter.
///
/// Filters are tokenized into `/`-delimited levels on construction. A level
/// consisting of `#` is a multi-level wildcard and may only appear as the
/// final level. A level consisting of `+` is a single-level wildcard.
/// Wildcard characters cannot be combined with other text within a level.
///
/// As with [`Topic`], empty levels are preserved. The filter `"a/b/+"`
/// therefore matches the topic `"a/b/"` but not `"a/b"`.
#[derive(Clone, Debug, Eq)]
pub struct Filter {
	text: String,
	tokens: Vec<Token>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFilter {
	#[error("filter cannot be empty")]
	Empty,
	#[error("filter cannot exceed maximum mqtt string length")]
	TooLong,
	#[error("filter levels cannot contain both wildcard and non-wildcard characters")]
	MixedWildcard,
	#[error("multi-level wildcard can only appear in final filter level")]
	NonTerminalMultiLevelWildcard,
}

impl Filter {
	/// Creates a new Filter.
	pub fn new(filter: impl Into<String>) -> Result<Self, InvalidFilter> {
		let text = filter.into();

		if text.is_empty() {
			return Err(InvalidFilter::Empty);
		}

		if text.len() > u16::MAX as usize {
			return Err(InvalidFilter::TooLong);
		}

		let levels: Vec<&str> = text.split('/').collect();
		let final_level = levels.len() - 1;

		let mut tokens = Vec::with_capacity(levels.len());
		for (position, level) in levels.iter().enumerate() {
			let kind = match *level {
				"#" => {
					if position != final_level {
						return Err(InvalidFilter::NonTerminalMultiLevelWildcard);
					}
					TokenKind::MultiLevel
				}
				"+" => TokenKind::SingleLevel,
				level if level.contains('#') || level.contains('+') => {
					return Err(InvalidFilter::MixedWildcard);
				}
				_ => TokenKind::Valid,
			};
			tokens.push(Token::new(*level, kind));
		}

		Ok(Self { text, tokens })
	}

	/// Checks `topic` to determine if it would be matched by the `Filter`.
	///
	/// A multi-level wildcard matches the remainder of the topic, including
	/// the empty remainder, so `"a/#"` matches both `"a"` and `"a/b/c"`.
	pub fn matches(&self, topic: &Topic) -> bool {
		let mut topic_tokens = topic.tokens().iter();

		for token in &self.tokens {
			match token.kind() {
				TokenKind::MultiLevel => return true,
				TokenKind::SingleLevel => {
					if topic_tokens.next().is_none() {
						return false;
					}
				}
				TokenKind::Valid => {
					if topic_tokens.next().map_or(true, |t| t.text() != token.text()) {
						return false;
					}
				}
				TokenKind::Invalid => return false,
			}
		}

		// Ensure all levels of the topic have been matched
		topic_tokens.next().is_none()
	}

	/// Returns the inner filter str.
	#[inline]
	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// Returns the length of the filter in bytes when encoded as UTF-8.
	#[inline]
	pub fn len(&self) -> usize {
		self.text.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Returns the `/`-delimited levels of the filter.
	#[inline]
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}
}

/// Filters compare by structure. Two filters are equal when their levels
/// pair up with the same kind, and literal levels carry the same text.
impl PartialEq for Filter {
	fn eq(&self, other: &Self) -> bool {
		self.tokens.len() == other.tokens.len()
			&& self
				.tokens
				.iter()
				.zip(other.tokens.iter())
				.all(|(a, b)| {
					a.kind() == b.kind()
						&& (a.kind() != TokenKind::Valid || a.text() == b.text())
				})
	}
}

impl TryFrom<&str> for Filter {
	type Error = InvalidFilter;

	#[inline]
	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl TryFrom<String> for Filter {
	type Error = InvalidFilter;

	#[inline]
	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.text.fmt(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn topic(text: &str) -> Topic {
		Topic::new(text).unwrap()
	}

	#[test]
	fn parses_filters() {
		assert!(Filter::new("a/b/c").is_ok());
		assert!(Filter::new("#").is_ok());
		assert!(Filter::new("+").is_ok());
		assert!(Filter::new("a/+/c").is_ok());
		assert!(Filter::new("a/b/#").is_ok());
		assert!(Filter::new("/").is_ok());
		assert!(Filter::new("+/+").is_ok());

		assert_eq!(Filter::new(""), Err(InvalidFilter::Empty));
		assert_eq!(Filter::new("a/b#"), Err(InvalidFilter::MixedWildcard));
		assert_eq!(Filter::new("a/+b/c"), Err(InvalidFilter::MixedWildcard));
		assert_eq!(
			Filter::new("a/#/c"),
			Err(InvalidFilter::NonTerminalMultiLevelWildcard)
		);
		assert_eq!(
			Filter::new("#/a"),
			Err(InvalidFilter::NonTerminalMultiLevelWildcard)
		);
	}

	#[test]
	fn wildcard_kinds() {
		let filter = Filter::new("a/+/#").unwrap();
		let kinds: Vec<TokenKind> = filter.tokens().iter().map(|t| t.kind()).collect();
		assert_eq!(
			kinds,
			vec![TokenKind::Valid, TokenKind::SingleLevel, TokenKind::MultiLevel]
		);
	}

	#[test]
	fn matches_topics() {
		let filter = Filter::new("a/b/+").unwrap();
		assert!(filter.matches(&topic("a/b/c")));
		assert!(filter.matches(&topic("a/b/")));
		assert!(!filter.matches(&topic("a/b")));
		assert!(!filter.matches(&topic("a/b/c/d")));
		assert!(!filter.matches(&topic("a/x/c")));

		let exact = Filter::new("a/b").unwrap();
		assert!(exact.matches(&topic("a/b")));
		assert!(!exact.matches(&topic("a/b/")));
		assert!(!exact.matches(&topic("a")));
	}

	#[test]
	fn multi_level_matches_remainder() {
		let all = Filter::new("#").unwrap();
		assert!(all.matches(&topic("a")));
		assert!(all.matches(&topic("a/b/c")));
		assert!(all.matches(&topic("/")));

		let scoped = Filter::new("sport/#").unwrap();
		assert!(scoped.matches(&topic("sport")));
		assert!(scoped.matches(&topic("sport/tennis/player1")));
		assert!(!scoped.matches(&topic("news")));
	}

	#[test]
	fn single_level_requires_a_level() {
		let filter = Filter::new("+/+").unwrap();
		assert!(filter.matches(&topic("/")));
		assert!(filter.matches(&topic("a/b")));
		assert!(!filter.matches(&topic("a")));
		assert!(!filter.matches(&topic("a/b/c")));
	}

	#[test]
	fn structural_equality() {
		assert_eq!(Filter::new("a/+/c").unwrap(), Filter::new("a/+/c").unwrap());
		assert_eq!(Filter::new("a/#").unwrap(), Filter::new("a/#").unwrap());
		assert_ne!(Filter::new("a/+/c").unwrap(), Filter::new("a/b/c").unwrap());
		assert_ne!(Filter::new("a/b").unwrap(), Filter::new("a/b/").unwrap());
		assert_ne!(Filter::new("a/b").unwrap(), Filter::new("a/b/c").unwrap());
	}
}
