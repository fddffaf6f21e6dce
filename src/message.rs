use crate::{qos::QoS, topic::Topic};
use core::fmt;

/// An application message, either to be published or received from the
/// broker.
///
/// The payload is an owned byte buffer with a read/write cursor. Writes at
/// the cursor overwrite existing bytes and extend the buffer once the cursor
/// reaches the end, so a message can be built incrementally, rewound with
/// [`Message::seek`] and re-read.
#[derive(Clone)]
pub struct Message {
	pub topic: Topic,
	pub qos: QoS,
	pub retain: bool,
	pub duplicate: bool,
	payload: Vec<u8>,
	cursor: usize,
}

impl Message {
	/// Creates a message with an empty payload.
	pub fn new(topic: Topic, qos: QoS, retain: bool) -> Self {
		Self {
			topic,
			qos,
			retain,
			duplicate: false,
			payload: Vec::new(),
			cursor: 0,
		}
	}

	/// Creates a message with the given payload. The cursor is left at the
	/// start of the payload.
	pub fn with_payload(
		topic: Topic,
		payload: impl Into<Vec<u8>>,
		qos: QoS,
		retain: bool,
	) -> Self {
		Self {
			topic,
			qos,
			retain,
			duplicate: false,
			payload: payload.into(),
			cursor: 0,
		}
	}

	/// Returns the entire payload, regardless of the cursor position.
	#[inline]
	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	/// Returns the payload length in bytes.
	#[inline]
	pub fn len(&self) -> usize {
		self.payload.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.payload.is_empty()
	}

	/// Returns the number of payload bytes the buffer can hold without
	/// reallocating.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.payload.capacity()
	}

	/// Reserves buffer space for at least `additional` more payload bytes.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		self.payload.reserve(additional);
	}

	/// Releases any excess buffer capacity.
	#[inline]
	pub fn pack(&mut self) {
		self.payload.shrink_to_fit();
	}

	/// Returns the cursor position.
	#[inline]
	pub fn position(&self) -> usize {
		self.cursor
	}

	/// Returns the number of payload bytes left to read from the cursor.
	#[inline]
	pub fn available(&self) -> usize {
		self.payload.len() - self.cursor
	}

	/// Moves the cursor. Returns `false`, leaving the cursor unchanged, if
	/// `position` is past the end of the payload.
	pub fn seek(&mut self, position: usize) -> bool {
		if position > self.payload.len() {
			return false;
		}
		self.cursor = position;
		true
	}

	/// Reads the byte at the cursor and advances past it.
	pub fn read(&mut self) -> Option<u8> {
		let byte = *self.payload.get(self.cursor)?;
		self.cursor += 1;
		Some(byte)
	}

	/// Reads the byte at the cursor without advancing.
	#[inline]
	pub fn peek(&self) -> Option<u8> {
		self.payload.get(self.cursor).copied()
	}

	/// Reads `len` bytes from the cursor, advancing past them. Returns
	/// `None`, without advancing, if fewer than `len` bytes remain.
	pub fn read_slice(&mut self, len: usize) -> Option<&[u8]> {
		if self.available() < len {
			return None;
		}
		let start = self.cursor;
		self.cursor += len;
		Some(&self.payload[start..self.cursor])
	}

	/// Writes a byte at the cursor, extending the payload if the cursor is
	/// at the end.
	pub fn write(&mut self, byte: u8) {
		if self.cursor < self.payload.len() {
			self.payload[self.cursor] = byte;
		} else {
			self.payload.push(byte);
		}
		self.cursor += 1;
	}

	/// Writes a slice at the cursor, extending the payload as needed.
	pub fn write_slice(&mut self, bytes: &[u8]) {
		let overlap = (self.payload.len() - self.cursor).min(bytes.len());
		let end = self.cursor + overlap;
		self.payload[self.cursor..end].copy_from_slice(&bytes[..overlap]);
		self.payload.extend_from_slice(&bytes[overlap..]);
		self.cursor += bytes.len();
	}

	/// Compares the entire payload against `other`.
	#[inline]
	pub fn payload_equals(&self, other: impl AsRef<[u8]>) -> bool {
		self.payload == other.as_ref()
	}

	/// Compares the entire payload against `other`, ignoring ASCII case.
	#[inline]
	pub fn payload_equals_ignore_case(&self, other: impl AsRef<[u8]>) -> bool {
		self.payload.eq_ignore_ascii_case(other.as_ref())
	}
}

impl fmt::Debug for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Message")
			.field("topic", &self.topic.as_str())
			.field("qos", &self.qos)
			.field("retain", &self.retain)
			.field("duplicate", &self.duplicate)
			.field("len", &self.payload.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn message(payload: &[u8]) -> Message {
		Message::with_payload(Topic::new("t").unwrap(), payload, QoS::AtMostOnce, false)
	}

	#[test]
	fn cursor_reads() {
		let mut msg = message(b"abc");
		assert_eq!(msg.available(), 3);
		assert_eq!(msg.peek(), Some(b'a'));
		assert_eq!(msg.read(), Some(b'a'));
		assert_eq!(msg.read_slice(2), Some(&b"bc"[..]));
		assert_eq!(msg.read(), None);
		assert_eq!(msg.peek(), None);
		assert_eq!(msg.available(), 0);
	}

	#[test]
	fn read_slice_past_end() {
		let mut msg = message(b"ab");
		assert_eq!(msg.read_slice(3), None);
		// the failed read must not move the cursor
		assert_eq!(msg.position(), 0);
	}

	#[test]
	fn seek_bounds() {
		let mut msg = message(b"abcd");
		assert!(msg.seek(4));
		assert!(!msg.seek(5));
		assert_eq!(msg.position(), 4);
		assert!(msg.seek(0));
		assert_eq!(msg.read(), Some(b'a'));
	}

	#[test]
	fn writes_overwrite_then_extend() {
		let mut msg = message(b"abcd");
		assert!(msg.seek(2));
		msg.write_slice(b"XYZ");
		assert_eq!(msg.payload(), b"abXYZ");
		assert_eq!(msg.position(), 5);

		msg.write(b'!');
		assert_eq!(msg.payload(), b"abXYZ!");
	}

	#[test]
	fn builds_incrementally() {
		let mut msg = Message::new(Topic::new("t").unwrap(), QoS::AtMostOnce, false);
		msg.write_slice(b"hello");
		msg.write(b' ');
		msg.write_slice(b"world");
		assert_eq!(msg.payload(), b"hello world");
		assert!(msg.seek(0));
		assert_eq!(msg.read(), Some(b'h'));
	}

	#[test]
	fn reserve_and_pack() {
		let mut msg = message(b"abc");
		msg.reserve(128);
		assert!(msg.capacity() >= 131);
		msg.pack();
		assert!(msg.capacity() >= 3);
		assert!(msg.capacity() < 131);
	}

	#[test]
	fn payload_comparisons() {
		let msg = message(b"Hello");
		assert!(msg.payload_equals(b"Hello"));
		assert!(!msg.payload_equals(b"hello"));
		assert!(msg.payload_equals_ignore_case(b"hello"));
		assert!(msg.payload_equals_ignore_case(b"HELLO"));
		assert!(!msg.payload_equals_ignore_case(b"HELLO!"));
	}
}
