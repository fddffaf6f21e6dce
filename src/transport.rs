/// A byte-oriented duplex stream the protocol engine runs over.
///
/// The engine assumes ordered, reliable delivery (TCP, TLS, a serial link
/// with its own framing, an in-memory pipe in tests). It never sleeps or
/// polls: the embedding drives it by calling
/// [`Client::data_available`](crate::Client::data_available) when
/// [`bytes_available`](Transport::bytes_available) reports pending input.
///
/// Implementations may block briefly in [`read_byte`](Transport::read_byte)
/// while the remainder of a packet is in flight, but should give up and
/// return `None` rather than stall indefinitely.
pub trait Transport {
	/// Returns whether at least one byte is ready to read.
	fn bytes_available(&self) -> bool;

	/// Reads a single byte, or `None` if the stream has nothing to deliver.
	fn read_byte(&mut self) -> Option<u8>;

	/// Writes a single byte. Returns `false` if the stream did not accept
	/// it.
	fn write_byte(&mut self, byte: u8) -> bool;

	/// Flushes any buffered output to the peer.
	fn flush(&mut self);
}
