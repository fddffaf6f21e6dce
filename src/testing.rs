//! In-memory transport for exercising the engine without a network.

use crate::transport::Transport;
use std::collections::VecDeque;

pub struct MockTransport {
	pub incoming: VecDeque<u8>,
	pub outgoing: Vec<u8>,
	pub accept_writes: bool,
	pub flushes: usize,
}

impl MockTransport {
	pub fn new() -> Self {
		Self {
			incoming: VecDeque::new(),
			outgoing: Vec::new(),
			accept_writes: true,
			flushes: 0,
		}
	}

	/// Queues bytes for the engine to read.
	pub fn feed(&mut self, bytes: &[u8]) {
		self.incoming.extend(bytes);
	}

	/// Drains and returns everything the engine has written so far.
	pub fn take_outgoing(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.outgoing)
	}
}

impl Transport for MockTransport {
	fn bytes_available(&self) -> bool {
		!self.incoming.is_empty()
	}

	fn read_byte(&mut self) -> Option<u8> {
		self.incoming.pop_front()
	}

	fn write_byte(&mut self, byte: u8) -> bool {
		if self.accept_writes {
			self.outgoing.push(byte);
		}
		self.accept_writes
	}

	fn flush(&mut self) {
		self.flushes += 1;
	}
}
