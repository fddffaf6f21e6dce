//! # tickmqtt
//!
//! A transport-agnostic MQTT 3.1.1 client engine.
//!
//! The engine runs over anything that can move bytes in order: hand it a
//! [`Transport`] and an [`EventHandler`] and drive it from your own loop.
//! Two entry points do all the work: [`Client::data_available`] consumes one
//! inbound packet, and [`Client::interval_timer`], called once a second,
//! advances keepalive pings, the CONNACK deadline and the retransmission of
//! unacknowledged QoS 1 and 2 packets. There are no threads, timers or
//! executors inside; everything happens in the calling thread.
//!
//! ```
//! use tickmqtt::{Client, ConnectOptions, QoS, Transport};
//! # use std::collections::VecDeque;
//! #
//! # struct Loopback {
//! # 	incoming: VecDeque<u8>,
//! # 	outgoing: Vec<u8>,
//! # }
//! #
//! # impl Transport for Loopback {
//! # 	fn bytes_available(&self) -> bool {
//! # 		!self.incoming.is_empty()
//! # 	}
//! # 	fn read_byte(&mut self) -> Option<u8> {
//! # 		self.incoming.pop_front()
//! # 	}
//! # 	fn write_byte(&mut self, byte: u8) -> bool {
//! # 		self.outgoing.push(byte);
//! # 		true
//! # 	}
//! # 	fn flush(&mut self) {}
//! # }
//! #
//! # fn main() -> Result<(), tickmqtt::Error> {
//! let transport = Loopback {
//! 	incoming: VecDeque::new(),
//! 	outgoing: Vec::new(),
//! };
//! let mut client = Client::new(transport, ());
//!
//! client.connect(ConnectOptions {
//! 	client_id: "doc-client",
//! 	..Default::default()
//! })?;
//!
//! // the broker accepts the session
//! client.transport_mut().incoming.extend([0x20, 0x02, 0x00, 0x00]);
//! client.data_available()?;
//! assert!(client.is_connected());
//!
//! client.publish("greeting", b"hello", QoS::AtMostOnce, false)?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod filter;
mod message;
mod options;
mod packet;
mod qos;
pub mod serde;
#[cfg(test)]
mod testing;
mod token;
mod topic;
mod transport;

pub use self::{
	client::{
		Client, ConnectionState, EventHandler, MessageHandler, SubscribeFailed, Subscription,
	},
	error::Error,
	filter::{Filter, InvalidFilter},
	message::Message,
	options::{Configuration, ConnectOptions, Credentials, Will},
	packet::PacketType,
	qos::{InvalidQoS, QoS},
	token::{Token, TokenKind},
	topic::{InvalidTopic, Topic},
	transport::Transport,
};
