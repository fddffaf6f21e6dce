//! The MQTT 3.1.1 client protocol engine.
//!
//! The engine owns a [`Transport`] and an [`EventHandler`] and is driven
//! entirely by the embedding: [`Client::data_available`] consumes one
//! inbound packet, [`Client::interval_timer`] advances every time-based
//! behaviour by one second. Nothing here spawns, sleeps or polls.

mod allocator;
mod events;
mod queue;
mod subscriptions;

pub use events::EventHandler;
pub use subscriptions::{MessageHandler, SubscribeFailed, Subscription};

use crate::{
	error::Error,
	filter::Filter,
	message::Message,
	options::{Configuration, ConnectOptions},
	packet::PacketType,
	qos::QoS,
	serde,
	topic::Topic,
	transport::Transport,
};
use allocator::PacketIdAllocator;
use queue::DeliveryQueue;
use subscriptions::SubscriptionList;
use tracing::{debug, error, warn};

// Fixed headers of the two-byte acknowledgement packets. PUBREL carries
// mandatory flag bits.
const PUBACK: u8 = 0x40;
const PUBREC: u8 = 0x50;
const PUBREL: u8 = 0x62;
const PUBCOMP: u8 = 0x70;

/// Connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
	#[default]
	Disconnected,
	/// CONNECT sent, CONNACK outstanding.
	Connecting,
	Connected,
}

/// An MQTT 3.1.1 client session over a byte-oriented transport.
///
/// The client tracks unacknowledged QoS 1 and 2 traffic in bounded delivery
/// queues and retransmits on a tick-driven schedule, so reliable delivery
/// works without any runtime or timer machinery of its own. Inbound
/// messages are offered to per-subscription [`MessageHandler`]s first and
/// fall back to [`EventHandler::receive_message`].
pub struct Client<T, H> {
	transport: T,
	handler: H,
	configuration: Configuration,
	state: ConnectionState,
	allocator: PacketIdAllocator,
	subscriptions: SubscriptionList,
	/// Outbound QoS 1 and 2 publishes awaiting PUBACK or PUBREC.
	outgoing_publish: DeliveryQueue,
	/// Inbound QoS 2 messages held until their PUBREL.
	incoming_qos2: DeliveryQueue,
	/// Outbound PUBRELs awaiting PUBCOMP.
	outgoing_pubrel: DeliveryQueue,
	/// Ticks until the next PINGREQ. Zero disarms the keepalive.
	ping_countdown: u8,
	unanswered_pings: u8,
	/// Ticks left for the broker to answer with a CONNACK.
	connect_countdown: u8,
	connect_announcement: Option<Message>,
	disconnect_announcement: Option<Message>,
}

impl<T: Transport, H: EventHandler> Client<T, H> {
	/// Creates a client with the default [`Configuration`].
	pub fn new(transport: T, handler: H) -> Self {
		Self::with_configuration(transport, handler, Configuration::default())
	}

	pub fn with_configuration(transport: T, handler: H, configuration: Configuration) -> Self {
		let capacity = configuration.queue_capacity;
		Self {
			transport,
			handler,
			configuration,
			state: ConnectionState::Disconnected,
			allocator: PacketIdAllocator::new(),
			subscriptions: SubscriptionList::default(),
			outgoing_publish: DeliveryQueue::new(capacity),
			incoming_qos2: DeliveryQueue::new(capacity),
			outgoing_pubrel: DeliveryQueue::new(capacity),
			ping_countdown: 0,
			unanswered_pings: 0,
			connect_countdown: 0,
			connect_announcement: None,
			disconnect_announcement: None,
		}
	}

	#[inline]
	pub fn state(&self) -> ConnectionState {
		self.state
	}

	#[inline]
	pub fn is_connected(&self) -> bool {
		self.state == ConnectionState::Connected
	}

	#[inline]
	pub fn handler(&self) -> &H {
		&self.handler
	}

	#[inline]
	pub fn handler_mut(&mut self) -> &mut H {
		&mut self.handler
	}

	#[inline]
	pub fn transport(&self) -> &T {
		&self.transport
	}

	#[inline]
	pub fn transport_mut(&mut self) -> &mut T {
		&mut self.transport
	}

	/// Returns the registered subscriptions, in registration order.
	pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
		self.subscriptions.iter()
	}

	/// Number of outbound publishes awaiting acknowledgement, including
	/// QoS 2 publishes in their release phase.
	pub fn pending_publishes(&self) -> usize {
		self.outgoing_publish.len() + self.outgoing_pubrel.len()
	}

	/// Number of inbound QoS 2 messages held until their PUBREL arrives.
	pub fn pending_receives(&self) -> usize {
		self.incoming_qos2.len()
	}

	/// Sets a message published automatically after every successful
	/// connection handshake.
	pub fn set_connect_announcement(&mut self, message: Option<Message>) {
		self.connect_announcement = message;
	}

	/// Sets a message published immediately before an orderly disconnect.
	/// The announcement is sent at most once, so it is always published at
	/// QoS 0 regardless of the quality of service set on the message.
	pub fn set_disconnect_announcement(&mut self, message: Option<Message>) {
		self.disconnect_announcement = message;
	}

	/// Sends a CONNECT packet and begins waiting for the CONNACK.
	///
	/// With `clean_session` set, any in-flight packets from a previous
	/// session are discarded. Otherwise they are kept and their
	/// retransmission budgets refreshed, so delivery resumes once the
	/// broker accepts the session.
	pub fn connect(&mut self, options: ConnectOptions<'_>) -> Result<(), Error> {
		if self.state == ConnectionState::Connected {
			return Err(Error::AlreadyConnected);
		}

		if options.clean_session {
			self.outgoing_publish.clear();
			self.incoming_qos2.clear();
			self.outgoing_pubrel.clear();
		} else {
			let timeout = self.configuration.packet_timeout;
			self.outgoing_publish.restore(timeout);
			self.incoming_qos2.restore(timeout);
			self.outgoing_pubrel.restore(timeout);
		}

		write_connect(&mut self.transport, &options)?;
		self.state = ConnectionState::Connecting;
		self.connect_countdown = self.configuration.connect_timeout;
		self.ping_countdown = 0;
		self.unanswered_pings = 0;
		debug!(
			client_id = options.client_id,
			clean_session = options.clean_session,
			"connect sent"
		);
		Ok(())
	}

	/// Publishes the disconnect announcement, if one is set, then sends a
	/// DISCONNECT packet and resets the session state.
	pub fn disconnect(&mut self) -> Result<(), Error> {
		if self.state == ConnectionState::Disconnected {
			return Err(Error::NotConnected);
		}

		if self.state == ConnectionState::Connected {
			if let Some(mut announcement) = self.disconnect_announcement.clone() {
				announcement.qos = QoS::AtMostOnce;
				if let Err(err) = self.publish_message(announcement) {
					warn!(error = %err, "failed to publish disconnect announcement");
				}
			}
		}

		write_disconnect(&mut self.transport)?;
		self.reset();
		debug!("disconnect sent");
		Ok(())
	}

	/// Publishes `payload` to `topic`.
	///
	/// At [`QoS::AtMostOnce`] the packet is written and forgotten. At
	/// higher levels the message is tracked until the acknowledgement flow
	/// completes, and retransmitted with the duplicate flag set if an
	/// acknowledgement does not arrive in time.
	pub fn publish(
		&mut self,
		topic: &str,
		payload: &[u8],
		qos: QoS,
		retain: bool,
	) -> Result<(), Error> {
		let topic = Topic::new(topic)?;
		self.publish_message(Message::with_payload(topic, payload, qos, retain))
	}

	/// Publishes a prepared [`Message`].
	pub fn publish_message(&mut self, mut message: Message) -> Result<(), Error> {
		if self.state != ConnectionState::Connected {
			return Err(Error::NotConnected);
		}

		// first transmission is never a duplicate
		message.duplicate = false;

		if message.qos == QoS::AtMostOnce {
			write_publish(&mut self.transport, &message, None)?;
			debug!(topic = message.topic.as_str(), "published");
			return Ok(());
		}

		// the in-flight window spans both outbound stages
		if self.pending_publishes() >= self.configuration.queue_capacity {
			return Err(Error::QueueFull);
		}
		let packet_id = self.allocator.next_publish_id();
		write_publish(&mut self.transport, &message, Some(packet_id))?;
		debug!(
			topic = message.topic.as_str(),
			packet_id,
			qos = ?message.qos,
			"published"
		);
		self.outgoing_publish
			.insert(packet_id, self.configuration.packet_timeout, Some(message))
	}

	/// Sends a SUBSCRIBE packet for `filter` and registers the
	/// subscription. Returns the packet id carried by the SUBSCRIBE.
	///
	/// The subscription is confirmed through
	/// [`EventHandler::subscribed`] once the SUBACK arrives.
	pub fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<u16, Error> {
		self.subscribe_inner(filter, qos, None)
	}

	/// Like [`Client::subscribe`], but messages matching `filter` are
	/// offered to `handler` before the catch-all
	/// [`EventHandler::receive_message`].
	pub fn subscribe_with_handler(
		&mut self,
		filter: &str,
		qos: QoS,
		handler: MessageHandler,
	) -> Result<u16, Error> {
		self.subscribe_inner(filter, qos, Some(handler))
	}

	fn subscribe_inner(
		&mut self,
		filter: &str,
		qos: QoS,
		handler: Option<MessageHandler>,
	) -> Result<u16, Error> {
		if self.state != ConnectionState::Connected {
			return Err(Error::NotConnected);
		}
		let filter = Filter::new(filter)?;
		let packet_id = self.allocator.next_control_id();
		write_subscribe(&mut self.transport, packet_id, &[(&filter, qos)])?;
		debug!(filter = filter.as_str(), packet_id, "subscribe sent");
		self.subscriptions.upsert(filter, qos, handler, packet_id);
		Ok(packet_id)
	}

	/// Re-sends every registered subscription in a single SUBSCRIBE
	/// packet. Intended for [`EventHandler::init_session`], when the broker
	/// has no session state and the registry is the only record of what
	/// should be subscribed.
	pub fn resubscribe(&mut self) -> Result<u16, Error> {
		if self.state != ConnectionState::Connected {
			return Err(Error::NotConnected);
		}
		// SUBSCRIBE must carry at least one filter
		if self.subscriptions.is_empty() {
			return Err(Error::PayloadInvalid);
		}

		let packet_id = self.allocator.next_control_id();
		let filters: Vec<(&Filter, QoS)> = self
			.subscriptions
			.iter()
			.map(|subscription| (subscription.filter(), subscription.qos()))
			.collect();
		write_subscribe(&mut self.transport, packet_id, &filters)?;
		let count = filters.len();
		drop(filters);
		self.subscriptions.mark_all_pending(packet_id);
		debug!(packet_id, count, "resubscribe sent");
		Ok(packet_id)
	}

	/// Sends an UNSUBSCRIBE packet for `filter`. Returns the packet id
	/// carried by the UNSUBSCRIBE.
	///
	/// The matching registry entry, if any, is removed once the UNSUBACK
	/// arrives and [`EventHandler::unsubscribed`] has run.
	pub fn unsubscribe(&mut self, filter: &str) -> Result<u16, Error> {
		if self.state != ConnectionState::Connected {
			return Err(Error::NotConnected);
		}
		let filter = Filter::new(filter)?;
		let packet_id = self.allocator.next_control_id();
		write_unsubscribe(&mut self.transport, packet_id, &filter)?;
		self.subscriptions.mark_unsubscribe(&filter, packet_id);
		debug!(filter = filter.as_str(), packet_id, "unsubscribe sent");
		Ok(packet_id)
	}

	/// Consumes exactly one packet from the transport.
	///
	/// Call whenever [`Transport::bytes_available`] reports pending input.
	/// Any event handlers triggered by the packet run before this returns.
	pub fn data_available(&mut self) -> Result<(), Error> {
		let header = serde::get_u8(&mut self.transport)?;
		let length = serde::get_var(&mut self.transport)?;

		// an intact inbound packet is proof of life for the keepalive
		if self.state == ConnectionState::Connected {
			self.ping_countdown = self.configuration.ping_interval;
			self.unanswered_pings = 0;
		}

		match PacketType::from_header(header) {
			Some(PacketType::ConnAck) => self.recv_connack(length),
			Some(PacketType::Publish) => self.recv_publish(header, length),
			Some(PacketType::PubAck) => self.recv_puback(length),
			Some(PacketType::PubRec) => self.recv_pubrec(length),
			Some(PacketType::PubRel) => self.recv_pubrel(length),
			Some(PacketType::PubComp) => self.recv_pubcomp(length),
			Some(PacketType::SubAck) => self.recv_suback(length),
			Some(PacketType::UnsubAck) => self.recv_unsuback(length),
			Some(PacketType::PingResp) => self.recv_pingresp(length),
			_ => {
				// server-bound or reserved type; skip its payload so the
				// stream stays in sync
				self.drain(length)?;
				warn!(header, "unhandled packet type");
				Err(Error::UnhandledPacketType(header))
			}
		}
	}

	/// Advances all time-based behaviour by one tick, nominally a second.
	///
	/// While connecting, this counts down the CONNACK deadline. While
	/// connected, it ages the delivery queues (retransmitting or dropping
	/// overdue packets) and drives the keepalive cycle.
	pub fn interval_timer(&mut self) -> Result<(), Error> {
		match self.state {
			ConnectionState::Disconnected => Ok(()),
			ConnectionState::Connecting => self.connect_interval(),
			ConnectionState::Connected => {
				let dropped = self.queue_interval();
				self.ping_interval()?;
				if dropped > 0 {
					return Err(Error::QueueTimeout);
				}
				Ok(())
			}
		}
	}

	/// Reports the transport as lost. Resets the session state and fires
	/// [`EventHandler::disconnected`].
	pub fn disconnected(&mut self) {
		self.reset();
		self.handler.disconnected();
	}

	/// Resets the session state without firing any events: the connection
	/// state returns to [`ConnectionState::Disconnected`] and the keepalive
	/// and connect countdowns are disarmed. Delivery queues are kept so a
	/// session can be resumed, and cleared on the next clean connect.
	pub fn reset(&mut self) {
		self.state = ConnectionState::Disconnected;
		self.ping_countdown = 0;
		self.unanswered_pings = 0;
		self.connect_countdown = 0;
	}

	fn recv_connack(&mut self, length: usize) -> Result<(), Error> {
		match self.state {
			ConnectionState::Connecting => {}
			ConnectionState::Connected => {
				self.drain(length)?;
				return Err(Error::AlreadyConnected);
			}
			ConnectionState::Disconnected => {
				self.drain(length)?;
				return Err(Error::NotConnected);
			}
		}

		if length < 2 {
			self.drain(length)?;
			return Err(Error::PacketInvalid);
		}
		let flags = serde::get_u8(&mut self.transport)?;
		let return_code = serde::get_u8(&mut self.transport)?;
		self.drain(length - 2)?;

		// only the session-present bit may be set
		if flags & 0xfe != 0 {
			return Err(Error::PacketInvalid);
		}
		let session_present = flags & 0x01 == 0x01;

		let refusal = match return_code {
			0 => {
				self.state = ConnectionState::Connected;
				self.connect_countdown = 0;
				self.ping_countdown = self.configuration.ping_interval;
				self.unanswered_pings = 0;
				debug!(session_present, "connection accepted");

				self.handler.connected();
				if !session_present {
					self.handler.init_session();
				}
				if let Some(announcement) = self.connect_announcement.clone() {
					if let Err(err) = self.publish_message(announcement) {
						warn!(error = %err, "failed to publish connect announcement");
					}
				}
				return Ok(());
			}
			1 => Error::UnacceptableProtocol,
			2 => Error::ClientIdRejected,
			3 => Error::ServerUnavailable,
			4 => Error::BadUsernamePassword,
			5 => Error::NotAuthorized,
			// a violation, not a refusal; the attempt stays alive under
			// the connect timeout
			_ => return Err(Error::PacketInvalid),
		};

		self.state = ConnectionState::Disconnected;
		self.connect_countdown = 0;
		warn!(return_code, "connection refused");
		Err(refusal)
	}

	fn recv_publish(&mut self, header: u8, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;

		let duplicate = header & 0x08 != 0;
		let retain = header & 0x01 != 0;
		let qos = match QoS::try_from((header & 0x06) >> 1) {
			Ok(qos) => qos,
			Err(_) => {
				self.drain(length)?;
				return Err(Error::InvalidPacketFlags);
			}
		};

		let topic_text = serde::get_str(&mut self.transport)?;
		let Some(mut remaining) = length.checked_sub(2 + topic_text.len()) else {
			// the declared length did not cover the topic string; the
			// stream can no longer be trusted
			return Err(Error::PayloadInvalid);
		};

		let topic = match Topic::new(topic_text) {
			Ok(topic) => topic,
			Err(err) => {
				self.drain(remaining)?;
				warn!(error = %err, "publish with invalid topic");
				return Err(Error::VarheaderInvalid);
			}
		};

		if qos == QoS::AtMostOnce {
			let message = self.read_publish_message(topic, qos, retain, duplicate, remaining)?;
			debug!(topic = message.topic.as_str(), "publish received");
			self.deliver(&message);
			return Ok(());
		}

		let Some(after_id) = remaining.checked_sub(2) else {
			self.drain(remaining)?;
			return Err(Error::PayloadInvalid);
		};
		remaining = after_id;
		let packet_id = serde::get_u16(&mut self.transport)?;

		if qos == QoS::AtLeastOnce {
			let message = self.read_publish_message(topic, qos, retain, duplicate, remaining)?;
			debug!(
				topic = message.topic.as_str(),
				packet_id, "publish received"
			);
			self.deliver(&message);
			write_ack(&mut self.transport, PUBACK, packet_id)?;
			return Ok(());
		}

		// exactly-once: hold the message until the broker releases it
		if self.incoming_qos2.contains(packet_id) {
			self.drain(remaining)?;
			debug!(packet_id, "duplicate publish, repeating pubrec");
		} else {
			let message = self.read_publish_message(topic, qos, retain, duplicate, remaining)?;
			debug!(
				topic = message.topic.as_str(),
				packet_id, "publish received, held for release"
			);
			self.incoming_qos2
				.insert(packet_id, self.configuration.packet_timeout, Some(message))?;
		}
		write_ack(&mut self.transport, PUBREC, packet_id)
	}

	fn recv_puback(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		let packet_id = self.read_ack_id(length)?;
		if self.outgoing_publish.remove(packet_id).is_none() {
			warn!(packet_id, "puback for unknown packet id");
			return Err(Error::PacketIdNotFound(packet_id));
		}
		debug!(packet_id, "puback received");
		Ok(())
	}

	fn recv_pubrec(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		let packet_id = self.read_ack_id(length)?;
		if self.outgoing_publish.remove(packet_id).is_none() {
			warn!(packet_id, "pubrec for unknown packet id");
			return Err(Error::PacketIdNotFound(packet_id));
		}
		write_ack(&mut self.transport, PUBREL, packet_id)?;
		// the payload is done with; only the release handshake remains,
		// and the removal above left room for its entry
		self.outgoing_pubrel
			.insert(packet_id, self.configuration.packet_timeout, None)?;
		debug!(packet_id, "pubrec received, pubrel sent");
		Ok(())
	}

	fn recv_pubrel(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		let packet_id = self.read_ack_id(length)?;
		let Some(entry) = self.incoming_qos2.remove(packet_id) else {
			warn!(packet_id, "pubrel for unknown packet id");
			return Err(Error::PacketIdNotFound(packet_id));
		};
		if let Some(message) = entry.message {
			self.deliver(&message);
		}
		write_ack(&mut self.transport, PUBCOMP, packet_id)?;
		debug!(packet_id, "pubrel received, pubcomp sent");
		Ok(())
	}

	fn recv_pubcomp(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		let packet_id = self.read_ack_id(length)?;
		if self.outgoing_pubrel.remove(packet_id).is_none() {
			warn!(packet_id, "pubcomp for unknown packet id");
			return Err(Error::PacketIdNotFound(packet_id));
		}
		debug!(packet_id, "pubcomp received");
		Ok(())
	}

	fn recv_suback(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;

		// a suback must carry at least one return code
		if length < 3 {
			self.drain(length)?;
			return Err(Error::PayloadInvalid);
		}
		let packet_id = serde::get_u16(&mut self.transport)?;
		let codes = serde::get_slice(&mut self.transport, length - 2)?;

		let mut results = Vec::with_capacity(codes.len());
		for code in codes {
			results.push(match code {
				0 => Ok(QoS::AtMostOnce),
				1 => Ok(QoS::AtLeastOnce),
				2 => Ok(QoS::ExactlyOnce),
				0x80 => Err(SubscribeFailed),
				_ => {
					warn!(packet_id, code, "invalid suback return code");
					return Err(Error::InvalidReturnCodes);
				}
			});
		}

		debug!(packet_id, count = results.len(), "suback received");
		self.subscriptions.resolve_suback(packet_id, &results);
		for result in results {
			self.handler.subscribed(packet_id, result);
		}
		Ok(())
	}

	fn recv_unsuback(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		let packet_id = self.read_ack_id(length)?;
		let removed = self.subscriptions.resolve_unsuback(packet_id);
		debug!(packet_id, removed, "unsuback received");
		self.handler.unsubscribed(packet_id);
		Ok(())
	}

	fn recv_pingresp(&mut self, length: usize) -> Result<(), Error> {
		self.ensure_connected(length)?;
		self.drain(length)?;
		debug!("pingresp received");
		Ok(())
	}

	/// Reads the payload portion of an inbound PUBLISH into a [`Message`].
	fn read_publish_message(
		&mut self,
		topic: Topic,
		qos: QoS,
		retain: bool,
		duplicate: bool,
		payload_len: usize,
	) -> Result<Message, Error> {
		let payload = serde::get_slice(&mut self.transport, payload_len)?;
		let mut message = Message::with_payload(topic, payload, qos, retain);
		message.duplicate = duplicate;
		Ok(message)
	}

	/// Offers `message` to the subscription handlers, falling back to the
	/// catch-all event.
	fn deliver(&mut self, message: &Message) {
		if self.subscriptions.dispatch(message) {
			return;
		}
		self.handler.receive_message(message);
	}

	fn ensure_connected(&mut self, length: usize) -> Result<(), Error> {
		if self.state != ConnectionState::Connected {
			self.drain(length)?;
			return Err(Error::NotConnected);
		}
		Ok(())
	}

	/// Reads the packet id of a two-byte acknowledgement, tolerating and
	/// discarding any unexpected extra bytes.
	fn read_ack_id(&mut self, length: usize) -> Result<u16, Error> {
		if length < 2 {
			self.drain(length)?;
			return Err(Error::PayloadInvalid);
		}
		let packet_id = serde::get_u16(&mut self.transport)?;
		self.drain(length - 2)?;
		Ok(packet_id)
	}

	fn drain(&mut self, length: usize) -> Result<(), Error> {
		for _ in 0..length {
			serde::get_u8(&mut self.transport)?;
		}
		Ok(())
	}

	fn connect_interval(&mut self) -> Result<(), Error> {
		self.connect_countdown = self.connect_countdown.saturating_sub(1);
		if self.connect_countdown > 0 {
			return Ok(());
		}
		self.state = ConnectionState::Disconnected;
		error!("no connack received, abandoning connection attempt");
		Err(Error::ConnectTimeout)
	}

	/// Ages all three delivery queues by one tick, retransmitting overdue
	/// packets. Returns the number of entries dropped for exhausting their
	/// retries.
	fn queue_interval(&mut self) -> usize {
		let timeout = self.configuration.packet_timeout;
		let max_retries = self.configuration.max_retries;
		let transport = &mut self.transport;
		let mut dropped = 0;

		dropped += self.outgoing_publish.sweep(timeout, max_retries, |entry| {
			let Some(message) = entry.message.as_mut() else {
				return;
			};
			message.duplicate = true;
			warn!(packet_id = entry.packet_id, "publish unacknowledged, retransmitting");
			if write_publish(&mut *transport, message, Some(entry.packet_id)).is_err() {
				warn!(packet_id = entry.packet_id, "publish retransmission failed");
			}
		});

		dropped += self.incoming_qos2.sweep(timeout, max_retries, |entry| {
			warn!(packet_id = entry.packet_id, "pubrel overdue, repeating pubrec");
			if write_ack(&mut *transport, PUBREC, entry.packet_id).is_err() {
				warn!(packet_id = entry.packet_id, "pubrec retransmission failed");
			}
		});

		dropped += self.outgoing_pubrel.sweep(timeout, max_retries, |entry| {
			warn!(packet_id = entry.packet_id, "pubcomp overdue, repeating pubrel");
			if write_ack(&mut *transport, PUBREL, entry.packet_id).is_err() {
				warn!(packet_id = entry.packet_id, "pubrel retransmission failed");
			}
		});

		dropped
	}

	/// Advances the keepalive cycle: sends a PINGREQ once the countdown
	/// expires and reports a dead connection after two unanswered pings.
	fn ping_interval(&mut self) -> Result<(), Error> {
		if self.ping_countdown == 0 {
			return Ok(());
		}
		self.ping_countdown -= 1;
		if self.ping_countdown > 1 {
			return Ok(());
		}

		if self.unanswered_pings >= 2 {
			self.ping_countdown = 0;
			self.unanswered_pings = 0;
			error!("no response to ping");
			return Err(Error::NoPingResponse);
		}

		if self.unanswered_pings > 0 {
			warn!(unanswered = self.unanswered_pings, "ping unanswered, retrying");
		}
		write_pingreq(&mut self.transport)?;
		self.ping_countdown = if self.unanswered_pings == 0 {
			self.configuration.ping_interval
		} else {
			self.configuration.ping_retry_interval
		};
		self.unanswered_pings += 1;
		debug!(unanswered = self.unanswered_pings, "pingreq sent");
		Ok(())
	}
}

fn write_connect(transport: &mut impl Transport, options: &ConnectOptions<'_>) -> Result<(), Error> {
	let mut flags = 0u8;
	if options.clean_session {
		flags |= 0x02;
	}
	if let Some(will) = &options.will {
		if will.payload.len() > u16::MAX as usize {
			return Err(Error::PacketInvalid);
		}
		flags |= 0x04;
		flags |= (will.qos as u8) << 3;
		if will.retain {
			flags |= 0x20;
		}
	}
	if let Some(credentials) = &options.credentials {
		flags |= 0x80;
		if credentials.password.is_some() {
			flags |= 0x40;
		}
	}

	// protocol name, level, flags and keep alive
	let mut length = 10 + 2 + options.client_id.len();
	if let Some(will) = &options.will {
		length += 2 + will.topic.len() + 2 + will.payload.len();
	}
	if let Some(credentials) = &options.credentials {
		length += 2 + credentials.username.len();
		if let Some(password) = credentials.password {
			length += 2 + password.len();
		}
	}

	serde::put_u8(transport, PacketType::Connect as u8)?;
	serde::put_var(transport, length)?;
	serde::put_str(transport, "MQTT")?;
	serde::put_u8(transport, 4)?;
	serde::put_u8(transport, flags)?;
	serde::put_u16(transport, options.keep_alive)?;
	serde::put_str(transport, options.client_id)?;
	if let Some(will) = &options.will {
		serde::put_str(transport, will.topic.as_str())?;
		serde::put_u16(transport, will.payload.len() as u16)?;
		serde::put_slice(transport, will.payload)?;
	}
	if let Some(credentials) = &options.credentials {
		serde::put_str(transport, credentials.username)?;
		if let Some(password) = credentials.password {
			serde::put_str(transport, password)?;
		}
	}
	transport.flush();
	Ok(())
}

fn write_publish(
	transport: &mut impl Transport,
	message: &Message,
	packet_id: Option<u16>,
) -> Result<(), Error> {
	let mut header = PacketType::Publish as u8 | (message.qos as u8) << 1;
	if message.duplicate {
		header |= 0x08;
	}
	if message.retain {
		header |= 0x01;
	}

	let mut length = 2 + message.topic.len() + message.len();
	if packet_id.is_some() {
		length += 2;
	}

	serde::put_u8(transport, header)?;
	serde::put_var(transport, length)?;
	serde::put_str(transport, message.topic.as_str())?;
	if let Some(packet_id) = packet_id {
		serde::put_u16(transport, packet_id)?;
	}
	serde::put_slice(transport, message.payload())?;
	transport.flush();
	Ok(())
}

fn write_subscribe(
	transport: &mut impl Transport,
	packet_id: u16,
	filters: &[(&Filter, QoS)],
) -> Result<(), Error> {
	let length = 2 + filters
		.iter()
		.map(|(filter, _)| 2 + filter.len() + 1)
		.sum::<usize>();

	serde::put_u8(transport, PacketType::Subscribe as u8 | 0x02)?;
	serde::put_var(transport, length)?;
	serde::put_u16(transport, packet_id)?;
	for (filter, qos) in filters {
		serde::put_str(transport, filter.as_str())?;
		serde::put_u8(transport, *qos as u8)?;
	}
	transport.flush();
	Ok(())
}

fn write_unsubscribe(
	transport: &mut impl Transport,
	packet_id: u16,
	filter: &Filter,
) -> Result<(), Error> {
	let length = 2 + 2 + filter.len();
	serde::put_u8(transport, PacketType::Unsubscribe as u8 | 0x02)?;
	serde::put_var(transport, length)?;
	serde::put_u16(transport, packet_id)?;
	serde::put_str(transport, filter.as_str())?;
	transport.flush();
	Ok(())
}

fn write_ack(transport: &mut impl Transport, header: u8, packet_id: u16) -> Result<(), Error> {
	serde::put_u8(transport, header)?;
	serde::put_var(transport, 2)?;
	serde::put_u16(transport, packet_id)?;
	transport.flush();
	Ok(())
}

fn write_pingreq(transport: &mut impl Transport) -> Result<(), Error> {
	serde::put_u8(transport, PacketType::PingReq as u8)?;
	serde::put_var(transport, 0)?;
	transport.flush();
	Ok(())
}

fn write_disconnect(transport: &mut impl Transport) -> Result<(), Error> {
	serde::put_u8(transport, PacketType::Disconnect as u8)?;
	serde::put_var(transport, 0)?;
	transport.flush();
	Ok(())
}
