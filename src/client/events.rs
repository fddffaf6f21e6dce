use super::subscriptions::SubscribeFailed;
use crate::{message::Message, qos::QoS};

/// Session events raised by the engine.
///
/// All methods default to doing nothing, so an implementation only needs to
/// override the events it cares about. Handlers run synchronously inside
/// [`Client::data_available`], before the call that raised them returns.
///
/// [`Client::data_available`]: crate::Client::data_available
pub trait EventHandler {
	/// The broker accepted the connection.
	fn connected(&mut self) {}

	/// The embedding reported the transport as lost via
	/// [`Client::disconnected`].
	///
	/// [`Client::disconnected`]: crate::Client::disconnected
	fn disconnected(&mut self) {}

	/// The broker holds no previous session state for this client.
	/// Subscriptions must be established from scratch, typically with
	/// [`Client::subscribe`] or [`Client::resubscribe`].
	///
	/// [`Client::subscribe`]: crate::Client::subscribe
	/// [`Client::resubscribe`]: crate::Client::resubscribe
	fn init_session(&mut self) {}

	/// One filter of the SUBSCRIBE identified by `packet_id` was
	/// acknowledged. `result` carries the granted quality of service, or
	/// [`SubscribeFailed`] if the broker refused the filter.
	fn subscribed(&mut self, packet_id: u16, result: Result<QoS, SubscribeFailed>) {
		let _ = (packet_id, result);
	}

	/// The UNSUBSCRIBE identified by `packet_id` was acknowledged.
	fn unsubscribed(&mut self, packet_id: u16) {
		let _ = packet_id;
	}

	/// An application message arrived and no subscription handler consumed
	/// it.
	fn receive_message(&mut self, message: &Message) {
		let _ = message;
	}
}

/// A unit handler for clients that only publish.
impl EventHandler for () {}
