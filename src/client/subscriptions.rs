use crate::{filter::Filter, message::Message, qos::QoS};

/// Marker for a SUBSCRIBE filter the broker refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeFailed;

/// Handler invoked for inbound messages matching one subscription.
///
/// Returning `true` marks the message as consumed; no further handlers run
/// and the catch-all [`EventHandler::receive_message`] is skipped.
///
/// [`EventHandler::receive_message`]: crate::EventHandler::receive_message
pub type MessageHandler = fn(&Subscription, &Message) -> bool;

/// A topic filter registered with [`Client::subscribe`].
///
/// [`Client::subscribe`]: crate::Client::subscribe
#[derive(Debug)]
pub struct Subscription {
	filter: Filter,
	qos: QoS,
	handler: Option<MessageHandler>,
	pending: Option<Pending>,
}

/// Packet id of the SUBSCRIBE or UNSUBSCRIBE awaiting acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
	Subscribe(u16),
	Unsubscribe(u16),
}

impl Subscription {
	#[inline]
	pub fn filter(&self) -> &Filter {
		&self.filter
	}

	/// The granted quality of service, once the SUBACK has arrived. Before
	/// that, the requested quality of service.
	#[inline]
	pub fn qos(&self) -> QoS {
		self.qos
	}
}

/// Insertion-ordered subscription registry, deduplicated by structural
/// filter equality.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionList {
	subscriptions: Vec<Subscription>,
}

impl SubscriptionList {
	#[inline]
	pub fn len(&self) -> usize {
		self.subscriptions.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.subscriptions.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
		self.subscriptions.iter()
	}

	/// Registers a subscription awaiting its SUBACK. A subscription with an
	/// equal filter is replaced rather than duplicated.
	pub fn upsert(
		&mut self,
		filter: Filter,
		qos: QoS,
		handler: Option<MessageHandler>,
		packet_id: u16,
	) {
		let subscription = Subscription {
			filter,
			qos,
			handler,
			pending: Some(Pending::Subscribe(packet_id)),
		};
		match self
			.subscriptions
			.iter_mut()
			.find(|existing| existing.filter == subscription.filter)
		{
			Some(existing) => *existing = subscription,
			None => self.subscriptions.push(subscription),
		}
	}

	/// Records the packet id of an in-flight UNSUBSCRIBE for `filter`.
	pub fn mark_unsubscribe(&mut self, filter: &Filter, packet_id: u16) -> bool {
		match self
			.subscriptions
			.iter_mut()
			.find(|subscription| subscription.filter == *filter)
		{
			Some(subscription) => {
				subscription.pending = Some(Pending::Unsubscribe(packet_id));
				true
			}
			None => false,
		}
	}

	/// Marks every registered subscription as awaiting the SUBACK for
	/// `packet_id`. Used when all filters are re-sent in one SUBSCRIBE on a
	/// fresh session.
	pub fn mark_all_pending(&mut self, packet_id: u16) {
		for subscription in &mut self.subscriptions {
			subscription.pending = Some(Pending::Subscribe(packet_id));
		}
	}

	/// Applies SUBACK results to the subscriptions awaiting `packet_id`, in
	/// registration order. Granted subscriptions adopt the granted quality
	/// of service; refused ones are removed.
	pub fn resolve_suback(&mut self, packet_id: u16, results: &[Result<QoS, SubscribeFailed>]) {
		let mut results = results.iter();
		self.subscriptions.retain_mut(|subscription| {
			if subscription.pending != Some(Pending::Subscribe(packet_id)) {
				return true;
			}
			let Some(result) = results.next() else {
				return true;
			};
			match result {
				Ok(granted) => {
					subscription.qos = *granted;
					subscription.pending = None;
					true
				}
				Err(SubscribeFailed) => false,
			}
		});
	}

	/// Removes the subscriptions whose UNSUBSCRIBE was acknowledged by
	/// `packet_id`. Returns how many were removed.
	pub fn resolve_unsuback(&mut self, packet_id: u16) -> usize {
		let before = self.subscriptions.len();
		self.subscriptions
			.retain(|subscription| subscription.pending != Some(Pending::Unsubscribe(packet_id)));
		before - self.subscriptions.len()
	}

	/// Offers `message` to the handlers of matching subscriptions, in
	/// registration order. Returns `true` once a handler consumes it.
	pub fn dispatch(&self, message: &Message) -> bool {
		for subscription in &self.subscriptions {
			let Some(handler) = subscription.handler else {
				continue;
			};
			if subscription.filter.matches(&message.topic) && handler(subscription, message) {
				return true;
			}
		}
		false
	}
}
