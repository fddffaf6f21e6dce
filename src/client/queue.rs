use crate::{error::Error, message::Message};
use tracing::warn;

/// One in-flight packet awaiting acknowledgement.
#[derive(Debug)]
pub(crate) struct QueueEntry {
	pub packet_id: u16,
	/// Ticks left until the packet is retransmitted.
	pub timeout: u8,
	/// Retransmissions performed so far.
	pub retries: u8,
	/// The tracked message. `None` for flows where only the packet id must
	/// survive, such as an outbound PUBREL.
	pub message: Option<Message>,
}

/// A bounded, insertion-ordered set of in-flight packets.
///
/// The engine keeps one queue per unacknowledged flow: outbound QoS 1 and 2
/// publishes, inbound QoS 2 publishes held for a PUBREL, and outbound
/// PUBRELs held for a PUBCOMP. Entries age out of the queue via
/// [`DeliveryQueue::sweep`], once per tick while a connection is up.
#[derive(Debug)]
pub(crate) struct DeliveryQueue {
	entries: Vec<QueueEntry>,
	capacity: usize,
}

impl DeliveryQueue {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
			capacity,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[inline]
	pub fn is_full(&self) -> bool {
		self.entries.len() >= self.capacity
	}

	pub fn contains(&self, packet_id: u16) -> bool {
		self.entries.iter().any(|entry| entry.packet_id == packet_id)
	}

	/// Tracks a new in-flight packet with a fresh retry budget.
	pub fn insert(
		&mut self,
		packet_id: u16,
		timeout: u8,
		message: Option<Message>,
	) -> Result<(), Error> {
		if self.is_full() {
			return Err(Error::QueueFull);
		}
		self.entries.push(QueueEntry {
			packet_id,
			timeout,
			retries: 0,
			message,
		});
		Ok(())
	}

	/// Removes and returns the entry for `packet_id`, if tracked.
	pub fn remove(&mut self, packet_id: u16) -> Option<QueueEntry> {
		let index = self
			.entries
			.iter()
			.position(|entry| entry.packet_id == packet_id)?;
		Some(self.entries.remove(index))
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Grants every entry a fresh timeout and retry budget. Used when a
	/// session is resumed and in-flight packets are about to be redelivered
	/// on a new connection.
	pub fn restore(&mut self, timeout: u8) {
		for entry in &mut self.entries {
			entry.timeout = timeout;
			entry.retries = 0;
		}
	}

	/// Ages every entry by one tick.
	///
	/// An entry whose timeout reaches zero is either retransmitted via
	/// `resend` with a fresh timeout, or dropped once it has exhausted
	/// `max_retries`. Returns the number of entries dropped.
	pub fn sweep<F>(&mut self, timeout: u8, max_retries: u8, mut resend: F) -> usize
	where
		F: FnMut(&mut QueueEntry),
	{
		let mut dropped = 0;
		self.entries.retain_mut(|entry| {
			entry.timeout = entry.timeout.saturating_sub(1);
			if entry.timeout > 0 {
				return true;
			}

			entry.retries += 1;
			if entry.retries >= max_retries {
				warn!(
					packet_id = entry.packet_id,
					retries = entry.retries,
					"unacknowledged packet dropped"
				);
				dropped += 1;
				return false;
			}

			entry.timeout = timeout;
			resend(entry);
			true
		});
		dropped
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn queue_ids(queue: &DeliveryQueue) -> Vec<u16> {
		queue.entries.iter().map(|entry| entry.packet_id).collect()
	}

	#[test]
	fn insert_remove_contains() {
		let mut queue = DeliveryQueue::new(4);
		queue.insert(256, 3, None).unwrap();
		queue.insert(257, 3, None).unwrap();

		assert!(queue.contains(256));
		assert!(!queue.contains(300));
		assert_eq!(queue.len(), 2);

		let entry = queue.remove(256).unwrap();
		assert_eq!(entry.packet_id, 256);
		assert!(queue.remove(256).is_none());
		assert_eq!(queue_ids(&queue), vec![257]);
	}

	#[test]
	fn rejects_inserts_when_full() {
		let mut queue = DeliveryQueue::new(2);
		queue.insert(1, 3, None).unwrap();
		queue.insert(2, 3, None).unwrap();
		assert_eq!(queue.insert(3, 3, None), Err(Error::QueueFull));
		assert_eq!(queue.len(), 2);
	}

	#[test]
	fn sweep_retransmits_after_timeout() {
		let mut queue = DeliveryQueue::new(4);
		queue.insert(256, 3, None).unwrap();

		let mut resent = Vec::new();
		for _ in 0..2 {
			let dropped = queue.sweep(3, 2, |entry| resent.push(entry.packet_id));
			assert_eq!(dropped, 0);
			assert!(resent.is_empty());
		}

		// third tick expires the entry and triggers the first retransmission
		let dropped = queue.sweep(3, 2, |entry| resent.push(entry.packet_id));
		assert_eq!(dropped, 0);
		assert_eq!(resent, vec![256]);
		assert!(queue.contains(256));
	}

	#[test]
	fn sweep_drops_after_retry_budget() {
		let mut queue = DeliveryQueue::new(4);
		queue.insert(256, 3, None).unwrap();

		let mut total_dropped = 0;
		let mut ticks = 0;
		while total_dropped == 0 {
			ticks += 1;
			total_dropped += queue.sweep(3, 2, |_| {});
			assert!(ticks <= 6, "entry should have been dropped by tick 6");
		}

		assert_eq!(ticks, 6);
		assert!(queue.is_empty());
	}

	#[test]
	fn restore_refreshes_budgets() {
		let mut queue = DeliveryQueue::new(4);
		queue.insert(256, 3, None).unwrap();

		// age the entry into its second retry window
		for _ in 0..4 {
			queue.sweep(3, 5, |_| {});
		}
		assert_eq!(queue.entries[0].retries, 1);

		queue.restore(3);
		assert_eq!(queue.entries[0].timeout, 3);
		assert_eq!(queue.entries[0].retries, 0);
	}
}
