use crate::{qos::QoS, topic::Topic};

/// Engine timing and queueing limits.
///
/// All intervals count ticks of [`Client::interval_timer`], which the
/// embedding is expected to call once per second.
///
/// [`Client::interval_timer`]: crate::Client::interval_timer
#[derive(Clone, Debug)]
pub struct Configuration {
	/// Idle time in seconds before a PINGREQ is sent.
	///
	/// Must be comfortably below the `keep_alive` interval requested at
	/// connect time, or the broker will drop the session before the ping
	/// cycle completes. Defaults to 30 seconds.
	pub ping_interval: u8,

	/// Wait in seconds for a PINGRESP before the ping is repeated.
	///
	/// Defaults to 6 seconds.
	pub ping_retry_interval: u8,

	/// Wait in seconds for the broker's CONNACK before the connection
	/// attempt is abandoned.
	///
	/// Defaults to 10 seconds.
	pub connect_timeout: u8,

	/// Wait in seconds before an unacknowledged packet is retransmitted.
	///
	/// Defaults to 3 seconds.
	pub packet_timeout: u8,

	/// Number of retransmissions before an unacknowledged packet is
	/// dropped and reported as timed out.
	///
	/// Defaults to 2.
	pub max_retries: u8,

	/// Number of packets each delivery queue can hold. Bounds the
	/// in-flight window for each direction of QoS 1 and 2 traffic.
	///
	/// Defaults to 8.
	pub queue_capacity: usize,
}

impl Default for Configuration {
	fn default() -> Self {
		Self {
			ping_interval: 30,
			ping_retry_interval: 6,
			connect_timeout: 10,
			packet_timeout: 3,
			max_retries: 2,
			queue_capacity: 8,
		}
	}
}

/// Session parameters for a single [`Client::connect`] call.
///
/// [`Client::connect`]: crate::Client::connect
#[derive(Clone, Debug)]
pub struct ConnectOptions<'a> {
	pub client_id: &'a str,

	/// Username and optional password for authentication.
	pub credentials: Option<Credentials<'a>>,

	/// Keep alive timeout in seconds.
	///
	/// Defaults to 60 seconds.
	pub keep_alive: u16,

	/// Whether the broker should discard any previous session state.
	///
	/// Defaults to `true`.
	pub clean_session: bool,

	/// Will message the broker publishes if the connection drops without
	/// a DISCONNECT packet.
	pub will: Option<Will<'a>>,
}

impl<'a> Default for ConnectOptions<'a> {
	fn default() -> Self {
		Self {
			client_id: "",
			credentials: None,
			keep_alive: 60,
			clean_session: true,
			will: None,
		}
	}
}

/// Username and optional password for authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
	pub username: &'a str,
	pub password: Option<&'a str>,
}

impl<'a> From<&'a str> for Credentials<'a> {
	fn from(username: &'a str) -> Self {
		Self {
			username,
			password: None,
		}
	}
}

impl<'a> From<(&'a str, &'a str)> for Credentials<'a> {
	fn from((username, password): (&'a str, &'a str)) -> Self {
		Self {
			username,
			password: Some(password),
		}
	}
}

/// A will message, registered with the broker at connect time.
#[derive(Clone, Debug)]
pub struct Will<'a> {
	/// The topic to publish the will message to.
	pub topic: &'a Topic,

	/// The message to publish as the will.
	pub payload: &'a [u8],

	/// The quality of service to publish the will message at.
	pub qos: QoS,

	/// Whether or not the will message should be retained.
	pub retain: bool,
}
