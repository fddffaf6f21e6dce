//! Minimal subscriber over a non-blocking TCP stream.
//!
//! Connects to a broker, subscribes to a filter and prints every message
//! until interrupted. Demonstrates the polling loop an embedding is
//! expected to run: `data_available` whenever bytes are pending, and
//! `interval_timer` once a second.

use clap::Parser;
use std::{
	io::{ErrorKind, Read, Write},
	net::TcpStream,
	str::from_utf8,
	thread,
	time::{Duration, Instant},
};
use tickmqtt::{Client, ConnectOptions, Error, EventHandler, Message, QoS, Transport};
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[derive(Parser)]
struct Arguments {
	/// Address of the broker to connect to
	#[arg(default_value = "localhost:1883", env = "TICKMQTT_BROKER")]
	address: String,

	/// Filter to subscribe to
	#[arg(default_value = "#")]
	filter: String,

	/// Client identifier
	#[arg(long, default_value = "tickmqtt-demo")]
	id: String,
}

/// [`Transport`] over a non-blocking [`TcpStream`].
///
/// Reads and writes poll the socket for up to 100ms before giving up, so
/// a stalled broker surfaces as a protocol error rather than a hang.
struct TcpTransport {
	stream: TcpStream,
}

impl TcpTransport {
	fn connect(address: &str) -> std::io::Result<Self> {
		let stream = TcpStream::connect(address)?;
		stream.set_nodelay(true)?;
		stream.set_nonblocking(true)?;
		Ok(Self { stream })
	}
}

impl Transport for TcpTransport {
	fn bytes_available(&self) -> bool {
		self.stream.peek(&mut [0u8]).map_or(false, |n| n > 0)
	}

	fn read_byte(&mut self) -> Option<u8> {
		let deadline = Instant::now() + Duration::from_millis(100);
		let mut byte = [0u8];
		loop {
			match self.stream.read(&mut byte) {
				Ok(1) => return Some(byte[0]),
				Ok(_) => return None,
				Err(err) if err.kind() == ErrorKind::WouldBlock => {
					if Instant::now() >= deadline {
						return None;
					}
					thread::sleep(Duration::from_millis(1));
				}
				Err(_) => return None,
			}
		}
	}

	fn write_byte(&mut self, byte: u8) -> bool {
		let deadline = Instant::now() + Duration::from_millis(100);
		loop {
			match self.stream.write(&[byte]) {
				Ok(1) => return true,
				Ok(_) => return false,
				Err(err) if err.kind() == ErrorKind::WouldBlock => {
					if Instant::now() >= deadline {
						return false;
					}
					thread::sleep(Duration::from_millis(1));
				}
				Err(_) => return false,
			}
		}
	}

	fn flush(&mut self) {
		let _ = self.stream.flush();
	}
}

struct Printer;

impl EventHandler for Printer {
	fn connected(&mut self) {
		println!("connected");
	}

	fn disconnected(&mut self) {
		println!("connection lost");
	}

	fn receive_message(&mut self, message: &Message) {
		println!(
			"{}: {}",
			message.topic,
			from_utf8(message.payload()).unwrap_or_default()
		);
	}
}

fn main() -> anyhow::Result<()> {
	setup_tracing()?;
	let arguments = Arguments::parse();

	let transport = TcpTransport::connect(&arguments.address)?;
	let mut client = Client::new(transport, Printer);
	client.connect(ConnectOptions {
		client_id: &arguments.id,
		..Default::default()
	})?;

	let mut next_tick = Instant::now() + Duration::from_secs(1);
	let mut subscribed = false;
	loop {
		while client.transport().bytes_available() {
			if let Err(err) = client.data_available() {
				eprintln!("packet error: {err}");
			}
		}

		if client.is_connected() && !subscribed {
			client.subscribe(&arguments.filter, QoS::AtLeastOnce)?;
			subscribed = true;
		}

		if Instant::now() >= next_tick {
			next_tick += Duration::from_secs(1);
			match client.interval_timer() {
				Ok(()) => {}
				Err(err @ (Error::ConnectTimeout | Error::NoPingResponse)) => {
					client.disconnected();
					return Err(err.into());
				}
				Err(err) => eprintln!("timer error: {err}"),
			}
		}

		thread::sleep(Duration::from_millis(5));
	}
}

fn setup_tracing() -> Result<(), SetGlobalDefaultError> {
	let filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::ERROR.into())
		.with_env_var("TICKMQTT_LOG")
		.try_from_env();

	let subscriber = tracing_subscriber::fmt()
		.with_file(true)
		.with_target(false)
		.with_env_filter(filter.unwrap_or_default())
		.finish();

	tracing::subscriber::set_global_default(subscriber)
}
