use crate::{filter::InvalidFilter, topic::InvalidTopic};
use core::str::Utf8Error;

/// Errors reported by the protocol engine.
///
/// Framing errors generally mean the inbound stream can no longer be
/// trusted and the transport should be torn down. Flow errors such as
/// [`Error::PacketIdNotFound`] are recoverable and usually indicate a
/// duplicate acknowledgement from the broker.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("insufficient data available from transport")]
	InsufficientData,
	#[error("remaining length encoding exceeds four bytes")]
	RemainingLengthEncoding,
	#[error("transport rejected write")]
	WriteFailure,
	#[error("malformed packet")]
	PacketInvalid,
	#[error("malformed variable header")]
	VarheaderInvalid,
	#[error("malformed payload")]
	PayloadInvalid,
	#[error("invalid fixed header flags")]
	InvalidPacketFlags,
	#[error("invalid return code in suback payload")]
	InvalidReturnCodes,
	#[error("unhandled packet type (header {0:#04x})")]
	UnhandledPacketType(u8),
	#[error("invalid utf-8 in string field")]
	Utf8(#[from] Utf8Error),
	#[error("not connected")]
	NotConnected,
	#[error("already connected")]
	AlreadyConnected,
	#[error("timed out waiting for connack")]
	ConnectTimeout,
	#[error("no entry found for packet id {0}")]
	PacketIdNotFound(u16),
	#[error("delivery queue is full")]
	QueueFull,
	#[error("delivery queue entry timed out")]
	QueueTimeout,
	#[error("no response to ping")]
	NoPingResponse,
	#[error("connection refused: unacceptable protocol version")]
	UnacceptableProtocol,
	#[error("connection refused: client identifier rejected")]
	ClientIdRejected,
	#[error("connection refused: server unavailable")]
	ServerUnavailable,
	#[error("connection refused: bad username or password")]
	BadUsernamePassword,
	#[error("connection refused: not authorized")]
	NotAuthorized,
	#[error("invalid topic: {0}")]
	Topic(#[from] InvalidTopic),
	#[error("invalid filter: {0}")]
	Filter(#[from] InvalidFilter),
}
