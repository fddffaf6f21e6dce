//! Primitive wire encoding for MQTT 3.1.1.
//!
//! All multi-byte integers are big-endian. Strings are UTF-8, prefixed with
//! a two-byte length. The remaining-length field of the fixed header uses a
//! variable-length encoding of up to four bytes, seven bits per byte with
//! the high bit as a continuation flag.

use crate::{error::Error, transport::Transport};

/// Largest value representable by the remaining-length encoding.
pub const REMAINING_LENGTH_MAX: usize = 268_435_455;

pub fn get_u8(src: &mut impl Transport) -> Result<u8, Error> {
	src.read_byte().ok_or(Error::InsufficientData)
}

pub fn get_u16(src: &mut impl Transport) -> Result<u16, Error> {
	let high = get_u8(src)?;
	let low = get_u8(src)?;
	Ok(u16::from_be_bytes([high, low]))
}

pub fn get_slice(src: &mut impl Transport, len: usize) -> Result<Vec<u8>, Error> {
	let mut bytes = Vec::with_capacity(len);
	for _ in 0..len {
		bytes.push(get_u8(src)?);
	}
	Ok(bytes)
}

pub fn get_str(src: &mut impl Transport) -> Result<String, Error> {
	let len = get_u16(src)? as usize;
	let bytes = get_slice(src, len)?;
	String::from_utf8(bytes).map_err(|err| Error::Utf8(err.utf8_error()))
}

/// Decodes a variable-length remaining-length field.
pub fn get_var(src: &mut impl Transport) -> Result<usize, Error> {
	let mut value = 0;
	let mut multiplier = 1;
	loop {
		let encoded = get_u8(src)? as usize;
		value += (encoded & 0x7f) * multiplier;
		if encoded & 0x80 == 0 {
			break Ok(value);
		}
		multiplier *= 0x80;
		if multiplier > 0x80 * 0x80 * 0x80 {
			break Err(Error::RemainingLengthEncoding);
		}
	}
}

pub fn put_u8(dst: &mut impl Transport, value: u8) -> Result<(), Error> {
	if dst.write_byte(value) {
		Ok(())
	} else {
		Err(Error::WriteFailure)
	}
}

pub fn put_u16(dst: &mut impl Transport, value: u16) -> Result<(), Error> {
	let [high, low] = value.to_be_bytes();
	put_u8(dst, high)?;
	put_u8(dst, low)
}

pub fn put_slice(dst: &mut impl Transport, slice: &[u8]) -> Result<(), Error> {
	for &byte in slice {
		put_u8(dst, byte)?;
	}
	Ok(())
}

pub fn put_str(dst: &mut impl Transport, value: &str) -> Result<(), Error> {
	if value.len() > u16::MAX as usize {
		return Err(Error::PacketInvalid);
	}
	put_u16(dst, value.len() as u16)?;
	put_slice(dst, value.as_bytes())
}

/// Encodes a variable-length remaining-length field.
pub fn put_var(dst: &mut impl Transport, mut value: usize) -> Result<(), Error> {
	if value > REMAINING_LENGTH_MAX {
		return Err(Error::RemainingLengthEncoding);
	}
	loop {
		let mut encoded = value % 0x80;
		value /= 0x80;
		if value > 0 {
			encoded |= 0x80;
		}
		put_u8(dst, encoded as u8)?;
		if value == 0 {
			break Ok(());
		}
	}
}
