/// MQTT 3.1.1 control packet types, as the high nibble of the fixed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
	Connect = 0x10,
	ConnAck = 0x20,
	Publish = 0x30,
	PubAck = 0x40,
	PubRec = 0x50,
	PubRel = 0x60,
	PubComp = 0x70,
	Subscribe = 0x80,
	SubAck = 0x90,
	Unsubscribe = 0xa0,
	UnsubAck = 0xb0,
	PingReq = 0xc0,
	PingResp = 0xd0,
	Disconnect = 0xe0,
}

impl PacketType {
	/// Extracts the packet type from a fixed header byte. The reserved
	/// type values `0x00` and `0xf0` have no packet type.
	pub fn from_header(header: u8) -> Option<Self> {
		match header & 0xf0 {
			0x10 => Some(Self::Connect),
			0x20 => Some(Self::ConnAck),
			0x30 => Some(Self::Publish),
			0x40 => Some(Self::PubAck),
			0x50 => Some(Self::PubRec),
			0x60 => Some(Self::PubRel),
			0x70 => Some(Self::PubComp),
			0x80 => Some(Self::Subscribe),
			0x90 => Some(Self::SubAck),
			0xa0 => Some(Self::Unsubscribe),
			0xb0 => Some(Self::UnsubAck),
			0xc0 => Some(Self::PingReq),
			0xd0 => Some(Self::PingResp),
			0xe0 => Some(Self::Disconnect),
			_ => None,
		}
	}
}
