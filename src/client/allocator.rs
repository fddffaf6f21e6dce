/// Issues packet identifiers from two disjoint ranges.
///
/// Identifiers for PUBLISH packets come from `[256, 65535]` and identifiers
/// for SUBSCRIBE and UNSUBSCRIBE from `[1, 255]`, each wrapping within its
/// own range. Zero is never issued. Keeping the ranges disjoint means a
/// stray acknowledgement can never resolve against the wrong kind of
/// in-flight packet.
#[derive(Debug)]
pub(crate) struct PacketIdAllocator {
	publish: u16,
	control: u16,
}

const PUBLISH_ID_MIN: u16 = 256;
const CONTROL_ID_MAX: u16 = 255;

impl PacketIdAllocator {
	pub fn new() -> Self {
		Self {
			publish: PUBLISH_ID_MIN,
			control: 1,
		}
	}

	pub fn next_publish_id(&mut self) -> u16 {
		let id = self.publish;
		self.publish = if id == u16::MAX {
			PUBLISH_ID_MIN
		} else {
			id + 1
		};
		id
	}

	pub fn next_control_id(&mut self) -> u16 {
		let id = self.control;
		self.control = if id == CONTROL_ID_MAX { 1 } else { id + 1 };
		id
	}
}
