/// Quality of service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum QoS {
	#[default]
	AtMostOnce = 0,
	AtLeastOnce = 1,
	ExactlyOnce = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidQoS;

impl TryFrom<u8> for QoS {
	type Error = InvalidQoS;

	#[inline]
	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::AtMostOnce),
			1 => Ok(Self::AtLeastOnce),
			2 => Ok(Self::ExactlyOnce),
			_ => Err(InvalidQoS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_u8() {
		assert_eq!(QoS::try_from(0), Ok(QoS::AtMostOnce));
		assert_eq!(QoS::try_from(1), Ok(QoS::AtLeastOnce));
		assert_eq!(QoS::try_from(2), Ok(QoS::ExactlyOnce));
		assert_eq!(QoS::try_from(3), Err(InvalidQoS));
	}

	#[test]
	fn ordering() {
		assert!(QoS::AtMostOnce < QoS::AtLeastOnce);
		assert!(QoS::AtLeastOnce < QoS::ExactlyOnce);
	}
}
