//! Opaque identity keys used to partition the session cache.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTITY_MAX_LEN: usize = 128;

/// Opaque key identifying whose session is being managed (typically a portal user handle).
///
/// Identities carry no structure beyond equality and hashing; the only validation performed is
/// that the key is non-empty and of bounded length so it can be used safely as a map key and
/// log field.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);
impl Identity {
	/// Creates a new identity after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentityError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Returns the identity as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for Identity {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Identity {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<Identity> for String {
	fn from(value: Identity) -> Self {
		value.0
	}
}
impl TryFrom<String> for Identity {
	type Error = IdentityError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for Identity {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for Identity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Identity({})", self.0)
	}
}
impl Display for Identity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for Identity {
	type Err = IdentityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Error returned when identity validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentityError {
	/// The identity was empty.
	#[error("Identity cannot be empty.")]
	Empty,
	/// The identity exceeded the allowed byte count.
	#[error("Identity exceeds {max} bytes.")]
	TooLong {
		/// Maximum permitted length in bytes.
		max: usize,
	},
}

fn validate_view(view: &str) -> Result<(), IdentityError> {
	if view.is_empty() {
		return Err(IdentityError::Empty);
	}
	if view.len() > IDENTITY_MAX_LEN {
		return Err(IdentityError::TooLong { max: IDENTITY_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identities_validate_length() {
		assert_eq!(Identity::new(""), Err(IdentityError::Empty));

		let exact = "a".repeat(IDENTITY_MAX_LEN);

		Identity::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTITY_MAX_LEN + 1);

		assert_eq!(Identity::new(&too_long), Err(IdentityError::TooLong { max: IDENTITY_MAX_LEN }));
	}

	#[test]
	fn serde_enforces_validation() {
		let identity: Identity =
			serde_json::from_str("\"abc12x\"").expect("Identity should deserialize successfully.");

		assert_eq!(identity.as_str(), "abc12x");
		assert!(serde_json::from_str::<Identity>("\"\"").is_err());
	}

	#[test]
	fn borrow_supports_str_lookup() {
		let map: HashMap<Identity, u8> = HashMap::from_iter([(
			Identity::new("abc12x").expect("Identity used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("abc12x"), Some(&7));
	}
}
