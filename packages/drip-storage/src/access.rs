use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use drip_domain::{FlatMap, Scalar};

use crate::{Error, TENANT_KEY, VISIBILITY_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
	Public,
	Private,
}
impl Visibility {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Public => "public",
			Self::Private => "private",
		}
	}
}
impl fmt::Display for Visibility {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Visibility {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"public" => Ok(Self::Public),
			"private" => Ok(Self::Private),
			other => Err(Error::InvalidArgument(format!(
				"visibility must be public or private, got {other:?}."
			))),
		}
	}
}

/// Which stored records a query may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
	PublicOnly,
	/// Public records plus the records owned by this tenant.
	Tenant(String),
}
impl AccessScope {
	pub fn matches(&self, metadata: &FlatMap) -> bool {
		let is_public = metadata.get(VISIBILITY_KEY)
			== Some(&Scalar::String(Visibility::Public.as_str().to_string()));

		match self {
			Self::PublicOnly => is_public,
			Self::Tenant(tenant_id) =>
				is_public
					|| matches!(
						metadata.get(TENANT_KEY),
						Some(Scalar::String(owner)) if owner == tenant_id
					),
		}
	}
}
