//! Participant and service-instance identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A globally-unique participant or service-instance identifier.
///
/// Newtyped over [`Uuid`] rather than a bare string: GUIDs are compared and
/// ordered (broadcast tie-break, §4.3) throughout the RPC and discovery
/// layers, so they deserve a real type rather than stringly-typed plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for Guid {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

/// Opaque string accompanying a GUID to support blue/green deployments.
pub type ServiceInstanceTag = Option<String>;
