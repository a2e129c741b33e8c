//! What a capability token grants.

use serde::{Deserialize, Serialize};

use seedbox_core::types::{TransferId, UserId};
use seedbox_entity::delivery::Disposition;

/// The resource a capability token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CapabilityResource {
    /// One artifact of a transfer session.
    Artifact {
        /// Session content identifier.
        session: TransferId,
        /// Artifact index within the session.
        index: usize,
    },
    /// A file inside the owner's sandbox.
    File {
        /// Path relative to the owner's sandbox root.
        path: String,
    },
}

/// Everything a capability token authorizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPayload {
    /// Target resource.
    pub resource: CapabilityResource,
    /// Inline or attachment delivery.
    pub disposition: Disposition,
    /// Owner at issue time. When present it must still own the resource
    /// when the token is redeemed.
    pub owner: Option<UserId>,
}

/// Wire claims. Short names keep link URLs compact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CapabilityClaims {
    pub res: CapabilityResource,
    pub disp: Disposition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own: Option<UserId>,
    pub iat: i64,
    pub exp: i64,
}

impl CapabilityClaims {
    pub(crate) fn new(payload: &CapabilityPayload, issued_at: i64, expires_at: i64) -> Self {
        Self {
            res: payload.resource.clone(),
            disp: payload.disposition,
            own: payload.owner,
            iat: issued_at,
            exp: expires_at,
        }
    }

    pub(crate) fn into_payload(self) -> CapabilityPayload {
        CapabilityPayload {
            resource: self.res,
            disposition: self.disp,
            owner: self.own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_wire_shape() {
        let res = CapabilityResource::Artifact {
            session: TransferId::new("abc"),
            index: 2,
        };
        let json = serde_json::to_value(&res).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "kind": "artifact", "session": "abc", "index": 2 })
        );
    }

    #[test]
    fn test_owner_omitted_when_absent() {
        let payload = CapabilityPayload {
            resource: CapabilityResource::File {
                path: "a.mkv".to_string(),
            },
            disposition: Disposition::Stream,
            owner: None,
        };
        let json = serde_json::to_value(CapabilityClaims::new(&payload, 1, 2)).expect("serialize");
        assert!(json.get("own").is_none());
        assert_eq!(json["disp"], "stream");
    }
}
