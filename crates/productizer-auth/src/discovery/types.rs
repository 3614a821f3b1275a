//! Dataspace configuration document
//!
//! Format: <https://docs.ioxio.dev/schemas/dataspace-configuration/>

use serde::{Deserialize, Serialize};

/// Well-known path of the dataspace configuration under the issuer origin
pub const DATASPACE_CONFIGURATION_PATH: &str = "/.well-known/dataspace/dataspace-configuration.json";

/// Dataspace configuration published by a dataspace
///
/// Only [`jwks_uri`](Self::jwks_uri) is used; the remaining fields are
/// descriptive metadata kept for logging and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataspaceConfiguration {
    /// JWKS URL of the dataspace's token issuer
    #[serde(alias = "jwks_url")]
    pub jwks_uri: String,

    /// Base domain of the dataspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataspace_base_domain: Option<String>,

    /// Human readable dataspace name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataspace_name: Option<String>,

    /// Product Gateway URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_gateway_url: Option<String>,

    /// Definition viewer URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_viewer_url: Option<String>,

    /// Developer portal URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_portal_url: Option<String>,

    /// Documentation URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,

    /// Authentication providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_providers: Option<serde_json::Value>,

    /// Consent providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_providers: Option<serde_json::Value>,

    /// Data product definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_document() {
        let doc: DataspaceConfiguration = serde_json::from_value(json!({
            "authentication_providers": {},
            "consent_providers": [],
            "dataspace_base_domain": "sandbox.ioxio-dataspace.com",
            "dataspace_name": "IOXIO Sandbox",
            "definition_viewer_url": "https://definitions.sandbox.ioxio-dataspace.com",
            "definitions": {},
            "developer_portal_url": "https://developer.sandbox.ioxio-dataspace.com",
            "docs_url": "https://docs.ioxio.dev",
            "jwks_uri": "https://sandbox.ioxio-dataspace.com/.well-known/jwks.json",
            "product_gateway_url": "https://gateway.sandbox.ioxio-dataspace.com"
        }))
        .unwrap();

        assert_eq!(
            doc.jwks_uri,
            "https://sandbox.ioxio-dataspace.com/.well-known/jwks.json"
        );
        assert_eq!(doc.dataspace_name.as_deref(), Some("IOXIO Sandbox"));
    }

    #[test]
    fn test_jwks_url_alias() {
        let doc: DataspaceConfiguration =
            serde_json::from_value(json!({ "jwks_url": "https://x/jwks.json" })).unwrap();
        assert_eq!(doc.jwks_uri, "https://x/jwks.json");
    }

    #[test]
    fn test_missing_jwks_uri_is_rejected() {
        let result = serde_json::from_value::<DataspaceConfiguration>(json!({
            "dataspace_name": "No keys"
        }));
        assert!(result.is_err());
    }
}
