//! # Dataspace Discovery
//!
//! Every dataspace publishes a configuration document at a fixed well-known
//! path under its HTTPS origin. The document names the JWKS URL holding the
//! keys that sign the dataspace's API tokens.
//!
//! ```text
//! iss = https://{domain}
//!        │
//!        ▼
//! https://{domain}/.well-known/dataspace/dataspace-configuration.json
//!        │  jwks_uri
//!        ▼
//! JWKS document (see crate::jwt::jwks)
//! ```

mod resolver;
mod types;

pub use resolver::{DataspaceResolver, dataspace_configuration_url};
pub use types::{DATASPACE_CONFIGURATION_PATH, DataspaceConfiguration};
