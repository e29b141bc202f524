//! Session tokens signed with versioned RSA keys
//!
//! ## Modules
//! - `certificate`: filesystem key store and public key publisher
//! - `jwt`: token issuance and bearer header parsing
//! - `claims`: session claims, unverified/verified split
//! - `verifier`: bearer verification against a key resolver
//! - `correlation`: request ids threaded across process boundaries

pub mod certificate;
pub mod claims;
pub mod correlation;
pub mod error;
pub mod jwt;
pub mod verifier;

pub use certificate::{CertificatePublisher, CertificateStore, CertificateVersion, PublicKeyEnvelope};
pub use claims::{Identity, SessionClaims, SessionToken, UnverifiedClaims};
pub use correlation::{CorrelationContext, RequestId, GRPC_REQUEST_ID_KEY, HTTP_REQUEST_ID_HEADER};
pub use error::{AuthError, Result};
pub use jwt::{parse_bearer, TokenIssuer, JWT_ALGORITHM};
pub use verifier::{PublicKeyResolver, TokenVerifier};
