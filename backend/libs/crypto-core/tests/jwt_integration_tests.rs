/// Integration tests for session token issuance and verification
///
/// This test module covers:
/// - Issue/verify round trip through the in-process publisher
/// - Expiry boundary
/// - Key-version binding between token and public key
/// - Key rotation on disk
use crypto_core::{
    AuthError, CertificatePublisher, CertificateStore, Identity, SessionClaims, TokenIssuer,
    TokenVerifier, JWT_ALGORITHM,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::time::Duration;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_store() -> CertificateStore {
    CertificateStore::new(FIXTURES)
}

fn local_verifier() -> TokenVerifier<CertificatePublisher> {
    TokenVerifier::new(CertificatePublisher::new(fixture_store()))
}

// ============================================================================
// Round trip
// ============================================================================

#[tokio::test]
async fn test_issue_then_verify_returns_identity() {
    let issuer = TokenIssuer::new(fixture_store());
    let verifier = local_verifier();

    for version in ["1", "2"] {
        let token = issuer
            .issue(&Identity::new("bob"), &version.into(), Duration::from_secs(600))
            .expect("Failed to issue token");

        let identity = verifier
            .verify(&format!("bearer {token}"))
            .await
            .expect("Token should verify");

        assert_eq!(identity, Identity::new("bob"));
    }
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_expiry_boundary() {
    let issued_at = 1_700_000_000;
    let ttl = Duration::from_secs(600);
    let token = TokenIssuer::new(fixture_store())
        .issue_at(&Identity::new("bob"), &"1".into(), ttl, issued_at)
        .unwrap();
    let header = format!("bearer {token}");
    let verifier = local_verifier();
    let deadline = issued_at + 600;

    assert!(verifier.verify_at(&header, deadline - 1).await.is_ok());

    let err = verifier.verify_at(&header, deadline).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));

    let err = verifier.verify_at(&header, deadline + 1).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[tokio::test]
async fn test_zero_ttl_token_is_already_expired() {
    let token = TokenIssuer::new(fixture_store())
        .issue(&Identity::new("bob"), &"1".into(), Duration::ZERO)
        .unwrap();

    let err = local_verifier()
        .verify(&format!("bearer {token}"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

// ============================================================================
// Key-version binding
// ============================================================================

/// Sign claims naming `claimed_version` with the key of `signing_version`.
fn forge(claimed_version: &str, signing_version: &str) -> String {
    let pem = std::fs::read(format!("{FIXTURES}/private_key{signing_version}.pem")).unwrap();
    let claims = SessionClaims {
        name: "mallory".to_string(),
        key_version: claimed_version.into(),
        exp: chrono::Utc::now().timestamp() + 600,
    };
    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_rsa_pem(&pem).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_token_signed_by_other_version_is_rejected() {
    let verifier = local_verifier();

    // Signed with v1, claims v2: verifier fetches v2's key
    let err = verifier
        .verify(&format!("bearer {}", forge("2", "1")))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid));

    let err = verifier
        .verify(&format!("bearer {}", forge("1", "2")))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid));
}

#[tokio::test]
async fn test_token_for_retired_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        format!("{FIXTURES}/private_key1.pem"),
        dir.path().join("private_key1.pem"),
    )
    .unwrap();

    let store = CertificateStore::new(dir.path());
    let token = TokenIssuer::new(store.clone())
        .issue(&Identity::new("bob"), &"1".into(), Duration::from_secs(600))
        .unwrap();
    let verifier = TokenVerifier::new(CertificatePublisher::new(store));
    let header = format!("bearer {token}");

    assert!(verifier.verify(&header).await.is_ok());

    std::fs::remove_file(dir.path().join("private_key1.pem")).unwrap();

    let err = verifier.verify(&header).await.unwrap_err();
    assert!(matches!(err, AuthError::KeyUnavailable(_)));
}

#[tokio::test]
async fn test_rotated_key_file_invalidates_old_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("private_key1.pem");
    std::fs::copy(format!("{FIXTURES}/private_key1.pem"), &key_path).unwrap();

    let store = CertificateStore::new(dir.path());
    let token = TokenIssuer::new(store.clone())
        .issue(&Identity::new("bob"), &"1".into(), Duration::from_secs(600))
        .unwrap();

    // Different key material under the same version
    std::fs::copy(format!("{FIXTURES}/private_key2.pem"), &key_path).unwrap();

    let err = TokenVerifier::new(CertificatePublisher::new(store))
        .verify(&format!("bearer {token}"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid));
}

// ============================================================================
// Tampering
// ============================================================================

#[tokio::test]
async fn test_tampered_signature_is_rejected() {
    let token = TokenIssuer::new(fixture_store())
        .issue(&Identity::new("bob"), &"1".into(), Duration::from_secs(600))
        .unwrap()
        .into_inner();

    let (message, signature) = token.rsplit_once('.').unwrap();
    let mut sig: Vec<char> = signature.chars().collect();
    sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{message}.{}", sig.into_iter().collect::<String>());

    let err = local_verifier()
        .verify(&format!("bearer {tampered}"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid));
}
