use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("request has no `x-line-signature` header")]
    Missing,
    #[error("signature header is not valid base64")]
    Malformed,
    #[error("signature does not match the request body")]
    Mismatch,
    #[error("channel secret cannot be used as an HMAC key")]
    InvalidKey,
}

/// Checks that a webhook body was signed with the channel secret.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    channel_secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(channel_secret: SecretString) -> Self {
        Self { channel_secret }
    }

    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let header = header.map(str::trim).filter(|value| !value.is_empty());
        let header = header.ok_or(SignatureError::Missing)?;
        let expected = STANDARD.decode(header).map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }

    /// Base64 HMAC-SHA256 of `body`, as LINE puts it in the signature header.
    pub fn sign(&self, body: &[u8]) -> Result<String, SignatureError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256, SignatureError> {
        HmacSha256::new_from_slice(self.channel_secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidKey)
    }
}

#[cfg(test)]
mod tests {
    use super::{SignatureError, SignatureVerifier};

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new("channel-secret".to_owned().into())
    }

    #[test]
    fn signed_body_verifies() {
        let body = br#"{"events":[]}"#;
        let signature = verifier().sign(body).expect("sign");
        assert_eq!(verifier().verify(body, Some(&signature)), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = verifier().sign(br#"{"events":[]}"#).expect("sign");
        assert_eq!(
            verifier().verify(br#"{"events":[{}]}"#, Some(&signature)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn secret_must_match() {
        let body = b"payload";
        let foreign = SignatureVerifier::new("other-secret".to_owned().into())
            .sign(body)
            .expect("sign");
        assert_eq!(verifier().verify(body, Some(&foreign)), Err(SignatureError::Mismatch));
    }

    #[test]
    fn missing_and_malformed_headers_are_distinguished() {
        assert_eq!(verifier().verify(b"x", None), Err(SignatureError::Missing));
        assert_eq!(verifier().verify(b"x", Some("  ")), Err(SignatureError::Missing));
        assert_eq!(verifier().verify(b"x", Some("not base64!")), Err(SignatureError::Malformed));
    }
}
