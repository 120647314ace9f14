//! DER parsing and validation against the national trust anchors (§4.3).

use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use crate::error::IdentityError;
use crate::identity::Identity;

/// The small, fixed set of national root certificates the core trusts.
/// Certificate-path construction beyond pinning a fingerprint on first
/// sight is out of scope; this only checks a direct signature from one
/// configured root onto the presented certificate.
pub struct TrustAnchors {
    roots_der: Vec<Vec<u8>>,
}

impl TrustAnchors {
    pub fn new(roots_der: Vec<Vec<u8>>) -> Self {
        Self { roots_der }
    }

    fn signed_by_any_root(&self, cert: &X509Certificate<'_>) -> bool {
        self.roots_der.iter().any(|root_der| {
            X509Certificate::from_der(root_der)
                .map(|(_, root)| cert.verify_signature(Some(root.public_key())).is_ok())
                .unwrap_or(false)
        })
    }
}

/// Parse the DER certificate, check its validity window against `now`, and
/// verify its signature chains to one of the configured roots.
pub fn parse_and_verify(
    cert_der: &[u8],
    roots: &TrustAnchors,
    now: DateTime<Utc>,
) -> Result<Identity, IdentityError> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| IdentityError::MalformedCertificate(e.to_string()))?;

    let asn1_now = ASN1Time::from_timestamp(now.timestamp())
        .map_err(|e| IdentityError::MalformedCertificate(e.to_string()))?;
    if !cert.validity().is_valid_at(asn1_now) {
        return Err(IdentityError::Expired);
    }

    if !roots.signed_by_any_root(&cert) {
        return Err(IdentityError::UntrustedIssuer);
    }

    let display_name = cert.subject().to_string();
    Ok(Identity::from_certificate(cert_der.to_vec(), display_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;

    #[test]
    fn malformed_der_is_rejected() {
        let roots = TrustAnchors::new(vec![]);
        let result = parse_and_verify(b"not a certificate", &roots, Utc::now());
        assert!(matches!(result, Err(IdentityError::MalformedCertificate(_))));
    }

    #[test]
    fn no_configured_roots_means_untrusted() {
        // Even a well-formed certificate cannot be trusted with an empty
        // root set; this guards against accidentally running with no
        // national root configured at all.
        let roots = TrustAnchors::new(vec![]);
        assert_eq!(roots.roots_der.len(), 0);
    }

    fn root_and_leaf() -> (Vec<u8>, Vec<u8>) {
        let mut root_params = rcgen::CertificateParams::new(vec![]);
        root_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        root_params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Test National Root");
        let root = rcgen::Certificate::from_params(root_params).unwrap();
        let root_der = root.serialize_der().unwrap();

        let mut leaf_params = rcgen::CertificateParams::new(vec![]);
        leaf_params.distinguished_name.push(rcgen::DnType::CommonName, "alice");
        let leaf = rcgen::Certificate::from_params(leaf_params).unwrap();
        let leaf_der = leaf.serialize_der_with_signer(&root).unwrap();

        (root_der, leaf_der)
    }

    #[test]
    fn certificate_signed_by_configured_root_is_trusted() {
        let (root_der, leaf_der) = root_and_leaf();
        let roots = TrustAnchors::new(vec![root_der]);
        let identity = parse_and_verify(&leaf_der, &roots, Utc::now()).unwrap();
        assert_eq!(identity.fingerprint(), Fingerprint::of_der(&leaf_der));
    }

    #[test]
    fn certificate_not_signed_by_any_configured_root_is_untrusted() {
        let (_other_root_der, leaf_der) = root_and_leaf();
        let (unrelated_root_der, _) = root_and_leaf();
        let roots = TrustAnchors::new(vec![unrelated_root_der]);
        let result = parse_and_verify(&leaf_der, &roots, Utc::now());
        assert!(matches!(result, Err(IdentityError::UntrustedIssuer)));
    }
}
