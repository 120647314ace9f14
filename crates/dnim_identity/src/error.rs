use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("certificate could not be parsed as DER: {0}")]
    MalformedCertificate(String),

    #[error("certificate is outside its validity window")]
    Expired,

    #[error("certificate chain does not lead to a configured national root")]
    UntrustedIssuer,

    #[error("peer fingerprint does not match the previously pinned value for this endpoint")]
    PinMismatch,

    #[error("card is unavailable")]
    CardUnavailable,

    #[error("card operation failed: {0}")]
    CardFailure(String),
}
