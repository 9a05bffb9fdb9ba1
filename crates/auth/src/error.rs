use thiserror::Error;

/// Terminal token verification failure.
///
/// There is no partial trust: any variant means the bearer is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token could not be parsed, or a structural claim check failed.
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// Token expiry has passed.
    #[error("token has expired")]
    Expired,

    /// Signature does not verify against the declared key.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The declared algorithm is not an accepted asymmetric algorithm.
    ///
    /// `none` and symmetric algorithms are rejected outright: accepting a
    /// symmetric algorithm against public key material is a forgery vector.
    #[error("token algorithm '{0}' is not accepted")]
    RejectedAlgorithm(String),

    /// The declared key id could not be resolved from the issuer's key set.
    #[error("unable to resolve signing key '{0}'")]
    KeyResolution(String),

    /// Signature verified but a required identity claim is absent.
    #[error("token is missing required claim '{0}'")]
    ClaimsMissing(&'static str),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::RejectedAlgorithm(err.to_string())
            }
            _ => Self::Malformed(err.to_string()),
        }
    }
}
