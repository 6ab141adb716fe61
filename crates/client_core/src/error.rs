use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Non-2xx reply. Displays the raw response body and nothing else.
    #[error("{body}")]
    Status { status: u16, body: String },
    /// Displays the whole cause chain, e.g. down to "Connection refused".
    #[error("{}", with_causes(.0))]
    Request(#[from] reqwest::Error),
    #[error("invalid response payload from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid API base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

impl TransferError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransferError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request never produced a response from the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, TransferError::Request(_))
    }
}

/// Joins `err` and its sources with `": "`, skipping causes already present in the text.
pub fn with_causes(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, Error)]
    #[error("error sending request")]
    struct Outer(#[source] Middle);

    #[derive(Debug, Error)]
    #[error("client error (Connect)")]
    struct Middle(#[source] io::Error);

    #[test]
    fn cause_chain_is_appended_in_order() {
        let err = Outer(Middle(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "Connection refused",
        )));
        assert_eq!(
            with_causes(&err),
            "error sending request: client error (Connect): Connection refused"
        );
    }

    #[test]
    fn causes_already_in_the_message_are_not_repeated() {
        #[derive(Debug, Error)]
        #[error("decode failed: bad byte")]
        struct Wrapper(#[source] Leaf);

        #[derive(Debug, Error)]
        #[error("bad byte")]
        struct Leaf;

        assert_eq!(with_causes(&Wrapper(Leaf)), "decode failed: bad byte");
    }
}
