//! Request and response messages exchanged with the transport.

use core::fmt;

/// CoAP content format number for `application/cbor`.
pub const CONTENT_FORMAT_CBOR: u16 = 60;

/// Operation requested by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a value or subtree (CoAP GET).
    Read,
    /// Write a value or subtree (CoAP PUT).
    Write,
    /// Run a command (CoAP POST).
    Execute,
    /// Any other CoAP method code.
    Unsupported(u8),
}

impl Method {
    /// Maps a CoAP method code.
    #[must_use]
    pub fn from_coap_code(code: u8) -> Self {
        match code {
            1 => Self::Read,
            2 => Self::Execute,
            3 => Self::Write,
            other => Self::Unsupported(other),
        }
    }
}

/// Response status, encoded as CoAP codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    /// 2.04
    Changed = 0x44,
    /// 2.05
    Content = 0x45,
    /// 4.00
    BadRequest = 0x80,
    /// 4.01
    Unauthorized = 0x81,
    /// 4.04
    NotFound = 0x84,
    /// 5.00
    InternalError = 0xa0,
}

impl ResponseCode {
    /// Returns the raw CoAP code byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for 2.xx codes.
    #[must_use]
    pub fn is_success(self) -> bool {
        self.as_u8() >> 5 == 2
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.as_u8();
        write!(f, "{}.{:02}", code >> 5, code & 0x1f)
    }
}

/// An inbound server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Target resource or subtree path.
    pub path: String,
    /// Requested operation.
    pub method: Method,
    /// CBOR payload, empty if none.
    pub payload: Vec<u8>,
    /// Token to echo in the response.
    pub token: Vec<u8>,
}

impl Request {
    /// Creates a request without payload or token.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            payload: Vec::new(),
            token: Vec::new(),
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Sets the token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<Vec<u8>>) -> Self {
        self.token = token.into();
        self
    }
}

/// An outbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status.
    pub code: ResponseCode,
    /// CBOR payload, empty if none.
    pub payload: Vec<u8>,
    /// Token of the request being answered.
    pub token: Vec<u8>,
    /// Content format of `payload`.
    pub content_format: u16,
}

impl Response {
    /// Creates a response with no payload.
    #[must_use]
    pub fn empty(code: ResponseCode, token: Vec<u8>) -> Self {
        Self::with_payload(code, token, Vec::new())
    }

    /// Creates a response carrying a CBOR payload.
    #[must_use]
    pub fn with_payload(code: ResponseCode, token: Vec<u8>, payload: Vec<u8>) -> Self {
        Self {
            code,
            payload,
            token,
            content_format: CONTENT_FORMAT_CBOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coap_method_codes() {
        assert_eq!(Method::from_coap_code(1), Method::Read);
        assert_eq!(Method::from_coap_code(2), Method::Execute);
        assert_eq!(Method::from_coap_code(3), Method::Write);
        assert_eq!(Method::from_coap_code(4), Method::Unsupported(4));
    }

    #[test]
    fn code_display() {
        assert_eq!(ResponseCode::Content.to_string(), "2.05");
        assert_eq!(ResponseCode::NotFound.to_string(), "4.04");
        assert_eq!(ResponseCode::InternalError.to_string(), "5.00");
        assert!(ResponseCode::Changed.is_success());
        assert!(!ResponseCode::BadRequest.is_success());
    }
}
