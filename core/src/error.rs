// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;
use thiserror::Error;

/// Error returned by every signing, credential and config operation.
///
/// The [`ErrorKind`] tells callers whether they passed bad input or the
/// request itself cannot be signed. The underlying cause, if any, is kept as
/// the error source.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// ErrorKind classifies an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential is present but cannot be used for signing.
    CredentialInvalid,
    /// Request cannot be signed: missing host, non-UTF-8 header, chunk
    /// signed out of order.
    RequestInvalid,
    /// Configuration value could not be understood.
    ConfigInvalid,
    /// Caller broke an argument contract such as a zero chunk size or an
    /// empty secret key.
    InvalidArgument,
    /// Anything else, mostly I/O.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::CredentialInvalid => "credential invalid",
            ErrorKind::RequestInvalid => "request invalid",
            ErrorKind::ConfigInvalid => "config invalid",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Build an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the cause of this error.
    pub fn with_source(self, source: impl Into<anyhow::Error>) -> Self {
        Error {
            source: Some(source.into()),
            ..self
        }
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message without the kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the caller's arguments caused this error.
    pub fn is_argument_error(&self) -> bool {
        self.kind == ErrorKind::InvalidArgument
    }

    /// Shortcut for [`ErrorKind::CredentialInvalid`].
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Shortcut for [`ErrorKind::RequestInvalid`].
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Shortcut for [`ErrorKind::ConfigInvalid`].
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Shortcut for [`ErrorKind::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Shortcut for [`ErrorKind::Unexpected`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::unexpected(err.to_string()).with_source(err)
    }
}

macro_rules! from_error {
    ($kind:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(err: $ty) -> Self {
                    Error::new(ErrorKind::$kind, err.to_string()).with_source(err)
                }
            }
        )+
    };
}

from_error!(RequestInvalid:
    http::Error,
    http::header::InvalidHeaderValue,
    http::header::ToStrError,
    http::uri::InvalidUri,
    http::uri::InvalidUriParts,
    std::str::Utf8Error,
);

from_error!(Unexpected:
    std::fmt::Error,
    std::string::FromUtf8Error,
    std::io::Error,
);
