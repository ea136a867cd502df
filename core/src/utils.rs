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

//! Utility functions and types.

use std::fmt;

/// Redacts a secret so it can be safely written to logs or `Debug` output.
///
/// - Empty input is shown as `EMPTY`.
/// - Input shorter than 12 characters is entirely redacted.
/// - Longer input keeps only its first and last three characters, which is
///   enough to tell two access keys apart without leaking either.
///
/// Raw key bytes (such as a derived signing key) are always fully redacted.
pub struct Redact<'a>(RedactInner<'a>);

enum RedactInner<'a> {
    Str(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(RedactInner::Str(value))
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(RedactInner::Str(value.as_str()))
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(RedactInner::Str("")),
            Some(v) => Redact(RedactInner::Str(v)),
        }
    }
}

impl<'a> From<&'a [u8]> for Redact<'a> {
    fn from(value: &'a [u8]) -> Self {
        Redact(RedactInner::Bytes(value))
    }
}

impl<'a> From<&'a Vec<u8>> for Redact<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Redact(RedactInner::Bytes(value.as_slice()))
    }
}

impl fmt::Debug for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RedactInner::Bytes(bs) if bs.is_empty() => f.write_str("EMPTY"),
            RedactInner::Bytes(_) => f.write_str("***"),
            RedactInner::Str(s) => {
                let length = s.len();
                if length == 0 {
                    f.write_str("EMPTY")
                } else if length < 12 || !s.is_char_boundary(3) || !s.is_char_boundary(length - 3)
                {
                    f.write_str("***")
                } else {
                    f.write_str(&s[..3])?;
                    f.write_str("***")?;
                    f.write_str(&s[length - 3..])
                }
            }
        }
    }
}
