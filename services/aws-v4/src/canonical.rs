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

//! Canonical form of a request as SigV4 hashes it.
//!
//! Every function here is pure: the same input always renders the same bytes.

use crate::constants::{ALGORITHM, AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, SCOPE_TERMINATOR};
use http::{HeaderMap, HeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use s3sign_core::hash::hex_sha256;
use s3sign_core::time::{format_date, format_iso8601, DateTime};
use s3sign_core::{Error, Result};
use std::fmt;

/// Trim leading and trailing spaces and tabs of a header value.
///
/// Internal whitespace is kept as-is.
pub fn normalize_header_value(value: &mut HeaderValue) {
    let bs = value.as_bytes();
    let is_blank = |b: &u8| *b == b' ' || *b == b'\t';

    let start = bs.iter().position(|b| !is_blank(b)).unwrap_or(bs.len());
    let end = bs.len() - bs.iter().rev().position(|b| !is_blank(b)).unwrap_or(0);
    if start == 0 && end == bs.len() {
        return;
    }

    let sensitive = value.is_sensitive();
    if let Ok(mut trimmed) = HeaderValue::from_bytes(&bs[start..end.max(start)]) {
        trimmed.set_sensitive(sensitive);
        *value = trimmed;
    }
}

/// Header names sorted ordinally.
fn sorted_header_names(headers: &HeaderMap) -> Vec<&str> {
    let mut names = headers.keys().map(|k| k.as_str()).collect::<Vec<_>>();
    names.sort_unstable();
    names
}

/// Semicolon-joined list of lower-cased header names: `host;range;x-amz-date`.
pub fn canonicalize_header_names(headers: &HeaderMap) -> String {
    sorted_header_names(headers).join(";")
}

/// `name:value\n` for every header, ordered like [`canonicalize_header_names`].
///
/// Values repeated under one name are joined with `,` in insertion order.
pub fn canonicalize_headers(headers: &HeaderMap) -> Result<String> {
    let mut f = String::with_capacity(256);

    for name in sorted_header_names(headers) {
        let mut values = Vec::new();
        for value in headers.get_all(name) {
            let value = value.to_str().map_err(|e| {
                Error::request_invalid(format!("header {name} is not valid utf-8")).with_source(e)
            })?;
            values.push(value.trim_matches([' ', '\t']));
        }

        f.push_str(name);
        f.push(':');
        f.push_str(&values.join(","));
        f.push('\n');
    }

    Ok(f)
}

/// Sort an already encoded query string by key, then value.
///
/// A parameter without `=` is rendered as `key=`. Empty segments are
/// dropped. Keys and values are never re-encoded.
pub fn canonicalize_query(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut pairs = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect::<Vec<_>>();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical URI of a request path.
///
/// The path is decoded first so an already encoded path is not encoded twice,
/// then every byte except the unreserved characters and `/` is encoded.
pub fn canonical_uri(path: &str) -> Result<String> {
    let path = percent_decode_str(path).decode_utf8().map_err(|e| {
        Error::request_invalid(format!("path {path} is not valid utf-8 once decoded"))
            .with_source(e)
    })?;

    let encoded = utf8_percent_encode(&path, &AWS_URI_ENCODE_SET).to_string();
    if encoded.starts_with('/') {
        Ok(encoded)
    } else {
        Ok(format!("/{encoded}"))
    }
}

/// Percent-encode a query key or value; only unreserved characters survive.
pub fn percent_encode_query(value: &str) -> String {
    utf8_percent_encode(value, &AWS_QUERY_ENCODE_SET).to_string()
}

/// Scope: `20130524/us-east-1/s3/aws4_request`
pub fn scope(date: DateTime, region: &str, service: &str) -> String {
    format!(
        "{}/{region}/{service}/{SCOPE_TERMINATOR}",
        format_date(date)
    )
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20130524T000000Z
/// 20130524/us-east-1/s3/aws4_request
/// <hashed_canonical_request>
/// ```
pub fn string_to_sign(time: DateTime, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        format_iso8601(time),
        hex_sha256(canonical_request.as_bytes())
    )
}

/// The request in the exact form that gets hashed.
///
/// `headers` is the output of [`canonicalize_headers`] and already ends with
/// a newline, so the rendered form has a blank line before `signed_headers`.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequest<'a> {
    /// HTTP method, upper-case.
    pub method: &'a str,
    /// Output of [`canonical_uri`].
    pub uri: &'a str,
    /// Output of [`canonicalize_query`].
    pub query: &'a str,
    /// Output of [`canonicalize_headers`].
    pub headers: &'a str,
    /// Output of [`canonicalize_header_names`].
    pub signed_headers: &'a str,
    /// Hex SHA-256 of the body, or one of the placeholder payloads.
    pub payload_hash: &'a str,
}

impl fmt::Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        writeln!(f, "{}", self.headers)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.payload_hash)
    }
}
