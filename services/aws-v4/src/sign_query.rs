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

use crate::canonical::{
    canonical_uri, canonicalize_header_names, canonicalize_headers, canonicalize_query,
    normalize_header_value, percent_encode_query, string_to_sign, CanonicalRequest,
};
use crate::constants::*;
use crate::key::generate_signing_key;
use crate::{Credential, SigningContext};
use http::{header, HeaderMap, HeaderValue};
use log::debug;
use s3sign_core::hash::hex_hmac_sha256;
use s3sign_core::Result;
use std::time::Duration;

/// Query parameters owned by the signer. A caller supplied `X-Amz-Expires`
/// is not among them.
const SIGNING_QUERY_KEYS: [&str; 6] = [
    X_AMZ_ALGORITHM_QUERY,
    X_AMZ_CREDENTIAL_QUERY,
    X_AMZ_DATE_QUERY,
    X_AMZ_SIGNED_HEADERS_QUERY,
    X_AMZ_SECURITY_TOKEN_QUERY,
    X_AMZ_SIGNATURE_QUERY,
];

/// QuerySigner signs a request into presigned URL query parameters.
///
/// - [Authenticating Requests: Using Query Parameters](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html)
///
/// The validity window is part of the signed query. Either put
/// `X-Amz-Expires` into the query before signing, or let the signer add it
/// via [`QuerySigner::with_expires_in`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySigner {
    expires_in: Option<Duration>,
}

/// Ordered, percent-encoded query parameters produced by [`QuerySigner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedQuery {
    pairs: Vec<(String, String)>,
}

impl PresignedQuery {
    /// Parameters in the order they should be appended.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of `X-Amz-Signature`.
    pub fn signature(&self) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == X_AMZ_SIGNATURE_QUERY)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Render the parameters as `k=v&k=v`.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the parameters to the caller's query.
    ///
    /// Signing parameters left over from an earlier presign are dropped from
    /// `query`, and so is any key these parameters carry themselves (such as
    /// `X-Amz-Expires` set via [`QuerySigner::with_expires_in`]).
    pub fn apply_to(&self, query: &str) -> String {
        let query = query.strip_prefix('?').unwrap_or(query);

        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
                !self.replaces(key)
            })
            .map(str::to_string)
            .chain(self.pairs.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn replaces(&self, key: &str) -> bool {
        SIGNING_QUERY_KEYS.contains(&key) || self.pairs.iter().any(|(k, _)| k == key)
    }
}

impl QuerySigner {
    /// Create a new query signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `X-Amz-Expires` to the signed parameters.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Sign the request and return the presigned parameters.
    ///
    /// `headers` gains a `host` header; the signing time travels in the
    /// query instead of `x-amz-date`. `query` must already be
    /// percent-encoded and is signed together with the new parameters.
    pub fn sign(
        &self,
        ctx: &SigningContext,
        headers: &mut HeaderMap,
        query: &str,
        payload_hash: &str,
        cred: &Credential,
    ) -> Result<PresignedQuery> {
        cred.check()?;

        headers.remove(header::AUTHORIZATION);
        headers.insert(header::HOST, HeaderValue::try_from(ctx.host_header())?);
        for value in headers.values_mut() {
            normalize_header_value(value);
        }

        let scope = ctx.scope();
        debug!("calculated scope: {scope}");
        let signed_headers = canonicalize_header_names(headers);

        let mut pairs = vec![
            (X_AMZ_ALGORITHM_QUERY.to_string(), ALGORITHM.to_string()),
            (
                X_AMZ_CREDENTIAL_QUERY.to_string(),
                percent_encode_query(&format!("{}/{scope}", cred.access_key_id)),
            ),
            (X_AMZ_DATE_QUERY.to_string(), ctx.date_time()),
        ];
        if let Some(expires_in) = self.expires_in {
            pairs.push((
                X_AMZ_EXPIRES_QUERY.to_string(),
                expires_in.as_secs().to_string(),
            ));
        }
        pairs.push((
            X_AMZ_SIGNED_HEADERS_QUERY.to_string(),
            percent_encode_query(&signed_headers),
        ));
        if let Some(token) = &cred.session_token {
            pairs.push((
                X_AMZ_SECURITY_TOKEN_QUERY.to_string(),
                percent_encode_query(token),
            ));
        }

        let mut presigned = PresignedQuery { pairs };
        let creq = CanonicalRequest {
            method: ctx.method().as_str(),
            uri: &canonical_uri(ctx.path())?,
            query: &canonicalize_query(&presigned.apply_to(query)),
            headers: &canonicalize_headers(headers)?,
            signed_headers: &signed_headers,
            payload_hash,
        }
        .to_string();
        debug!("calculated canonical request: {creq}");

        let string_to_sign = string_to_sign(ctx.time(), &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(
            &cred.secret_access_key,
            ctx.time(),
            ctx.region(),
            ctx.service(),
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());
        presigned
            .pairs
            .push((X_AMZ_SIGNATURE_QUERY.to_string(), signature));

        Ok(presigned)
    }
}
