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
    normalize_header_value, string_to_sign, CanonicalRequest,
};
use crate::constants::{ALGORITHM, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN};
use crate::key::generate_signing_key;
use crate::{Credential, SigningContext};
use http::{header, HeaderMap, HeaderValue};
use log::debug;
use s3sign_core::hash::hex_hmac_sha256;
use s3sign_core::utils::Redact;
use s3sign_core::Result;
use std::fmt::{Debug, Formatter};

/// HeaderSigner signs one fully buffered request into an `Authorization`
/// header.
///
/// - [Authenticating Requests: Using the Authorization Header](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-auth-using-authorization-header.html)
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSigner;

/// Everything a header signature produced.
///
/// The signature, scope, date and signing key seed a chunked upload.
#[derive(Clone)]
pub struct SignedHeaders {
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// Hex encoded signature.
    pub signature: String,
    /// Credential scope: `20130524/us-east-1/s3/aws4_request`.
    pub scope: String,
    /// Signing time in ISO8601 basic format.
    pub date_time: String,
    /// Derived signing key.
    pub signing_key: Vec<u8>,
}

impl Debug for SignedHeaders {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHeaders")
            .field("authorization", &self.authorization)
            .field("signature", &self.signature)
            .field("scope", &self.scope)
            .field("date_time", &self.date_time)
            .field("signing_key", &Redact::from(&self.signing_key))
            .finish()
    }
}

impl HeaderSigner {
    /// Create a new header signer.
    pub fn new() -> Self {
        Self
    }

    /// Sign the request and return the `Authorization` header value.
    ///
    /// `headers` gains `host`, `x-amz-date` and, when the credential carries
    /// a session token, `x-amz-security-token`. The request must be sent with
    /// exactly the returned header set.
    ///
    /// `query` must already be percent-encoded. `payload_hash` is the hex
    /// SHA-256 of the body or one of the placeholder payloads.
    pub fn sign(
        &self,
        ctx: &SigningContext,
        headers: &mut HeaderMap,
        query: &str,
        payload_hash: &str,
        cred: &Credential,
    ) -> Result<String> {
        Ok(self
            .compute(ctx, headers, query, payload_hash, cred)?
            .authorization)
    }

    /// Same as [`HeaderSigner::sign`], but keep everything the chunked
    /// signer needs to continue the signature chain.
    pub fn compute(
        &self,
        ctx: &SigningContext,
        headers: &mut HeaderMap,
        query: &str,
        payload_hash: &str,
        cred: &Credential,
    ) -> Result<SignedHeaders> {
        cred.check()?;

        // A previous signature must never become a signed header.
        headers.remove(header::AUTHORIZATION);
        headers.insert(header::HOST, HeaderValue::try_from(ctx.host_header())?);
        headers.insert(X_AMZ_DATE, HeaderValue::try_from(ctx.date_time())?);
        match &cred.session_token {
            Some(token) => {
                let mut value = HeaderValue::from_str(token)?;
                // Keep the token out of Debug output.
                value.set_sensitive(true);
                headers.insert(X_AMZ_SECURITY_TOKEN, value);
            }
            None => {
                headers.remove(X_AMZ_SECURITY_TOKEN);
            }
        }

        // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
        for value in headers.values_mut() {
            normalize_header_value(value);
        }

        let signed_headers = canonicalize_header_names(headers);
        let creq = CanonicalRequest {
            method: ctx.method().as_str(),
            uri: &canonical_uri(ctx.path())?,
            query: &canonicalize_query(query),
            headers: &canonicalize_headers(headers)?,
            signed_headers: &signed_headers,
            payload_hash,
        }
        .to_string();
        debug!("calculated canonical request: {creq}");

        let scope = ctx.scope();
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(ctx.time(), &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(
            &cred.secret_access_key,
            ctx.time(),
            ctx.region(),
            ctx.service(),
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            cred.access_key_id
        );

        Ok(SignedHeaders {
            authorization,
            signature,
            scope,
            date_time: ctx.date_time(),
            signing_key,
        })
    }
}
