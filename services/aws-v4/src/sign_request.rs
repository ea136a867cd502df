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

use crate::constants::{UNSIGNED_PAYLOAD, X_AMZ_CONTENT_SHA_256};
use crate::{Credential, HeaderSigner, QuerySigner, SigningContext};
use http::request::Parts;
use http::uri::PathAndQuery;
use http::{header, HeaderValue, Uri};
use s3sign_core::time::DateTime;
use s3sign_core::Result;
use std::mem;
use std::time::Duration;

/// RequestSigner that implement AWS SigV4 on top of `http::request::Parts`.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug)]
pub struct RequestSigner {
    service: String,
    region: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Sign the request in place.
    ///
    /// - Without credential the request is left untouched.
    /// - Without `expires_in` an `Authorization` header is inserted. A missing
    ///   `x-amz-content-sha256` defaults to `UNSIGNED-PAYLOAD`.
    /// - With `expires_in` the presigned parameters are appended to the uri.
    pub fn sign_request(
        &self,
        req: &mut Parts,
        credential: Option<&Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        let mut ctx = SigningContext::new(req.method.clone(), &req.uri, &self.region, &self.service)?;
        if let Some(time) = self.time {
            ctx = ctx.with_time(time);
        }
        let query = req.uri.query().unwrap_or_default().to_string();

        match expires_in {
            None => {
                let payload_hash = match req.headers.get(X_AMZ_CONTENT_SHA_256) {
                    Some(v) => v.to_str()?.to_string(),
                    None => {
                        req.headers.insert(
                            X_AMZ_CONTENT_SHA_256,
                            HeaderValue::from_static(UNSIGNED_PAYLOAD),
                        );
                        UNSIGNED_PAYLOAD.to_string()
                    }
                };

                let authorization = HeaderSigner::new().sign(
                    &ctx,
                    &mut req.headers,
                    &query,
                    payload_hash.trim(),
                    cred,
                )?;
                let mut authorization = HeaderValue::from_str(&authorization)?;
                authorization.set_sensitive(true);
                req.headers.insert(header::AUTHORIZATION, authorization);
            }
            Some(expires_in) => {
                let presigned = QuerySigner::new().with_expires_in(expires_in).sign(
                    &ctx,
                    &mut req.headers,
                    &query,
                    UNSIGNED_PAYLOAD,
                    cred,
                )?;

                let path_and_query = format!("{}?{}", req.uri.path(), presigned.apply_to(&query));
                let mut parts = mem::take(&mut req.uri).into_parts();
                parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
                req.uri = Uri::from_parts(parts)?;
            }
        }

        Ok(())
    }
}
