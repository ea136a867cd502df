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

use crate::canonical::scope;
use http::uri::Scheme;
use http::{Method, Uri};
use s3sign_core::time::{format_iso8601, now, DateTime};
use s3sign_core::{Error, Result};

/// SigningContext carries everything about a request that ends up in its
/// signature, except the headers, the query and the payload.
///
/// The signing time is captured once. Every signature computed from the same
/// context, including every chunk of a chunked upload, shares that time.
#[derive(Debug, Clone)]
pub struct SigningContext {
    method: Method,
    scheme: Option<Scheme>,
    host: String,
    port: Option<u16>,
    path: String,
    region: String,
    service: String,
    time: DateTime,
}

impl SigningContext {
    /// Create a context for `method uri`, capturing the current time.
    ///
    /// Only the scheme, host, port and path of `uri` are used. The query is
    /// passed to the signers separately.
    pub fn new(method: Method, uri: &Uri, region: &str, service: &str) -> Result<Self> {
        let host = uri
            .host()
            .ok_or_else(|| Error::request_invalid("request without host is invalid for signing"))?;

        Ok(Self {
            method,
            scheme: uri.scheme().cloned(),
            host: host.to_string(),
            port: uri.port_u16(),
            path: uri.path().to_string(),
            region: region.to_string(),
            service: service.to_string(),
            time: now(),
        })
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = time;
        self
    }

    /// HTTP method of the request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Host of the endpoint, without port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port of the endpoint if the uri carries one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path of the request, as given by the caller.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Region of the endpoint: `us-east-1`.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Service name: `s3`.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Time of signing.
    pub fn time(&self) -> DateTime {
        self.time
    }

    /// Time of signing in ISO8601 basic format: `20130524T000000Z`.
    pub fn date_time(&self) -> String {
        format_iso8601(self.time)
    }

    /// Credential scope: `20130524/us-east-1/s3/aws4_request`.
    pub fn scope(&self) -> String {
        scope(self.time, &self.region, &self.service)
    }

    /// Value of the `host` header.
    ///
    /// The port is omitted when it is the default port of the scheme.
    pub fn host_header(&self) -> String {
        let default_port = match self.scheme.as_ref().map(|s| s.as_str()) {
            Some("http") => Some(80),
            Some("https") => Some(443),
            _ => None,
        };

        match self.port {
            Some(port) if Some(port) != default_port => format!("{}:{port}", self.host),
            _ => self.host.clone(),
        }
    }
}
