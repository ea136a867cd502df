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

use crate::constants::*;
use crate::{ChunkedBody, ChunkedSigner, Credential, RequestSigner, SigningContext};
use http::{Method, Uri};
use ini::Ini;
use log::debug;
use s3sign_core::{Context, Error, Result};
use std::io::Read;

/// Config for the signer.
///
/// Values are layered: defaults first, then [`Config::from_env`], then
/// [`Config::from_profile`]. Fields already set are only replaced by a later
/// layer that carries a value.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub struct Config {
    /// `config_file` will be load from:
    ///
    /// - env value: [`AWS_CONFIG_FILE`]
    /// - default to: `~/.aws/config`
    pub config_file: String,
    /// `shared_credentials_file` will be loaded from:
    ///
    /// - env value: [`AWS_SHARED_CREDENTIALS_FILE`]
    /// - default to: `~/.aws/credentials`
    pub shared_credentials_file: String,
    /// `profile` will be loaded from:
    ///
    /// - env value: [`AWS_PROFILE`]
    /// - default to: `default`
    pub profile: String,

    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    /// - profile config: `region`
    pub region: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    /// - profile config: `aws_access_key_id`
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    /// - profile config: `aws_secret_access_key`
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    /// - profile config: `aws_session_token`
    pub session_token: Option<String>,
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ENDPOINT_URL`]
    /// - profile config: `endpoint_url`
    pub endpoint: Option<String>,
    /// `chunk_size` of chunked uploads will be loaded from
    ///
    /// - env value: [`S3SIGN_CHUNK_SIZE`]
    /// - default to 64 KiB
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: "~/.aws/config".to_string(),
            shared_credentials_file: "~/.aws/credentials".to_string(),
            profile: "default".to_string(),
            region: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load config from env.
    ///
    /// An unparsable or zero [`S3SIGN_CHUNK_SIZE`] keeps the current chunk
    /// size.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();
        let get = |key: &str| envs.get(key).cloned();

        if let Some(v) = get(AWS_CONFIG_FILE) {
            self.config_file = v;
        }
        if let Some(v) = get(AWS_SHARED_CREDENTIALS_FILE) {
            self.shared_credentials_file = v;
        }
        if let Some(v) = get(AWS_PROFILE) {
            self.profile = v;
        }
        self.region = get(AWS_REGION).or(self.region);
        self.access_key_id = get(AWS_ACCESS_KEY_ID).or(self.access_key_id);
        self.secret_access_key = get(AWS_SECRET_ACCESS_KEY).or(self.secret_access_key);
        self.session_token = get(AWS_SESSION_TOKEN).or(self.session_token);
        self.endpoint = get(AWS_ENDPOINT_URL).or(self.endpoint);

        if let Some(v) = get(S3SIGN_CHUNK_SIZE) {
            match v.parse::<usize>() {
                Ok(size) if size > 0 => self.chunk_size = size,
                _ => debug!("ignore invalid {S3SIGN_CHUNK_SIZE}: {v}"),
            }
        }
        self
    }

    /// Load config from profile (and shared profile).
    ///
    /// [`AWS_PROFILE`], [`AWS_CONFIG_FILE`] and
    /// [`AWS_SHARED_CREDENTIALS_FILE`] override the fields of `self` before
    /// the files are read.
    pub fn from_profile(mut self, ctx: &Context) -> Self {
        if let Some(profile) = ctx.env_var(AWS_PROFILE) {
            self.profile = profile;
        }
        if let Some(path) = ctx.env_var(AWS_CONFIG_FILE) {
            self.config_file = path;
        }
        if let Some(path) = ctx.env_var(AWS_SHARED_CREDENTIALS_FILE) {
            self.shared_credentials_file = path;
        }

        self.load_profile(ctx)
    }

    /// Load `self.profile` from `self.config_file` and
    /// `self.shared_credentials_file` without looking at the environment.
    ///
    /// Values in the shared credentials file win over the config file. A
    /// missing file or section is not an error.
    pub fn load_profile(mut self, ctx: &Context) -> Self {
        let section = match self.profile.as_str() {
            "default" => "default".to_string(),
            name => format!("profile {name}"),
        };
        let config_file = self.config_file.clone();
        if let Err(err) = self.load_section(ctx, &config_file, &section, true) {
            debug!("skip config file {config_file}: {err}");
        }

        let section = self.profile.clone();
        let credentials_file = self.shared_credentials_file.clone();
        if let Err(err) = self.load_section(ctx, &credentials_file, &section, false) {
            debug!("skip shared credentials file {credentials_file}: {err}");
        }

        self
    }

    /// Build a credential from the loaded keys.
    ///
    /// Returns `None` unless both the access key id and the secret access key
    /// are present and non-empty.
    pub fn credential(&self) -> Option<Credential> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty() => Some(Credential {
                access_key_id: ak.clone(),
                secret_access_key: sk.clone(),
                session_token: self.session_token.clone(),
                expires_in: None,
            }),
            _ => None,
        }
    }

    /// Build a [`RequestSigner`] for `service` in the configured region.
    pub fn request_signer(&self, service: &str) -> Result<RequestSigner> {
        Ok(RequestSigner::new(service, self.require_region()?))
    }

    /// Build a [`SigningContext`] for `path` on the configured endpoint.
    ///
    /// `path` may carry a query, which is ignored by the context.
    pub fn signing_context(
        &self,
        method: Method,
        path: &str,
        service: &str,
    ) -> Result<SigningContext> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::config_invalid("endpoint is required"))?;
        let uri = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let uri = uri.parse::<Uri>().map_err(|e| {
            Error::config_invalid(format!("endpoint {endpoint} with path {path} is invalid"))
                .with_source(e)
        })?;

        SigningContext::new(method, &uri, self.require_region()?, service)
    }

    /// Stream `reader` through `signer` in chunks of the configured size.
    pub fn chunked_body<R: Read>(&self, signer: ChunkedSigner, reader: R) -> Result<ChunkedBody<R>> {
        ChunkedBody::new(signer, reader, self.chunk_size)
    }

    fn require_region(&self) -> Result<&str> {
        self.region
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid("region is required"))
    }

    /// Apply the keys of `[section]` in the INI file at `path`.
    ///
    /// The shared credentials file only carries the three credential keys,
    /// `with_settings` also picks up `region` and `endpoint_url`.
    fn load_section(
        &mut self,
        ctx: &Context,
        path: &str,
        section: &str,
        with_settings: bool,
    ) -> Result<()> {
        let path = ctx
            .expand_home_dir(path)
            .ok_or_else(|| Error::config_invalid(format!("cannot expand home dir in {path}")))?;
        let content = ctx.file_read_as_string(&path)?;
        let ini = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid(format!("{path} is not a valid ini file")).with_source(e)
        })?;
        let props = ini
            .section(Some(section))
            .ok_or_else(|| Error::config_invalid(format!("section [{section}] not found")))?;
        let get = |key: &str| props.get(key).map(str::to_string);

        if with_settings {
            self.region = get("region").or(self.region.take());
            self.endpoint = get("endpoint_url").or(self.endpoint.take());
        }
        self.access_key_id = get("aws_access_key_id").or(self.access_key_id.take());
        self.secret_access_key = get("aws_secret_access_key").or(self.secret_access_key.take());
        self.session_token = get("aws_session_token").or(self.session_token.take());

        Ok(())
    }
}
