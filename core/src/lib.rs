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

//! Core components for signing S3 requests.
//!
//! This crate provides the service-independent building blocks used by the
//! signers in this workspace.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading and environment access
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and credential validation (`SigningCredential`)
//! - **Error**: A single error type carrying an [`ErrorKind`] shared by every crate in the workspace
//!
//! ## Example
//!
//! ```
//! use s3sign_core::{Context, ProvideCredential, Result, SigningCredential, StaticEnv};
//! use std::collections::HashMap;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//!     secret: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty() && !self.secret.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyLoader;
//!
//! impl ProvideCredential for MyLoader {
//!     type Credential = MyCredential;
//!
//!     fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
//!         let (Some(key), Some(secret)) = (ctx.env_var("MY_KEY"), ctx.env_var("MY_SECRET")) else {
//!             return Ok(None);
//!         };
//!         Ok(Some(MyCredential { key, secret }))
//!     }
//! }
//!
//! let ctx = Context::new().with_env(StaticEnv {
//!     home_dir: None,
//!     envs: HashMap::from([
//!         ("MY_KEY".to_string(), "my-access-key".to_string()),
//!         ("MY_SECRET".to_string(), "my-secret-key".to_string()),
//!     ]),
//! });
//!
//! let cred = MyLoader.provide_credential(&ctx).unwrap().unwrap();
//! assert!(cred.is_valid());
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::{Context, Env, FileRead, OsEnv, OsFileRead, StaticEnv};

mod api;
pub use api::{ProvideCredential, SigningCredential};
