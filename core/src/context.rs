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

use crate::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Context is the only way credential providers and config loaders reach
/// the outside world.
///
/// A fresh context can neither read files nor see environment variables.
/// Plug in [`OsFileRead`] and [`OsEnv`] for real use, or [`StaticEnv`] in
/// tests.
///
/// ```
/// use s3sign_core::{Context, OsEnv, OsFileRead};
///
/// let ctx = Context::new().with_file_read(OsFileRead).with_env(OsEnv);
/// ```
#[derive(Clone, Debug)]
pub struct Context {
    fs: Arc<dyn FileRead>,
    env: Arc<dyn Env>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with nothing plugged in.
    pub fn new() -> Self {
        Context {
            fs: Arc::new(Unconfigured),
            env: Arc::new(Unconfigured),
        }
    }

    /// Use `fs` to read profile files.
    pub fn with_file_read(self, fs: impl FileRead) -> Self {
        Context {
            fs: Arc::new(fs),
            ..self
        }
    }

    /// Use `env` for variables and the home directory.
    pub fn with_env(self, env: impl Env) -> Self {
        Context {
            env: Arc::new(env),
            ..self
        }
    }

    /// Read a whole file.
    pub fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.fs.file_read(path)
    }

    /// Read a whole file as UTF-8.
    pub fn file_read_as_string(&self, path: &str) -> Result<String> {
        Ok(String::from_utf8(self.file_read(path)?)?)
    }

    /// Home directory of the current user, if known.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.env.home_dir()
    }

    /// Replace a leading `~/` (or `~\`) with the home directory.
    ///
    /// Returns `None` only when the path needs the home directory and none
    /// is known.
    pub fn expand_home_dir(&self, path: &str) -> Option<String> {
        match path.strip_prefix('~') {
            Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => self
                .home_dir()
                .map(|home| format!("{}{rest}", home.display())),
            _ => Some(path.to_string()),
        }
    }

    /// Value of `key`, if set and valid UTF-8.
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }

    /// Every variable visible through this context.
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env.vars()
    }
}

/// FileRead reads a file into memory.
pub trait FileRead: Debug + Send + Sync + 'static {
    /// Read the content of `path`.
    fn file_read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Env exposes environment variables and the home directory.
pub trait Env: Debug + Send + Sync + 'static {
    /// Value of `key`; `None` when unset or not UTF-8.
    fn var(&self, key: &str) -> Option<String>;

    /// All variables.
    fn vars(&self) -> HashMap<String, String>;

    /// Home directory of the current user.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// OsFileRead reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileRead;

impl FileRead for OsFileRead {
    fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        debug!("reading file: {path}");
        std::fs::read(path)
            .map_err(|e| Error::unexpected(format!("failed to read {path}")).with_source(e))
    }
}

/// OsEnv reads the environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// StaticEnv serves a fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Home directory to report.
    pub home_dir: Option<PathBuf>,
    /// Variables to report.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }

    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// Stand-in for both seams until the caller configures them.
#[derive(Debug)]
struct Unconfigured;

impl FileRead for Unconfigured {
    fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        Err(Error::unexpected(format!(
            "cannot read {path}: context has no file reader"
        )))
    }
}

impl Env for Unconfigured {
    fn var(&self, _: &str) -> Option<String> {
        None
    }

    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}
