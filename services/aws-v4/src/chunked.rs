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

//! Chunked upload signing (`STREAMING-AWS4-HMAC-SHA256-PAYLOAD`).
//!
//! - [Signature Calculations for the Authorization Header: Transferring Payload in Multiple Chunks](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html)
//!
//! The body of a chunked upload is a sequence of frames:
//!
//! ```text
//! <hex-size>;chunk-signature=<sig>\r\n
//! <chunk-data>\r\n
//! ...
//! 0;chunk-signature=<final-sig>\r\n
//! \r\n
//! ```
//!
//! The first chunk is chained to the seed signature of the request headers,
//! every later chunk to the signature of the chunk before it.

use crate::constants::*;
use crate::sign_header::HeaderSigner;
use crate::{Credential, SigningContext};
use bytes::{BufMut, Bytes, BytesMut};
use http::{header, HeaderMap, HeaderValue};
use log::debug;
use s3sign_core::hash::{hex_hmac_sha256, hex_sha256};
use s3sign_core::utils::Redact;
use s3sign_core::{Error, Result};
use std::fmt::{Debug, Formatter};
use std::io::{ErrorKind as IoErrorKind, Read};

/// Where a chunked upload session is in its signature chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No seed signature yet.
    Created,
    /// Seed signature computed, no chunk signed.
    Initialized,
    /// At least one data chunk signed.
    ChunkSigned,
    /// Terminating chunk signed; the session is closed.
    Terminated,
}

/// ChunkedSigner owns the signature chain of one chunked upload.
///
/// It is not `Clone`: one signer serves exactly one upload, and an aborted
/// upload needs a new signer with a fresh seed signature.
pub struct ChunkedSigner {
    ctx: SigningContext,
    state: ChunkState,
    last_signature: String,
    scope: String,
    date_time: String,
    signing_key: Vec<u8>,
    chunks_signed: u64,
}

impl Debug for ChunkedSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedSigner")
            .field("state", &self.state)
            .field("last_signature", &self.last_signature)
            .field("scope", &self.scope)
            .field("date_time", &self.date_time)
            .field("signing_key", &Redact::from(&self.signing_key))
            .field("chunks_signed", &self.chunks_signed)
            .finish()
    }
}

impl ChunkedSigner {
    /// Create a signer for one upload. The signing time of `ctx` is used
    /// for every chunk.
    pub fn new(ctx: &SigningContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ChunkState::Created,
            last_signature: String::new(),
            scope: String::new(),
            date_time: String::new(),
            signing_key: Vec::new(),
            chunks_signed: 0,
        }
    }

    /// Insert the headers a chunked upload of `decoded_length` bytes needs
    /// and return the framed content length.
    ///
    /// - `x-amz-content-sha256: STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    /// - `content-encoding: aws-chunked`
    /// - `x-amz-decoded-content-length: <decoded_length>`
    /// - `content-length: <framed length>`
    pub fn prepare_headers(
        headers: &mut HeaderMap,
        decoded_length: u64,
        chunk_size: u64,
    ) -> Result<u64> {
        let content_length = calculate_chunked_content_length(decoded_length, chunk_size)?;

        headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_static(STREAMING_PAYLOAD),
        );
        headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(AWS_CHUNKED),
        );
        headers.insert(
            X_AMZ_DECODED_CONTENT_LENGTH,
            HeaderValue::from(decoded_length),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));

        Ok(content_length)
    }

    /// Compute the seed signature and return the `Authorization` header value.
    ///
    /// The request is signed with the streaming payload placeholder, which is
    /// also written to `x-amz-content-sha256`.
    pub fn compute_signature(
        &mut self,
        headers: &mut HeaderMap,
        query: &str,
        cred: &Credential,
    ) -> Result<String> {
        if self.state != ChunkState::Created {
            return Err(Error::request_invalid(
                "seed signature of a chunked upload can only be computed once",
            ));
        }

        headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_static(STREAMING_PAYLOAD),
        );
        let signed = HeaderSigner::new().compute(
            &self.ctx,
            headers,
            query,
            STREAMING_PAYLOAD,
            cred,
        )?;
        debug!("calculated seed signature: {}", signed.signature);

        self.last_signature = signed.signature;
        self.scope = signed.scope;
        self.date_time = signed.date_time;
        self.signing_key = signed.signing_key;
        self.state = ChunkState::Initialized;

        Ok(signed.authorization)
    }

    /// Sign the next chunk. An empty `data` signs the terminating chunk.
    pub fn sign_chunk(&mut self, data: &[u8]) -> Result<String> {
        match self.state {
            ChunkState::Created => {
                return Err(Error::request_invalid(
                    "chunk signed before the seed signature is computed",
                ))
            }
            ChunkState::Terminated => {
                return Err(Error::request_invalid(
                    "chunk signed after the terminating chunk",
                ))
            }
            ChunkState::Initialized | ChunkState::ChunkSigned => {}
        }

        // StringToSign:
        //
        // AWS4-HMAC-SHA256-PAYLOAD
        // 20130524T000000Z
        // 20130524/us-east-1/s3/aws4_request
        // <previous_signature>
        // <hashed_empty_extensions>
        // <hashed_chunk_data>
        let string_to_sign = format!(
            "{CHUNK_ALGORITHM}\n{}\n{}\n{}\n{EMPTY_STRING_SHA256}\n{}",
            self.date_time,
            self.scope,
            self.last_signature,
            hex_sha256(data)
        );
        debug!("calculated chunk string to sign: {string_to_sign}");

        let signature = hex_hmac_sha256(&self.signing_key, string_to_sign.as_bytes());
        self.last_signature.clone_from(&signature);
        self.chunks_signed += 1;
        self.state = if data.is_empty() {
            ChunkState::Terminated
        } else {
            ChunkState::ChunkSigned
        };

        Ok(signature)
    }

    /// Sign the first `user_data_len` bytes of `buf` and frame them as one
    /// chunk. `user_data_len == 0` emits the terminating chunk.
    pub fn construct_signed_chunk(&mut self, user_data_len: usize, buf: &[u8]) -> Result<Bytes> {
        if user_data_len > buf.len() {
            return Err(Error::invalid_argument(format!(
                "chunk length {user_data_len} exceeds buffer of {} bytes",
                buf.len()
            )));
        }

        let data = &buf[..user_data_len];
        let signature = self.sign_chunk(data)?;

        let mut chunk = BytesMut::with_capacity(chunk_header_length(data.len() as u64) as usize);
        chunk.put_slice(format!("{:x}{CHUNK_SIGNATURE}{signature}{CLRF}", data.len()).as_bytes());
        chunk.put_slice(data);
        chunk.put_slice(CLRF.as_bytes());

        Ok(chunk.freeze())
    }

    /// Current state of the chain.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Signature the next chunk will be chained to.
    pub fn last_signature(&self) -> &str {
        &self.last_signature
    }

    /// Number of chunks signed so far, terminator included.
    pub fn chunks_signed(&self) -> u64 {
        self.chunks_signed
    }
}

/// Number of hex digits of `n`.
fn hex_len(n: u64) -> u64 {
    if n == 0 {
        1
    } else {
        u64::from((u64::BITS - n.leading_zeros()).div_ceil(4))
    }
}

/// Framed size of one chunk carrying `n` bytes of data.
///
/// `hex(n) + ";chunk-signature=" + <64 hex> + CRLF + data + CRLF`
pub fn chunk_header_length(n: u64) -> u64 {
    let overhead = hex_len(n) + CHUNK_SIGNATURE.len() as u64 + SIGNATURE_LENGTH + 2 * CLRF.len() as u64;
    n.saturating_add(overhead)
}

/// Total framed size of a chunked upload, terminator included.
///
/// Both lengths must be positive.
pub fn calculate_chunked_content_length(original_length: u64, chunk_size: u64) -> Result<u64> {
    if original_length == 0 {
        return Err(Error::invalid_argument(
            "original length of a chunked upload must be positive",
        ));
    }
    if chunk_size == 0 {
        return Err(Error::invalid_argument(
            "chunk size of a chunked upload must be positive",
        ));
    }

    let full_chunks = original_length / chunk_size;
    let remainder = original_length % chunk_size;

    let overflow = || Error::invalid_argument("chunked content length overflows u64");
    let mut length = full_chunks
        .checked_mul(chunk_header_length(chunk_size))
        .ok_or_else(overflow)?;
    if remainder > 0 {
        length = length
            .checked_add(chunk_header_length(remainder))
            .ok_or_else(overflow)?;
    }

    length
        .checked_add(chunk_header_length(0))
        .ok_or_else(overflow)
}

/// ChunkedBody reads a source in `chunk_size` blocks and yields each block
/// as a signed frame, ending with the terminating chunk.
///
/// The signer must hold its seed signature. It is consumed, so the chain
/// cannot be continued elsewhere.
pub struct ChunkedBody<R> {
    signer: ChunkedSigner,
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R> Debug for ChunkedBody<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedBody")
            .field("signer", &self.signer)
            .field("chunk_size", &self.buf.len())
            .field("done", &self.done)
            .finish()
    }
}

impl<R: Read> ChunkedBody<R> {
    /// Create a body streaming `reader` through `signer`.
    pub fn new(signer: ChunkedSigner, reader: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_argument(
                "chunk size of a chunked upload must be positive",
            ));
        }
        if signer.state() != ChunkState::Initialized {
            return Err(Error::request_invalid(format!(
                "chunked body needs a freshly seeded signer, got {:?}",
                signer.state()
            )));
        }

        Ok(Self {
            signer,
            reader,
            buf: vec![0; chunk_size],
            done: false,
        })
    }

    /// The signer driving this body.
    pub fn signer(&self) -> &ChunkedSigner {
        &self.signer
    }

    /// Fill the buffer until it is full or the reader is exhausted.
    fn fill_buf(&mut self) -> Result<usize> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for ChunkedBody<R> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let n = match self.fill_buf() {
            Ok(n) => n,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        if n == 0 {
            self.done = true;
        }

        Some(self.signer.construct_signed_chunk(n, &self.buf))
    }
}
