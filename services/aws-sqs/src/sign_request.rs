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
use crate::{Credential, Endpoint};
use log::debug;
use querysign_core::hash::base64_hmac_sha256;
use querysign_core::time::{format_iso8601, now, DateTime};
use querysign_core::{Error, Params, Result, SignRequest, SigningRequest};
use std::fmt::Write;

/// RequestSigner that implements AWS Signature Version 2 for Query APIs.
///
/// - [Signature Version 2 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-2.html)
///
/// Signing is a pure function of the parameters, the credential snapshot,
/// the endpoint and the signing time. It performs no I/O.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    version: String,

    time: Option<DateTime>,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSigner {
    /// Create a new signer speaking the default API version.
    pub fn new() -> Self {
        Self {
            version: SQS_API_VERSION.to_string(),

            time: None,
        }
    }

    /// Specify the API version sent as `Version`.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
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

    /// Sign `operation` with `params` and return the encoded query string.
    ///
    /// The returned string can be used both as `application/x-www-form-urlencoded`
    /// body and as query string.
    pub fn sign(
        &self,
        operation: &str,
        params: &Params,
        cred: &Credential,
        endpoint: &Endpoint,
    ) -> Result<String> {
        let mut req = endpoint
            .signing_request(operation, None)
            .with_params(params.clone());
        self.sign_request(&mut req, cred)?;
        Ok(req.params_to_string())
    }
}

impl SignRequest for RequestSigner {
    type Credential = Credential;

    fn sign_request(&self, req: &mut SigningRequest, cred: &Self::Credential) -> Result<()> {
        validate(req, cred)?;

        // Work on a copy so that a failure never leaves a half signed request.
        let mut signed_req = req.clone();
        let now = self.time.unwrap_or_else(now);

        // canonicalize context
        canonicalize_query(&mut signed_req, cred, &self.version, now)?;
        let signature_index = signed_req
            .params
            .partition_point(|(k, _)| k.as_bytes() < SIGNATURE.as_bytes());
        signed_req.params_encode(&AWS_QUERY_ENCODE_SET);

        // StringToSign:
        //
        // POST
        // sqs.us-east-1.amazonaws.com:443
        // /
        // AWSAccessKeyId=...&Action=...
        let string_to_sign = string_to_sign(&signed_req)?;
        debug!("calculated string to sign: {string_to_sign}");

        let signature =
            base64_hmac_sha256(cred.secret_access_key.as_bytes(), string_to_sign.as_bytes());

        let encoded = percent_encoding::utf8_percent_encode(&signature, &AWS_QUERY_ENCODE_SET);
        signed_req
            .params
            .insert(signature_index, (SIGNATURE.to_string(), encoded.to_string()));

        *req = signed_req;
        Ok(())
    }
}

fn validate(req: &SigningRequest, cred: &Credential) -> Result<()> {
    if req.action.is_empty() {
        return Err(Error::request_invalid("operation name must not be empty"));
    }
    if cred.access_key_id.is_empty() {
        return Err(Error::request_invalid("access key id is required for signing"));
    }
    if cred.secret_access_key.is_empty() {
        return Err(Error::request_invalid(
            "secret access key is required for signing",
        ));
    }

    for (k, v) in &req.params {
        if k.is_empty() {
            return Err(Error::request_invalid("parameter key must not be empty"));
        }
        if k == SIGNATURE {
            return Err(Error::request_invalid("parameter key is reserved")
                .with_context(format!("key: {k}")));
        }
        check_transportable(k, k)?;
        check_transportable(k, v)?;
    }
    Ok(())
}

/// Reject characters outside of the XML 1.0 `Char` production, the service
/// can't carry them in requests nor echo them in responses.
fn check_transportable(key: &str, value: &str) -> Result<()> {
    let invalid = value.chars().find(|c| {
        !matches!(c,
            '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}')
    });

    match invalid {
        None => Ok(()),
        Some(c) => Err(
            Error::encoding_invalid("parameter contains a character that can't be transported")
                .with_context(format!("key: {key}"))
                .with_context(format!("character: U+{:04X}", c as u32)),
        ),
    }
}

fn canonicalize_query(
    ctx: &mut SigningRequest,
    cred: &Credential,
    version: &str,
    now: DateTime,
) -> Result<()> {
    let action = ctx.action.clone();
    ctx.params_push(ACTION, action);
    ctx.params_push(VERSION, version);
    ctx.params_push(TIMESTAMP, format_iso8601(now));
    ctx.params_push(AWS_ACCESS_KEY_ID_PARAM, cred.access_key_id.as_str());
    ctx.params_push(SIGNATURE_METHOD, HMAC_SHA256);
    ctx.params_push(SIGNATURE_VERSION, SIGNATURE_VERSION_2);
    if let Some(token) = &cred.session_token {
        ctx.params_push(SECURITY_TOKEN, token.as_str());
    }

    // Sort by param name, duplicated names are caller errors.
    ctx.params_sort_unique()
}

fn string_to_sign(ctx: &SigningRequest) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "{}", ctx.method)?;
    writeln!(f, "{}:{}", ctx.host.to_lowercase(), ctx.port)?;
    writeln!(f, "{}", ctx.path_or_root())?;
    write!(f, "{}", ctx.params_to_string())?;

    Ok(f)
}
