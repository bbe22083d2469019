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

use crate::{Error, Params, Result};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet};

/// Content type of signed Query API bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Signing context for a Query API request.
///
/// The parameters are held as plain pairs until the signer canonicalizes
/// them, after which they are sorted and percent encoded in place.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// API action name, like `SendMessage`.
    pub action: String,
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme, `https` or `http`.
    pub scheme: String,
    /// Host without port.
    pub host: String,
    /// Port, always part of the signed string.
    pub port: u16,
    /// HTTP path.
    pub path: String,
    /// Query parameters.
    pub params: Vec<(String, String)>,
}

impl SigningRequest {
    /// Create a new POST signing request without parameters.
    pub fn new(
        action: impl Into<String>,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            method: Method::POST,
            scheme: scheme.into(),
            host: host.into(),
            port,
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Append all pairs from a parameter builder.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params.into_pairs());
        self
    }

    /// Push a new pair into the parameter list.
    #[inline]
    pub fn params_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// Get the first value of given key.
    pub fn params_get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sort the parameters by key in byte order.
    ///
    /// Returns a request invalid error if two parameters share the same key.
    pub fn params_sort_unique(&mut self) -> Result<()> {
        self.params.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        if let Some(w) = self.params.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(Error::request_invalid("duplicate parameter key")
                .with_context(format!("key: {}", w[0].0)));
        }
        Ok(())
    }

    /// Percent encode all keys and values with given set.
    pub fn params_encode(&mut self, set: &'static AsciiSet) {
        for (k, v) in self.params.iter_mut() {
            *k = utf8_percent_encode(k, set).to_string();
            *v = utf8_percent_encode(v, set).to_string();
        }
    }

    /// Join parameters into `k1=v1&k2=v2`.
    ///
    /// ```shell
    /// [(a, b), (c, d)] => "a=b&c=d"
    /// ```
    pub fn params_to_string(&self) -> String {
        let size = self
            .params
            .iter()
            .map(|(k, v)| k.len() + v.len() + 2)
            .sum::<usize>();

        let mut s = String::with_capacity(size);
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                s.push('&');
            }
            s.push_str(k);
            s.push('=');
            s.push_str(v);
        }
        s
    }

    /// Path used for signing, `/` if empty.
    pub fn path_or_root(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }

    /// Build the http request carrying the parameters as form body.
    ///
    /// Call this after signing, the parameters are taken as already encoded.
    pub fn into_form_request(self) -> Result<http::Request<Bytes>> {
        let uri = format!(
            "{}://{}:{}{}",
            self.scheme,
            self.host,
            self.port,
            self.path_or_root()
        );
        let body = self.params_to_string();

        let req = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Bytes::from(body))?;
        Ok(req)
    }
}
