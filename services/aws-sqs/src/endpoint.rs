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
use crate::Config;
use querysign_core::{Error, Result, SigningRequest};

/// Endpoint is the target of signed requests.
///
/// Host, path and port are also signing inputs: the same request signed for
/// a different endpoint yields a different signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// `https` or `http`.
    pub scheme: String,
    /// Host without port, like `sqs.us-east-1.amazonaws.com`.
    pub host: String,
    /// Port, always part of the signed string.
    pub port: u16,
    /// Default path for requests not addressed to a queue.
    pub path: String,
}

impl Endpoint {
    /// Create an endpoint for given host with default scheme, port and path.
    pub fn new(host: &str) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: host.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }

    /// Regional endpoint: `sqs.{region}.amazonaws.com`.
    pub fn for_region(region: &str) -> Self {
        Self::new(&format!("sqs.{region}.amazonaws.com"))
    }

    /// Build endpoint from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut endpoint = match &config.host {
            Some(host) => Self::new(host),
            None => Self::for_region(config.region()),
        };
        if endpoint.host.is_empty() {
            return Err(Error::config_invalid("endpoint host must not be empty"));
        }

        if let Some(scheme) = &config.scheme {
            if scheme != "https" && scheme != "http" {
                return Err(Error::config_invalid("endpoint scheme must be http or https")
                    .with_context(format!("scheme: {scheme}")));
            }
            endpoint.scheme = scheme.clone();
        }
        if let Some(port) = config.port {
            endpoint.port = port;
        }
        if let Some(path) = &config.path {
            endpoint.path = path.clone();
        }

        Ok(endpoint)
    }

    /// Start a signing request for `action` against this endpoint.
    ///
    /// `path` overrides the endpoint path, requests addressed to a queue use
    /// the path of the queue url.
    pub fn signing_request(&self, action: &str, path: Option<&str>) -> SigningRequest {
        SigningRequest::new(
            action,
            self.scheme.as_str(),
            self.host.as_str(),
            self.port,
            path.unwrap_or(&self.path),
        )
    }
}

/// Extract the path from a queue url.
///
/// `https://sqs.us-east-1.amazonaws.com/123456789012/orders` gives
/// `/123456789012/orders`.
pub fn queue_path(queue_url: &str) -> Result<String> {
    let uri: http::Uri = queue_url.parse().map_err(|e| {
        Error::request_invalid("queue url is invalid")
            .with_source(e)
            .with_context(format!("queue_url: {queue_url}"))
    })?;

    if uri.host().is_none() {
        return Err(Error::request_invalid("queue url must be absolute")
            .with_context(format!("queue_url: {queue_url}")));
    }

    let path = uri.path();
    if path.is_empty() || path == "/" {
        return Err(Error::request_invalid("queue url has no queue path")
            .with_context(format!("queue_url: {queue_url}")));
    }
    Ok(path.to_string())
}
