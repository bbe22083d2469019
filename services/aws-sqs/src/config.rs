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
use querysign_core::time::{parse_rfc3339, DateTime};
use querysign_core::Context;

/// Config carries all the configuration for the SQS client.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// `region` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`], then [`AWS_DEFAULT_REGION`]
    /// - default to `us-east-1`
    pub region: Option<String>,
    /// `host` overrides the regional endpoint `sqs.{region}.amazonaws.com`.
    pub host: Option<String>,
    /// `path` of the endpoint, default to `/`.
    pub path: Option<String>,
    /// `port` of the endpoint, default to `443`.
    pub port: Option<u16>,
    /// `scheme` of the endpoint, default to `https`.
    pub scheme: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// `credentials_expire_at` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_CREDENTIALS_EXPIRE_AT`] in RFC 3339
    pub credentials_expire_at: Option<DateTime>,
}

impl Config {
    /// Load config from env.
    ///
    /// Fields that are already set are kept.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx
            .env_var(AWS_REGION)
            .or_else(|| ctx.env_var(AWS_DEFAULT_REGION))
        {
            self.region.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_SECRET_ACCESS_KEY) {
            self.secret_access_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_SESSION_TOKEN) {
            self.session_token.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_CREDENTIALS_EXPIRE_AT) {
            match parse_rfc3339(&v) {
                Ok(t) => {
                    self.credentials_expire_at.get_or_insert(t);
                }
                Err(e) => log::warn!("ignore invalid {AWS_CREDENTIALS_EXPIRE_AT}: {e}"),
            }
        }

        self
    }

    /// Region in use, falling back to `us-east-1`.
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}
