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

use crate::provide_credential::{EnvCredentialProvider, StaticCredentialProvider};
use crate::{Config, Credential};
use async_trait::async_trait;
use querysign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider is a loader that will try to load credential via default chains.
///
/// Resolution order:
///
/// 1. Keys set in [`Config`], if built with [`DefaultCredentialProvider::from_config`]
/// 2. Environment variables
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` reading environment variables only.
    pub fn new() -> Self {
        let chain = ProvideCredentialChain::new().push(EnvCredentialProvider::new());

        Self { chain }
    }

    /// Create a provider that prefers the static keys carried by config.
    pub fn from_config(config: &Config) -> Self {
        let mut chain = ProvideCredentialChain::new();

        if let (Some(ak), Some(sk)) = (&config.access_key_id, &config.secret_access_key) {
            let mut provider = StaticCredentialProvider::new(ak, sk);
            if let Some(token) = &config.session_token {
                provider = provider.with_session_token(token);
            }
            if let Some(expires_in) = config.credentials_expire_at {
                provider = provider.with_expires_in(expires_in);
            }
            chain = chain.push(provider);
        }

        Self {
            chain: chain.push(EnvCredentialProvider::new()),
        }
    }

    /// Create with a custom credential chain.
    pub fn with_chain(chain: ProvideCredentialChain<Credential>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}
