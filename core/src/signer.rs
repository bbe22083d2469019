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

use crate::{
    Context, Error, ProvideCredential, Result, SignRequest, SigningCredential, SigningRequest,
};
use log::debug;
use std::sync::{Arc, Mutex};

/// Signer is the main struct used to sign the request.
///
/// It keeps the last loaded credential as a snapshot. The snapshot is
/// reloaded through the provider once it is no longer valid, and every
/// request is signed with exactly one snapshot.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,

            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the context of this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Get a valid credential snapshot, loading a new one if needed.
    pub async fn credential(&self) -> Result<K> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if let Some(cred) = cached.filter(|c| c.is_valid()) {
            return Ok(cred);
        }

        debug!("credential is absent or no longer valid, loading a new one");
        let loaded = self.loader.provide_credential(&self.ctx).await?;
        if loaded.as_ref().is_some_and(|c| c.is_expired()) {
            return Err(Error::credential_expired(
                "credential from provider has expired",
            ));
        }
        let Some(cred) = loaded.filter(|c| c.is_valid()) else {
            return Err(Error::credential_invalid(
                "no valid credential found from provider",
            ));
        };

        *self.credential.lock().expect("lock poisoned") = Some(cred.clone());
        Ok(cred)
    }

    /// Signing request.
    pub async fn sign(&self, req: &mut SigningRequest) -> Result<()> {
        let cred = self.credential().await?;
        self.builder.sign_request(req, &cred)
    }
}
