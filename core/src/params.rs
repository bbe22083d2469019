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

/// FlattenParams turns a structured value into flat query parameters.
///
/// Implementations write their fields below `prefix`, for example a queue
/// attribute flattened at `Attribute.1` writes `Attribute.1.Name` and
/// `Attribute.1.Value`.
pub trait FlattenParams {
    /// Write this value into `params` below `prefix`.
    fn flatten_params(&self, prefix: &str, params: &mut Params);
}

impl FlattenParams for str {
    fn flatten_params(&self, prefix: &str, params: &mut Params) {
        params.insert(prefix, self);
    }
}

impl FlattenParams for String {
    fn flatten_params(&self, prefix: &str, params: &mut Params) {
        params.insert(prefix, self.as_str());
    }
}

impl<T: FlattenParams + ?Sized> FlattenParams for &T {
    fn flatten_params(&self, prefix: &str, params: &mut Params) {
        (**self).flatten_params(prefix, params)
    }
}

/// Params is the typed builder for Query API parameters.
///
/// Values are wire-ready strings, the signer does the percent encoding.
/// Insertion order does not matter and duplicated keys are kept as-is: the
/// signer sorts the final set and rejects duplicates.
///
/// ```
/// use querysign_core::Params;
///
/// let params = Params::new()
///     .with("QueueName", "orders")
///     .with_list("AttributeName", ["All"]);
///
/// assert_eq!(params.get("AttributeName.1"), Some("All"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter and return self, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an indexed list and return self, builder style.
    pub fn with_list<I>(mut self, prefix: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: FlattenParams,
    {
        self.insert_list(prefix, values);
        self
    }

    /// Insert a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Insert a parameter if value is `Some`.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Insert a raw byte value, which must be valid utf-8.
    pub fn insert_bytes(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        let value = String::from_utf8(value.into()).map_err(|e| {
            Error::encoding_invalid("parameter value is not valid utf-8")
                .with_source(e)
                .with_context(format!("key: {key}"))
        })?;

        self.insert(key, value);
        Ok(())
    }

    /// Insert a structured value below `prefix`.
    pub fn insert_struct(&mut self, prefix: &str, value: &impl FlattenParams) {
        value.flatten_params(prefix, self);
    }

    /// Insert an indexed list: `prefix.1`, `prefix.2`, ...
    ///
    /// Items that are structs themselves end up as `prefix.N.Field`.
    pub fn insert_list<I>(&mut self, prefix: &str, values: I)
    where
        I: IntoIterator,
        I::Item: FlattenParams,
    {
        for (idx, value) in values.into_iter().enumerate() {
            value.flatten_params(&format!("{prefix}.{}", idx + 1), self);
        }
    }

    /// Get the first value of given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of flat pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over flat pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Take the flat pairs out.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
