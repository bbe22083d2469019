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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Env values used in aws services.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_CREDENTIALS_EXPIRE_AT: &str = "AWS_CREDENTIALS_EXPIRE_AT";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

// Fixed query parameters added by the signer.
pub const ACTION: &str = "Action";
pub const VERSION: &str = "Version";
pub const TIMESTAMP: &str = "Timestamp";
pub const AWS_ACCESS_KEY_ID_PARAM: &str = "AWSAccessKeyId";
pub const SIGNATURE_METHOD: &str = "SignatureMethod";
pub const SIGNATURE_VERSION: &str = "SignatureVersion";
pub const SECURITY_TOKEN: &str = "SecurityToken";
pub const SIGNATURE: &str = "Signature";

pub const HMAC_SHA256: &str = "HmacSHA256";
pub const SIGNATURE_VERSION_2: &str = "2";

/// Query API version spoken by this client.
pub const SQS_API_VERSION: &str = "2009-02-01";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_PATH: &str = "/";

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/general/latest/gr/signature-version-2.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - Space is encoded as `%20`, never `+`.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
