// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! S3 presigned upload URLs (AWS Signature Version 4, query auth).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::AwsConfig;

type HmacSha256 = Hmac<Sha256>;

/// How long a presigned URL stays valid.
pub const PRESIGN_EXPIRY_SECS: u64 = 15 * 60;

fn hmac(key: &[u8], data: &str) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Object key for an upload: `images/<uuid>.<ext>`.
pub fn upload_key(filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    let ext: String = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();
    if ext.is_empty() {
        format!("images/{id}")
    } else {
        format!("images/{id}.{ext}")
    }
}

/// One request to presign.
pub struct PresignRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Object key without the leading slash.
    pub key: &'a str,
    /// Headers the uploader must send, besides `host`.
    pub headers: &'a [(&'a str, &'a str)],
    pub region: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub now: DateTime<Utc>,
    pub expires_secs: u64,
}

/// Build a presigned URL.
pub fn presign_url(req: &PresignRequest<'_>) -> String {
    let amz_date = req.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = req.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/s3/aws4_request", req.region);

    let canonical_uri = format!(
        "/{}",
        req.key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    );

    let mut headers: Vec<(String, String)> = req
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    headers.push(("host".to_string(), req.host.to_string()));
    headers.sort();
    let signed_headers = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();

    let credential = format!("{}/{scope}", req.access_key);
    let mut query = [
        ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
        ("X-Amz-Credential", credential),
        ("X-Amz-Date", amz_date.clone()),
        ("X-Amz-Expires", req.expires_secs.to_string()),
        ("X-Amz-SignedHeaders", signed_headers.clone()),
    ]
    .into_iter()
    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
    .collect::<Vec<_>>();
    query.sort();
    let canonical_query = query.join("&");

    let canonical_request = format!(
        "{}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\nUNSIGNED-PAYLOAD",
        req.method
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_date = hmac(format!("AWS4{}", req.secret_key).as_bytes(), &date);
    let k_region = hmac(&k_date, req.region);
    let k_service = hmac(&k_region, "s3");
    let k_signing = hmac(&k_service, "aws4_request");
    let signature = hex::encode(hmac(&k_signing, &string_to_sign));

    format!(
        "https://{}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}",
        req.host
    )
}

/// Presigned PUT for `key` in the configured bucket.
pub fn presigned_put_url(
    aws: &AwsConfig,
    key: &str,
    content_type: &str,
    now: DateTime<Utc>,
) -> String {
    let host = format!("{}.s3.{}.amazonaws.com", aws.bucket, aws.region);
    presign_url(&PresignRequest {
        method: "PUT",
        host: &host,
        key,
        headers: &[("content-type", content_type)],
        region: &aws.region,
        access_key: &aws.access_key,
        secret_key: &aws.secret_key,
        now,
        expires_secs: PRESIGN_EXPIRY_SECS,
    })
}
