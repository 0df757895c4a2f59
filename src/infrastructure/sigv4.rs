// AWS Signature Version 4 request signing
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use sha2::{Digest, Sha256};

use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::infrastructure::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const AMZ_DATE: &str = "x-amz-date";
pub const SECURITY_TOKEN: &str = "x-amz-security-token";

fn hmac(key: &[u8], data: &str) -> ApiResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|err| ApiError::Configuration(format!("invalid signing key: {err}")))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// `kSigning` derived from the secret for one day, region and service.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> ApiResult<Vec<u8>> {
    let date_key = hmac(format!("AWS4{secret}").as_bytes(), date)?;
    let region_key = hmac(&date_key, region)?;
    let service_key = hmac(&region_key, service)?;
    hmac(&service_key, "aws4_request")
}

/// Path segments are encoded once more on top of the URL encoding.
fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &reqwest::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (urlencoding::encode(&k).into_owned(), urlencoding::encode(&v).into_owned()))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical request text and the signed header list. `headers` must be
/// lowercase names; they are sorted here.
pub fn canonical_request(
    method: &str,
    url: &reqwest::Url,
    headers: &[(String, String)],
    payload_hash: &str,
) -> (String, String) {
    let mut headers: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    headers.sort();
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let request = format!(
        "{method}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        canonical_uri(url.path()),
        canonical_query(url),
    );
    (request, signed_headers)
}

pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    )
}

fn host_header(url: &reqwest::Url) -> ApiResult<String> {
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::InvalidRequest(format!("request url {url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn header_value(value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| ApiError::InvalidRequest(format!("invalid header value: {err}")))
}

/// Adds the date, token and authorization headers to `request`.
pub fn sign_request(
    request: &mut reqwest::Request,
    credentials: &Credentials,
    region: &str,
    service: &str,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut headers = vec![
        ("host".to_string(), host_header(request.url())?),
        (AMZ_DATE.to_string(), amz_date.clone()),
    ];
    if let Some(content_type) = request.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        headers.push((CONTENT_TYPE.as_str().to_string(), content_type.to_string()));
    }
    if let Some(token) = &credentials.session_token {
        headers.push((SECURITY_TOKEN.to_string(), token.clone()));
    }

    let body = request.body().and_then(|b| b.as_bytes()).unwrap_or_default();
    let (canonical, signed_headers) = canonical_request(
        request.method().as_str(),
        request.url(),
        &headers,
        &sha256_hex(body),
    );
    let scope = format!("{date}/{region}/{service}/aws4_request");
    let key = signing_key(&credentials.secret_access_key, &date, region, service)?;
    let signature = hex::encode(hmac(&key, &string_to_sign(&amz_date, &scope, &canonical))?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );
    let request_headers = request.headers_mut();
    request_headers.insert(AMZ_DATE, header_value(&amz_date)?);
    if let Some(token) = &credentials.session_token {
        request_headers.insert(SECURITY_TOKEN, header_value(token)?);
    }
    request_headers.insert(AUTHORIZATION, header_value(&authorization)?);
    Ok(())
}
