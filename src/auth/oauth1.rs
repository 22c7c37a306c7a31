//! OAuth 1.0a HMAC-SHA1 request signing for the Twitter v1.1 API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use url::Url;

use crate::auth::credentials::Credentials;

/// RFC 3986 unreserved characters (ALPHA / DIGIT / "-" / "." / "_" / "~")
/// must NOT be encoded, everything else must be.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
    use rand::RngExt;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn generate_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
        .to_string()
}

/// Build the signature base string: uppercase method, the URL stripped of
/// its query string, and the sorted, encoded parameter list.
fn signature_base(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut params: Vec<&(String, String)> = params.iter().collect();
    params.sort();

    let param_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let base_url = match Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or(""),
            parsed.path()
        ),
        Err(_) => url.to_string(),
    };

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&param_string),
    )
}

/// Sign a request with a pinned nonce and timestamp. Split out from
/// [`authorization_header`] so the deterministic part is testable.
fn build_header(
    method: &str,
    url: &str,
    creds: &Credentials,
    nonce: String,
    timestamp: String,
) -> String {
    let mut oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), creds.consumer_key.clone()),
        ("oauth_nonce".into(), nonce),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), timestamp),
        ("oauth_token".into(), creds.access_token.clone()),
        ("oauth_version".into(), "1.0".into()),
    ];

    // The signature base covers the oauth params plus the URL's query pairs.
    let mut all_params = oauth_params.clone();
    if let Ok(parsed) = Url::parse(url) {
        for (k, v) in parsed.query_pairs() {
            all_params.push((k.into_owned(), v.into_owned()));
        }
    }

    let base_string = signature_base(method, url, &all_params);

    let signing_key = format!(
        "{}&{}",
        percent_encode(&creds.consumer_secret),
        percent_encode(&creds.access_secret),
    );

    let mut mac =
        Hmac::<Sha1>::new_from_slice(signing_key.as_bytes()).expect("HMAC accepts any key size");
    mac.update(base_string.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    oauth_params.push(("oauth_signature".into(), signature));
    oauth_params.sort();

    let header_parts: String = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {header_parts}")
}

/// Generate an OAuth 1.0a `Authorization` header value for a request.
///
/// Query parameters are extracted from `url` and included in the signature
/// base automatically, so requests must carry their parameters in the URL.
pub fn authorization_header(method: &str, url: &str, creds: &Credentials) -> String {
    build_header(method, url, creds, generate_nonce(), generate_timestamp())
}
