//! Presigned URLs
//!
//! `presign_url` appends `expires=<unix ts>` and then
//! `signature=<hex hmac-sha256>` computed over the URL as it stands after
//! adding `expires`. Both are inserted ahead of any `#fragment`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::error::{PersonaError, Result};
use crate::helpers::time::now_i64;
use crate::utils::constants::{DEFAULT_PRESIGN_TTL_SECS, EXPIRES_PARAM, SIGNATURE_PARAM};

type HmacSha256 = Hmac<Sha256>;

/// Sign `url` with `secret`; `expires` defaults to fifteen minutes from now.
pub fn presign_url(url: &str, secret: &str, expires: Option<i64>) -> Result<String> {
    if secret.is_empty() {
        return Err(PersonaError::InvalidArgument("no secret provided".to_string()));
    }
    if has_query_param(url, SIGNATURE_PARAM) {
        return Err(PersonaError::InvalidArgument(format!(
            "url already carries a '{}' parameter",
            SIGNATURE_PARAM
        )));
    }
    let expires = expires.unwrap_or_else(|| now_i64() + DEFAULT_PRESIGN_TTL_SECS);

    let with_expiry = append_query_param(url, EXPIRES_PARAM, &expires.to_string());
    let signature = hex::encode(mac_for(&with_expiry, secret)?.finalize().into_bytes());
    Ok(append_query_param(&with_expiry, SIGNATURE_PARAM, &signature))
}

pub fn is_presigned_url_valid(url: &str, secret: &str) -> bool {
    is_presigned_url_valid_at(url, secret, now_i64())
}

/// Same as [`is_presigned_url_valid`] against an explicit clock.
pub fn is_presigned_url_valid_at(url: &str, secret: &str, now: i64) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(parsed) = Url::parse(url) else {
        debug!(url, "presigned url is not parsable");
        return false;
    };

    let mut expires = None;
    let mut signature = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            EXPIRES_PARAM => expires = Some(value.into_owned()),
            SIGNATURE_PARAM => signature = Some(value.into_owned()),
            _ => {}
        }
    }
    let (Some(expires), Some(signature)) = (expires, signature) else {
        return false;
    };

    match expires.parse::<i64>() {
        Ok(expires) if expires >= now => {}
        _ => {
            debug!(url, "presigned url expired or carries a bad expiry");
            return false;
        }
    }

    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    let unsigned = remove_query_param(url, SIGNATURE_PARAM);
    match mac_for(&unsigned, secret) {
        Ok(mac) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

fn mac_for(message: &str, secret: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PersonaError::InvalidArgument(format!("unusable secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac)
}

fn split_fragment(url: &str) -> (&str, &str) {
    match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

fn append_query_param(url: &str, name: &str, value: &str) -> String {
    let (head, fragment) = split_fragment(url);
    let separator = if head.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}{}", head, separator, name, value, fragment)
}

fn query_pairs(url: &str) -> impl Iterator<Item = &str> {
    let (head, _) = split_fragment(url);
    head.split_once('?')
        .map(|(_, query)| query)
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
}

fn has_query_param(url: &str, name: &str) -> bool {
    query_pairs(url).any(|pair| pair.split('=').next() == Some(name))
}

fn remove_query_param(url: &str, name: &str) -> String {
    let (head, fragment) = split_fragment(url);
    let Some((path, query)) = head.split_once('?') else {
        return url.to_owned();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| pair.split('=').next() != Some(name))
        .collect();

    if kept.is_empty() {
        format!("{}{}", path, fragment)
    } else {
        format!("{}?{}{}", path, kept.join("&"), fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_EXPIRY: i64 = 1_234_567_890;

    fn expected_signature(message: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn presigning_is_deterministic() {
        let signed = presign_url("http://x/y?a=1", "k", Some(FIXED_EXPIRY)).unwrap();
        let signature = expected_signature("http://x/y?a=1&expires=1234567890", "k");
        assert_eq!(signed, format!("http://x/y?a=1&expires=1234567890&signature={}", signature));
        assert_eq!(signed, presign_url("http://x/y?a=1", "k", Some(FIXED_EXPIRY)).unwrap());
    }

    #[test]
    fn signed_url_validates_before_expiry() {
        let signed = presign_url("http://x/y?a=1", "k", Some(FIXED_EXPIRY)).unwrap();
        assert!(is_presigned_url_valid_at(&signed, "k", FIXED_EXPIRY - 10));
        assert!(is_presigned_url_valid_at(&signed, "k", FIXED_EXPIRY));
    }

    #[test]
    fn expired_url_is_rejected() {
        let signed = presign_url("http://x/y?a=1", "k", Some(FIXED_EXPIRY)).unwrap();
        assert!(!is_presigned_url_valid_at(&signed, "k", FIXED_EXPIRY + 1));
        // 2009 is long gone
        assert!(!is_presigned_url_valid(&signed, "k"));
    }

    #[test]
    fn tampering_is_rejected() {
        let signed = presign_url("http://x/y?a=1", "k", Some(FIXED_EXPIRY)).unwrap();
        let now = FIXED_EXPIRY - 10;

        let (head, last) = signed.split_at(signed.len() - 1);
        let tampered_sig = format!("{}{}", head, if last == "0" { "1" } else { "0" });
        assert!(!is_presigned_url_valid_at(&tampered_sig, "k", now));

        let tampered_param = signed.replace("a=1", "a=2");
        assert!(!is_presigned_url_valid_at(&tampered_param, "k", now));

        assert!(!is_presigned_url_valid_at(&signed, "other", now));
    }

    #[test]
    fn default_expiry_is_in_the_future() {
        let signed = presign_url("https://example.com/file.pdf", "secret", None).unwrap();
        assert!(signed.starts_with("https://example.com/file.pdf?expires="));
        assert!(is_presigned_url_valid(&signed, "secret"));
    }

    #[test]
    fn fragment_stays_last() {
        let signed = presign_url("http://x/y#section", "k", Some(FIXED_EXPIRY)).unwrap();
        assert!(signed.starts_with("http://x/y?expires=1234567890&signature="));
        assert!(signed.ends_with("#section"));
        assert!(is_presigned_url_valid_at(&signed, "k", FIXED_EXPIRY));
    }

    #[test]
    fn url_with_signature_parameter_is_refused() {
        assert!(matches!(
            presign_url("http://x/y?signature=abc", "k", Some(FIXED_EXPIRY)),
            Err(PersonaError::InvalidArgument(_))
        ));
        assert!(matches!(
            presign_url("http://x/y?a=1&signature#frag", "k", Some(FIXED_EXPIRY)),
            Err(PersonaError::InvalidArgument(_))
        ));
        // Only an exact parameter name counts.
        let signed = presign_url("http://x/y?signature_v=2", "k", Some(FIXED_EXPIRY)).unwrap();
        assert!(is_presigned_url_valid_at(&signed, "k", FIXED_EXPIRY - 90));
    }

    #[test]
    fn missing_parameters_or_secret_fail() {
        assert!(!is_presigned_url_valid_at("http://x/y?a=1&expires=99", "k", 0));
        assert!(!is_presigned_url_valid_at("http://x/y?a=1&signature=00", "k", 0));
        assert!(matches!(
            presign_url("http://x/y", "", None),
            Err(PersonaError::InvalidArgument(_))
        ));
    }
}
