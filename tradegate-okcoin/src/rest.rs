//! OKCoin signed REST client.
//!
//! Builds canonical, signed POST requests and parses timestamped JSON
//! responses.
//!
//! # Authentication
//!
//! OKCoin signs requests with an uppercase-hex MD5 digest:
//! - every parameter except `sign` itself, sorted lexicographically,
//!   joined as `key=value` pairs with `&`
//! - `&secret_key=<shared secret>` appended
//! - MD5 of that byte string, hex-encoded, uppercased
//!
//! The signature must match the exchange byte-for-byte or every
//! authenticated call is rejected; it is the single most
//! compatibility-critical function in this crate.

use chrono::Utc;
use md5::{Digest, Md5};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::error;

use tradegate_domain::Timestamped;
use tradegate_gateway::{GatewayError, GatewayResult};

/// Parameter carrying the request signature. Excluded from the signing input.
const SIGN_FIELD: &str = "sign";

/// Parameter carrying the partner (account) identifier.
const PARTNER_FIELD: &str = "partner";

/// Compute the request signature over a sorted parameter map.
///
/// Pure and deterministic: `BTreeMap` iteration is lexicographic by key, so
/// insertion order never changes the result. A pre-existing `sign` entry is
/// ignored.
pub fn sign_request(params: &BTreeMap<String, String>, secret_key: &str) -> String {
    let joined = params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGN_FIELD)
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{}&secret_key={}", joined, secret_key);
    hex::encode_upper(Md5::digest(payload.as_bytes()))
}

/// OKCoin REST API client.
///
/// No retries and no timeouts at this layer: retry policy belongs to the
/// caller, and a failed send surfaces as a Rejected order, not a silent drop.
pub struct OkCoinRestClient {
    client: Client,
    base_url: String,
    partner: String,
    secret_key: String,
}

impl OkCoinRestClient {
    /// Create a new REST client for the given endpoint and credentials.
    pub fn new(base_url: String, partner: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            partner,
            secret_key,
        }
    }

    /// Send a signed, form-encoded POST to `<base>/<action>`.
    ///
    /// Adds the `partner` and `sign` fields before transmission and captures
    /// a receipt timestamp when the response arrives.
    ///
    /// # Errors
    ///
    /// - `Transport` on any I/O failure
    /// - `Protocol` when the response body is not JSON (logged with the raw
    ///   body and the action name for diagnosis)
    pub async fn post(
        &self,
        action: &str,
        mut params: BTreeMap<String, String>,
    ) -> GatewayResult<Timestamped<Value>> {
        params.insert(PARTNER_FIELD.to_string(), self.partner.clone());
        let signature = sign_request(&params, &self.secret_key);
        params.insert(SIGN_FIELD.to_string(), signature);

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), action);

        // .form() serializes the map as application/x-www-form-urlencoded
        // and sets the content type accordingly
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let time = Utc::now();

        match serde_json::from_str::<Value>(&body) {
            Ok(data) => Ok(Timestamped::new(data, time)),
            Err(e) => {
                error!(action, body = %body, error = %e, "unparseable REST response");
                Err(GatewayError::Protocol(format!(
                    "unparseable response from {}: {}",
                    action, e
                )))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_signature_is_uppercase_hex_md5() {
        let sig = sign_request(&params(&[("symbol", "btc_usd")]), "secret");

        assert_eq!(sig.len(), 32);
        assert!(sig
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_known_vector() {
        // MD5("partner=12345&symbol=btc_usd&secret_key=secret"), uppercased
        let sig = sign_request(
            &params(&[("partner", "12345"), ("symbol", "btc_usd")]),
            "secret",
        );
        assert_eq!(sig, "CF64B9EB78E793D7EC52CF6CA6ABF217");
    }

    #[test]
    fn test_signature_independent_of_insertion_order() {
        let mut forward = BTreeMap::new();
        forward.insert("amount".to_string(), "1".to_string());
        forward.insert("price".to_string(), "100".to_string());
        forward.insert("symbol".to_string(), "btc_usd".to_string());

        let mut reverse = BTreeMap::new();
        reverse.insert("symbol".to_string(), "btc_usd".to_string());
        reverse.insert("price".to_string(), "100".to_string());
        reverse.insert("amount".to_string(), "1".to_string());

        assert_eq!(sign_request(&forward, "s"), sign_request(&reverse, "s"));
    }

    #[test]
    fn test_signature_excludes_sign_field_itself() {
        let without = params(&[("symbol", "btc_usd"), ("type", "buy")]);
        let mut with = without.clone();
        with.insert("sign".to_string(), "BOGUS".to_string());

        assert_eq!(sign_request(&without, "s"), sign_request(&with, "s"));
    }

    #[test]
    fn test_signature_depends_on_values_and_secret() {
        let base = params(&[("symbol", "btc_usd")]);
        let changed = params(&[("symbol", "ltc_usd")]);

        assert_ne!(sign_request(&base, "s"), sign_request(&changed, "s"));
        assert_ne!(sign_request(&base, "s"), sign_request(&base, "other"));
    }

    #[tokio::test]
    async fn test_post_transport_failure_is_transport_error() {
        // Nothing listens on this port; the request fails at connect time
        let client = OkCoinRestClient::new(
            "http://127.0.0.1:9".to_string(),
            "partner".to_string(),
            "secret".to_string(),
        );

        let err = client.post("trade.do", BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
