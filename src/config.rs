//! Runtime settings read from the environment.
//!
//! The binary loads `.env` with `dotenvy` before calling [`Settings::from_env`].

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

use crate::notify::{AFRICASTALKING_URL, GatewayConfig};

const DEFAULT_SCHOOL_NAME: &str = "Paranga Secondary School";
const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub school_name: String,
    pub school_contact: String,
    pub records_dir: PathBuf,
    pub dispatch_log: PathBuf,
    pub sms_concurrency: usize,
    gateway_username: Option<String>,
    gateway_api_key: Option<String>,
    gateway_sender_id: Option<String>,
    gateway_url: String,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(var)
    }

    /// Builds settings from any key lookup, defaulting what is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let sms_concurrency = match lookup("SMS_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("SMS_CONCURRENCY must be a number, got {raw:?}"))?,
            None => DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            school_name: lookup("SCHOOL_NAME").unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()),
            school_contact: lookup("SCHOOL_CONTACT").unwrap_or_default(),
            records_dir: lookup("RECORDS_DIR")
                .unwrap_or_else(|| "records".to_string())
                .into(),
            dispatch_log: lookup("SMS_DISPATCH_LOG")
                .unwrap_or_else(|| "logs/sms_dispatch.csv".to_string())
                .into(),
            sms_concurrency,
            gateway_username: lookup("AFRICASTALKING_USERNAME"),
            gateway_api_key: lookup("AFRICASTALKING_API_KEY"),
            gateway_sender_id: lookup("AFRICASTALKING_SENDER_ID"),
            gateway_url: lookup("SMS_GATEWAY_URL").unwrap_or_else(|| AFRICASTALKING_URL.to_string()),
        })
    }

    /// Gateway credentials. Only commands that send SMS need them.
    pub fn gateway(&self) -> Result<GatewayConfig> {
        let username = self
            .gateway_username
            .clone()
            .ok_or_else(|| anyhow!("AFRICASTALKING_USERNAME must be set"))?;
        let api_key = self
            .gateway_api_key
            .clone()
            .ok_or_else(|| anyhow!("AFRICASTALKING_API_KEY must be set"))?;

        Ok(GatewayConfig {
            username,
            api_key,
            sender_id: self.gateway_sender_id.clone(),
            url: self.gateway_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.school_name, DEFAULT_SCHOOL_NAME);
        assert_eq!(settings.records_dir, PathBuf::from("records"));
        assert_eq!(settings.sms_concurrency, 5);
        assert!(settings.gateway().is_err());
    }

    #[test]
    fn test_gateway_from_env() {
        let settings = Settings::from_lookup(lookup(&[
            ("AFRICASTALKING_USERNAME", "paranga"),
            ("AFRICASTALKING_API_KEY", "secret"),
            ("SMS_CONCURRENCY", "8"),
        ]))
        .unwrap();
        let gateway = settings.gateway().unwrap();

        assert_eq!(gateway.username, "paranga");
        assert_eq!(gateway.url, AFRICASTALKING_URL);
        assert_eq!(gateway.sender_id, None);
        assert_eq!(settings.sms_concurrency, 8);
    }

    #[test]
    fn test_bad_concurrency() {
        assert!(Settings::from_lookup(lookup(&[("SMS_CONCURRENCY", "many")])).is_err());
    }
}
