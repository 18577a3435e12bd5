//! Allow-list check applied to every outbound provider URL.

use url::Url;

use crate::error::{Result, WeatherError};

pub const OPENWEATHER_DOMAIN: &str = "openweathermap.org";
pub const NWS_DOMAIN: &str = "api.weather.gov";

/// Which URLs the providers are permitted to request.
///
/// A host passes when it equals one of `allowed_hosts` or is a subdomain of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    allowed_hosts: Vec<String>,
    require_https: bool,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new([OPENWEATHER_DOMAIN, NWS_DOMAIN])
    }
}

impl UrlPolicy {
    pub fn new<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_hosts: allowed_hosts.into_iter().map(Into::into).collect(),
            require_https: true,
        }
    }

    /// Also accept plain `http`. Only meant for pointing providers at a local mock server.
    pub fn allow_http(mut self) -> Self {
        self.require_https = false;
        self
    }

    pub fn check(&self, url: &Url) -> Result<()> {
        let scheme_ok = match url.scheme() {
            "https" => true,
            "http" => !self.require_https,
            _ => false,
        };
        if !scheme_ok {
            return Err(WeatherError::invalid(format!(
                "URL must use HTTPS, got scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| WeatherError::invalid("URL has no host"))?;

        if self.host_allowed(host) {
            Ok(())
        } else {
            Err(WeatherError::invalid(format!("URL host not allowed: {host}")))
        }
    }

    /// Parse `raw` and run [`check`](Self::check) on it.
    pub fn parse(&self, raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|e| WeatherError::invalid(format!("invalid URL: {e}")))?;
        self.check(&url)?;
        Ok(url)
    }

    fn host_allowed(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_provider_domains() {
        let policy = UrlPolicy::default();
        assert!(policy.parse("https://api.openweathermap.org/geo/1.0/zip?zip=10001,US").is_ok());
        assert!(policy.parse("https://api.weather.gov/points/40.7501,-73.9996").is_ok());
        assert!(policy.parse("https://openweathermap.org/").is_ok());
    }

    #[test]
    fn rejects_plain_http() {
        let err = UrlPolicy::default()
            .parse("http://api.weather.gov/points/1,2")
            .unwrap_err();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn rejects_foreign_hosts() {
        let policy = UrlPolicy::default();
        for raw in [
            "https://example.com/data",
            "https://evilopenweathermap.org/data",
            "https://api.weather.gov.attacker.net/points",
            "ftp://api.weather.gov/points",
        ] {
            assert!(
                matches!(policy.parse(raw), Err(WeatherError::InvalidInput(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unparsable_url() {
        let err = UrlPolicy::default().parse("not a url").unwrap_err();
        assert!(err.to_string().contains("invalid URL"));
    }

    #[test]
    fn allow_http_still_enforces_hosts() {
        let policy = UrlPolicy::new(["127.0.0.1"]).allow_http();
        assert!(policy.parse("http://127.0.0.1:8080/points").is_ok());
        assert!(policy.parse("http://10.0.0.1/points").is_err());
    }
}
