use reqwest::{Client, StatusCode, header::USER_AGENT, redirect};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    error::{Result, WeatherError},
    policy::UrlPolicy,
};

const MAX_REDIRECTS: usize = 10;

/// HTTP client whose redirect hops are held to the same `policy` as the
/// first request.
pub(crate) fn client(policy: &UrlPolicy) -> Result<Client> {
    let policy = policy.clone();
    Client::builder()
        .redirect(redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                return attempt.error("too many redirects");
            }
            let verdict = policy.check(attempt.url());
            match verdict {
                Ok(()) => attempt.follow(),
                Err(e) => attempt.error(e),
            }
        }))
        .build()
        .map_err(|e| WeatherError::upstream(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and decode a JSON body, after checking it against `policy`.
///
/// Anything other than `200 OK` is an upstream error. `what` names the call in
/// error messages. Credentials travel in query strings, so URLs are kept out of
/// both logs and error text.
pub(crate) async fn get_json<T>(
    http: &Client,
    policy: &UrlPolicy,
    url: Url,
    user_agent: Option<&str>,
    what: &str,
) -> Result<T>
where
    T: DeserializeOwned,
{
    policy.check(&url)?;
    tracing::debug!(what, host = url.host_str().unwrap_or_default(), path = url.path(), "GET");

    let mut request = http.get(url);
    if let Some(agent) = user_agent {
        request = request.header(USER_AGENT, agent);
    }

    let res = request.send().await.map_err(|e| match rejected_redirect(&e) {
        Some(reason) => WeatherError::invalid(format!("{what} redirect rejected: {reason}")),
        None => WeatherError::upstream(format!("failed to send {what} request: {}", e.without_url())),
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| {
        WeatherError::upstream(format!("failed to read {what} response body: {}", e.without_url()))
    })?;

    if status != StatusCode::OK {
        return Err(WeatherError::upstream(format!(
            "{what} request failed with status {status}: {}",
            truncate_body(&body)
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| WeatherError::upstream(format!("failed to parse {what} JSON: {e}")))
}

/// Reason the redirect policy refused a hop, if that is why `err` happened.
fn rejected_redirect(err: &reqwest::Error) -> Option<String> {
    if !err.is_redirect() {
        return None;
    }
    match std::error::Error::source(err)?.downcast_ref::<WeatherError>()? {
        WeatherError::InvalidInput(reason) => Some(reason.clone()),
        _ => None,
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
