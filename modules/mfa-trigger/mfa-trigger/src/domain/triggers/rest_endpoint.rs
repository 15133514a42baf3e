//! Trigger delegating the decision to an external policy endpoint.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use mfa_trigger_sdk::Event;
use tracing::{debug, warn};

use super::{TriggerInput, TriggerResolver, TriggerSupport};
use crate::config::{RestEndpointConfig, TriggerKind};
use crate::domain::DomainError;

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// POSTs `{"principalId", "serviceId"}` to the endpoint; a 200 body naming a
/// registered provider requires it.
///
/// Timeouts, transport errors, non-200 answers and unknown provider names are
/// all policy misses.
pub struct RestEndpointTrigger {
    endpoint: Option<Uri>,
    timeout: Duration,
    client: HttpClient,
    support: TriggerSupport,
}

impl RestEndpointTrigger {
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the TLS configuration is rejected.
    pub fn new(cfg: &RestEndpointConfig, support: TriggerSupport) -> anyhow::Result<Self> {
        let endpoint = cfg
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|raw| {
                let url = url::Url::parse(raw)
                    .map_err(|e| anyhow::anyhow!("invalid REST policy endpoint '{raw}': {e}"))?;
                url.as_str()
                    .parse::<Uri>()
                    .map_err(|e| anyhow::anyhow!("invalid REST policy endpoint '{raw}': {e}"))
            })
            .transpose()?;

        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::aws_lc_rs::default_provider())?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            endpoint,
            timeout: cfg.timeout,
            client,
            support,
        })
    }

    async fn call(&self, endpoint: &Uri, body: Vec<u8>) -> Result<Option<String>, DomainError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/plain, application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| DomainError::PolicyEndpoint(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| DomainError::PolicyEndpoint(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "Policy endpoint returned no decision");
            return Ok(None);
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| DomainError::PolicyEndpoint(e.to_string()))?
            .to_bytes();
        Ok(Some(String::from_utf8_lossy(&body).trim().to_owned()))
    }
}

#[async_trait]
impl TriggerResolver for RestEndpointTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::RestEndpoint
    }

    #[tracing::instrument(skip_all, fields(endpoint))]
    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Ok(None);
        };
        tracing::Span::current().record("endpoint", tracing::field::display(endpoint));

        let body = serde_json::to_vec(&serde_json::json!({
            "principalId": input.authentication.principal().id,
            "serviceId": input.ctx.service().map(|s| s.id.as_str()),
        }))?;

        let answer = tokio::select! {
            () = input.ctx.cancellation().cancelled() => {
                debug!("Request cancelled before the policy endpoint answered");
                return Ok(None);
            }
            answer = tokio::time::timeout(self.timeout, self.call(endpoint, body)) => answer,
        };

        let provider_name = match answer {
            Ok(Ok(Some(name))) if !name.is_empty() => name,
            Ok(Ok(_)) => return Ok(None),
            Ok(Err(e)) => {
                warn!(error = %e, "Policy endpoint call failed, treating as no opinion");
                return Ok(None);
            }
            Err(_) => {
                warn!(timeout = %humantime::format_duration(self.timeout), "Policy endpoint timed out, treating as no opinion");
                return Ok(None);
            }
        };

        let Some(provider) = self
            .support
            .registry
            .all_providers()
            .into_values()
            .find(|p| p.matches(&provider_name))
        else {
            debug!(provider = %provider_name, "Policy endpoint named an unknown provider");
            return Ok(None);
        };
        self.support.verify_and_build(&provider, input).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use httpmock::prelude::*;
    use mfa_trigger_sdk::{Authentication, Principal, ResolutionContext, Service};
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    use super::*;
    use crate::domain::provider_registry::tests::FakeProvider;
    use crate::domain::triggers::tests::support;

    fn trigger(url: String, timeout: Duration) -> RestEndpointTrigger {
        RestEndpointTrigger::new(
            &RestEndpointConfig {
                url: Some(url),
                timeout,
            },
            support(vec![FakeProvider::new("mfa-duo").alias("duo").shared()]),
        )
        .unwrap()
    }

    async fn resolve(trigger: &RestEndpointTrigger, ctx: &ResolutionContext) -> Result<Option<Event>, DomainError> {
        let auth = Authentication::builder(Principal::new("casuser")).build();
        trigger
            .resolve(&TriggerInput {
                ctx,
                authentication: &auth,
                service: None,
            })
            .await
    }

    fn ctx() -> ResolutionContext {
        ResolutionContext::builder()
            .service(Service::new("https://portal.example.org"))
            .build()
    }

    #[tokio::test]
    async fn provider_named_by_endpoint_is_required() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/mfa")
                    .header("content-type", "application/json");
                then.status(200).body("duo\n");
            })
            .await;

        let event = resolve(&trigger(server.url("/mfa"), Duration::from_secs(2)), &ctx())
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;
        assert_eq!(event.provider_id(), Some("mfa-duo"));
    }

    #[tokio::test]
    async fn non_ok_and_unknown_answers_are_misses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/denied");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/unknown");
                then.status(200).body("mfa-yubikey");
            })
            .await;

        let denied = trigger(server.url("/denied"), Duration::from_secs(2));
        assert_eq!(resolve(&denied, &ctx()).await, Ok(None));

        let unknown = trigger(server.url("/unknown"), Duration::from_secs(2));
        assert_eq!(resolve(&unknown, &ctx()).await, Ok(None));
    }

    #[tokio::test]
    #[traced_test]
    async fn timeout_is_a_miss() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/slow");
                then.status(200).body("mfa-duo").delay(Duration::from_secs(2));
            })
            .await;

        let slow = trigger(server.url("/slow"), Duration::from_millis(100));
        assert_eq!(resolve(&slow, &ctx()).await, Ok(None));
        assert!(logs_contain("Policy endpoint timed out"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_miss() {
        let unreachable = trigger("http://127.0.0.1:9/mfa".to_owned(), Duration::from_secs(2));
        assert_eq!(resolve(&unreachable, &ctx()).await, Ok(None));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_call() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/slow");
                then.status(200).body("mfa-duo").delay(Duration::from_secs(5));
            })
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let ctx = ResolutionContext::builder().cancellation(token).build();
        let slow = trigger(server.url("/slow"), Duration::from_secs(10));
        assert_eq!(resolve(&slow, &ctx).await, Ok(None));
    }

    #[test]
    fn rejects_malformed_url() {
        let result = RestEndpointTrigger::new(
            &RestEndpointConfig {
                url: Some("not a url".to_owned()),
                timeout: Duration::from_secs(1),
            },
            support(vec![]),
        );
        assert!(result.is_err());
    }
}
