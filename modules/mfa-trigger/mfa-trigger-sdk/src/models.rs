//! Domain models for the `mfa_trigger` module.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use http::StatusCode;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::MfaTriggerError;

/// A released attribute value: either a scalar or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttributeValue {
    /// All values as a slice; a scalar is a one-element slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }

    /// `true` when there is no non-blank value to test.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().iter().all(|v| v.trim().is_empty())
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.as_slice().iter().any(|v| v == value)
    }

    /// Union of both values, keeping the order of first appearance.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut values = self.as_slice().to_vec();
        for value in other.as_slice() {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
        if values.len() == 1 {
            Self::Single(values.swap_remove(0))
        } else {
            Self::Multi(values)
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_owned).collect())
    }
}

/// Attribute map keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

fn merge_attributes(target: &mut Attributes, other: &Attributes) {
    for (name, value) in other {
        target
            .entry(name.clone())
            .and_modify(|current| *current = current.merge(value))
            .or_insert_with(|| value.clone());
    }
}

/// The authenticated identity plus released attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Principal {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// A non-fatal message attached to a successful handler (e.g. "password expiring").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl MessageDescriptor {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            default_message: None,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// Record of one credential-verification handler that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResult {
    pub handler_name: String,
    /// Provider whose factor this handler verified, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MessageDescriptor>,
}

impl HandlerResult {
    #[must_use]
    pub fn new(handler_name: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            provider_id: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn for_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: MessageDescriptor) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Outcome of one or more successful authentication transactions.
///
/// Immutable once built; [`Authentication::merge`] produces a new value in which
/// attributes and handler successes from both sides accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    principal: Principal,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    successes: Vec<HandlerResult>,
    authenticated_at: DateTime<Utc>,
}

impl Authentication {
    #[must_use]
    pub fn builder(principal: Principal) -> AuthenticationBuilder {
        AuthenticationBuilder {
            principal,
            attributes: Attributes::new(),
            successes: Vec::new(),
            authenticated_at: None,
        }
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Handler successes in the order they were recorded.
    #[must_use]
    pub fn successes(&self) -> &[HandlerResult] {
        &self.successes
    }

    #[must_use]
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.successes.iter().flat_map(|s| s.warnings.iter())
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Provider ids already satisfied by this authentication.
    ///
    /// Collected from handler successes bound to a provider and from the values of
    /// the authentication context attribute.
    #[must_use]
    pub fn satisfied_provider_ids(&self, context_attribute: &str) -> BTreeSet<&str> {
        let mut ids: BTreeSet<&str> = self
            .successes
            .iter()
            .filter_map(|s| s.provider_id.as_deref())
            .collect();
        if let Some(value) = self.attributes.get(context_attribute) {
            ids.extend(value.as_slice().iter().map(String::as_str));
        }
        ids
    }

    /// Combine with a later authentication of the same principal.
    ///
    /// Attributes are unioned, handler successes appended (identical records are
    /// kept once) and the authentication instant moves to the later of the two.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut principal = self.principal.clone();
        merge_attributes(&mut principal.attributes, &other.principal.attributes);

        let mut attributes = self.attributes.clone();
        merge_attributes(&mut attributes, &other.attributes);

        let mut successes = self.successes.clone();
        for success in &other.successes {
            if !successes.contains(success) {
                successes.push(success.clone());
            }
        }

        Self {
            principal,
            attributes,
            successes,
            authenticated_at: self.authenticated_at.max(other.authenticated_at),
        }
    }
}

pub struct AuthenticationBuilder {
    principal: Principal,
    attributes: Attributes,
    successes: Vec<HandlerResult>,
    authenticated_at: Option<DateTime<Utc>>,
}

impl AuthenticationBuilder {
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn success(mut self, result: HandlerResult) -> Self {
        self.successes.push(result);
        self
    }

    #[must_use]
    pub fn authenticated_at(mut self, at: DateTime<Utc>) -> Self {
        self.authenticated_at = Some(at);
        self
    }

    #[must_use]
    pub fn build(self) -> Authentication {
        Authentication {
            principal: self.principal,
            attributes: self.attributes,
            successes: self.successes,
            authenticated_at: self.authenticated_at.unwrap_or_else(Utc::now),
        }
    }
}

/// The service (relying party URL) targeted by a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
}

impl Service {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// What happens when a selected provider is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Skip the provider as if the trigger had no opinion.
    Open,
    /// Fail the attempt.
    #[default]
    Closed,
}

/// Per-service multifactor requirements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultifactorPolicy {
    /// Provider ids required by this service.
    pub providers: Vec<String>,
    /// Comma-separated principal attribute names that trigger the providers.
    pub principal_attribute_name_trigger: Option<String>,
    /// Pattern the attribute value must contain.
    pub principal_attribute_value_to_match: Option<String>,
    pub bypass_enabled: bool,
    /// Overrides the global failure mode for this service.
    pub failure_mode: Option<FailureMode>,
}

impl MultifactorPolicy {
    /// Attribute names from [`Self::principal_attribute_name_trigger`], trimmed, in order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        self.principal_attribute_name_trigger
            .as_deref()
            .map(|names| {
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_attribute_trigger(&self) -> bool {
        !self.attribute_names().is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// Access rules a registered service enforces before any step-up decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessStrategy {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sso_enabled: bool,
    /// Principal attributes the principal must carry. An empty value list only
    /// requires the attribute to be present.
    #[serde(default)]
    pub required_attributes: BTreeMap<String, Vec<String>>,
}

impl Default for AccessStrategy {
    fn default() -> Self {
        Self {
            enabled: true,
            sso_enabled: true,
            required_attributes: BTreeMap::new(),
        }
    }
}

impl AccessStrategy {
    #[must_use]
    pub fn is_service_access_allowed(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_principal_authorized(&self, principal: &Principal) -> bool {
        self.required_attributes.iter().all(|(name, required)| {
            principal.attribute(name).is_some_and(|value| {
                required.is_empty() || required.iter().any(|r| value.contains(r))
            })
        })
    }
}

/// A relying-party record owned by the service registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisteredService {
    pub id: u64,
    pub name: String,
    /// Regular expression matched against [`Service::id`].
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multifactor_policy: Option<MultifactorPolicy>,
    #[serde(default)]
    pub access_strategy: AccessStrategy,
}

impl RegisteredService {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            service_id: service_id.into(),
            multifactor_policy: None,
            access_strategy: AccessStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_multifactor_policy(mut self, policy: MultifactorPolicy) -> Self {
        self.multifactor_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_access_strategy(mut self, strategy: AccessStrategy) -> Self {
        self.access_strategy = strategy;
        self
    }
}

/// A credential presented with the request. The secret is redacted from `Debug`.
#[derive(Debug, Clone)]
pub struct Credential {
    id: String,
    secret: Option<SecretString>,
}

impl Credential {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: None,
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }
}

/// Request facts the triggers may inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub parameters: BTreeMap<String, Vec<String>>,
    /// Header names are stored lower-cased.
    pub headers: BTreeMap<String, String>,
}

impl RequestAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// First value of the named parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Server-side session credential bound to one [`Authentication`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketGrantingTicket {
    id: String,
    authentication: Authentication,
    created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    usage_count: u32,
}

impl TicketGrantingTicket {
    #[must_use]
    pub fn new(id: impl Into<String>, authentication: Authentication) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            authentication,
            created_at: now,
            last_used_at: now,
            usage_count: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn authentication(&self) -> &Authentication {
        &self.authentication
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    #[must_use]
    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    /// Fold a later authentication of the same principal into this ticket.
    pub fn merge_authentication(&mut self, authentication: &Authentication) {
        self.authentication = self.authentication.merge(authentication);
        self.last_used_at = Utc::now();
        self.usage_count = self.usage_count.saturating_add(1);
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, time_to_live: TimeDelta) -> bool {
        now.signed_duration_since(self.created_at) >= time_to_live
    }
}

/// The finalized outcome of all authentication transactions of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub authentication: Authentication,
    pub service: Option<Service>,
}

/// Accumulates authentications across the transactions of an MFA sequence.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationResultBuilder {
    authentications: Vec<Authentication>,
    credentials: Vec<Credential>,
}

impl AuthenticationResultBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collect(mut self, authentication: Authentication) -> Self {
        self.authentications.push(authentication);
        self
    }

    #[must_use]
    pub fn collect_credential(mut self, credential: Credential) -> Self {
        self.credentials.push(credential);
        self
    }

    #[must_use]
    pub fn authentications(&self) -> &[Authentication] {
        &self.authentications
    }

    #[must_use]
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    #[must_use]
    pub fn initial_authentication(&self) -> Option<&Authentication> {
        self.authentications.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authentications.is_empty()
    }

    /// Merge every collected authentication into one result.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if nothing was collected or the collected
    ///   authentications belong to different principals
    pub fn build(&self, service: Option<Service>) -> Result<AuthenticationResult, MfaTriggerError> {
        let mut collected = self.authentications.iter();
        let first = collected.next().ok_or_else(|| {
            MfaTriggerError::AuthenticationFailed("no authentication was collected".to_owned())
        })?;

        let mut merged = first.clone();
        for next in collected {
            if next.principal().id != merged.principal().id {
                return Err(MfaTriggerError::AuthenticationFailed(format!(
                    "principal '{}' does not match '{}'",
                    next.principal().id,
                    merged.principal().id
                )));
            }
            merged = merged.merge(next);
        }

        Ok(AuthenticationResult {
            authentication: merged,
            service,
        })
    }
}

/// Result of a geo-location lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl GeoLocation {
    /// Address components joined into one string for pattern matching.
    #[must_use]
    pub fn build_address(&self) -> String {
        self.addresses.join(", ")
    }
}

/// Identifier of an [`Event`]: a terminal transition or a provider id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventId {
    Success,
    SuccessWithWarnings,
    AuthenticationFailure,
    Error,
    /// A provider that must be satisfied before the flow can continue.
    Provider(String),
}

impl EventId {
    pub const SUCCESS: &'static str = "success";
    pub const SUCCESS_WITH_WARNINGS: &'static str = "success-with-warnings";
    pub const AUTHENTICATION_FAILURE: &'static str = "authentication-failure";
    pub const ERROR: &'static str = "error";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => Self::SUCCESS,
            Self::SuccessWithWarnings => Self::SUCCESS_WITH_WARNINGS,
            Self::AuthenticationFailure => Self::AUTHENTICATION_FAILURE,
            Self::Error => Self::ERROR,
            Self::Provider(id) => id,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Provider(_))
    }

    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        match self {
            Self::Provider(id) => Some(id),
            _ => None,
        }
    }

    /// HTTP status the hosting layer should answer with.
    #[must_use]
    pub fn response_status(&self) -> StatusCode {
        match self {
            Self::AuthenticationFailure | Self::Error => StatusCode::UNAUTHORIZED,
            Self::Success | Self::SuccessWithWarnings | Self::Provider(_) => StatusCode::OK,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        match id {
            EventId::Provider(id) => id,
            other => other.as_str().to_owned(),
        }
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        match id.as_str() {
            Self::SUCCESS => Self::Success,
            Self::SUCCESS_WITH_WARNINGS => Self::SuccessWithWarnings,
            Self::AUTHENTICATION_FAILURE => Self::AuthenticationFailure,
            Self::ERROR => Self::Error,
            _ => Self::Provider(id),
        }
    }
}

/// Attribute bag consumed by the hosting workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_service: Option<RegisteredService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_granting_ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MessageDescriptor>,
    #[serde(skip)]
    pub error: Option<MfaTriggerError>,
}

/// The engine's unit of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    id: EventId,
    attributes: EventAttributes,
}

impl Event {
    #[must_use]
    pub fn new(id: EventId, attributes: EventAttributes) -> Self {
        Self { id, attributes }
    }

    #[must_use]
    pub fn success() -> Self {
        Self::new(EventId::Success, EventAttributes::default())
    }

    #[must_use]
    pub fn success_with_warnings(warnings: Vec<MessageDescriptor>) -> Self {
        Self::new(
            EventId::SuccessWithWarnings,
            EventAttributes {
                warnings,
                ..EventAttributes::default()
            },
        )
    }

    #[must_use]
    pub fn authentication_failure(error: MfaTriggerError) -> Self {
        Self::new(
            EventId::AuthenticationFailure,
            EventAttributes {
                error: Some(error),
                ..EventAttributes::default()
            },
        )
    }

    #[must_use]
    pub fn error(error: MfaTriggerError) -> Self {
        Self::new(
            EventId::Error,
            EventAttributes {
                error: Some(error),
                ..EventAttributes::default()
            },
        )
    }

    /// Terminal event for a failure: `authentication-failure` for recognized
    /// authentication/ticket errors, `error` for everything else.
    #[must_use]
    pub fn from_failure(error: MfaTriggerError) -> Self {
        if error.is_authentication_failure() {
            Self::authentication_failure(error)
        } else {
            Self::error(error)
        }
    }

    /// An event naming the provider that must be satisfied.
    #[must_use]
    pub fn provider_required(
        provider_id: impl Into<String>,
        principal: &Principal,
        service: Option<&RegisteredService>,
    ) -> Self {
        let provider_id = provider_id.into();
        Self::new(
            EventId::Provider(provider_id.clone()),
            EventAttributes {
                principal: Some(principal.clone()),
                registered_service: service.cloned(),
                provider_id: Some(provider_id),
                ..EventAttributes::default()
            },
        )
    }

    #[must_use]
    pub fn with_ticket_granting_ticket(mut self, ticket_id: impl Into<String>) -> Self {
        self.attributes.ticket_granting_ticket_id = Some(ticket_id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &EventId {
        &self.id
    }

    #[must_use]
    pub fn attributes(&self) -> &EventAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.id.provider_id()
    }

    #[must_use]
    pub fn error_cause(&self) -> Option<&MfaTriggerError> {
        self.attributes.error.as_ref()
    }
}

/// Per-request input of one resolution pass.
///
/// Immutable after construction; the rank validator derives a new context
/// with [`ResolutionContext::with_result_builder`] instead of mutating it.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    service: Option<Service>,
    ticket_granting_ticket_id: Option<String>,
    credential: Option<Credential>,
    result_builder: Option<AuthenticationResultBuilder>,
    request: RequestAttributes,
    resolved_events: Vec<Event>,
    cancellation: CancellationToken,
}

impl ResolutionContext {
    #[must_use]
    pub fn builder() -> ResolutionContextBuilder {
        ResolutionContextBuilder::default()
    }

    #[must_use]
    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    #[must_use]
    pub fn ticket_granting_ticket_id(&self) -> Option<&str> {
        self.ticket_granting_ticket_id.as_deref()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Authentications already established for this attempt.
    #[must_use]
    pub fn result_builder(&self) -> Option<&AuthenticationResultBuilder> {
        self.result_builder.as_ref()
    }

    #[must_use]
    pub fn request(&self) -> &RequestAttributes {
        &self.request
    }

    /// Candidate events resolved earlier in the same request.
    #[must_use]
    pub fn resolved_events(&self) -> &[Event] {
        &self.resolved_events
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Derive a context whose established authentication is `builder`.
    ///
    /// The presented credential is dropped: it has already been folded into the builder.
    #[must_use]
    pub fn with_result_builder(&self, builder: AuthenticationResultBuilder) -> Self {
        Self {
            credential: None,
            result_builder: Some(builder),
            ..self.clone()
        }
    }
}

#[derive(Default)]
pub struct ResolutionContextBuilder {
    inner: ResolutionContext,
}

impl ResolutionContextBuilder {
    #[must_use]
    pub fn service(mut self, service: Service) -> Self {
        self.inner.service = Some(service);
        self
    }

    #[must_use]
    pub fn ticket_granting_ticket_id(mut self, id: impl Into<String>) -> Self {
        self.inner.ticket_granting_ticket_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.inner.credential = Some(credential);
        self
    }

    #[must_use]
    pub fn result_builder(mut self, builder: AuthenticationResultBuilder) -> Self {
        self.inner.result_builder = Some(builder);
        self
    }

    #[must_use]
    pub fn request(mut self, request: RequestAttributes) -> Self {
        self.inner.request = request;
        self
    }

    #[must_use]
    pub fn resolved_event(mut self, event: Event) -> Self {
        self.inner.resolved_events.push(event);
        self
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.inner.cancellation = token;
        self
    }

    #[must_use]
    pub fn build(self) -> ResolutionContext {
        self.inner
    }
}
