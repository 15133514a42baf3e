//! mfa-policy-check - dry run of the step-up policy
//!
//! Wires the MFA trigger engine with the static collaborators from one
//! configuration file, runs a single resolution and prints the resulting event
//! as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mfa_trigger::{MfaTrigger, MfaTriggerCollaborators};
use mfa_trigger_sdk::{
    Credential, Event, MfaTriggerClient, RequestAttributes, ResolutionContext, Service,
};
use static_mfa_plugin::StaticMfaPlugin;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;

/// Evaluate MFA trigger policy against a static configuration
#[derive(Parser, Debug)]
#[command(name = "mfa-policy-check")]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML configuration with `mfa_trigger` and `static_mfa_plugin` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve an initial login attempt
    Resolve(RequestArgs),

    /// Log in to establish a session, then re-evaluate policy for another service
    ResolveExistingSession {
        #[command(flatten)]
        request: RequestArgs,

        /// Service the session is first established for
        #[arg(long)]
        session_service: String,

        /// Username of the session login
        #[arg(long)]
        session_username: String,

        /// Secret of the session login
        #[arg(long)]
        session_secret: String,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Target service URL
    #[arg(long)]
    service: String,

    /// Username to authenticate
    #[arg(long)]
    username: Option<String>,

    /// Password or one-time code
    #[arg(long, requires = "username")]
    secret: Option<String>,

    /// Request parameter, as `name=value`; repeatable
    #[arg(long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Request header, as `name=value`; repeatable
    #[arg(long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    #[arg(long)]
    client_ip: Option<String>,

    #[arg(long)]
    user_agent: Option<String>,
}

impl RequestArgs {
    fn context(&self, ticket_granting_ticket_id: Option<String>, cancellation: &CancellationToken) -> ResolutionContext {
        let request = self.params.iter().fold(
            RequestAttributes::new(),
            |request, (name, value)| request.with_parameter(name.as_str(), value.as_str()),
        );
        let request = self
            .headers
            .iter()
            .fold(request, |request, (name, value)| request.with_header(name, value.as_str()));
        let request = match &self.client_ip {
            Some(ip) => request.with_client_ip(ip.as_str()),
            None => request,
        };
        let request = match &self.user_agent {
            Some(agent) => request.with_user_agent(agent.as_str()),
            None => request,
        };

        let mut builder = ResolutionContext::builder()
            .service(Service::new(self.service.as_str()))
            .request(request)
            .cancellation(cancellation.clone());
        if let Some(username) = &self.username {
            let mut credential = Credential::new(username.as_str());
            if let Some(secret) = &self.secret {
                credential = credential.with_secret(secret.clone());
            }
            builder = builder.credential(credential);
        }
        if let Some(id) = ticket_granting_ticket_id {
            builder = builder.ticket_granting_ticket_id(id);
        }
        builder.build()
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_owned(), value.to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn render(event: &Event) -> anyhow::Result<String> {
    let report = serde_json::json!({
        "event": event,
        "status": event.id().response_status().as_u16(),
        "error": event.error_cause().map(ToString::to_string),
    });
    serde_json::to_string_pretty(&report).context("failed to render event")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let cfg = config::load(cli.config.as_deref())?;
    let plugin = StaticMfaPlugin::from_config(&cfg.static_mfa_plugin)?;
    let module = MfaTrigger::default();
    let client: Arc<dyn MfaTriggerClient> = module.init(
        &cfg.mfa_trigger,
        MfaTriggerCollaborators {
            providers: plugin.providers,
            authentication_executor: plugin.authentication_executor,
            service_registry: plugin.service_registry,
            ticket_store: plugin.ticket_store,
            geo_location: Some(plugin.geo_location),
        },
    )?;

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let event = match &cli.command {
        Commands::Resolve(request) => client.resolve(&request.context(None, &cancellation)).await,
        Commands::ResolveExistingSession {
            request,
            session_service,
            session_username,
            session_secret,
        } => {
            let login = ResolutionContext::builder()
                .service(Service::new(session_service.as_str()))
                .credential(Credential::new(session_username.as_str()).with_secret(session_secret.clone()))
                .cancellation(cancellation.clone())
                .build();
            let session = client.resolve(&login).await;
            let Some(ticket_id) = session.attributes().ticket_granting_ticket_id.clone() else {
                println!("{}", render(&session)?);
                anyhow::bail!("session login did not grant a ticket ({})", session.id());
            };
            info!(ticket_granting_ticket_id = %ticket_id, "Session established");
            client
                .resolve_existing_session(&request.context(Some(ticket_id), &cancellation))
                .await
        }
    };

    println!("{}", render(&event)?);
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_first_equals() {
        assert_eq!(
            parse_pair("authn_method=mfa-duo").unwrap(),
            ("authn_method".to_owned(), "mfa-duo".to_owned())
        );
        assert_eq!(parse_pair("q=a=b").unwrap().1, "a=b");
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn request_args_build_the_context() {
        let cli = Cli::try_parse_from([
            "mfa-policy-check",
            "resolve",
            "--service",
            "https://payroll.example.org/",
            "--username",
            "casuser",
            "--secret",
            "Mellon",
            "--param",
            "authn_method=mfa-duo",
            "--header",
            "X-Trace=1",
            "--client-ip",
            "10.0.0.1",
        ])
        .unwrap();
        let Commands::Resolve(request) = cli.command else {
            panic!("expected resolve");
        };

        let ctx = request.context(Some("TGT-1".to_owned()), &CancellationToken::new());
        assert_eq!(ctx.service().unwrap().id, "https://payroll.example.org/");
        assert_eq!(ctx.credential().unwrap().id(), "casuser");
        assert_eq!(ctx.request().parameter("authn_method"), Some("mfa-duo"));
        assert_eq!(ctx.request().header("x-trace"), Some("1"));
        assert_eq!(ctx.request().client_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(ctx.ticket_granting_ticket_id(), Some("TGT-1"));
    }

    #[test]
    fn secret_requires_username() {
        let parsed = Cli::try_parse_from([
            "mfa-policy-check",
            "resolve",
            "--service",
            "https://payroll.example.org/",
            "--secret",
            "Mellon",
        ]);
        assert!(parsed.is_err());
    }
}
