//! templated-mail CLI entrypoint
//! Parses command-line arguments, renders mail templates and sends them.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use std::path::PathBuf;
use templated_mail::config::{EnvConfigReader, MailConfig};
use templated_mail::factory::{self, ConfiguredMessage};
use templated_mail::templates::{self, candidate_paths};

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use lettre::Transport;
use lettre::transport::stub::StubTransport;
use serde_json::Value as JsonValue;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "templated-mail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that resolve templates
#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Template file name, path, `EXT:` package path or inline template source
    template: String,
    /// Template root directory; may be repeated, searched before configured roots
    #[arg(long = "template-root")]
    template_roots: Vec<String>,
    /// Package whose templates directory is searched last
    #[arg(long)]
    package: Option<String>,
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render a template and send it as a message
    Send {
        #[command(flatten)]
        template: TemplateArgs,
        /// Recipient address; may be repeated
        #[arg(long, required = true)]
        to: Vec<String>,
        /// Carbon copy address; may be repeated
        #[arg(long)]
        cc: Vec<String>,
        /// Blind carbon copy address; may be repeated
        #[arg(long)]
        bcc: Vec<String>,
        /// Sender address, overrides the configured one
        #[arg(long)]
        from: Option<String>,
        /// Subject line, overrides the configured one
        #[arg(long)]
        subject: Option<String>,
        /// Template variable as key=value; JSON values are parsed
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, JsonValue)>,
        /// Render and print the body instead of delivering it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the candidate paths for a template and which one is used
    Resolve {
        #[command(flatten)]
        template: TemplateArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Send {
            template,
            to,
            cc,
            bcc,
            from,
            subject,
            vars,
            dry_run,
        } => send(SendParams {
            template,
            to,
            cc,
            bcc,
            from,
            subject,
            vars,
            dry_run,
        }),
        Commands::Resolve { template } => resolve(&template),
    }
}

/// Parameters for the send command
struct SendParams {
    template: TemplateArgs,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    from: Option<String>,
    subject: Option<String>,
    vars: Vec<(String, JsonValue)>,
    dry_run: bool,
}

/// Parse a `key=value` template variable
fn parse_var(raw: &str) -> Result<(String, JsonValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| JsonValue::from(value));
    Ok((key.to_string(), value))
}

/// Load configuration and put command-line template roots first
fn load_config(args: &TemplateArgs) -> anyhow::Result<MailConfig> {
    let mut config = MailConfig::load(args.config.as_deref(), &EnvConfigReader)
        .context("Failed to load configuration")?;
    if !args.template_roots.is_empty() {
        let configured = std::mem::take(&mut config.template_root_paths);
        config.template_root_paths = args
            .template_roots
            .iter()
            .cloned()
            .chain(configured)
            .collect();
    }
    Ok(config)
}

fn send(params: SendParams) -> anyhow::Result<()> {
    let config = load_config(&params.template)?;

    if params.dry_run {
        let mut message = factory::message_with_transport(&config, StubTransport::new_ok())?;
        prepare(&mut message, &params, &config)?;
        message
            .render(&params.template.template)
            .context("Failed to render message")?;
        println!("{}", message.sender().body().unwrap_or_default());
        return Ok(());
    }

    let mut message = factory::message_from_config(&config)?;
    prepare(&mut message, &params, &config)?;
    message
        .render(&params.template.template)
        .context("Failed to send message")?;
    println!("✅ Sent '{}' to {}", message.sender().subject(), params.to.join(", "));
    Ok(())
}

/// Apply the command-line fields, context and variables to a configured message
fn prepare<T>(
    message: &mut ConfiguredMessage<T>,
    params: &SendParams,
    config: &MailConfig,
) -> anyhow::Result<()>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let sender = message.sender_mut();
    if let Some(from) = &params.from {
        sender.set_from(from)?;
    }
    if let Some(subject) = &params.subject {
        sender.set_subject(subject.as_str());
    }
    for address in &params.to {
        sender.add_to(address)?;
    }
    for address in &params.cc {
        sender.add_cc(address)?;
    }
    for address in &params.bcc {
        sender.add_bcc(address)?;
    }
    if sender.subject().is_empty() {
        warn!("Sending message without a subject");
    }

    if let Some(package) = &params.template.package {
        message.set_context(factory::package_context(config, package)?);
    }
    for (key, value) in &params.vars {
        message.assign(key, value.clone());
    }
    Ok(())
}

fn resolve(args: &TemplateArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let locator = config.package_map();
    let context = args
        .package
        .as_deref()
        .map(|key| factory::package_context(&config, key))
        .transpose()?;
    let context_root = context.as_ref().and_then(|c| c.package_root());

    let candidates = candidate_paths(
        &args.template,
        config.template_root_paths.as_slice(),
        context_root,
        &locator,
    );
    let resolved = templates::resolve(
        &args.template,
        config.template_root_paths.as_slice(),
        context_root,
        &locator,
    );
    info!("Checked {} candidate path(s)", candidates.len());

    println!("Candidates for '{}':", args.template);
    let mut marked = false;
    for candidate in &candidates {
        let hit = !marked && resolved.as_deref() == Some(candidate.as_str());
        marked |= hit;
        println!("  [{}] {}", if hit { "x" } else { " " }, candidate);
    }

    match resolved {
        Some(path) => println!("Resolved: {path}"),
        None => println!("Not found; the identifier is rendered as inline template source"),
    }
    Ok(())
}
