use crate::cli::demo::demo_app;
use crate::config::{ConfigSnapshot, ConfigStore, YamlConfigStore};
use crate::dispatcher::Collaborators;
use crate::hot_reload::watch_config;
use crate::origin::{OriginChecker, SubnetAllowList};
use crate::registry::AdminApp;
use crate::render::{FsTemplateEngine, NoTemplates, TemplateEngine};
use crate::request::AdminRequest;
use crate::response::ResponseState;
use crate::runtime_config::RuntimeConfig;
use crate::session::{TokenSessionStore, DEFAULT_SESSION_COOKIE};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::io::{BufRead, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface for Gatehouse
#[derive(Debug, Parser)]
#[command(name = "gatehouse")]
#[command(about = "Admin UI request-dispatch core", long_about = None, version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the commands that build the demo app
#[derive(Debug, Clone, clap::Args)]
pub struct AppArgs {
    /// YAML configuration file (defaults to $GATEHOUSE_CONFIG, then config/config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Template root (defaults to $GATEHOUSE_TEMPLATE_DIR, then templates)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Permitted source networks in CIDR notation (default: loopback only)
    #[arg(long = "allow", value_delimiter = ',')]
    pub allow: Vec<String>,

    /// Register a live session token and send it as the session cookie
    #[arg(long)]
    pub session_token: Option<String>,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one request through the demo app and print the response
    Dispatch {
        #[command(flatten)]
        app: AppArgs,

        /// Full request path, including the base path and query string
        #[arg(short, long, default_value = "/ui/panel/")]
        path: String,

        /// Transport-layer source address
        #[arg(long, default_value = "127.0.0.1")]
        ip: IpAddr,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Extra request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Print the response as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch requests read line by line (`METHOD PATH [IP]`) from a file or stdin
    Replay {
        #[command(flatten)]
        app: AppArgs,

        /// Request file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reload the configuration file when it changes
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Print the configuration values a dispatch would use
    CheckConfig {
        /// YAML configuration file (defaults to $GATEHOUSE_CONFIG, then config/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Parse the command line and run it, writing to stdout.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &RuntimeConfig::from_env(), &mut out)
}

/// Run `cli` against `runtime` defaults, writing results to `out`.
pub fn execute(cli: &Cli, runtime: &RuntimeConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Dispatch {
            app,
            path,
            ip,
            method,
            headers,
            json,
        } => {
            let (admin, _store) = build_app(app, runtime)?;
            let method: Method = method
                .parse()
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let mut request = AdminRequest::new(method, path, *ip);
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("header '{header}' is not 'Name: value'"))?;
                request = request.with_header(name.trim(), value.trim());
            }
            if let Some(token) = &app.session_token {
                request =
                    request.with_header("Cookie", &format!("{DEFAULT_SESSION_COOKIE}={token}"));
            }

            let state = admin.dispatch(&request);
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&state)?)?;
            } else {
                print_response(&state, out)?;
            }
            Ok(())
        }
        Commands::Replay { app, input, watch } => {
            let (admin, store) = build_app(app, runtime)?;
            let _watcher = if *watch || runtime.watch_config {
                Some(watch_config(Arc::clone(&store)).context("failed to watch configuration")?)
            } else {
                None
            };

            let reader: Box<dyn BufRead> = match input {
                Some(path) => Box::new(std::io::BufReader::new(
                    std::fs::File::open(path)
                        .with_context(|| format!("failed to open {}", path.display()))?,
                )),
                None => Box::new(std::io::stdin().lock()),
            };

            let mut count = 0usize;
            for line in reader.lines() {
                let line = line?;
                let Some(request) = parse_request_line(&line, app.session_token.as_deref())? else {
                    continue;
                };
                let state = admin.dispatch(&request);
                writeln!(
                    out,
                    "{} {} {}",
                    state.status,
                    request.method,
                    request.path
                )?;
                count += 1;
            }
            info!(requests = count, "Replay finished");
            Ok(())
        }
        Commands::CheckConfig { config } => {
            let path = config.as_deref().unwrap_or(&runtime.config_path);
            let store = load_store(path)?;
            let snapshot = ConfigSnapshot::from_store(&store);
            writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
            Ok(())
        }
    }
}

fn load_store(path: &Path) -> anyhow::Result<YamlConfigStore> {
    if path.exists() {
        YamlConfigStore::load(path)
    } else {
        info!(path = %path.display(), "No configuration file, using defaults");
        Ok(YamlConfigStore::empty())
    }
}

fn build_app(
    args: &AppArgs,
    runtime: &RuntimeConfig,
) -> anyhow::Result<(AdminApp, Arc<YamlConfigStore>)> {
    let config_path = args.config.as_deref().unwrap_or(&runtime.config_path);
    let store = Arc::new(load_store(config_path)?);

    let origin: Arc<dyn OriginChecker> = if args.allow.is_empty() {
        Arc::new(SubnetAllowList::loopback())
    } else {
        Arc::new(SubnetAllowList::new(&args.allow)?)
    };

    let sessions = TokenSessionStore::new();
    if let Some(token) = &args.session_token {
        sessions.insert(token.as_str());
    }

    let template_dir = args.templates.as_deref().unwrap_or(&runtime.template_dir);
    let templates: Arc<dyn TemplateEngine> = if template_dir.is_dir() {
        Arc::new(FsTemplateEngine::new(template_dir))
    } else {
        info!(path = %template_dir.display(), "No template directory, handler bodies only");
        Arc::new(NoTemplates)
    };

    let collaborators = Collaborators {
        origin,
        sessions: Arc::new(sessions),
        config: Arc::clone(&store) as Arc<dyn ConfigStore>,
        templates,
    };
    Ok((demo_app(collaborators)?, store))
}

/// `METHOD PATH [IP]`; blank lines and `#` comments yield `None`.
pub(crate) fn parse_request_line(
    line: &str,
    session_token: Option<&str>,
) -> anyhow::Result<Option<AdminRequest>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        anyhow::bail!("request line '{line}' is not 'METHOD PATH [IP]'");
    };
    let method: Method = method
        .parse()
        .with_context(|| format!("invalid HTTP method '{method}'"))?;
    let ip: IpAddr = match parts.next() {
        Some(ip) => ip
            .parse()
            .with_context(|| format!("invalid source address '{ip}'"))?,
        None => IpAddr::from([127, 0, 0, 1]),
    };

    let mut request = AdminRequest::new(method, path, ip);
    if let Some(token) = session_token {
        request = request.with_header("Cookie", &format!("{DEFAULT_SESSION_COOKIE}={token}"));
    }
    Ok(Some(request))
}

fn print_response(state: &ResponseState, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "Status: {}", state.status)?;
    for (name, value) in &state.headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}", state.body)
}
