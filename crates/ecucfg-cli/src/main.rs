//! CLI interface for ecucfg - generate SOVD ECU configuration.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use ecucfg_core::paths::write_default_config;
use ecucfg_core::{
    AppConfig, AppPaths, TransportKind, UnitConfig, UnitIdentity, definitions_path,
    generate_schema, render_definitions, render_primary_config, transform_file,
};
use env_logger::fmt::WriteStyle;
use log::{LevelFilter, debug, info};
use tempfile::NamedTempFile;

const APP_NAME: &str = "ecucfg";

/// Repository URL for schema $id.
const REPO_URL: &str = "https://github.com/byteowlz/ecucfg";

const DEFINITIONS_HEADER: &str = "# === DID Definitions (save as dids.yaml) ===";

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("resolved paths: {}", ctx.paths);

    match cli.command {
        Some(Command::Config { command }) => handle_config(&ctx, command).map(|()| ExitCode::SUCCESS),
        Some(Command::Completions { shell }) => {
            handle_completions(shell);
            Ok(ExitCode::SUCCESS)
        }
        None => handle_generate(&ctx, &cli.generate),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ecucfg",
    author,
    version,
    about = "Generate SOVD ECU configuration from parameters or discovery results",
    after_help = "Examples:\n  ecucfg --name engine_ecu --tx-id 0x7E0 --rx-id 0x7E8\n  ecucfg --from-discovery discovery.json",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(flatten)]
    generate: GenerateArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Common CLI options shared across all subcommands.
#[derive(Debug, Clone, Args)]
pub struct CommonOpts {
    /// Override the config file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
    /// Reduce output to only errors.
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    pub quiet: bool,
    /// Increase logging verbosity (stackable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
    /// Enable trace logging.
    #[arg(long, global = true)]
    pub trace: bool,
    /// Disable ANSI colors in output.
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    pub no_color: bool,
    /// Control color output.
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    pub color: ColorOption,
    /// Do not change anything on disk.
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
    /// Detect terminal capabilities automatically.
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit ANSI color codes.
    Never,
}

/// Options for generating ECU configuration.
#[derive(Debug, Clone, Default, Args)]
struct GenerateArgs {
    /// ECU name.
    #[arg(short, long)]
    name: Option<String>,
    /// ECU ID (default: derived from name).
    #[arg(short, long)]
    id: Option<String>,
    /// TX CAN ID (tester -> ECU).
    #[arg(short = 't', long = "tx-id", value_name = "ID")]
    tx_id: Option<String>,
    /// RX CAN ID (ECU -> tester).
    #[arg(short = 'r', long = "rx-id", value_name = "ID")]
    rx_id: Option<String>,
    /// CAN interface, or DoIP gateway host [default: vcan0].
    #[arg(short = 'I', long)]
    interface: Option<String>,
    /// Transport protocol.
    #[arg(long, value_enum, default_value_t = TransportArg::Isotp)]
    transport: TransportArg,
    /// Generate from discovery JSON.
    #[arg(short = 'd', long = "from-discovery", value_name = "PATH")]
    from_discovery: Option<PathBuf>,
    /// Also generate DID YAML.
    #[arg(long)]
    dids: bool,
    /// Leave the commented example DIDs out of the DID YAML.
    #[arg(long = "no-did-examples", requires = "dids")]
    no_did_examples: bool,
    /// Output file (default: stdout).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Transport selectable on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    /// ISO-TP over CAN.
    #[default]
    Isotp,
    /// Diagnostics over IP.
    Doip,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Isotp => Self::IsoTp,
            TransportArg::Doip => Self::DoIp,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect and manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration as JSON.
    Show,
    /// Print the resolved config file path.
    Path,
    /// Print the JSON schema.
    Schema,
    /// Write the default configuration file.
    Init {
        /// Recreate configuration even if it already exists.
        #[arg(long)]
        force: bool,
    },
}

// ─── Mode resolution ─────────────────────────────────────────────────

/// What a generation invocation does, resolved once from the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    /// Transform a discovery result document.
    Discovery(PathBuf),
    /// Render one unit from explicit parameters.
    Direct(DirectRequest),
    /// Not enough input: print usage and fail.
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DirectRequest {
    identity: UnitIdentity,
    interface: Option<String>,
    transport: TransportKind,
}

impl Mode {
    /// Discovery wins over direct parameters; direct needs name, tx and rx.
    fn resolve(args: &GenerateArgs) -> Self {
        if let Some(path) = args
            .from_discovery
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            return Self::Discovery(path.clone());
        }

        let (Some(name), Some(tx_id), Some(rx_id)) = (
            non_empty(args.name.as_ref()),
            non_empty(args.tx_id.as_ref()),
            non_empty(args.rx_id.as_ref()),
        ) else {
            return Self::Usage;
        };

        let identity = match non_empty(args.id.as_ref()) {
            Some(id) => UnitIdentity::new(id, name, tx_id, rx_id),
            None => UnitIdentity::from_name(name, tx_id, rx_id),
        };

        Self::Direct(DirectRequest {
            identity,
            interface: args.interface.clone(),
            transport: args.transport.into(),
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

// ─── Runtime ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.as_deref())?;
        let config = AppConfig::load(&paths)
            .with_context(|| format!("loading config from {}", paths.config_file.display()))?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        builder.filter_level(self.effective_log_level());

        let force_color = matches!(self.common.color, ColorOption::Always)
            || env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !io::stderr().is_terminal());

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        if let Some(ref file) = self.config.logging.file {
            let sink = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .with_context(|| format!("opening log file {file}"))?;
            builder.write_style(WriteStyle::Never);
            builder.target(env_logger::Target::Pipe(Box::new(sink)));
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    const fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => self.config.logging.level.to_level_filter(),
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Report a written file on stderr unless quiet.
    fn report(&self, what: &str, path: &Path) {
        if !self.common.quiet {
            eprintln!("{what} written to {}", path.display());
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────────────

fn handle_generate(ctx: &RuntimeContext, args: &GenerateArgs) -> Result<ExitCode> {
    let settings = &ctx.config.generator;

    let config = match Mode::resolve(args) {
        Mode::Discovery(path) => {
            info!("generating from discovery result {}", path.display());
            transform_file(&path, settings)?
        }
        Mode::Direct(request) => {
            let interface = request.interface.as_deref().unwrap_or(settings.interface.as_str());
            info!(
                "generating {} ({}) over {} on {interface}",
                request.identity.name, request.identity.id, request.transport
            );
            let unit = UnitConfig::new(request.identity, interface, Some(request.transport), settings);
            render_primary_config(&unit, settings)
        }
        Mode::Usage => {
            Cli::command()
                .write_help(&mut io::stderr())
                .context("writing usage")?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let definitions = args.dids.then(|| render_definitions(!args.no_did_examples));

    match &args.output {
        Some(path) => write_outputs(ctx, path, &config, definitions.as_deref())?,
        None => print_outputs(&config, definitions.as_deref())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn write_outputs(
    ctx: &RuntimeContext,
    path: &Path,
    config: &str,
    definitions: Option<&str>,
) -> Result<()> {
    let did_path = definitions.map(|_| definitions_path(path));

    if ctx.common.dry_run {
        info!("dry-run: would write config to {}", path.display());
        if let Some(ref did_path) = did_path {
            info!("dry-run: would write DIDs to {}", did_path.display());
        }
        return Ok(());
    }

    let mut targets = vec![("Config", "config", path.to_path_buf(), config)];
    if let (Some(did_path), Some(definitions)) = (did_path, definitions) {
        targets.push(("DIDs", "DIDs", did_path, definitions));
    }

    // Nothing lands on disk unless every file could be staged.
    let mut staged = Vec::with_capacity(targets.len());
    for (_, noun, target, body) in &targets {
        if target.is_dir() {
            anyhow::bail!("writing {noun} to {}: is a directory", target.display());
        }
        let file = stage(target, body)
            .with_context(|| format!("writing {noun} to {}", target.display()))?;
        staged.push(file);
    }

    for (file, (what, noun, target, _)) in staged.into_iter().zip(&targets) {
        file.persist(target)
            .with_context(|| format!("writing {noun} to {}", target.display()))?;
        ctx.report(what, target);
    }
    Ok(())
}

/// Write `body` to a temporary file next to `target`.
fn stage(target: &Path, body: &str) -> Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn print_outputs(config: &str, definitions: Option<&str>) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{config}")?;
    if let Some(definitions) = definitions {
        writeln!(out, "\n{DEFINITIONS_HEADER}\n")?;
        writeln!(out, "{definitions}")?;
    }
    out.flush()?;
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ctx.config).context("serializing config to JSON")?
            );
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
        ConfigCommand::Schema => {
            println!("{}", generate_schema(APP_NAME, REPO_URL)?);
            Ok(())
        }
        ConfigCommand::Init { force } => {
            if ctx.paths.config_file.exists() && !force {
                anyhow::bail!(
                    "config already exists at {} (use --force to overwrite)",
                    ctx.paths.config_file.display()
                );
            }
            if ctx.common.dry_run {
                info!(
                    "dry-run: would write default config to {}",
                    ctx.paths.config_file.display()
                );
                return Ok(());
            }
            write_default_config(&ctx.paths.config_file)?;
            ctx.report("Config", &ctx.paths.config_file);
            Ok(())
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
}
