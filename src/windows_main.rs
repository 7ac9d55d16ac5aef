#![cfg(windows)]

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use cvmd2html::config::{self, Config, PopupBackend};
use cvmd2html::package::{self, Package};
use cvmd2html::params::{HELP_TEXT, Params};
use cvmd2html::popup::{Buttons, HelperPopup, NativePopup, PopupKind, Prompter};
use cvmd2html::registry::{self, CurrentUser};
use cvmd2html::setup;
use cvmd2html::shortcut::ComApartment;
use cvmd2html::supervisor;

const CAPTION: &str = "Convert to HTML";

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = config::launcher_dirs()
        .map(|dirs| dirs.log_dir)
        .unwrap_or_else(|_| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "launcher.log");
    let (nb, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(nb)
        .init();
    guard
}

fn load_package(cfg: &Config) -> Result<Package> {
    let pwsh = match &cfg.pwsh_path {
        Some(path) => path.clone(),
        None => registry::pwsh_path().context("locating PowerShell Core")?,
    };
    Ok(Package::new(&package::script_root()?, pwsh))
}

fn prompter_for<'a>(package: &'a Package, cfg: &Config) -> Box<dyn Prompter + 'a> {
    if cfg.popup == PopupBackend::Helper && package.has_message_box_script() {
        Box::new(HelperPopup::new(package))
    } else {
        if cfg.popup == PopupBackend::Helper {
            warn!(
                script = %package.message_box_script.display(),
                "message box helper missing, using the system message box"
            );
        }
        Box::new(NativePopup::new(CAPTION))
    }
}

fn convert(markdown: &std::path::Path, cfg: &Config) -> Result<()> {
    let package = load_package(cfg)?;
    package.ensure_convertible()?;
    let prompter = prompter_for(&package, cfg);
    let status = supervisor::run(package.conversion_command(markdown), &*prompter)
        .with_context(|| format!("converting {}", markdown.display()))?;
    if !status.success() {
        warn!(?status, markdown = %markdown.display(), "conversion reported an error");
    }
    Ok(())
}

fn install(no_icon: bool, cfg: &Config) -> Result<()> {
    let launcher = std::env::current_exe()?;
    let icon = Package::menu_icon_in(&package::script_root()?);
    let icon = (!no_icon).then_some(icon.as_path());
    setup::install(&mut CurrentUser, &launcher, &cfg.menu_text, icon)
        .context("configuring the shortcut menu")?;
    Ok(())
}

fn show_help(cfg: &Config) -> Result<()> {
    let package = load_package(cfg)
        .inspect_err(|e| warn!("{:#}", e))
        .ok();
    let prompter: Box<dyn Prompter + '_> = match &package {
        Some(package) => prompter_for(package, cfg),
        None => Box::new(NativePopup::new(CAPTION)),
    };
    prompter.popup(HELP_TEXT, PopupKind::Normal, Buttons::OkOnly)?;
    Ok(())
}

fn run(params: &Params, cfg: &Config) -> Result<ExitCode> {
    match params {
        Params::Convert { markdown } => convert(markdown, cfg)?,
        Params::Set { no_icon } => install(*no_icon, cfg)?,
        Params::Unset => setup::uninstall(&mut CurrentUser).context("removing the shortcut menu")?,
        Params::Help => {
            show_help(cfg)?;
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn main() -> Result<ExitCode> {
    let _guard = init_logging();

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Failed to load config: {:#}, using defaults", e);
            Config::default()
        }
    };
    let params = Params::parse(
        std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned()),
    );
    info!(?params, "launcher started");

    let _com = ComApartment::enter().context("initializing COM")?;
    match run(&params, &cfg) {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("{:#}", e);
            if let Err(popup_err) =
                NativePopup::new(CAPTION).popup(&format!("{e:#}"), PopupKind::Error, Buttons::OkOnly)
            {
                warn!("failed to show the error message box: {}", popup_err);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
