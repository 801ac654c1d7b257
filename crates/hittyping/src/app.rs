#![forbid(unsafe_code)]

//! Wiring: config to display, selector and probe loop.

use std::io::{self, Write};
use std::sync::Arc;

use hp_core::config::Config;
use hp_core::error::HpError;
use hp_core::stats::Stats;
use hp_probe::{LoopSettings, ProbeLoop, ProtocolSelector, ReqwestFactory};
use hp_render::display::lock;
use hp_render::signals::SignalWorker;
use hp_render::terminal::{self, QuietMode};
use hp_render::{Display, HeaderInfo, RenderOptions, Renderer, SharedDisplay};

use crate::cli::Cli;
use crate::resolve;

/// Parse, resolve and probe until the count is reached.
///
/// On success the final report (unless silent) has been printed and the
/// terminal restored.
pub fn run(cli: Cli) -> Result<(), HpError> {
    let mut config = cli.into_config(|key| std::env::var(key).ok())?;
    config.resolved_ip = resolve::resolve(&config.host)?;
    tracing::info!(
        host = %config.host,
        ip = ?config.resolved_ip,
        protocol = %config.protocol,
        downgrade = ?config.downgrade,
        "starting"
    );

    let selector = ProtocolSelector::new(
        Box::new(ReqwestFactory),
        config.host.clone(),
        config.protocol,
        config.timeout,
        config.insecure,
    )?;

    let quiet = if terminal::stdout_is_tty() {
        QuietMode::enter()
    } else {
        QuietMode::detached()
    };
    let display = build_display(&config, io::stdout(), quiet);
    let _signals = match SignalWorker::spawn(Arc::clone(&display)) {
        Ok(worker) => Some(worker),
        Err(err) => {
            tracing::warn!(%err, "signal handling unavailable");
            None
        }
    };
    lock(&display).start()?;

    let mut probe = ProbeLoop::new(selector, Arc::clone(&display), loop_settings(&config));
    let result = probe.run();
    let shutdown = lock(&display).shutdown();
    result?;
    shutdown?;
    Ok(())
}

/// Display for `config`, not yet started.
pub fn build_display<W: Write>(config: &Config, out: W, quiet: QuietMode) -> SharedDisplay<W> {
    let renderer = Renderer::new(
        out,
        RenderOptions {
            show_header: config.show_header,
            show_legend: config.show_legend,
        },
    );
    Display::new(
        Stats::new(config.mode, config.effective_thresholds()),
        renderer,
        quiet,
        HeaderInfo {
            host: config.display_host.clone(),
            ip: config.resolved_ip.clone(),
            protocol: config.protocol,
        },
        config.show_final,
    )
    .into_shared()
}

#[must_use]
pub fn loop_settings(config: &Config) -> LoopSettings {
    LoopSettings {
        interval: config.interval,
        jitter: config.jitter,
        count: config.count,
        downgrade: config.downgrade,
    }
}
