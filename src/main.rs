//! keyscope: live keystroke monitor
//!
//! Installs a system-wide low-level keyboard hook and renders every key-down
//! two ways:
//! - A technical log: timestamp, modifier combination, key name
//! - A reconstruction of the typed text, segmented by foreground window
//!
//! Output stays in memory and on the console. Nothing is written to disk or
//! sent anywhere.

mod config;
mod hook;
mod keyboard;
mod lifecycle;
mod output;
mod shell;
mod window;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::hook::{HookController, PlatformDesktop, PlatformHook};
use crate::lifecycle::ShutdownSignal;
use crate::shell::ConsoleShell;

fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; stdout is reserved for the technical log. Records
    // are handed to a writer thread so the hook callback never blocks on stderr.
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(writer)
        .init();

    // Route panic reports through the non-blocking writer too
    std::panic::set_hook(Box::new(|info| {
        error!(%info, "panic");
    }));

    info!(version = env!("CARGO_PKG_VERSION"), ?config, "keyscope starting");

    let shell = ConsoleShell::new(config.echo_log)?;
    let mut controller =
        HookController::new(PlatformHook::default(), PlatformDesktop::default(), shell);

    // The hook lives on this thread; callbacks arrive while it pumps messages
    controller.start();

    if controller.is_running() {
        let hook_thread = hook::current_thread_id();
        ShutdownSignal::new().spawn_watcher(move || hook::post_quit(hook_thread))?;

        info!("capturing keystrokes, press Ctrl+C to stop");
        hook::run_message_loop();
    } else {
        warn!(state = %controller.state(), "keyboard hook not running");
    }

    // Cleanup
    controller.stop();

    let (lines, text) = {
        let shell = controller.sink();
        (shell.line_count(), shell.text().to_owned())
    };
    drop(controller);

    if config.show_text && !text.is_empty() {
        println!();
        println!("{text}");
    }

    info!(lines, "keyscope stopped");

    Ok(())
}
