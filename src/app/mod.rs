mod debug;
mod guard;
mod media;
mod resolver;
mod tui;

#[cfg(test)]
mod tests;

use std::env;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::cli::{Cli, Command};

use self::guard::SeekGuard;
use self::media::{LocalMedia, player_handle};
use self::resolver::StreamResolver;

pub fn run(cli: Cli) -> Result<()> {
    let dev_mode = cli.dev || env_flag("SEEKGUARD_DEV");
    let resolver = StreamResolver::from_env();

    match cli.command {
        Command::Play { video, duration } => run_play(&resolver, &video, duration, dev_mode),
        Command::Resolve { video } => run_resolve(&resolver, &video),
    }
}

fn run_resolve(resolver: &StreamResolver, video: &str) -> Result<()> {
    let outcome = resolver.resolve(video);
    emit_warnings(&outcome.warnings);
    match outcome.url {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => Err(anyhow!("no playable URL for {video}")),
    }
}

fn run_play(
    resolver: &StreamResolver,
    video: &str,
    fallback_duration: f64,
    dev_mode: bool,
) -> Result<()> {
    let outcome = resolver.resolve(video);
    emit_warnings(&outcome.warnings);
    let url = outcome
        .url
        .ok_or_else(|| anyhow!("no playable URL for {video}"))?;
    let duration = outcome.duration_secs.unwrap_or(fallback_duration);

    let handle = player_handle(LocalMedia::new(&url, duration));
    let mut seek_guard = SeekGuard::new();
    seek_guard.register_player(Arc::clone(&handle));

    tui::run_player(&mut seek_guard, &handle, dev_mode)
}

fn emit_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).ok().as_deref().map(str::trim),
        Some("1") | Some("true") | Some("yes")
    )
}
