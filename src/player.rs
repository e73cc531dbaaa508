//! Debug helper that plays a track on the machine running the server.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use reqwest::StatusCode;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;

/// A player binary and the arguments placed before the file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// `ffplay` first, `mpg123` if it cannot be launched.
pub fn default_players() -> Vec<PlayerCommand> {
    vec![
        PlayerCommand::new("ffplay", &["-nodisp", "-autoexit"]),
        PlayerCommand::new("mpg123", &[]),
    ]
}

#[derive(Debug)]
pub enum PlayOutcome {
    Started { file: PathBuf, player: String },
    DownloadFailed(StatusCode),
}

pub struct LocalPlayer {
    config: Arc<Config>,
    http: reqwest::Client,
    players: Vec<PlayerCommand>,
    scratch_dir: Option<PathBuf>,
}

impl LocalPlayer {
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            players: default_players(),
            scratch_dir: None,
        }
    }

    pub fn with_players(mut self, players: Vec<PlayerCommand>) -> Self {
        self.players = players;
        self
    }

    /// Download into `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    /// Download `url` into a kept temp file and hand it to a detached player.
    ///
    /// The file is not removed afterwards; the player process owns it.
    pub async fn play(&self, url: &str) -> anyhow::Result<PlayOutcome> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.download_timeout())
            .send()
            .await
            .with_context(|| format!("download of {} failed", url))?;

        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), "Download of {} rejected", url);
            return Ok(PlayOutcome::DownloadFailed(response.status()));
        }
        let bytes = response.bytes().await?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("aidj-").suffix(".mp3");
        let file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tokio::fs::write(file.path(), &bytes).await?;
        info!("Downloaded {} bytes to {}", bytes.len(), file.path().display());

        // Dropping `file` on a failed launch removes the download.
        let player = self.spawn(file.path())?;
        let (_, path) = file.keep()?;
        Ok(PlayOutcome::Started { file: path, player })
    }

    fn spawn(&self, path: &Path) -> anyhow::Result<String> {
        let mut last_error = None;
        for player in &self.players {
            // stdout carries the MCP transport, so the player must not inherit it.
            let spawned = Command::new(&player.program)
                .args(&player.args)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(_child) => {
                    info!("Started {} for {}", player.program, path.display());
                    return Ok(player.program.clone());
                }
                Err(e) => {
                    warn!("Could not launch {}: {}", player.program, e);
                    last_error = Some(anyhow!("could not launch {}: {}", player.program, e));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no audio player configured")))
    }
}
