//! Local execution through the `nft` binary.

use std::{io, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use nftkit_wire::SerializedBatch;
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{Handler, Response, Result, SubmitError};

#[derive(Debug, Clone)]
pub struct NftOptions {
    /// The `nft` executable. Default: `nft`, looked up in `PATH`.
    pub program: PathBuf,
    /// Run through `sudo`. Default: false.
    pub sudo: bool,
    /// Only check the batch (`nft -c`), never commit it. Default: false.
    pub check_only: bool,
}

impl NftOptions {
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn with_check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }
}

impl Default for NftOptions {
    fn default() -> Self {
        Self { program: PathBuf::from("nft"), sudo: false, check_only: false }
    }
}

/// Feeds each batch as a JSON document to `nft -j -f -`.
///
/// `nft` applies a whole document atomically: either every command is committed, or none is.
#[derive(Debug, Clone, Default)]
pub struct NftHandler {
    options: NftOptions,
}

impl NftHandler {
    pub fn new(options: NftOptions) -> Self {
        Self { options }
    }

    /// The command line used for every batch.
    pub fn command(&self) -> Command {
        let mut cmd = if self.options.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.options.program);
            cmd
        } else {
            Command::new(&self.options.program)
        };

        if self.options.check_only {
            cmd.arg("-c");
        }
        cmd.args(["-j", "-f", "-"]);

        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Handler for NftHandler {
    async fn handle(&mut self, batch: &SerializedBatch) -> Result<Response> {
        let mut cmd = self.command();
        tracing::debug!(?cmd, entries = batch.len(), "running command");

        let mut child = cmd.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let document = batch.to_document().to_string();
            match stdin.write_all(document.as_bytes()).await {
                // nft may bail out before reading everything; its exit status tells why.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
            // Closing stdin marks the end of the document.
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(?stderr, status = ?output.status, ?cmd, "command returned non-zero status");
            return Err(SubmitError::NonZero { status: output.status, stderr });
        }

        Ok(Response::new(String::from_utf8_lossy(&output.stdout)))
    }
}
