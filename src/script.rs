//! Rendering, writing and submitting one shell script per node.
use crate::error::{Error, Result};
use crate::placeholders::{FixedContext, LineArgs, SHELLSCRIPT};
use crate::settings::Settings;
use log::{debug, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

const SHEBANG: &str = "#!/bin/bash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Written and handed to the submission command.
    Submitted,
    /// Written only.
    Generated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmittedScript {
    pub node: usize,
    pub path: PathBuf,
    /// The submission command, with placeholders resolved.
    pub submit_cmd: String,
    pub status: ScriptStatus,
}

/// A rendered but not yet written script.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScript {
    pub body: String,
    pub submit_cmd: String,
}

/// Run `cmd` through `sh -c`, waiting for it. The exit status is only logged.
pub fn run_shell(cmd: &str) -> Result<()> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .status()
        .map_err(|e| Error::io(format!("could not run `{}`", cmd), e))?;
    if !status.success() {
        warn!("`{}` exited with {}", cmd, status);
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| Error::io(format!("could not stat {:?}", path), e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
        .map_err(|e| Error::io(format!("could not make {:?} executable", path), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

pub struct ScriptEmitter<'a> {
    pub settings: &'a Settings,
    pub ctx: &'a FixedContext,
    pub execute: bool,
}

impl<'a> ScriptEmitter<'a> {
    pub fn script_path(&self, node: usize) -> PathBuf {
        PathBuf::from(format!(
            "{}{}.{}.{}.sh",
            self.settings.shellscript_out_dir, self.ctx.batch_file, self.ctx.batch_id, node
        ))
    }

    /// Render the script body and the submission command for `group`.
    ///
    /// The submission command takes its `%%<N>` values from the *last* line of
    /// the group.
    pub fn render(&self, script_path: &str, group: &[String]) -> Result<RenderedScript> {
        let delim = &self.settings.batch_file_delim;
        let mut body = format!("{}\n\n", SHEBANG);
        if let Some(preamble) = self.settings.shellscript_preamble.as_deref() {
            if !preamble.is_empty() {
                body.push_str(preamble);
                body.push_str("\n\n");
            }
        }
        let mut last_args = None;
        for line in group {
            let args = LineArgs::split(line, delim);
            let job = args.substitute(&self.settings.cmd)?.replace(SHELLSCRIPT, script_path);
            debug!("node job: {}", job);
            body.push_str(&format!("({}) &\n", job));
            last_args = Some(args);
        }
        body.push_str("\nwait\n");

        let submit_cmd = match last_args {
            Some(args) => args.substitute(&self.settings.shellscript_cmd)?,
            None => self.settings.shellscript_cmd.clone(),
        }
        .replace(SHELLSCRIPT, script_path);

        Ok(RenderedScript { body, submit_cmd })
    }

    /// Render, write and (when executing) submit the script for one node.
    pub fn emit(&self, node: usize, group: &[String]) -> Result<EmittedScript> {
        let path = self.script_path(node);
        let rendered = self.render(&path.to_string_lossy(), group)?;
        fs::write(&path, &rendered.body)
            .map_err(|e| Error::io(format!("could not write shellscript {:?}", path), e))?;
        make_executable(&path)?;

        let status = if self.execute {
            run_shell(&rendered.submit_cmd)?;
            ScriptStatus::Submitted
        } else {
            ScriptStatus::Generated
        };
        Ok(EmittedScript {
            node,
            path,
            submit_cmd: rendered.submit_cmd,
            status,
        })
    }
}
