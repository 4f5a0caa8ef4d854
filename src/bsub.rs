//! Generate, and optionally submit, cluster shell scripts for a batch of jobs.
use crate::batch::{node_count, BatchFile};
use crate::error::{Error, Result};
use crate::esubmit;
use crate::placeholders::{resolve_fixed, FixedContext};
use crate::script::{run_shell, EmittedScript, ScriptEmitter, ScriptStatus};
use crate::settings::Settings;
use log::{debug, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Everything `jptools bsub` was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct BsubArgs {
    pub settings_file: PathBuf,
    pub batch_file: PathBuf,
    pub batch_id: String,
    /// Run the pre-command and submit scripts, rather than only write them.
    pub execute: bool,
    pub cac: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub jobs: usize,
    pub nodes: usize,
    pub scripts: Vec<EmittedScript>,
}

fn create_dir(dir: &str, what: &str) -> Result<()> {
    if !Path::new(dir).exists() {
        info!("Creating {} directory {}", what, dir);
        fs::create_dir_all(dir)
            .map_err(|e| Error::io(format!("could not create {} directory {:?}", what, dir), e))?;
    }
    Ok(())
}

pub fn run(args: &BsubArgs) -> Result<Summary> {
    let ctx = FixedContext::new(&args.settings_file, &args.batch_file, &args.batch_id);
    run_with_context(args, &ctx)
}

pub fn run_with_context(args: &BsubArgs, ctx: &FixedContext) -> Result<Summary> {
    let settings = Settings::load(&args.settings_file)?;
    let mut settings = resolve_fixed(settings, ctx);
    settings.shellscript_cmd = esubmit::apply_overrides(
        &settings.shellscript_cmd,
        args.cac.as_deref(),
        args.time.as_deref(),
    );
    if !settings.description.trim().is_empty() {
        info!("{}", settings.description.trim());
    }

    if let Some(pre_cmd) = settings.pre_cmd.as_deref().filter(|c| !c.is_empty()) {
        if args.execute {
            info!("Executing precommand: {}", pre_cmd);
            run_shell(pre_cmd)?;
        } else {
            println!("Precommand (not executed): {}", pre_cmd);
        }
    }

    let batch = BatchFile::read(&args.batch_file, &settings)?;

    create_dir(&settings.shellscript_out_dir, "shellscript")?;
    if args.execute {
        for (dir, what) in [
            (&settings.home_dir, "home"),
            (&settings.in_dir, "in"),
            (&settings.out_dir, "out"),
        ] {
            if !dir.is_empty() {
                create_dir(dir, what)?;
            }
        }
    }

    let per_node = settings.processes_per_node;
    let nodes = node_count(batch.len(), per_node);

    if esubmit::is_esubmit(&settings.shellscript_cmd) {
        for note in esubmit::describe(&settings.shellscript_cmd) {
            info!("{}", note);
        }
    }

    if args.execute {
        println!("Starting submission...");
    } else {
        println!("Starting to generate (but not execute) shellscript files...");
    }
    let emitter = ScriptEmitter {
        settings: &settings,
        ctx,
        execute: args.execute,
    };
    let mut scripts = Vec::with_capacity(nodes);
    for (node, group) in batch.partition(per_node) {
        let script = emitter.emit(node, group)?;
        debug!("node {}: {}", script.node, script.submit_cmd);
        match script.status {
            ScriptStatus::Submitted => println!("    Submitted {}", script.path.display()),
            ScriptStatus::Generated => {
                println!("    Generated but did not submit {}", script.path.display())
            }
        }
        scripts.push(script);
    }
    Ok(Summary {
        jobs: batch.len(),
        nodes,
        scripts,
    })
}
