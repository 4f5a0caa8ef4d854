use clap::{Parser, Subcommand};
use std::path::PathBuf;

const BSUB_HELP: &str = "\
The job command is given in the settings file, where '%%n' is replaced with
the n-th column of the batch file line (counting from 0). The following
keywords are also replaced:

   %%HOMEDIR       the HomeDir of the settings file. Created if missing.
   %%INDIR         as %%HOMEDIR, e.g. for a data directory.
   %%OUTDIR        as %%HOMEDIR, e.g. for a results directory.
   %%SETTINGSFILE  the settings file name, path excluded.
   %%BATCHFILE     the batch file name, path excluded.
   %%BATCHID       the batch ID.
   %%DATE          the current date, YYYY-MM-DD.
   %%SHELLSCRIPT   the shell script being written, path included.

Jobs are packed ProcessesPerNode to a script, named
<ShellscriptOutDir><batchfile>.<batchid>.<node>.sh, and each script is passed
to ShellscriptCmd. To get started, try 'jptools bsub -e'.";

#[derive(Debug, Parser)]
#[clap(version, about = "Small tools for running analyses on a compute cluster", long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[clap(
        about = "Generate shell scripts for a batch of jobs and submit them",
        after_help = BSUB_HELP
    )]
    Bsub {
        #[clap(short = 'e', long)]
        /// Print an example settings file and exit
        show_settings_file: bool,

        #[clap(short, long)]
        /// Write the shell scripts but run neither the pre-command nor the submission command
        no_execution: bool,

        #[clap(short, long)]
        /// With esubmit, override the CAC given in the settings file
        cac: Option<String>,

        #[clap(short, long)]
        /// With esubmit, override the requested node time given in the settings file
        time: Option<String>,

        #[clap(value_parser, required = true, conflicts_with = "show-settings-file")]
        /// XML file governing how jobs are built and submitted
        settings_file: Option<PathBuf>,

        #[clap(value_parser, required = true, conflicts_with = "show-settings-file")]
        /// File where each line holds the arguments of one job
        batch_file: Option<PathBuf>,

        #[clap(required = true, conflicts_with = "show-settings-file")]
        /// ID distinguishing this run from others
        batch_id: Option<String>,
    },
    #[clap(about = "Print the dependencies of a Maven build descriptor as a table")]
    Deps {
        #[clap(value_parser, default_value = "pom.xml")]
        /// The build descriptor
        pom: PathBuf,
    },
    #[clap(about = "Print nearest-rank quantiles of a sorted column of numbers")]
    Quantiles {
        #[clap(short, long, value_delimiter = ',', required = true)]
        /// Quantiles to extract, as fractions between 0 and 1 (e.g. 0.05,0.5,0.95)
        quantiles: Vec<String>,

        #[clap(short, long, default_value_t = 0)]
        /// Column holding the values, counting from 0
        column: usize,

        #[clap(short = 'n', long)]
        /// Number of values in the input, if known. Otherwise they are counted first
        count: Option<u64>,

        #[clap(value_parser)]
        /// Tab-separated input sorted on the value column, optionally gzipped
        input: PathBuf,
    },
}
