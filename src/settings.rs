//! Loading and validation of the bsub XML settings document.
use crate::error::{Error, Result};
use log::debug;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use xml::reader::{ParserConfig, XmlEvent};

const DEFAULT_DELIM: &str = "\t";
const DEFAULT_PROCESSES_PER_NODE: usize = 7;

/// Printed by `jptools bsub -e`.
pub const EXAMPLE_SETTINGS: &str = r#"
Example of a settings file. Note: Tag names are case-sensitive.
Directories are created automatically prior to submission, so full paths
or making sure execution takes place in the right folder is recommended.

<Settings>
   <Description>Template bsub file.</Description>
   <HomeDir>~myname/mydir</HomeDir>
   <InDir>%%HOMEDIR/data</InDir>
   <OutDir>%%HOMEDIR/results/%%DATE</OutDir>
   <PreCmd>%%HOMEDIR/bin/mypreprocessor</PreCmd>
   <ShellscriptPreamble>
      module add easy;
      module add mpi;
      cd %%HOMEDIR;
   </ShellscriptPreamble>
   <BatchFileDelim>\t</BatchFileDelim>
   <BatchFileIgnorePrefix>#</BatchFileIgnorePrefix>
   <Cmd>./bin/mymagicexe -abc -o %%OUTDIR/%%0.%%BATCHID.out %%0 %%1</Cmd>
   <ProcessesPerNode>7</ProcessesPerNode>
   <ShellscriptOutDir>%%HOMEDIR/tmp/%%DATE</ShellscriptOutDir>
   <ShellscriptCmd>esubmit -c mycac -t 1000 -m -n 1 %%SHELLSCRIPT</ShellscriptCmd>
</Settings>
"#;

/// The closed set of elements recognised below `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Description,
    HomeDir,
    InDir,
    OutDir,
    PreCmd,
    BatchFileDelim,
    BatchFileIgnorePrefix,
    Cmd,
    ProcessesPerNode,
    ShellscriptOutDir,
    ShellscriptPreamble,
    ShellscriptCmd,
}

impl SettingsField {
    /// Match an element name. Case-sensitive; unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "Description" => SettingsField::Description,
            "HomeDir" => SettingsField::HomeDir,
            "InDir" => SettingsField::InDir,
            "OutDir" => SettingsField::OutDir,
            "PreCmd" => SettingsField::PreCmd,
            "BatchFileDelim" => SettingsField::BatchFileDelim,
            "BatchFileIgnorePrefix" => SettingsField::BatchFileIgnorePrefix,
            "Cmd" => SettingsField::Cmd,
            "ProcessesPerNode" => SettingsField::ProcessesPerNode,
            "ShellscriptOutDir" => SettingsField::ShellscriptOutDir,
            "ShellscriptPreamble" => SettingsField::ShellscriptPreamble,
            "ShellscriptCmd" => SettingsField::ShellscriptCmd,
            _ => return None,
        };
        Some(field)
    }
}

/// Settings as found in the document. `None` means the element was absent
/// or had no leading text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSettings {
    pub description: Option<String>,
    pub home_dir: Option<String>,
    pub in_dir: Option<String>,
    pub out_dir: Option<String>,
    pub pre_cmd: Option<String>,
    pub batch_file_delim: Option<String>,
    pub batch_file_ignore_prefix: Option<String>,
    pub cmd: Option<String>,
    pub processes_per_node: Option<String>,
    pub shellscript_out_dir: Option<String>,
    pub shellscript_preamble: Option<String>,
    pub shellscript_cmd: Option<String>,
}

/// Validated settings, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub description: String,
    pub home_dir: String,
    pub in_dir: String,
    pub out_dir: String,
    pub pre_cmd: Option<String>,
    pub batch_file_delim: String,
    pub batch_file_ignore_prefix: Option<String>,
    pub cmd: String,
    pub processes_per_node: usize,
    pub shellscript_out_dir: String,
    pub shellscript_preamble: Option<String>,
    pub shellscript_cmd: String,
}

impl Settings {
    /// Parse and validate the settings document at `path`.
    pub fn load(path: &Path) -> Result<Settings> {
        RawSettings::from_path(path)?.validate()
    }
}

impl RawSettings {
    fn slot_mut(&mut self, field: SettingsField) -> &mut Option<String> {
        match field {
            SettingsField::Description => &mut self.description,
            SettingsField::HomeDir => &mut self.home_dir,
            SettingsField::InDir => &mut self.in_dir,
            SettingsField::OutDir => &mut self.out_dir,
            SettingsField::PreCmd => &mut self.pre_cmd,
            SettingsField::BatchFileDelim => &mut self.batch_file_delim,
            SettingsField::BatchFileIgnorePrefix => &mut self.batch_file_ignore_prefix,
            SettingsField::Cmd => &mut self.cmd,
            SettingsField::ProcessesPerNode => &mut self.processes_per_node,
            SettingsField::ShellscriptOutDir => &mut self.shellscript_out_dir,
            SettingsField::ShellscriptPreamble => &mut self.shellscript_preamble,
            SettingsField::ShellscriptCmd => &mut self.shellscript_cmd,
        }
    }

    pub fn from_path(path: &Path) -> Result<RawSettings> {
        let file = File::open(path)
            .map_err(|e| Error::io(format!("could not open settings file {:?}", path), e))?;
        RawSettings::parse(BufReader::new(file), path)
    }

    /// Parse a settings document. `origin` is only used in error messages.
    pub fn parse<R: Read>(reader: R, origin: &Path) -> Result<RawSettings> {
        let parser = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .ignore_comments(true)
            .coalesce_characters(true)
            .create_reader(reader);

        let mut raw = RawSettings::default();
        let mut depth = 0usize;
        let mut seen_root = false;
        // The recognised child whose first node we have not seen yet.
        let mut pending: Option<SettingsField> = None;

        for event in parser {
            let event = event.map_err(|source| Error::Xml {
                path: origin.to_path_buf(),
                source,
            })?;
            match event {
                XmlEvent::StartElement { name, .. } => {
                    match depth {
                        0 => {
                            if name.local_name != "Settings" {
                                return Err(Error::Parse("missing Settings node".to_owned()));
                            }
                            seen_root = true;
                        }
                        1 => {
                            pending = SettingsField::from_name(&name.local_name);
                            if pending.is_none() {
                                debug!("ignoring unrecognised settings element <{}>", name.local_name);
                            }
                        }
                        // An element as first child leaves the field unset.
                        _ => pending = None,
                    }
                    depth += 1;
                }
                XmlEvent::EndElement { .. } => {
                    depth = depth.saturating_sub(1);
                    pending = None;
                }
                XmlEvent::Characters(text) => {
                    if depth == 2 {
                        if let Some(field) = pending.take() {
                            *raw.slot_mut(field) = Some(text);
                        }
                    }
                }
                _ => {}
            }
        }
        if !seen_root {
            return Err(Error::Parse("missing Settings node".to_owned()));
        }
        Ok(raw)
    }

    /// Apply defaults and check required fields. Stops at the first problem.
    pub fn validate(self) -> Result<Settings> {
        let batch_file_delim = self
            .batch_file_delim
            .unwrap_or_else(|| DEFAULT_DELIM.to_owned())
            .replace("\\t", "\t");
        if batch_file_delim.is_empty()
            || batch_file_delim.contains('\n')
            || batch_file_delim.contains("\\n")
        {
            return Err(Error::Validation(
                "invalid or missing batch file delimiter".to_owned(),
            ));
        }

        let cmd = match self.cmd {
            Some(cmd) if !cmd.is_empty() => cmd,
            _ => return Err(Error::Validation("missing batch command (Cmd)".to_owned())),
        };

        let processes_per_node = match self.processes_per_node.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PROCESSES_PER_NODE,
            Some(text) => match text.parse::<i64>() {
                Ok(n) => n.max(1) as usize,
                Err(_) => {
                    return Err(Error::Validation(format!(
                        "invalid ProcessesPerNode value '{}'",
                        text
                    )))
                }
            },
        };

        let shellscript_out_dir = match self.shellscript_out_dir {
            Some(dir) if !dir.is_empty() => {
                if dir.ends_with('/') {
                    dir
                } else {
                    format!("{}/", dir)
                }
            }
            _ => {
                return Err(Error::Validation(
                    "missing shellscript output directory (ShellscriptOutDir)".to_owned(),
                ))
            }
        };

        let shellscript_cmd = match self.shellscript_cmd {
            Some(cmd) if !cmd.is_empty() => cmd,
            _ => {
                return Err(Error::Validation(
                    "missing shellscript command, i.e. submission command (ShellscriptCmd)"
                        .to_owned(),
                ))
            }
        };

        Ok(Settings {
            description: self.description.unwrap_or_default(),
            home_dir: self.home_dir.unwrap_or_default(),
            in_dir: self.in_dir.unwrap_or_default(),
            out_dir: self.out_dir.unwrap_or_default(),
            pre_cmd: self.pre_cmd,
            batch_file_delim,
            batch_file_ignore_prefix: self.batch_file_ignore_prefix.filter(|p| !p.is_empty()),
            cmd,
            processes_per_node,
            shellscript_out_dir,
            shellscript_preamble: self.shellscript_preamble,
            shellscript_cmd,
        })
    }
}
