//! `%%`-placeholder substitution.
use crate::error::{Error, Result};
use crate::settings::Settings;
use regex::Regex;
use std::{path::Path, sync::OnceLock};

pub const HOMEDIR: &str = "%%HOMEDIR";
pub const INDIR: &str = "%%INDIR";
pub const OUTDIR: &str = "%%OUTDIR";
pub const SETTINGSFILE: &str = "%%SETTINGSFILE";
pub const BATCHFILE: &str = "%%BATCHFILE";
pub const BATCHID: &str = "%%BATCHID";
pub const DATE: &str = "%%DATE";
pub const SHELLSCRIPT: &str = "%%SHELLSCRIPT";

/// Replace every occurrence of each token with its value, one table entry at
/// a time and in table order. Matching is literal.
pub fn replace_tokens(source: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .fold(source.to_owned(), |s, (token, value)| s.replace(token, value))
}

/// Base name of a path given on the command line, as used in file names.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Values derived from the invocation rather than from the settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedContext {
    pub settings_file: String,
    pub batch_file: String,
    pub batch_id: String,
    pub date: String,
}

impl FixedContext {
    /// Context for a run starting now, dated with the local clock.
    pub fn new(settings_path: &Path, batch_path: &Path, batch_id: &str) -> Self {
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        FixedContext::with_date(settings_path, batch_path, batch_id, &date)
    }

    pub fn with_date(settings_path: &Path, batch_path: &Path, batch_id: &str, date: &str) -> Self {
        FixedContext {
            settings_file: base_name(settings_path),
            batch_file: base_name(batch_path),
            batch_id: batch_id.to_owned(),
            date: date.to_owned(),
        }
    }

    /// The fixed substitution table, in application order.
    pub fn table<'a>(&'a self, settings: &'a Settings) -> [(&'static str, &'a str); 7] {
        [
            (HOMEDIR, settings.home_dir.as_str()),
            (INDIR, settings.in_dir.as_str()),
            (OUTDIR, settings.out_dir.as_str()),
            (SETTINGSFILE, self.settings_file.as_str()),
            (BATCHFILE, self.batch_file.as_str()),
            (BATCHID, self.batch_id.as_str()),
            (DATE, self.date.as_str()),
        ]
    }
}

/// Resolve the fixed placeholders in every string field of `settings`.
///
/// Fields are resolved in the order home, in, out, pre-command, command,
/// shell-script dir, preamble, submission command, and the table is rebuilt
/// before each one. So `InDir` may use `%%HOMEDIR` and get the resolved home
/// directory, and everything after `OutDir` sees all three resolved.
pub fn resolve_fixed(mut settings: Settings, ctx: &FixedContext) -> Settings {
    let home_dir = replace_tokens(&settings.home_dir, &ctx.table(&settings));
    settings.home_dir = home_dir;
    let in_dir = replace_tokens(&settings.in_dir, &ctx.table(&settings));
    settings.in_dir = in_dir;
    let out_dir = replace_tokens(&settings.out_dir, &ctx.table(&settings));
    settings.out_dir = out_dir;

    let table = ctx.table(&settings);
    let pre_cmd = settings.pre_cmd.as_deref().map(|s| replace_tokens(s, &table));
    let cmd = replace_tokens(&settings.cmd, &table);
    let shellscript_out_dir = replace_tokens(&settings.shellscript_out_dir, &table);
    let shellscript_preamble = settings
        .shellscript_preamble
        .as_deref()
        .map(|s| replace_tokens(s, &table));
    let shellscript_cmd = replace_tokens(&settings.shellscript_cmd, &table);

    Settings {
        pre_cmd,
        cmd,
        shellscript_out_dir,
        shellscript_preamble,
        shellscript_cmd,
        ..settings
    }
}

fn positional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%%([0-9]+)").expect("positional placeholder regex"))
}

/// The positional arguments of one batch line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineArgs<'a> {
    args: Vec<&'a str>,
}

impl<'a> LineArgs<'a> {
    /// Split a batch line on `delim`, after trimming surrounding whitespace.
    pub fn split(line: &'a str, delim: &str) -> Self {
        LineArgs {
            args: line.trim().split(delim).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Replace each `%%<N>` in `template` with argument N (0-based).
    pub fn substitute(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in positional_re().captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always matches");
            // An index too large for usize is out of range as well.
            let index = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            let arg = self.args.get(index).ok_or(Error::Submission {
                index,
                available: self.len(),
            })?;
            out.push_str(&template[last..whole.start()]);
            out.push_str(arg);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RawSettings;

    fn settings() -> Settings {
        RawSettings {
            home_dir: Some("/home/me".to_owned()),
            in_dir: Some("%%HOMEDIR/data".to_owned()),
            out_dir: Some("%%HOMEDIR/results/%%DATE".to_owned()),
            pre_cmd: Some("prep %%INDIR %%SETTINGSFILE".to_owned()),
            cmd: Some("app -o %%OUTDIR/%%0.%%BATCHID.out %%0".to_owned()),
            shellscript_out_dir: Some("%%HOMEDIR/tmp/%%DATE".to_owned()),
            shellscript_cmd: Some("esubmit %%BATCHFILE %%SHELLSCRIPT".to_owned()),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn ctx() -> FixedContext {
        FixedContext::with_date(
            Path::new("conf/set.xml"),
            Path::new("/data/batchlist"),
            "RUN11",
            "2024-03-01",
        )
    }

    #[test]
    fn test_literal_text_unchanged() {
        let text = "no placeholders here, 100% literal";
        assert_eq!(replace_tokens(text, &ctx().table(&settings())), text);
    }

    #[test]
    fn test_replace_tokens_in_order() {
        // A value introducing a later token is expanded; an earlier one is not.
        let table = [("%%A", "%%B"), ("%%B", "b"), ("%%C", "%%A")];
        assert_eq!(replace_tokens("%%A %%C", &table), "b %%A");
    }

    #[test]
    fn test_base_names() {
        let ctx = ctx();
        assert_eq!(ctx.settings_file, "set.xml");
        assert_eq!(ctx.batch_file, "batchlist");
    }

    #[test]
    fn test_resolve_fixed_dependency_order() {
        let resolved = resolve_fixed(settings(), &ctx());
        assert_eq!(resolved.in_dir, "/home/me/data");
        assert_eq!(resolved.out_dir, "/home/me/results/2024-03-01");
        assert_eq!(resolved.pre_cmd.as_deref(), Some("prep /home/me/data set.xml"));
        assert_eq!(
            resolved.cmd,
            "app -o /home/me/results/2024-03-01/%%0.RUN11.out %%0"
        );
        assert_eq!(resolved.shellscript_out_dir, "/home/me/tmp/2024-03-01/");
        assert_eq!(resolved.shellscript_cmd, "esubmit batchlist %%SHELLSCRIPT");
    }

    #[test]
    fn test_home_dir_sees_unresolved_later_dirs() {
        let mut s = settings();
        s.home_dir = "/h/%%INDIR".to_owned();
        let resolved = resolve_fixed(s, &ctx());
        assert_eq!(resolved.home_dir, "/h/%%HOMEDIR/data");
        assert_eq!(resolved.in_dir, "/h/%%HOMEDIR/data/data");
    }

    #[test]
    fn test_unset_fields_stay_unset() {
        let resolved = resolve_fixed(settings(), &ctx());
        assert_eq!(resolved.shellscript_preamble, None);
        assert_eq!(resolved.description, "");
    }

    #[test]
    fn test_positional_substitution() {
        let args = LineArgs::split("AAA\tBBB\tCCC\n", "\t");
        assert_eq!(args.len(), 3);
        assert_eq!(
            args.substitute("run -o %%1.out %%0 %%2%%2").unwrap(),
            "run -o BBB.out AAA CCCCCC"
        );
        assert_eq!(args.substitute("%%SHELLSCRIPT").unwrap(), "%%SHELLSCRIPT");
    }

    #[test]
    fn test_positional_out_of_range() {
        let args = LineArgs::split("a b c", " ");
        match args.substitute("x %%5") {
            Err(Error::Submission { index, available }) => {
                assert_eq!(index, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multichar_delimiter() {
        let args = LineArgs::split("  one::two ", "::");
        assert_eq!(args.substitute("%%1-%%0").unwrap(), "two-one");
    }
}
