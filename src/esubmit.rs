//! Handling specific to the `esubmit` scheduler front end.
use regex::{NoExpand, Regex};
use std::sync::OnceLock;

const ESUBMIT: &str = "esubmit";

fn cac_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-c *(\S+)").expect("cac regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-t *([0-9.]+)").expect("time regex"))
}

pub fn is_esubmit(cmd: &str) -> bool {
    cmd.contains(ESUBMIT)
}

/// Rewrite the `-c` and `-t` values of an esubmit command. Other commands
/// are returned unchanged.
pub fn apply_overrides(cmd: &str, cac: Option<&str>, time: Option<&str>) -> String {
    if !is_esubmit(cmd) {
        return cmd.to_owned();
    }
    let mut cmd = cmd.to_owned();
    if let Some(cac) = cac {
        cmd = cac_re()
            .replace_all(&cmd, NoExpand(&format!("-c {}", cac)))
            .into_owned();
    }
    if let Some(time) = time {
        cmd = time_re()
            .replace_all(&cmd, NoExpand(&format!("-t {}", time)))
            .into_owned();
    }
    cmd
}

/// Human-readable notes on what an esubmit command will request.
pub fn describe(cmd: &str) -> Vec<String> {
    let mut notes = Vec::new();
    match cac_re().captures(cmd) {
        Some(caps) => notes.push(format!("Using CAC {}.", &caps[1])),
        None => notes.push("Using user's default CAC.".to_owned()),
    }
    if cmd.contains("-m ") {
        notes.push("Suppressing e-mail notifications.".to_owned());
    }
    match time_re().captures(cmd) {
        Some(caps) => notes.push(format!("Time limit is {} minutes.", &caps[1])),
        None => notes.push("No time limit given.".to_owned()),
    }
    notes
}
