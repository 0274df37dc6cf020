//! External command execution.
//!
//! Used by `lint` (script linter) and `report` (page audits). Both take the
//! program and its leading arguments from config, so commands are passed
//! around as `&[String]` plus extra per-invocation arguments.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
};

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(&["git".to_owned()]; "--version")?;
///
/// // With working directory
/// exec!(root; &config.lint.scripts; &file)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            None,
            $cmd,
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            Some($root),
            $cmd,
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

/// Execute `cmd` followed by `args` and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(root: Option<&Path>, cmd: &[String], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output)?;
    Ok(output)
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[String], args: &[OsString]) -> Result<(String, Command)> {
    let Some((program, leading)) = cmd.split_first() else {
        bail!("Empty command");
    };

    let mut command = Command::new(program);
    command.args(leading).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    // Log under the program's file name, not its full path
    let name = Path::new(program)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(program)
        .to_owned();

    Ok((name, command))
}

/// Log command output line by line; on failure return stderr as the error.
fn log_output(name: &str, output: &Output) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        if detail.is_empty() {
            bail!("Command `{name}` failed with {}", output.status);
        }
        bail!("Command `{name}` failed with {}:\n{detail}", output.status);
    }

    for line in stdout.lines().chain(stderr.lines()) {
        if !line.trim().is_empty() {
            log!(name; "{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_to_os() {
        assert_eq!(to_os("hello"), OsString::from("hello"));
        assert_eq!(to_os(String::from("world")), OsString::from("world"));
    }

    #[test]
    fn test_filter_args() {
        let args = [OsString::from("a"), OsString::from(""), OsString::from("b")];
        let filtered = filter_args(&args);
        assert_eq!(filtered, vec![OsString::from("a"), OsString::from("b")]);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_prepare_uses_file_name() {
        let (name, command) = prepare(None, &cmd(&["/usr/bin/lighthouse", "--quiet"]), &[]).unwrap();
        assert_eq!(name, "lighthouse");
        assert_eq!(command.get_args().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_success_and_failure() {
        assert!(exec(None, &cmd(&["true"]), &[]).is_ok());

        let err = exec(None, &cmd(&["sh", "-c"]), &[to_os("echo boom >&2; exit 3")]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_macro_with_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = exec!(dir.path(); &cmd(&["pwd"]);).unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(printed.trim()).canonicalize().unwrap(), expected);
    }
}
