// src/save.rs

//! Save-file picker used by the Ctrl/Cmd+S shortcut.
//!
//! The picker is a seam: the session asks a [`SaveDialog`] for a destination
//! and writes the PNG itself. [`NativeSaveDialog`] shells out to whichever
//! desktop file chooser is installed; when none can be started the save step
//! is skipped without an error.

use log::{debug, warn};
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File extension written by the save flow.
pub const PNG_EXTENSION: &str = "png";

/// Asks the operator where to save the drawing.
pub trait SaveDialog: Send {
    /// Returns the chosen path, or `None` when the operator cancelled or no
    /// picker could be shown.
    fn choose_destination(&mut self, suggested: &Path) -> Option<PathBuf>;
}

/// The file name offered by the picker: the window title plus `.png`.
///
/// Path separators in the title are replaced so the suggestion always names
/// a file in the current directory.
pub fn suggested_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == '\0' { '_' } else { c })
        .collect();
    let stem = if stem.trim().is_empty() {
        "drawing".to_string()
    } else {
        stem
    };
    format!("{}.{}", stem, PNG_EXTENSION)
}

/// The suggested file, located in the current working directory.
pub fn suggested_path(title: &str) -> PathBuf {
    Path::new(".").join(suggested_file_name(title))
}

/// Picker that never shows anything and always answers with a fixed
/// destination. Useful for scripted sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedDestination {
    destination: Option<PathBuf>,
    asked: Vec<PathBuf>,
}

impl FixedDestination {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        FixedDestination {
            destination: Some(destination.into()),
            asked: Vec::new(),
        }
    }

    /// A picker the operator always cancels.
    pub fn cancelled() -> Self {
        Self::default()
    }

    /// The suggestions this picker was shown, oldest first.
    pub fn suggestions(&self) -> &[PathBuf] {
        &self.asked
    }
}

impl SaveDialog for FixedDestination {
    fn choose_destination(&mut self, suggested: &Path) -> Option<PathBuf> {
        self.asked.push(suggested.to_path_buf());
        self.destination.clone()
    }
}

/// Argument conventions of the supported desktop file choosers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chooser {
    Zenity,
    KDialog,
}

impl Chooser {
    fn command(self, program: &OsStr, suggested: &Path) -> Command {
        let mut cmd = Command::new(program);
        match self {
            Chooser::Zenity => {
                cmd.arg("--file-selection")
                    .arg("--save")
                    .arg("--confirm-overwrite")
                    .arg("--title=Save drawing")
                    .arg(format!("--filename={}", suggested.display()))
                    .arg("--file-filter=Portable Network Graphic file | *.png");
            }
            Chooser::KDialog => {
                cmd.arg("--title")
                    .arg("Save drawing")
                    .arg("--getsavefilename")
                    .arg(suggested)
                    .arg("Portable Network Graphic file (*.png)");
            }
        }
        cmd
    }
}

/// Uses zenity or kdialog, whichever starts first.
#[derive(Debug)]
pub struct NativeSaveDialog {
    candidates: Vec<(Chooser, OsString)>,
    /// Index into `candidates`, remembered after the first successful launch.
    chosen: Option<usize>,
}

impl Default for NativeSaveDialog {
    fn default() -> Self {
        Self::with_programs("zenity", "kdialog")
    }
}

impl NativeSaveDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the given executables, with zenity and kdialog arguments
    /// respectively, instead of looking both up on `PATH`.
    pub fn with_programs(zenity: impl Into<OsString>, kdialog: impl Into<OsString>) -> Self {
        NativeSaveDialog {
            candidates: vec![
                (Chooser::Zenity, zenity.into()),
                (Chooser::KDialog, kdialog.into()),
            ],
            chosen: None,
        }
    }

    fn run(
        chooser: Chooser,
        program: &OsStr,
        suggested: &Path,
    ) -> Result<Option<PathBuf>, std::io::Error> {
        let output = chooser.command(program, suggested).output()?;
        if !output.status.success() {
            debug!("{:?} save dialog dismissed ({})", chooser, output.status);
            return Ok(None);
        }
        let chosen = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if chosen.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(chosen)))
    }
}

impl SaveDialog for NativeSaveDialog {
    fn choose_destination(&mut self, suggested: &Path) -> Option<PathBuf> {
        let order: Vec<usize> = match self.chosen {
            Some(known) => vec![known],
            None => (0..self.candidates.len()).collect(),
        };

        for index in order {
            let (chooser, program) = &self.candidates[index];
            match Self::run(*chooser, program, suggested) {
                Ok(choice) => {
                    self.chosen = Some(index);
                    return choice;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{:?} not installed ({:?})", chooser, program);
                }
                Err(e) => {
                    warn!("Failed to run {:?} save dialog: {}", chooser, e);
                }
            }
        }

        debug!("No save dialog available, skipping save");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn suggestion_is_title_plus_png_in_current_dir() {
        assert_eq!(suggested_file_name("DrawFrame"), "DrawFrame.png");
        assert_eq!(suggested_file_name("My Drawing"), "My Drawing.png");
        assert_eq!(suggested_path("Demo"), Path::new("./Demo.png"));
    }

    #[test]
    fn suggestion_never_escapes_the_directory() {
        assert_eq!(suggested_file_name("a/b\\c"), "a_b_c.png");
        assert_eq!(suggested_file_name("   "), "drawing.png");
    }

    #[test]
    fn fixed_destination_records_suggestions() {
        let mut dialog = FixedDestination::new("/tmp/out.png");
        let chosen = dialog.choose_destination(Path::new("./T.png"));
        assert_eq!(chosen, Some(PathBuf::from("/tmp/out.png")));
        assert_eq!(dialog.suggestions(), &[PathBuf::from("./T.png")]);

        let mut cancelled = FixedDestination::cancelled();
        assert_eq!(cancelled.choose_destination(Path::new("./T.png")), None);
    }

    #[test]
    fn missing_choosers_skip_the_save_quietly() {
        let mut dialog = NativeSaveDialog::with_programs(
            "/nonexistent/drawframe-zenity",
            "/nonexistent/drawframe-kdialog",
        );
        assert_eq!(dialog.choose_destination(Path::new("./T.png")), None);
        // Still nothing remembered, so a later call tries both again.
        assert_eq!(dialog.chosen, None);
        assert_eq!(dialog.choose_destination(Path::new("./T.png")), None);
    }
}
