//! Message boxes shown on behalf of the hidden conversion process.
//!
//! Two backends answer a [`Prompter`] call. The helper backend runs the
//! `messageBox.ps1` script through a temporary shortcut and collects the
//! answer from a log file. The native backend calls `MessageBoxW` directly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Icon of the message box, valued as the matching `MB_ICON*` flag.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Normal = 0,
    Error = 16,
    Warning = 48,
}

/// Buttons of the message box, valued as the matching `MB_*` flag.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buttons {
    OkOnly = 0,
    YesNo = 4,
}

/// Shows a message and returns the caption of the button the user chose.
pub trait Prompter {
    fn popup(&self, text: &str, kind: PopupKind, buttons: Buttons) -> Result<Option<String>>;
}

/// Out-of-band return channel written by the popup helper.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct AnswerLog {
    path: PathBuf,
}

impl AnswerLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First line of the log, if the helper wrote one.
    pub fn read(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        content.lines().next().map(|line| line.trim_end().to_string())
    }
}

impl Drop for AnswerLog {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Arguments given to `cmd.exe` to run the helper link and capture its answer.
///
/// The message goes through three levels of `cmd` quoting, so double quotes
/// are replaced by `*` and newlines by `^`, which the helper script restores.
pub fn helper_command_args(
    link: &Path,
    text: &str,
    buttons: Buttons,
    kind: PopupKind,
    answer_log: &Path,
) -> String {
    let text = text.replace('"', "*").replace('\n', "^");
    format!(
        "/d /c \"\"{}\" \"\"\"{}\"\"\" {} {} > \"{}\"\"",
        link.display(),
        text,
        buttons as u32,
        kind as u32,
        answer_log.display()
    )
}

#[cfg(windows)]
pub use native::{HelperPopup, NativePopup};

#[cfg(windows)]
mod native {
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        IDNO, IDOK, IDYES, MB_SETFOREGROUND, MESSAGEBOX_STYLE, MessageBoxW,
    };
    use windows::core::PCWSTR;

    use super::{AnswerLog, Buttons, PopupKind, Prompter, helper_command_args};
    use crate::error::{LauncherError, Result};
    use crate::package::{CREATE_NO_WINDOW, Package, random_temp_path};
    use crate::shortcut::ShortcutLink;
    use crate::utils::to_wide;

    const CMD_EXE: &str = r"C:\Windows\System32\cmd.exe";

    /// Runs `messageBox.ps1` through a temporary shortcut link.
    pub struct HelperPopup<'a> {
        package: &'a Package,
    }

    impl<'a> HelperPopup<'a> {
        pub fn new(package: &'a Package) -> Self {
            Self { package }
        }
    }

    impl Prompter for HelperPopup<'_> {
        fn popup(&self, text: &str, kind: PopupKind, buttons: Buttons) -> Result<Option<String>> {
            let answer_log = AnswerLog::new(random_temp_path(".log")?);
            {
                let link = ShortcutLink::create(
                    random_temp_path(".lnk")?,
                    &self.package.pwsh_exe,
                    &self.package.message_box_link_arguments(),
                    &self.package.menu_icon,
                )?;
                let args =
                    helper_command_args(link.path(), text, buttons, kind, answer_log.path());
                tracing::debug!(?kind, ?buttons, "running popup helper");
                let status = Command::new(CMD_EXE)
                    .raw_arg(args)
                    .creation_flags(CREATE_NO_WINDOW)
                    .status()
                    .map_err(|source| LauncherError::Spawn {
                        program: CMD_EXE.to_string(),
                        source,
                    })?;
                if !status.success() {
                    tracing::warn!(?status, "popup helper exited with an error");
                }
            }
            Ok(answer_log.read())
        }
    }

    /// Falls back to the system message box.
    pub struct NativePopup {
        caption: Vec<u16>,
    }

    impl NativePopup {
        pub fn new(caption: &str) -> Self {
            Self {
                caption: to_wide(caption),
            }
        }
    }

    impl Prompter for NativePopup {
        fn popup(&self, text: &str, kind: PopupKind, buttons: Buttons) -> Result<Option<String>> {
            let wtext = to_wide(text);
            let style = MESSAGEBOX_STYLE(kind as u32 | buttons as u32) | MB_SETFOREGROUND;
            let result = unsafe {
                MessageBoxW(
                    HWND::default(),
                    PCWSTR(wtext.as_ptr()),
                    PCWSTR(self.caption.as_ptr()),
                    style,
                )
            };
            let answer = match result {
                IDYES => Some("Yes"),
                IDNO => Some("No"),
                IDOK => Some("OK"),
                _ => None,
            };
            Ok(answer.map(str::to_string))
        }
    }
}
