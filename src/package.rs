//! Resource files shipped next to the launcher and the command lines built
//! from them.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{LauncherError, Result};

/// `CREATE_NO_WINDOW` process creation flag.
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

const MODULE_MANIFEST: &str = "cvmd2html.psd1";
const RESOURCE_DIR: &str = "rsc";
const MESSAGE_BOX_SCRIPT: &str = "messageBox.ps1";
const MENU_ICON: &str = "menu.ico";

/// Script block run by PowerShell; `$args[0]` is the module manifest and
/// `$args[1]` the markdown file.
pub const CONVERSION_SCRIPT: &str = "try {Import-Module $args[0];cvmd2html -MarkdownPath $args[1]} catch {Write-Error $_.Exception.Message}";

#[derive(Debug, Clone)]
pub struct Package {
    /// PowerShell Core runtime.
    pub pwsh_exe: PathBuf,
    /// Module manifest exporting the `cvmd2html` function.
    pub module_manifest: PathBuf,
    pub message_box_script: PathBuf,
    pub menu_icon: PathBuf,
}

impl Package {
    pub fn new(root: &Path, pwsh_exe: PathBuf) -> Self {
        Self {
            pwsh_exe,
            module_manifest: root.join(MODULE_MANIFEST),
            message_box_script: root.join(RESOURCE_DIR).join(MESSAGE_BOX_SCRIPT),
            menu_icon: Self::menu_icon_in(root),
        }
    }

    /// Icon shown next to the shortcut menu entry.
    pub fn menu_icon_in(root: &Path) -> PathBuf {
        root.join(RESOURCE_DIR).join(MENU_ICON)
    }

    /// Fail early when the files needed for a conversion are absent.
    pub fn ensure_convertible(&self) -> Result<()> {
        for path in [&self.pwsh_exe, &self.module_manifest] {
            if !path.exists() {
                return Err(LauncherError::MissingResource(path.clone()));
            }
        }
        Ok(())
    }

    pub fn has_message_box_script(&self) -> bool {
        self.message_box_script.is_file()
    }

    /// Run the conversion of `markdown` in a hidden PowerShell console.
    pub fn conversion_command(&self, markdown: &Path) -> Command {
        let mut command = Command::new(&self.pwsh_exe);
        command.args([
            OsStr::new("-nop"),
            OsStr::new("-ep"),
            OsStr::new("Bypass"),
            OsStr::new("-w"),
            OsStr::new("Hidden"),
            OsStr::new("-cwa"),
            OsStr::new(CONVERSION_SCRIPT),
            self.module_manifest.as_os_str(),
            markdown.as_os_str(),
        ]);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }
        command
    }

    /// Arguments of the shortcut that starts the message box helper.
    pub fn message_box_link_arguments(&self) -> String {
        format!(
            "-nol -noni -nop -NoProfileLoadTime -f \"{}\"",
            self.message_box_script.display()
        )
    }
}

/// Directory holding the launcher executable.
pub fn script_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// `<dir>\<id>.tmp<extension>`, the naming used for ephemeral files.
pub fn temp_path_in(dir: &Path, id: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.tmp{}", id.to_lowercase(), extension))
}

/// A fresh path in the user's temp directory named after a new GUID.
#[cfg(windows)]
pub fn random_temp_path(extension: &str) -> Result<PathBuf> {
    let guid = windows::core::GUID::new()?;
    Ok(temp_path_in(
        &std::env::temp_dir(),
        &format!("{guid:?}"),
        extension,
    ))
}
