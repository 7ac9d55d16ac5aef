#![cfg(windows)]

use std::fs;
use std::path::{Path, PathBuf};

use windows::Win32::Foundation::TRUE;
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    CoUninitialize, IPersistFile,
};
use windows::Win32::UI::Shell::{IShellLinkW, ShellLink};
use windows::core::{Interface, PCWSTR};

use crate::error::Result;
use crate::utils::to_wide;

/// COM single-threaded apartment for the current thread, left on drop.
pub struct ComApartment(());

impl ComApartment {
    pub fn enter() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok()? };
        Ok(Self(()))
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// A `.lnk` file that exists for as long as this value lives.
#[derive(Debug)]
pub struct ShortcutLink {
    path: PathBuf,
}

impl ShortcutLink {
    /// Save a shortcut at `path` that runs `target` with `arguments`.
    /// Requires a [`ComApartment`] on the calling thread.
    pub fn create(path: PathBuf, target: &Path, arguments: &str, icon: &Path) -> Result<Self> {
        let wtarget = to_wide(target);
        let warguments = to_wide(arguments);
        let wicon = to_wide(icon);
        let wpath = to_wide(&path);
        unsafe {
            let link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
            link.SetPath(PCWSTR(wtarget.as_ptr()))?;
            link.SetArguments(PCWSTR(warguments.as_ptr()))?;
            link.SetIconLocation(PCWSTR(wicon.as_ptr()), 0)?;
            let persist: IPersistFile = link.cast()?;
            persist.Save(PCWSTR(wpath.as_ptr()), TRUE)?;
        }
        tracing::debug!(link = %path.display(), "shortcut link saved");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ShortcutLink {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
