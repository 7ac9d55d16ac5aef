#![cfg(windows)]

use std::path::PathBuf;

use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, WIN32_ERROR};
use windows::Win32::System::Registry::*;
use windows::core::{PCWSTR, PWSTR};

use crate::error::{LauncherError, Result};
use crate::setup::KeyStore;
use crate::utils::to_wide;

const PWSH_APP_PATH: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\App Paths\pwsh.exe";

/// Longest key name allowed by the registry, plus the terminator.
const MAX_KEY_NAME: usize = 256;

fn check(status: WIN32_ERROR, op: &'static str, key: &str) -> Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(LauncherError::Registry {
            op,
            key: key.to_string(),
            code: status.0,
        })
    }
}

/// Open registry key, closed on drop.
pub struct RegKey {
    hkey: HKEY,
    path: String,
}

impl RegKey {
    pub fn create(root: HKEY, path: &str) -> Result<Self> {
        let wpath = to_wide(path);
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                root,
                PCWSTR(wpath.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_READ | KEY_WRITE,
                None,
                &mut hkey,
                None,
            )
        };
        check(status, "RegCreateKeyExW", path)?;
        Ok(Self {
            hkey,
            path: path.to_string(),
        })
    }

    /// Open an existing key; `Ok(None)` when it does not exist.
    pub fn open(root: HKEY, path: &str, access: REG_SAM_FLAGS) -> Result<Option<Self>> {
        let wpath = to_wide(path);
        let mut hkey = HKEY::default();
        let status = unsafe { RegOpenKeyExW(root, PCWSTR(wpath.as_ptr()), 0, access, &mut hkey) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "RegOpenKeyExW", path)?;
        Ok(Some(Self {
            hkey,
            path: path.to_string(),
        }))
    }

    pub fn set_string(&self, name: Option<&str>, value: &str) -> Result<()> {
        let wname = name.map(to_wide);
        let pname = wname
            .as_ref()
            .map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr()));
        let data: Vec<u8> = to_wide(value)
            .into_iter()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let status = unsafe { RegSetValueExW(self.hkey, pname, 0, REG_SZ, Some(&data)) };
        check(status, "RegSetValueExW", &self.path)
    }

    /// Read a `REG_SZ` or `REG_EXPAND_SZ` value as stored.
    pub fn get_string(&self, name: Option<&str>) -> Result<Option<String>> {
        let wname = name.map(to_wide);
        let pname = wname
            .as_ref()
            .map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr()));
        let mut ty = REG_VALUE_TYPE(0);
        let mut cb = 0u32;
        let status = unsafe {
            RegQueryValueExW(
                self.hkey,
                pname,
                None,
                Some(&mut ty as *mut _),
                None,
                Some(&mut cb as *mut _),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "RegQueryValueExW", &self.path)?;
        if ty != REG_SZ && ty != REG_EXPAND_SZ {
            return Ok(None);
        }

        let mut buf = vec![0u16; (cb as usize).div_ceil(2) + 1];
        let mut cb2 = (buf.len() * 2) as u32;
        let status = unsafe {
            RegQueryValueExW(
                self.hkey,
                pname,
                None,
                None,
                Some(buf.as_mut_ptr().cast::<u8>()),
                Some(&mut cb2 as *mut _),
            )
        };
        check(status, "RegQueryValueExW", &self.path)?;
        buf.truncate(cb2 as usize / 2);
        while buf.last() == Some(&0) {
            buf.pop();
        }
        Ok(Some(String::from_utf16_lossy(&buf)))
    }

    pub fn delete_value(&self, name: &str) -> Result<()> {
        let wname = to_wide(name);
        let status = unsafe { RegDeleteValueW(self.hkey, PCWSTR(wname.as_ptr())) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(());
        }
        check(status, "RegDeleteValueW", &self.path)
    }

    pub fn subkey_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut index = 0u32;
        loop {
            let mut buf = [0u16; MAX_KEY_NAME];
            let mut len = buf.len() as u32;
            let status = unsafe {
                RegEnumKeyExW(
                    self.hkey,
                    index,
                    PWSTR(buf.as_mut_ptr()),
                    &mut len,
                    None,
                    PWSTR::null(),
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            check(status, "RegEnumKeyExW", &self.path)?;
            names.push(String::from_utf16_lossy(&buf[..len as usize]));
            index += 1;
        }
        Ok(names)
    }
}

impl Drop for RegKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.hkey) };
    }
}

/// Keys under `HKEY_CURRENT_USER`.
pub struct CurrentUser;

impl KeyStore for CurrentUser {
    fn create_key(&mut self, path: &str) -> Result<()> {
        RegKey::create(HKEY_CURRENT_USER, path).map(drop)
    }

    fn set_string(&mut self, path: &str, name: Option<&str>, value: &str) -> Result<()> {
        RegKey::create(HKEY_CURRENT_USER, path)?.set_string(name, value)
    }

    fn delete_value(&mut self, path: &str, name: &str) -> Result<()> {
        match RegKey::open(HKEY_CURRENT_USER, path, KEY_SET_VALUE)? {
            Some(key) => key.delete_value(name),
            None => Ok(()),
        }
    }

    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        match RegKey::open(HKEY_CURRENT_USER, path, KEY_ENUMERATE_SUB_KEYS)? {
            Some(key) => key.subkey_names(),
            None => Ok(Vec::new()),
        }
    }

    fn delete_key(&mut self, path: &str) -> Result<()> {
        let wpath = to_wide(path);
        let status = unsafe { RegDeleteKeyW(HKEY_CURRENT_USER, PCWSTR(wpath.as_ptr())) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(());
        }
        check(status, "RegDeleteKeyW", path)
    }
}

/// PowerShell Core executable registered under the machine `App Paths`.
pub fn pwsh_path() -> Result<PathBuf> {
    let key = RegKey::open(HKEY_LOCAL_MACHINE, PWSH_APP_PATH, KEY_READ)?
        .ok_or(LauncherError::PwshNotFound)?;
    let value = key.get_string(None)?.ok_or(LauncherError::PwshNotFound)?;
    Ok(PathBuf::from(value.trim_matches('"')))
}
