//! Installing and removing the "Convert to HTML" shortcut menu.

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;

/// Verb key under `HKEY_CURRENT_USER` for every `.md` file.
pub const VERB_KEY: &str = r"SOFTWARE\Classes\SystemFileAssociations\.md\shell\cthtml";
pub const COMMAND_SUBKEY: &str = "command";
pub const ICON_VALUE_NAME: &str = "Icon";
pub const DEFAULT_MENU_TEXT: &str = "Convert to &HTML";

/// Minimal view of a registry hive.
///
/// Paths are relative to the hive root. Operations on absent keys or values
/// succeed without effect, except `create_key` which creates every missing
/// key along the path. `delete_key` may refuse a key that still has subkeys.
pub trait KeyStore {
    fn create_key(&mut self, path: &str) -> Result<()>;
    /// Write a string value; `None` is the key's default value.
    fn set_string(&mut self, path: &str, name: Option<&str>, value: &str) -> Result<()>;
    fn delete_value(&mut self, path: &str, name: &str) -> Result<()>;
    fn subkeys(&self, path: &str) -> Result<Vec<String>>;
    fn delete_key(&mut self, path: &str) -> Result<()>;
}

/// Command run by Explorer for the selected file.
pub fn menu_command(launcher: &Path) -> String {
    format!("\"{}\" /Markdown:\"%1\"", launcher.display())
}

/// Write the verb and its command; `icon: None` removes any existing icon.
pub fn install<S>(store: &mut S, launcher: &Path, menu_text: &str, icon: Option<&Path>) -> Result<()>
where
    S: KeyStore + ?Sized,
{
    let command_key = format!("{VERB_KEY}\\{COMMAND_SUBKEY}");
    store.create_key(&command_key)?;
    store.set_string(&command_key, None, &menu_command(launcher))?;
    store.set_string(VERB_KEY, None, menu_text)?;
    match icon {
        Some(icon) => {
            store.set_string(VERB_KEY, Some(ICON_VALUE_NAME), &icon.display().to_string())?
        }
        None => store.delete_value(VERB_KEY, ICON_VALUE_NAME)?,
    }
    info!(key = VERB_KEY, with_icon = icon.is_some(), "shortcut menu installed");
    Ok(())
}

pub fn uninstall<S>(store: &mut S) -> Result<()>
where
    S: KeyStore + ?Sized,
{
    delete_tree(store, VERB_KEY)?;
    info!(key = VERB_KEY, "shortcut menu removed");
    Ok(())
}

/// Delete `key` with all its subkeys, leaves first.
pub fn delete_tree<S>(store: &mut S, key: &str) -> Result<()>
where
    S: KeyStore + ?Sized,
{
    for name in store.subkeys(key)? {
        delete_tree(store, &format!("{key}\\{name}"))?;
    }
    debug!(key, "deleting key");
    store.delete_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use std::collections::BTreeMap;

    /// Case-insensitive in-memory hive that rejects deleting non-leaf keys.
    #[derive(Default)]
    struct MemoryStore {
        keys: BTreeMap<String, BTreeMap<String, String>>,
        deleted: Vec<String>,
    }

    fn norm(path: &str) -> String {
        path.to_ascii_lowercase()
    }

    impl MemoryStore {
        fn value(&self, path: &str, name: &str) -> Option<&str> {
            self.keys
                .get(&norm(path))
                .and_then(|values| values.get(&norm(name)))
                .map(String::as_str)
        }

        fn children(&self, path: &str) -> Vec<String> {
            let prefix = format!("{}\\", norm(path));
            self.keys
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter(|rest| !rest.contains('\\'))
                .map(str::to_string)
                .collect()
        }
    }

    impl KeyStore for MemoryStore {
        fn create_key(&mut self, path: &str) -> Result<()> {
            let mut current = String::new();
            for part in path.split('\\') {
                if !current.is_empty() {
                    current.push('\\');
                }
                current.push_str(&norm(part));
                self.keys.entry(current.clone()).or_default();
            }
            Ok(())
        }

        fn set_string(&mut self, path: &str, name: Option<&str>, value: &str) -> Result<()> {
            let values = self.keys.get_mut(&norm(path)).ok_or(LauncherError::Registry {
                op: "set",
                key: path.to_string(),
                code: 2,
            })?;
            values.insert(norm(name.unwrap_or("")), value.to_string());
            Ok(())
        }

        fn delete_value(&mut self, path: &str, name: &str) -> Result<()> {
            if let Some(values) = self.keys.get_mut(&norm(path)) {
                values.remove(&norm(name));
            }
            Ok(())
        }

        fn subkeys(&self, path: &str) -> Result<Vec<String>> {
            Ok(self.children(path))
        }

        fn delete_key(&mut self, path: &str) -> Result<()> {
            if !self.children(path).is_empty() {
                return Err(LauncherError::Registry {
                    op: "delete",
                    key: path.to_string(),
                    code: 5,
                });
            }
            if self.keys.remove(&norm(path)).is_some() {
                self.deleted.push(norm(path));
            }
            Ok(())
        }
    }

    const LAUNCHER: &str = r"C:\Tools\cvmd2html\cvmd2html.exe";
    const ICON: &str = r"C:\Tools\cvmd2html\rsc\menu.ico";

    #[test]
    fn install_writes_verb_command_and_icon() {
        let mut store = MemoryStore::default();
        install(&mut store, Path::new(LAUNCHER), DEFAULT_MENU_TEXT, Some(Path::new(ICON))).unwrap();

        assert_eq!(store.value(VERB_KEY, ""), Some("Convert to &HTML"));
        assert_eq!(store.value(VERB_KEY, "Icon"), Some(ICON));
        assert_eq!(
            store.value(&format!(r"{VERB_KEY}\command"), ""),
            Some(r#""C:\Tools\cvmd2html\cvmd2html.exe" /Markdown:"%1""#)
        );
    }

    #[test]
    fn reinstall_without_icon_drops_icon_value() {
        let mut store = MemoryStore::default();
        install(&mut store, Path::new(LAUNCHER), DEFAULT_MENU_TEXT, Some(Path::new(ICON))).unwrap();
        install(&mut store, Path::new(LAUNCHER), DEFAULT_MENU_TEXT, None).unwrap();
        assert_eq!(store.value(VERB_KEY, "Icon"), None);
        assert_eq!(store.value(VERB_KEY, ""), Some(DEFAULT_MENU_TEXT));
    }

    #[test]
    fn uninstall_deletes_leaves_before_parents() {
        let mut store = MemoryStore::default();
        install(&mut store, Path::new(LAUNCHER), DEFAULT_MENU_TEXT, None).unwrap();
        store.create_key(&format!(r"{VERB_KEY}\extra\nested")).unwrap();

        uninstall(&mut store).unwrap();

        let verb = norm(VERB_KEY);
        let pos = |k: &str| store.deleted.iter().position(|d| d == k).unwrap();
        assert_eq!(store.deleted.len(), 4);
        assert!(pos(&format!(r"{verb}\extra\nested")) < pos(&format!(r"{verb}\extra")));
        assert!(pos(&format!(r"{verb}\extra")) < pos(&verb));
        assert!(pos(&format!(r"{verb}\command")) < pos(&verb));
        assert_eq!(store.deleted.last(), Some(&verb));
        assert!(store.keys.contains_key(&norm(r"SOFTWARE\Classes\SystemFileAssociations\.md\shell")));
    }

    #[test]
    fn uninstall_when_absent_is_a_no_op() {
        let mut store = MemoryStore::default();
        uninstall(&mut store).unwrap();
        assert!(store.deleted.is_empty());
    }
}
