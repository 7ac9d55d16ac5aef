//! Command-line parameter selection.
//!
//! The launcher accepts Windows-style named switches (`/Name` or
//! `/Name:value`, names case-insensitive) or a single positional path.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Convert the selected markdown file.
    Convert { markdown: PathBuf },
    /// Install the shortcut menu, optionally without its icon.
    Set { no_icon: bool },
    /// Remove the shortcut menu.
    Unset,
    Help,
}

pub const HELP_TEXT: &str = "\
The MarkdownToHtml shortcut launcher.
It starts the shortcut menu target script in a hidden window.

Syntax:
  cvmd2html.exe /Markdown:<markdown file path>
  cvmd2html.exe [/Set[:NoIcon]]
  cvmd2html.exe /Unset
  cvmd2html.exe /Help

<markdown file path>  The selected markdown's file path.
                 Set  Configure the shortcut menu in the registry.
              NoIcon  Specifies that the icon is not configured.
               Unset  Removes the shortcut menu.
                Help  Show the help doc.
";

/// Split `/Name:value` into its name and optional value.
fn named_switch(arg: &str) -> Option<(&str, Option<&str>)> {
    let rest = arg.strip_prefix('/')?;
    Some(match rest.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    })
}

impl Params {
    /// Select the parameter set from the arguments, program name excluded.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        match args.as_slice() {
            [] => Params::Set { no_icon: false },
            [arg] => Self::parse_single(arg.as_ref()),
            _ => Params::Help,
        }
    }

    fn parse_single(arg: &str) -> Self {
        let Some((name, value)) = named_switch(arg) else {
            if arg.is_empty() {
                return Params::Help;
            }
            return Params::Convert {
                markdown: PathBuf::from(arg),
            };
        };

        if name.eq_ignore_ascii_case("Markdown") {
            if let Some(path) = value.filter(|v| !v.is_empty()) {
                return Params::Convert {
                    markdown: PathBuf::from(path),
                };
            }
        }
        if name.eq_ignore_ascii_case("Set") {
            match value {
                None => return Params::Set { no_icon: false },
                Some(v) if v.eq_ignore_ascii_case("NoIcon") => {
                    return Params::Set { no_icon: true };
                }
                Some(_) => {}
            }
        }
        if name.eq_ignore_ascii_case("Unset") && value.is_none() {
            return Params::Unset;
        }
        Params::Help
    }
}
