use std::cell::RefCell;
use std::io::Cursor;
use std::path::PathBuf;

use cvmd2html::params::Params;
use cvmd2html::popup::{Buttons, PopupKind, Prompter};
use cvmd2html::setup::menu_command;
use cvmd2html::supervisor::{error_message, relay_output};
use pretty_assertions::assert_eq;

/// Answers every question from a script and records what was shown.
struct ScriptedUser {
    answers: RefCell<Vec<&'static str>>,
    seen: RefCell<Vec<String>>,
}

impl ScriptedUser {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().rev().copied().collect()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedUser {
    fn popup(
        &self,
        text: &str,
        kind: PopupKind,
        buttons: Buttons,
    ) -> cvmd2html::Result<Option<String>> {
        assert_eq!((kind, buttons), (PopupKind::Warning, Buttons::YesNo));
        self.seen.borrow_mut().push(text.to_string());
        Ok(self.answers.borrow_mut().pop().map(str::to_string))
    }
}

#[test]
fn explorer_command_round_trips_through_the_parser() {
    let command = menu_command(&PathBuf::from(r"C:\Apps\cvmd2html.exe"));
    assert_eq!(command, r#""C:\Apps\cvmd2html.exe" /Markdown:"%1""#);

    // Explorer substitutes %1; the C runtime strips the quotes.
    let argument = r"/Markdown:C:\Users\me\Documents\Read Me.md";
    assert_eq!(
        Params::parse([argument]),
        Params::Convert {
            markdown: PathBuf::from(r"C:\Users\me\Documents\Read Me.md")
        }
    );
}

#[test]
fn two_overwrite_questions_get_two_answers() {
    let transcript = "\
Converting a.md
The file a.html exists.
Overwrite a.html?
Converting b.md

The file b.html exists.
Overwrite b.html?
";
    let user = ScriptedUser::new(&["Yes", "No"]);
    let mut stdin = Vec::new();
    relay_output(Cursor::new(transcript), &mut stdin, &user).unwrap();

    assert_eq!(
        *user.seen.borrow(),
        [
            "Converting a.md\nThe file a.html exists.\n\nOverwrite a.html?",
            "Converting b.md\nThe file b.html exists.\n\nOverwrite b.html?",
        ]
    );
    assert_eq!(String::from_utf8(stdin).unwrap(), "Yes\nNo\n");
}

#[test]
fn powershell_error_record_is_reduced_to_its_message() {
    let stderr = "\x1b[31;1mcvmd2html: \x1b[0m\x1b[31;1mAccess to the path 'C:\\out\\a.html' is denied.\x1b[0m\r\n";
    assert_eq!(
        error_message(stderr).as_deref(),
        Some(r"Access to the path 'C:\out\a.html' is denied.")
    );
}
