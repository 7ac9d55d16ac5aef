#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

// Windows-only implementation lives in src/windows_main.rs
#[cfg(windows)]
mod windows_main;

#[cfg(windows)]
fn main() -> anyhow::Result<std::process::ExitCode> {
    windows_main::main()
}

// Non-Windows stub builds cleanly and informs the user.
#[cfg(not(windows))]
fn main() {
    println!("cvmd2html is Windows-only. Build on Windows to run.");
}
