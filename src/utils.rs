use std::ffi::OsStr;
use std::iter::once;

/// Null-terminated UTF-16 for Win32 `PCWSTR` parameters.
///
/// On Windows the native encoding is kept, so unpaired surrogates in paths
/// survive the round trip.
pub fn to_wide(s: impl AsRef<OsStr>) -> Vec<u16> {
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        s.as_ref().encode_wide().chain(once(0)).collect()
    }
    #[cfg(not(windows))]
    {
        s.as_ref().to_string_lossy().encode_utf16().chain(once(0)).collect()
    }
}
