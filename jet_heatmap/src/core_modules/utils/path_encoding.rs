// Output paths arrive from the C boundary as nul-terminated UTF-16 strings.
// `wide_to_path` decodes them properly. `wide_to_narrow_lossy` reproduces the
// single-byte transliteration older hosts relied on: ASCII passes through,
// everything else becomes `?`, and the result never exceeds 255 bytes.

use std::path::PathBuf;

/// Size of the narrow buffer the lossy conversion fills, terminator included.
pub const LEGACY_PATH_CAPACITY: usize = 256;

/// Decodes UTF-16 code units into a platform path.
#[cfg(windows)]
pub fn wide_to_path(units: &[u16]) -> PathBuf {
    use std::os::windows::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_wide(units))
}

/// Decodes UTF-16 code units into a platform path. Unpaired surrogates become
/// U+FFFD.
#[cfg(not(windows))]
pub fn wide_to_path(units: &[u16]) -> PathBuf {
    PathBuf::from(String::from_utf16_lossy(units))
}

/// Lossy single-byte transliteration.
///
/// Code units below 128 are copied, every other unit becomes `?`, and a lead
/// surrogate in `0xD800..=0xD8FF` also consumes the unit after it. At most
/// `LEGACY_PATH_CAPACITY - 1` source units are examined.
pub fn wide_to_narrow_lossy(units: &[u16]) -> String {
    let mut narrow = String::with_capacity(units.len().min(LEGACY_PATH_CAPACITY - 1));
    let mut i = 0;

    while i < units.len() && i < LEGACY_PATH_CAPACITY - 1 {
        let code = units[i];
        if code == 0 {
            break;
        }

        if code < 128 {
            narrow.push(code as u8 as char);
        } else {
            narrow.push('?');
            if (0xD800..=0xD8FF).contains(&code) {
                // Lead surrogate: the trail unit belongs to the same character.
                i += 1;
            }
        }

        i += 1;
    }

    narrow
}
