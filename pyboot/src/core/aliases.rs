//! Import-name to install-name translation.
//!
//! Some distributions install a module under a different import name. The
//! table below is the only place that knowledge lives.

use crate::core::imports::top_level;

/// Import name → package name, for modules whose distribution is named differently.
pub const MODULE_ALIASES: &[(&str, &str)] = &[
    ("PIL", "Pillow"),
    ("sklearn", "scikit-learn"),
    ("skimage", "scikit-image"),
    ("cv2", "opencv-python"),
    ("yaml", "PyYAML"),
    ("bs4", "beautifulsoup4"),
    ("dotenv", "python-dotenv"),
    ("attr", "attrs"),
    ("dateutil", "python-dateutil"),
    ("Crypto", "pycryptodome"),
    ("serial", "pyserial"),
    ("usb", "pyusb"),
    ("win32api", "pywin32"),
    ("win32con", "pywin32"),
    ("fitz", "PyMuPDF"),
    ("docx", "python-docx"),
    ("magic", "python-magic"),
    ("jwt", "PyJWT"),
    ("git", "GitPython"),
    ("google.protobuf", "protobuf"),
];

/// Return the installable package name for `module`, or `module` itself.
pub fn translate(module: &str) -> &str {
    MODULE_ALIASES
        .iter()
        .find(|(import, _)| *import == module)
        .map_or(module, |(_, package)| package)
}

/// Package to install for a (possibly dotted) module path.
///
/// An alias for the full path wins; otherwise the top-level package is
/// translated.
pub fn install_name(module: &str) -> &str {
    if let Some((_, package)) = MODULE_ALIASES.iter().find(|(import, _)| *import == module) {
        return package;
    }
    translate(top_level(module))
}
