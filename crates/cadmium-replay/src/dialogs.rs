//! Native dialogs
//!
//! Without the `dialogs` feature nothing is shown and no file is picked.

use std::path::PathBuf;

#[cfg(feature = "dialogs")]
const PICK_TITLE: &str = "Select CADmium / Fusion360-ds JSON file";
#[cfg(feature = "dialogs")]
const MESSAGE_TITLE: &str = "CADmium Replay";

/// Whether native dialogs were compiled in
pub fn available() -> bool {
    cfg!(feature = "dialogs")
}

/// Ask for the JSON file to replay. `None` if cancelled.
pub fn pick_json() -> Option<PathBuf> {
    #[cfg(feature = "dialogs")]
    {
        rfd::FileDialog::new()
            .set_title(PICK_TITLE)
            .add_filter("JSON files", &["json"])
            .pick_file()
    }
    #[cfg(not(feature = "dialogs"))]
    {
        None
    }
}

/// Show an informational message box
pub fn info(text: &str) {
    show(text, false);
}

/// Show an error message box
pub fn error(text: &str) {
    show(text, true);
}

#[cfg(feature = "dialogs")]
fn show(text: &str, is_error: bool) {
    let level = if is_error {
        rfd::MessageLevel::Error
    } else {
        rfd::MessageLevel::Info
    };
    rfd::MessageDialog::new()
        .set_title(MESSAGE_TITLE)
        .set_description(text)
        .set_level(level)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

#[cfg(not(feature = "dialogs"))]
fn show(_text: &str, _is_error: bool) {}
