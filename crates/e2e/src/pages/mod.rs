//! Page objects for the admin UI
//!
//! Pages are never cached. Each `from_session` call inspects the current
//! document and returns `None` when the browser is on some other page, which
//! is how an authorization failure shows up (the server quietly renders a
//! different page).

mod admin;
mod auth;
mod color_palette;
mod groups;
mod login;
mod theme;
mod users;

pub use admin::AdminPage;
pub use auth::AuthConfigEditPage;
pub use color_palette::{ColorPaletteEditPage, ColorPaletteSelectPage};
pub use groups::{GroupEditPage, GroupSelectPage};
pub use login::LoginPage;
pub use theme::{ThemeColor, ThemeEditPage, ThemeSelectPage};
pub use users::UserSelectPage;

use crate::error::E2eResult;
use crate::session::Session;

/// Whether any of `headings` is exactly `label`
pub fn matches_heading<S: AsRef<str>>(headings: &[S], label: &str) -> bool {
    headings.iter().any(|h| h.as_ref() == label)
}

/// Whether the current document has an `<h1>` reading exactly `label`
pub async fn has_heading(session: &Session, label: &str) -> E2eResult<bool> {
    Ok(matches_heading(&session.headings().await?, label))
}

/// CSS attribute selector value with quotes and backslashes escaped
pub(crate) fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
