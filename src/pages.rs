// Minimal HTML for the sign-in and sign-in error pages

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::credentials::CredentialName;
use crate::gate::{HOME_PATH, LOGIN_PATH};

/// Sign-in page with a single link to the identity provider
pub fn login_page(authorize_url: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in - Book Portal</title></head>
<body>
  <main>
    <h1>Book Management System</h1>
    <p>Sign in to browse, borrow and return books.</p>
    <a href="{}">Sign in</a>
  </main>
</body>
</html>
"#,
        escape_html(authorize_url)
    ))
}

/// Page shown when the identity provider reports an error.
///
/// The retry link depends on which credential the failed flow was for.
pub fn auth_error_page(credential: CredentialName, message: &str) -> Response {
    let (retry_href, retry_label) = match credential {
        CredentialName::Primary => (LOGIN_PATH, "Return to Login"),
        CredentialName::AddBook => (HOME_PATH, "Return to Home"),
    };

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Authentication Error - Book Portal</title></head>
<body>
  <main>
    <h1>Authentication Error</h1>
    <p class="error">{}</p>
    <a href="{}">{}</a>
  </main>
</body>
</html>
"#,
        escape_html(message),
        retry_href,
        retry_label
    );

    (StatusCode::UNAUTHORIZED, Html(body)).into_response()
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
