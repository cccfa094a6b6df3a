//! `Cookie` / `Set-Cookie` header helpers.
//!
//! Only one cookie matters to the server (`accessToken`), so a small parser
//! over the `name=value; name2=value2` syntax is all that is needed.

use std::time::Duration;

use homepage_core::gate::policy::ACCESS_COOKIE;

/// Returns the value of cookie `name` from a `Cookie` request header.
///
/// Surrounding whitespace is trimmed; the first match wins.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Builds the `Set-Cookie` value handing out an access token.
pub fn access_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{ACCESS_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        max_age.as_secs()
    )
}
