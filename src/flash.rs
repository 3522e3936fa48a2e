//! One-shot notices carried across a redirect in an encrypted cookie.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};

pub const FLASH_COOKIE: &str = "journal_flash";

pub fn set(jar: PrivateCookieJar, message: impl Into<String>) -> PrivateCookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, message.into()))
        .path("/")
        .http_only(true);
    jar.add(cookie)
}

/// Returns the pending notice, if any, and clears it.
pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE) {
        Some(cookie) => {
            let message = cookie.value().to_string();
            (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), Some(message))
        }
        None => (jar, None),
    }
}
