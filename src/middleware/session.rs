use sha2::{Digest, Sha512};
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite, time::Duration},
    service::SignedCookie,
};

use crate::config::SessionSettings;

pub const SESSION_COOKIE_NAME: &str = "bistro_session";

/// Sessions expire after seven days without a request.
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key derived from the configured secret.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub fn create_session_layer<S>(
    store: S,
    settings: &SessionSettings,
) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_secure(settings.secure_cookie)
        .with_path("/")
        .with_signed(signing_key(&settings.secret_key))
}
