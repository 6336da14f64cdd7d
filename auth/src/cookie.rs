/// Session cookie contract shared by the API and the edge guard.
///
/// The name is `<prefix>.session_token`; the value is the raw session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_seconds: i64,
}

impl SessionCookie {
    /// # Arguments
    /// * `prefix` - Cookie name prefix, e.g. `better-auth`
    /// * `secure` - Add the `Secure` attribute (HTTPS deployments)
    /// * `max_age_seconds` - Lifetime sent to the browser
    pub fn new(prefix: &str, secure: bool, max_age_seconds: i64) -> Self {
        Self {
            name: Self::name_for(prefix),
            secure,
            max_age_seconds,
        }
    }

    pub fn name_for(prefix: &str) -> String {
        format!("{prefix}.session_token")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Set-Cookie` value carrying a fresh session token.
    pub fn issue(&self, token: &str) -> String {
        self.render(token, self.max_age_seconds)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Find a cookie value in a raw `Cookie` request header.
    ///
    /// Empty values count as absent.
    pub fn find<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.trim_matches('"'))
            .filter(|value| !value.is_empty())
    }

    /// Whether a cookie called `name` appears at all, whatever its value.
    pub fn present(cookie_header: &str, name: &str) -> bool {
        cookie_header
            .split(';')
            .map(|pair| pair.trim())
            .any(|pair| pair.split_once('=').map_or(pair, |(key, _)| key) == name)
    }
}
