/**
 * Credentials for MESSAGE-INTEGRITY
 *
 * While a packet is decoded, USERNAME and REALM are captured into an
 * `AuthContext`; the integrity check then looks the password up through `Auth`.
 */
use crate::stun::security::MessageIntegrity;

pub trait Auth {
    /// The password for `username`, `None` when the user is not known in that realm
    fn password(&self, realm: Option<&str>, username: &str) -> Option<String>;
}

#[derive(Clone)]
pub struct SimpleAuth {
    realm: Option<String>,
    username: String,
    password: String,
}

impl SimpleAuth {
    pub fn new(realm: Option<String>, username: &str, password: &str) -> Self {
        Self {
            realm,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.password
    }
}

impl Auth for SimpleAuth {
    fn password(&self, realm: Option<&str>, username: &str) -> Option<String> {
        if self.realm.as_deref() != realm {
            return None;
        }
        if self.username != username {
            return None;
        }
        Some(self.password.clone())
    }
}

/**
 * USERNAME and REALM seen while decoding a packet
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub username: Option<String>,
    pub realm: Option<String>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Check a decoded MESSAGE-INTEGRITY with the captured credentials. With a
     * realm the long-term key is used, without one the password itself is the key.
     */
    pub fn verify(&self, integrity: &MessageIntegrity, auth: &dyn Auth) -> bool {
        let username = match &self.username {
            Some(username) => username,
            None => return false,
        };
        let password = match auth.password(self.realm.as_deref(), username) {
            Some(password) => password,
            None => return false,
        };

        match &self.realm {
            Some(realm) => integrity.verify_hash(username, realm, &password),
            None => integrity.verify_key(password.as_bytes()),
        }
    }
}
