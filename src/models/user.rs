#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// User ID
    pub id: u64,
    /// Unique login name
    pub login: String,
    /// Client-side password digest, stored and compared verbatim
    pub password_hash: String,
    /// Current session token, if the user has logged in
    pub token: Option<String>,
    /// When the current token was issued (milliseconds since epoch)
    pub token_issued_at: Option<i64>,
}

impl User {
    pub fn new(id: u64, login: String, password_hash: String) -> Self {
        Self {
            id,
            login,
            password_hash,
            token: None,
            token_issued_at: None,
        }
    }
}
