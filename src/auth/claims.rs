use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String, // Employee id
    pub exp: i64,    // Expiration timestamp
    pub iat: i64,    // Issued at timestamp
}

impl SessionClaims {
    pub fn employee_id(&self) -> Result<i32, String> {
        self.sub
            .parse()
            .map_err(|_| format!("Subject '{}' is not an employee id", self.sub))
    }
}
