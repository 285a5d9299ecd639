//! Credential storage for the local identity provider.
//!
//! Passwords are never stored: each account keeps a random salt and the hex
//! BLAKE3 key derived from `salt || password`.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use vibe_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;

const PASSWORD_KDF_CONTEXT: &str = "vibe-local-password-v1";

/// A registered local account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

fn hash_password(salt: &[u8], password: &str) -> String {
    let mut material = salt.to_vec();
    material.extend_from_slice(password.as_bytes());
    hex::encode(blake3::derive_key(PASSWORD_KDF_CONTEXT, &material))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    /// Register a new account. Returns `None` when the email is already taken.
    pub fn create_account(&self, email: &str, password: &str) -> Result<Option<Account>> {
        let email = normalize_email(email);
        if self.find_account(&email)?.is_some() {
            return Ok(None);
        }

        let uid = Uuid::new_v4().simple().to_string();
        let salt = *Uuid::new_v4().as_bytes();

        self.conn().execute(
            "INSERT INTO accounts (uid, email, password_hash, salt, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
            params![
                uid,
                email,
                hash_password(&salt, password),
                hex::encode(salt),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(Some(Account {
            uid: UserId(uid),
            email,
            display_name: None,
        }))
    }

    pub fn find_account(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT uid, email, display_name FROM accounts WHERE email = ?1",
                params![normalize_email(email)],
                |row| {
                    Ok(Account {
                        uid: UserId(row.get(0)?),
                        email: row.get(1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Check a password against the stored key. `Ok(false)` for a wrong
    /// password, `Ok(true)` on match; unknown emails are reported by
    /// [`Database::find_account`].
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT password_hash, salt FROM accounts WHERE email = ?1",
                params![normalize_email(email)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((stored, salt_hex)) = row else {
            return Ok(false);
        };
        let salt = hex::decode(&salt_hex).unwrap_or_default();
        Ok(hash_password(&salt, password) == stored)
    }

    pub fn set_account_display_name(&self, uid: &UserId, name: Option<&str>) -> Result<()> {
        self.conn().execute(
            "UPDATE accounts SET display_name = ?1 WHERE uid = ?2",
            params![name, uid.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_verify() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("Ada@Example.com ", "secret1").unwrap().unwrap();
        assert_eq!(account.email, "ada@example.com");

        assert!(db.verify_password("ada@example.com", "secret1").unwrap());
        assert!(!db.verify_password("ada@example.com", "wrong").unwrap());
        assert!(!db.verify_password("nobody@example.com", "secret1").unwrap());
    }

    #[test]
    fn duplicate_email_is_refused() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_account("a@b.co", "secret1").unwrap().is_some());
        assert!(db.create_account("A@B.CO", "other12").unwrap().is_none());
    }

    #[test]
    fn display_name_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let account = db.create_account("a@b.co", "secret1").unwrap().unwrap();
        db.set_account_display_name(&account.uid, Some("ada")).unwrap();
        let found = db.find_account("a@b.co").unwrap().unwrap();
        assert_eq!(found.display_name.as_deref(), Some("ada"));
    }
}
