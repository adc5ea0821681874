//! In-process stores used with `STORE_BACKEND=memory` and by the test suite.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    contacts::{
        repo::ContactStore,
        repo_types::{Contact, ContactChanges, NewContact},
    },
};

fn lock<T>(m: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
}

#[derive(Default)]
pub struct MemoryContactStore {
    rows: Mutex<Vec<Contact>>, // insertion order
    fail_next: Mutex<Option<String>>,
}

impl MemoryContactStore {
    /// Makes the next store call fail with `msg`.
    pub fn fail_next(&self, msg: &str) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(msg.to_string());
        }
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        match lock(&self.fail_next)?.take() {
            Some(msg) => Err(anyhow::anyhow!(msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn find_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Contact>> {
        self.check_failure()?;
        let mut rows: Vec<Contact> = lock(&self.rows)?
            .iter()
            .rev()
            .filter(|c| c.user == user_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-inserted first
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        self.check_failure()?;
        Ok(lock(&self.rows)?.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, contact: NewContact) -> anyhow::Result<Contact> {
        self.check_failure()?;
        let row = Contact {
            id: Uuid::new_v4(),
            user: contact.user,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            kind: contact.kind,
            date: OffsetDateTime::now_utc(),
        };
        lock(&self.rows)?.push(row.clone());
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, changes: ContactChanges) -> anyhow::Result<Option<Contact>> {
        self.check_failure()?;
        let mut rows = lock(&self.rows)?;
        Ok(rows.iter_mut().find(|c| c.id == id).map(|c| {
            changes.apply_to(c);
            c.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
        self.check_failure()?;
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(lock(&self.rows)?.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(lock(&self.rows)?.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut rows = lock(&self.rows)?;
        if rows.iter().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate email {}", user.email);
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            date: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }
}
