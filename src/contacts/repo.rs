use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Contact, ContactChanges, NewContact};

/// Persistence seam for contacts. Ownership is not enforced here; callers
/// check `Contact::user` before mutating.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// All contacts of one owner, newest first.
    async fn find_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Contact>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Contact>>;
    async fn insert(&self, contact: NewContact) -> anyhow::Result<Contact>;
    /// Returns the updated row, or `None` if it vanished in the meantime.
    async fn update_by_id(&self, id: Uuid, changes: ContactChanges) -> anyhow::Result<Option<Contact>>;
    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgContactStore {
    db: PgPool,
}

impl PgContactStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn find_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, name, email, phone, contact_type, date
            FROM contacts
            WHERE user_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list contacts by owner")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, name, email, phone, contact_type, date
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find contact by id")?;
        Ok(row)
    }

    async fn insert(&self, contact: NewContact) -> anyhow::Result<Contact> {
        let row = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (id, user_id, name, email, phone, contact_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, email, phone, contact_type, date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(contact.user)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.kind)
        .fetch_one(&self.db)
        .await
        .context("insert contact")?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, changes: ContactChanges) -> anyhow::Result<Option<Contact>> {
        // COALESCE keeps the stored value for every field the caller left out.
        let row = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   phone = COALESCE($4, phone),
                   contact_type = COALESCE($5, contact_type)
             WHERE id = $1
            RETURNING id, user_id, name, email, phone, contact_type, date
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.kind)
        .fetch_optional(&self.db)
        .await
        .context("update contact")?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM contacts WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete contact")?;
        Ok(res.rows_affected() > 0)
    }
}
