use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::contact::{ContactLead, ContactStats, LeadStatus, NewContactRequest},
    store::{decode_all, document_body, DocumentStore, StoreError, Subscription},
};

pub const CONTACTS: &str = "contacts";

pub struct ContactService;

impl ContactService {
    pub async fn submit(
        store: &dyn DocumentStore,
        req: NewContactRequest,
    ) -> Result<ContactLead, AppError> {
        let parent_name = req.parent_name.trim().to_string();
        let phone = req.phone.trim().to_string();
        if parent_name.is_empty() || phone.is_empty() {
            return Err(AppError::BadRequest(
                "Vui lòng nhập họ tên và số điện thoại".into(),
            ));
        }
        if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '.' | '-'))
        {
            return Err(AppError::BadRequest("Số điện thoại không hợp lệ".into()));
        }

        let now = Utc::now();
        let lead = ContactLead {
            id: Uuid::new_v4().to_string(),
            parent_name,
            phone,
            email: req.email.trim().to_string(),
            child_name: req.child_name.trim().to_string(),
            child_age: req.child_age.trim().to_string(),
            message: req.message.trim().to_string(),
            status: LeadStatus::New,
            date: now.format("%d/%m/%Y").to_string(),
            created_at: now,
        };
        store.set(CONTACTS, &lead.id, to_data(&lead)?).await?;
        tracing::info!("New contact lead {}", lead.id);
        Ok(lead)
    }

    /// All leads, newest first.
    pub async fn list(store: &dyn DocumentStore) -> Result<Vec<ContactLead>, StoreError> {
        let docs = store.list(CONTACTS).await?;
        let mut leads: Vec<ContactLead> = decode_all(CONTACTS, docs);
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    pub async fn stats(store: &dyn DocumentStore) -> Result<ContactStats, StoreError> {
        let leads = Self::list(store).await?;
        let new = leads.iter().filter(|l| l.status == LeadStatus::New).count();
        Ok(ContactStats {
            total: leads.len(),
            new,
            processed: leads.len() - new,
        })
    }

    /// Sets the status, or flips it between new and processed when `status` is `None`.
    pub async fn update_status(
        store: &dyn DocumentStore,
        id: &str,
        status: Option<LeadStatus>,
    ) -> Result<ContactLead, AppError> {
        let doc = store
            .get(CONTACTS, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Không tìm thấy yêu cầu".into()))?;
        let mut lead: ContactLead = doc
            .decode()
            .map_err(|e| AppError::BadRequest(format!("Yêu cầu không hợp lệ: {e}")))?;
        lead.status = status.unwrap_or_else(|| lead.status.toggled());

        store.set(CONTACTS, &lead.id, to_data(&lead)?).await?;
        tracing::info!("Contact {} marked {}", lead.id, lead.status.label());
        Ok(lead)
    }

    pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
        if store.get(CONTACTS, id).await?.is_none() {
            return Err(AppError::NotFound("Không tìm thấy yêu cầu".into()));
        }
        store.delete(CONTACTS, id).await?;
        tracing::info!("Deleted contact {}", id);
        Ok(())
    }

    pub fn subscribe(store: &dyn DocumentStore) -> Subscription {
        store.subscribe(CONTACTS)
    }
}

fn to_data(lead: &ContactLead) -> Result<serde_json::Value, AppError> {
    document_body(lead).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    fn request(name: &str, phone: &str) -> NewContactRequest {
        NewContactRequest {
            parent_name: name.into(),
            phone: phone.into(),
            email: "me@example.com".into(),
            child_name: "Bé Na".into(),
            child_age: "3".into(),
            message: "Xin tư vấn".into(),
        }
    }

    #[tokio::test]
    async fn submitted_leads_list_newest_first() {
        let store = MemoryDocumentStore::new();
        let first = ContactService::submit(&store, request("Lan", "0901 234 567"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = ContactService::submit(&store, request("Hùng", "+84 912345678"))
            .await
            .unwrap();

        let leads = ContactService::list(&store).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].id, second.id);
        assert_eq!(leads[1].id, first.id);
        assert_eq!(leads[1].status, LeadStatus::New);
    }

    #[tokio::test]
    async fn submit_requires_name_and_phone() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            ContactService::submit(&store, request(" ", "0901")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            ContactService::submit(&store, request("Lan", "call me")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(store.list(CONTACTS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_toggles_and_stats_follow() {
        let store = MemoryDocumentStore::new();
        let lead = ContactService::submit(&store, request("Lan", "0901234567"))
            .await
            .unwrap();
        ContactService::submit(&store, request("Mai", "0907654321"))
            .await
            .unwrap();

        let updated = ContactService::update_status(&store, &lead.id, None)
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Processed);
        let stats = ContactService::stats(&store).await.unwrap();
        assert_eq!(
            stats,
            ContactStats {
                total: 2,
                new: 1,
                processed: 1
            }
        );

        let back = ContactService::update_status(&store, &lead.id, Some(LeadStatus::New))
            .await
            .unwrap();
        assert_eq!(back.status, LeadStatus::New);
    }

    #[tokio::test]
    async fn delete_missing_lead_is_not_found() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            ContactService::delete(&store, "nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listeners_are_told_about_new_leads() {
        let store = MemoryDocumentStore::new();
        let mut sub = ContactService::subscribe(&store);
        ContactService::submit(&store, request("Lan", "0901234567"))
            .await
            .unwrap();
        assert!(sub.changed().await);
        assert_eq!(ContactService::list(&store).await.unwrap().len(), 1);
    }
}
