use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ConflictPolicy;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::mail::Mailer;
use crate::services::object;
use crate::store::{Document, DocumentStore, Order, StoreError, StoredDocument};

const COLLECTION: &str = "bookings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub vehicle_number: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub special_notes: String,
}

/// Fields a customer may edit after submission. Status and the suggestion
/// fields are deliberately absent; those move only through the status
/// operations.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub vehicle_number: Option<String>,
    pub service: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub special_notes: Option<String>,
}

impl BookingPatch {
    fn into_document(self) -> Document {
        let mut patch = Document::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                patch.insert(key.to_string(), Value::String(v));
            }
        };
        put("email", self.email);
        put("fullName", self.full_name);
        put("phoneNumber", self.phone_number);
        put("vehicleNumber", self.vehicle_number);
        put("service", self.service);
        put("preferredDate", self.preferred_date);
        put("preferredTime", self.preferred_time);
        put("specialNotes", self.special_notes);
        patch
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestAlternate {
    #[serde(default)]
    pub suggested_date: String,
    #[serde(default)]
    pub suggested_time: String,
    #[serde(default)]
    pub admin_note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingFilter {
    All,
    ByUser(String),
    ByStatus(BookingStatus),
    ByUserAndStatus(String, BookingStatus),
}

impl BookingFilter {
    pub fn from_params(user_id: Option<String>, status: Option<BookingStatus>) -> Self {
        match (user_id, status) {
            (Some(u), Some(s)) => BookingFilter::ByUserAndStatus(u, s),
            (Some(u), None) => BookingFilter::ByUser(u),
            (None, Some(s)) => BookingFilter::ByStatus(s),
            (None, None) => BookingFilter::All,
        }
    }

    fn conditions(&self) -> Vec<(&'static str, Value)> {
        match self {
            BookingFilter::All => vec![],
            BookingFilter::ByUser(u) => vec![("userId", json!(u))],
            BookingFilter::ByStatus(s) => vec![("status", json!(s))],
            BookingFilter::ByUserAndStatus(u, s) => {
                vec![("userId", json!(u)), ("status", json!(s))]
            }
        }
    }
}

#[derive(Debug)]
pub struct CreateOutcome {
    pub booking_id: String,
    pub slot_conflict: bool,
}

pub async fn create(
    store: &dyn DocumentStore,
    policy: ConflictPolicy,
    req: NewBooking,
) -> Result<CreateOutcome, AppError> {
    let mut missing = Vec::new();
    if req.user_id.is_empty() {
        missing.push("userId");
    }
    if req.full_name.is_empty() {
        missing.push("fullName");
    }
    if req.phone_number.is_empty() {
        missing.push("phoneNumber");
    }
    if req.vehicle_number.is_empty() {
        missing.push("vehicleNumber");
    }
    if req.service.is_empty() {
        missing.push("service");
    }
    if req.preferred_date.is_empty() {
        missing.push("preferredDate");
    }
    if req.preferred_time.is_empty() {
        missing.push("preferredTime");
    }
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let slot_conflict = slot_taken(store, &req.preferred_date, &req.preferred_time).await?;
    if slot_conflict {
        match policy {
            ConflictPolicy::Reject => {
                return Err(AppError::validation(
                    "The requested date and time slot is already taken",
                ))
            }
            ConflictPolicy::Allow => tracing::warn!(
                date = %req.preferred_date,
                time = %req.preferred_time,
                "slot already holds an active booking"
            ),
        }
    }

    let booking_id = store
        .insert(
            COLLECTION,
            object(json!({
                "userId": req.user_id,
                "email": req.email,
                "fullName": req.full_name,
                "phoneNumber": req.phone_number,
                "vehicleNumber": req.vehicle_number,
                "service": req.service,
                "preferredDate": req.preferred_date,
                "preferredTime": req.preferred_time,
                "specialNotes": req.special_notes,
                "status": BookingStatus::Pending,
                "suggestedDate": null,
                "suggestedTime": null,
                "adminNote": null,
            })),
        )
        .await?;

    tracing::info!(booking_id = %booking_id, user_id = %req.user_id, "booking created");
    Ok(CreateOutcome {
        booking_id,
        slot_conflict,
    })
}

async fn slot_taken(store: &dyn DocumentStore, date: &str, time: &str) -> Result<bool, AppError> {
    let holders = store
        .query(
            COLLECTION,
            &[("preferredDate", json!(date)), ("preferredTime", json!(time))],
            None,
        )
        .await?;

    Ok(holders.iter().any(|doc| {
        doc.data
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(BookingStatus::parse)
            .map(|s| !s.is_terminal())
            .unwrap_or(false)
    }))
}

async fn load(store: &dyn DocumentStore, booking_id: &str) -> Result<StoredDocument, AppError> {
    store
        .get(COLLECTION, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

fn current_status(doc: &StoredDocument) -> Result<BookingStatus, AppError> {
    doc.data
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(BookingStatus::parse)
        .ok_or_else(|| {
            AppError::Store(StoreError::Backend(anyhow::anyhow!(
                "booking {} has a malformed status",
                doc.id
            )))
        })
}

/// The only place a status write is assembled. Rejects illegal moves and
/// clears the suggestion fields whenever the booking leaves
/// `suggestion_pending`, so they cannot outlive that state.
fn status_patch(current: BookingStatus, next: BookingStatus) -> Result<Document, AppError> {
    if !current.can_transition_to(next) {
        return Err(AppError::validation(format!(
            "Cannot change booking status from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let mut patch = object(json!({ "status": next }));
    if current == BookingStatus::SuggestionPending {
        patch.insert("suggestedDate".to_string(), Value::Null);
        patch.insert("suggestedTime".to_string(), Value::Null);
        patch.insert("adminNote".to_string(), Value::Null);
    }
    Ok(patch)
}

pub async fn transition(
    store: &dyn DocumentStore,
    booking_id: &str,
    target: BookingStatus,
) -> Result<(), AppError> {
    let stored = load(store, booking_id).await?;
    let current = current_status(&stored)?;
    let patch = status_patch(current, target)?;
    store.update(COLLECTION, booking_id, patch).await?;

    tracing::info!(
        booking_id = %booking_id,
        from = current.as_str(),
        to = target.as_str(),
        "booking status updated"
    );
    Ok(())
}

pub async fn propose_alternate(
    store: &dyn DocumentStore,
    mailer: &dyn Mailer,
    mail_from: &str,
    booking_id: &str,
    req: SuggestAlternate,
) -> Result<(), AppError> {
    if req.suggested_date.is_empty() || req.suggested_time.is_empty() {
        return Err(AppError::validation("Suggested date and time are required"));
    }

    let stored = load(store, booking_id).await?;
    let current = current_status(&stored)?;

    let mut patch = status_patch(current, BookingStatus::SuggestionPending)?;
    patch.insert("suggestedDate".to_string(), json!(req.suggested_date));
    patch.insert("suggestedTime".to_string(), json!(req.suggested_time));
    patch.insert("adminNote".to_string(), json!(req.admin_note));
    store.update(COLLECTION, booking_id, patch).await?;

    tracing::info!(
        booking_id = %booking_id,
        date = %req.suggested_date,
        time = %req.suggested_time,
        "alternate slot suggested"
    );

    // Best-effort notification; the suggestion stands even if the email
    // cannot be delivered.
    let to = stored.data.get("email").and_then(|v| v.as_str()).unwrap_or("");
    if !to.is_empty() {
        let note = if req.admin_note.is_empty() {
            String::new()
        } else {
            format!("<p>Note from our team: {}</p>", req.admin_note)
        };
        let html = format!(
            "<p>We could not confirm your requested slot, so we proposed a new one: \
             <strong>{} at {}</strong>.</p>{}\
             <p>Please open your bookings to accept or decline the new time.</p>",
            req.suggested_date, req.suggested_time, note
        );
        if let Err(e) = mailer
            .send(mail_from, to, "New time proposed for your booking", &html)
            .await
        {
            tracing::error!(booking_id = %booking_id, error = %e, "failed to send suggestion email");
        }
    }

    Ok(())
}

/// Approves at the stored suggested slot. The client sends nothing but the
/// id; whatever date/time it believes were suggested is ignored.
pub async fn accept_suggestion(
    store: &dyn DocumentStore,
    booking_id: &str,
) -> Result<(), AppError> {
    let stored = load(store, booking_id).await?;
    let current = current_status(&stored)?;

    let suggested = (
        stored.data.get("suggestedDate").and_then(|v| v.as_str()),
        stored.data.get("suggestedTime").and_then(|v| v.as_str()),
    );
    let (date, time) = match suggested {
        (Some(d), Some(t)) if current == BookingStatus::SuggestionPending => {
            (d.to_string(), t.to_string())
        }
        _ => {
            return Err(AppError::validation(
                "No suggested date/time found for this booking",
            ))
        }
    };

    let mut patch = status_patch(current, BookingStatus::Approved)?;
    patch.insert("preferredDate".to_string(), json!(date));
    patch.insert("preferredTime".to_string(), json!(time));
    store.update(COLLECTION, booking_id, patch).await?;

    tracing::info!(booking_id = %booking_id, date = %date, time = %time, "suggestion accepted");
    Ok(())
}

/// Declining the proposed slot cancels the booking outright; it does not
/// return to `pending`.
pub async fn reject_suggestion(
    store: &dyn DocumentStore,
    booking_id: &str,
) -> Result<(), AppError> {
    let stored = load(store, booking_id).await?;
    let current = current_status(&stored)?;
    if current != BookingStatus::SuggestionPending {
        return Err(AppError::validation(
            "No suggested date/time found for this booking",
        ));
    }

    let patch = status_patch(current, BookingStatus::Cancelled)?;
    store.update(COLLECTION, booking_id, patch).await?;

    tracing::info!(booking_id = %booking_id, "suggestion rejected, booking cancelled");
    Ok(())
}

pub async fn update(
    store: &dyn DocumentStore,
    booking_id: &str,
    owner_id: Option<&str>,
    patch: BookingPatch,
) -> Result<(), AppError> {
    let stored = load(store, booking_id).await?;
    check_owner(&stored, owner_id, "Unauthorized to update this booking")?;

    store
        .update(COLLECTION, booking_id, patch.into_document())
        .await?;
    tracing::info!(booking_id = %booking_id, "booking updated");
    Ok(())
}

pub async fn delete(
    store: &dyn DocumentStore,
    booking_id: &str,
    owner_id: Option<&str>,
) -> Result<(), AppError> {
    let stored = load(store, booking_id).await?;
    check_owner(&stored, owner_id, "Unauthorized to delete this booking")?;

    store.delete(COLLECTION, booking_id).await?;
    tracing::info!(booking_id = %booking_id, "booking deleted");
    Ok(())
}

fn check_owner(
    stored: &StoredDocument,
    owner_id: Option<&str>,
    message: &str,
) -> Result<(), AppError> {
    if let Some(owner) = owner_id {
        let holder = stored.data.get("userId").and_then(|v| v.as_str()).unwrap_or("");
        if holder != owner {
            return Err(AppError::Forbidden(message.to_string()));
        }
    }
    Ok(())
}

pub async fn list(
    store: &dyn DocumentStore,
    filter: &BookingFilter,
) -> Result<Vec<Booking>, AppError> {
    let conditions = filter.conditions();
    let docs = match store
        .query(COLLECTION, &conditions, Some(Order::CreatedDesc))
        .await
    {
        Ok(docs) => docs,
        Err(err) => {
            tracing::warn!(error = %err, "sorted booking query failed, retrying unsorted");
            store.query(COLLECTION, &conditions, None).await?
        }
    };

    let mut bookings: Vec<Booking> = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value(doc.into_value()) {
            Ok(b) => bookings.push(b),
            Err(e) => tracing::warn!(error = %e, "skipping malformed booking document"),
        }
    }
    // Order is owed to the caller regardless of which query path answered.
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(bookings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, _from: &str, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), html.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _: &str, _: &str, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    fn new_booking(user: &str, date: &str, time: &str) -> NewBooking {
        NewBooking {
            user_id: user.to_string(),
            email: format!("{user}@example.com"),
            full_name: "Priya Nair".to_string(),
            phone_number: "9876543210".to_string(),
            vehicle_number: "KL-07-AB-1234".to_string(),
            service: "gold".to_string(),
            preferred_date: date.to_string(),
            preferred_time: time.to_string(),
            special_notes: String::new(),
        }
    }

    async fn created(store: &MemoryStore, user: &str, date: &str, time: &str) -> String {
        create(store, ConflictPolicy::Allow, new_booking(user, date, time))
            .await
            .unwrap()
            .booking_id
    }

    async fn status_of(store: &MemoryStore, id: &str) -> BookingStatus {
        let doc = store.get(COLLECTION, id).await.unwrap().unwrap();
        current_status(&doc).unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let store = MemoryStore::new();
        let mut req = new_booking("u1", "2025-11-25", "10:00");
        req.full_name = String::new();
        req.preferred_time = String::new();

        let err = create(&store, ConflictPolicy::Allow, req).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("fullName"));
                assert!(msg.contains("preferredTime"));
                assert!(!msg.contains("userId"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;
        assert_eq!(status_of(&store, &id).await, BookingStatus::Pending);

        let doc = store.get(COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.data.get("suggestedDate"), Some(&Value::Null));
        assert_eq!(doc.data.get("adminNote"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_conflict_allow_flags_and_creates() {
        let store = MemoryStore::new();
        created(&store, "u1", "2025-11-25", "10:00").await;

        let outcome = create(
            &store,
            ConflictPolicy::Allow,
            new_booking("u2", "2025-11-25", "10:00"),
        )
        .await
        .unwrap();
        assert!(outcome.slot_conflict);
        assert_eq!(
            list(&store, &BookingFilter::All).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_conflict_reject_refuses() {
        let store = MemoryStore::new();
        created(&store, "u1", "2025-11-25", "10:00").await;

        let err = create(
            &store,
            ConflictPolicy::Reject,
            new_booking("u2", "2025-11-25", "10:00"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // A terminal booking releases the slot.
        let other = created(&store, "u3", "2025-11-25", "11:00").await;
        transition(&store, &other, BookingStatus::Rejected).await.unwrap();
        create(
            &store,
            ConflictPolicy::Reject,
            new_booking("u4", "2025-11-25", "11:00"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_transition_table_enforced() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        transition(&store, &id, BookingStatus::Approved).await.unwrap();
        assert_eq!(status_of(&store, &id).await, BookingStatus::Approved);

        // approved -> rejected is not in the table; nothing is written.
        let err = transition(&store, &id, BookingStatus::Rejected).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(status_of(&store, &id).await, BookingStatus::Approved);

        transition(&store, &id, BookingStatus::Completed).await.unwrap();
        assert_eq!(status_of(&store, &id).await, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_transition_missing_booking() {
        let store = MemoryStore::new();
        let err = transition(&store, "ghost", BookingStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_suggest_accept_copies_stored_slot() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        propose_alternate(
            &store,
            &mailer,
            "noreply@test",
            &id,
            SuggestAlternate {
                suggested_date: "2025-11-26".to_string(),
                suggested_time: "14:00".to_string(),
                admin_note: "Morning fully booked".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(status_of(&store, &id).await, BookingStatus::SuggestionPending);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);

        accept_suggestion(&store, &id).await.unwrap();

        let doc = store.get(COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["status"], json!("approved"));
        assert_eq!(doc.data["preferredDate"], json!("2025-11-26"));
        assert_eq!(doc.data["preferredTime"], json!("14:00"));
        assert_eq!(doc.data.get("suggestedDate"), Some(&Value::Null));
        assert_eq!(doc.data.get("suggestedTime"), Some(&Value::Null));
        assert_eq!(doc.data.get("adminNote"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_reject_suggestion_cancels() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        propose_alternate(
            &store,
            &mailer,
            "noreply@test",
            &id,
            SuggestAlternate {
                suggested_date: "2025-11-26".to_string(),
                suggested_time: "14:00".to_string(),
                admin_note: String::new(),
            },
        )
        .await
        .unwrap();
        reject_suggestion(&store, &id).await.unwrap();

        let doc = store.get(COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["status"], json!("cancelled"));
        assert_eq!(doc.data.get("suggestedDate"), Some(&Value::Null));
        assert_eq!(doc.data.get("suggestedTime"), Some(&Value::Null));
        assert_eq!(doc.data.get("adminNote"), Some(&Value::Null));
        // The original request is untouched.
        assert_eq!(doc.data["preferredDate"], json!("2025-11-25"));
        assert_eq!(doc.data["preferredTime"], json!("10:00"));
    }

    #[tokio::test]
    async fn test_accept_without_suggestion_fails() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        let err = accept_suggestion(&store, &id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(status_of(&store, &id).await, BookingStatus::Pending);

        let err = reject_suggestion(&store, &id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_suggest_requires_both_fields() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        let err = propose_alternate(
            &store,
            &mailer,
            "noreply@test",
            &id,
            SuggestAlternate {
                suggested_date: "2025-11-26".to_string(),
                suggested_time: String::new(),
                admin_note: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(status_of(&store, &id).await, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_suggest_only_from_pending() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;
        transition(&store, &id, BookingStatus::Approved).await.unwrap();

        let err = propose_alternate(
            &store,
            &mailer,
            "noreply@test",
            &id,
            SuggestAlternate {
                suggested_date: "2025-11-26".to_string(),
                suggested_time: "14:00".to_string(),
                admin_note: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_block_suggestion() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        propose_alternate(
            &store,
            &FailingMailer,
            "noreply@test",
            &id,
            SuggestAlternate {
                suggested_date: "2025-11-26".to_string(),
                suggested_time: "14:00".to_string(),
                admin_note: String::new(),
            },
        )
        .await
        .unwrap();
        assert_eq!(status_of(&store, &id).await, BookingStatus::SuggestionPending);
    }

    #[tokio::test]
    async fn test_update_checks_owner() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        let err = update(
            &store,
            &id,
            Some("intruder"),
            BookingPatch {
                vehicle_number: Some("KL-01-XX-0001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let doc = store.get(COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["vehicleNumber"], json!("KL-07-AB-1234"));

        update(
            &store,
            &id,
            Some("u1"),
            BookingPatch {
                vehicle_number: Some("KL-01-XX-0001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let doc = store.get(COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["vehicleNumber"], json!("KL-01-XX-0001"));
        // Status is untouchable through update.
        assert_eq!(doc.data["status"], json!("pending"));
    }

    #[tokio::test]
    async fn test_delete_checks_owner() {
        let store = MemoryStore::new();
        let id = created(&store, "u1", "2025-11-25", "10:00").await;

        let err = delete(&store, &id, Some("intruder")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(store.get(COLLECTION, &id).await.unwrap().is_some());

        delete(&store, &id, Some("u1")).await.unwrap();
        assert!(store.get(COLLECTION, &id).await.unwrap().is_none());

        let err = delete(&store, &id, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = MemoryStore::new();
        let a = created(&store, "u1", "2025-11-25", "10:00").await;
        let b = created(&store, "u2", "2025-11-25", "11:00").await;
        let c = created(&store, "u1", "2025-11-26", "09:00").await;
        transition(&store, &c, BookingStatus::Approved).await.unwrap();

        let all = list(&store, &BookingFilter::All).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first.
        assert_eq!(all[0].id, c);
        assert_eq!(all[2].id, a);

        let mine = list(&store, &BookingFilter::ByUser("u1".to_string()))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|b| b.user_id == "u1"));

        let pending = list(&store, &BookingFilter::ByStatus(BookingStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|x| x.id == b));

        let mine_approved = list(
            &store,
            &BookingFilter::ByUserAndStatus("u1".to_string(), BookingStatus::Approved),
        )
        .await
        .unwrap();
        assert_eq!(mine_approved.len(), 1);
        assert_eq!(mine_approved[0].id, c);
    }
}
