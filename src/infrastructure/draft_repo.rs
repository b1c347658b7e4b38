use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::OrderDraft;
use crate::domain::ports::DraftRepository;

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Internal("draft store lock poisoned".to_string())
}

#[derive(Default)]
pub struct InMemoryDraftRepository {
    drafts: RwLock<HashMap<Uuid, OrderDraft>>,
}

impl InMemoryDraftRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftRepository for InMemoryDraftRepository {
    fn insert(&self, draft: OrderDraft) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        self.drafts.write().map_err(poisoned)?.insert(id, draft);
        Ok(id)
    }

    fn get(&self, id: Uuid) -> Result<Option<OrderDraft>, DomainError> {
        Ok(self.drafts.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn update<F>(&self, id: Uuid, edit: F) -> Result<OrderDraft, DomainError>
    where
        F: FnOnce(&mut OrderDraft) -> Result<(), DomainError>,
    {
        let mut drafts = self.drafts.write().map_err(poisoned)?;
        let stored = drafts
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Draft {id}")))?;

        // a failed edit leaves the stored draft untouched
        let mut edited = stored.clone();
        edit(&mut edited)?;
        *stored = edited.clone();
        Ok(edited)
    }

    fn remove(&self, id: Uuid) -> Result<Option<OrderDraft>, DomainError> {
        Ok(self.drafts.write().map_err(poisoned)?.remove(&id))
    }

    fn restore(&self, id: Uuid, draft: OrderDraft) -> Result<(), DomainError> {
        self.drafts.write().map_err(poisoned)?.insert(id, draft);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Customer, DraftPurpose};

    #[test]
    fn insert_get_remove_roundtrip() {
        let repo = InMemoryDraftRepository::new();
        let id = repo
            .insert(OrderDraft::new(DraftPurpose::EditBooking(4)))
            .expect("insert failed");

        let draft = repo.get(id).expect("get failed").expect("draft should exist");
        assert_eq!(draft.purpose, DraftPurpose::EditBooking(4));

        assert!(repo.remove(id).expect("remove failed").is_some());
        assert!(repo.get(id).expect("get failed").is_none());
    }

    #[test]
    fn restore_keeps_the_original_id() {
        let repo = InMemoryDraftRepository::new();
        let id = repo.insert(OrderDraft::new(DraftPurpose::NewBooking)).unwrap();
        let taken = repo.remove(id).unwrap().expect("draft should exist");
        assert!(repo.get(id).unwrap().is_none());

        repo.restore(id, taken).unwrap();
        assert_eq!(repo.get(id).unwrap().unwrap().purpose, DraftPurpose::NewBooking);
    }

    #[test]
    fn update_applies_edit() {
        let repo = InMemoryDraftRepository::new();
        let id = repo.insert(OrderDraft::new(DraftPurpose::NewBooking)).unwrap();

        let updated = repo
            .update(id, |d| {
                d.set_customer(Customer {
                    name: "Asha".to_string(),
                    ..Default::default()
                });
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.customer.name, "Asha");
        assert_eq!(repo.get(id).unwrap().unwrap().customer.name, "Asha");
    }

    #[test]
    fn failed_edit_is_not_stored() {
        let repo = InMemoryDraftRepository::new();
        let id = repo.insert(OrderDraft::new(DraftPurpose::NewBooking)).unwrap();

        let result = repo.update(id, |d| {
            d.no_of_days = 9;
            Err(DomainError::InvalidInput("rejected".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(repo.get(id).unwrap().unwrap().no_of_days, 1);
    }

    #[test]
    fn update_of_unknown_draft_is_not_found() {
        let repo = InMemoryDraftRepository::new();
        let result = repo.update(Uuid::new_v4(), |_| Ok(()));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
