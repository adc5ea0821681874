use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::{
    api::{ApiClient, ClientError},
    store::Store,
};
use crate::contacts::{
    dto::{CreateContactRequest, UpdateContactRequest},
    Contact,
};

/// Contacts as the UI sees them.
///
/// `contacts: None` means not loaded yet, `filtered: None` means no filter is
/// active. Fields an action leaves alone keep pointing at the same `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactsState {
    pub contacts: Option<Arc<Vec<Contact>>>,
    pub current: Option<Arc<Contact>>,
    pub filtered: Option<Arc<Vec<Contact>>>,
    pub filter_text: Option<Arc<str>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ContactsState {
    fn default() -> Self {
        Self {
            contacts: None,
            current: None,
            filtered: None,
            filter_text: None,
            loading: true,
            error: None,
        }
    }
}

impl ContactsState {
    pub fn contacts(&self) -> &[Contact] {
        self.contacts.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    /// What a list view should show: the filter result if one is active.
    pub fn visible(&self) -> &[Contact] {
        match &self.filtered {
            Some(f) => f.as_slice(),
            None => self.contacts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContactAction {
    ClearContacts,
    LoadContacts(Vec<Contact>),
    AddContact(Contact),
    UpdateContact(Contact),
    DeleteContact(Uuid),
    SetCurrent(Contact),
    ClearCurrent,
    FilterContacts(String),
    ClearFilter,
    ContactError(String),
    ClearErrors,
}

/// Case-insensitive literal substring match on name or email.
pub fn matches_filter(contact: &Contact, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    contact.name.to_lowercase().contains(&needle)
        || contact
            .email
            .as_deref()
            .is_some_and(|e| e.to_lowercase().contains(&needle))
}

fn filter_list(contacts: &[Contact], text: &str) -> Arc<Vec<Contact>> {
    Arc::new(
        contacts
            .iter()
            .filter(|c| matches_filter(c, text))
            .cloned()
            .collect(),
    )
}

/// Installs a new contact list and re-runs the active filter against it.
fn with_contacts(mut next: ContactsState, contacts: Vec<Contact>) -> ContactsState {
    if let Some(text) = &next.filter_text {
        next.filtered = Some(filter_list(&contacts, text));
    }
    next.contacts = Some(Arc::new(contacts));
    next
}

pub fn contact_reducer(state: &ContactsState, action: ContactAction) -> ContactsState {
    let mut next = state.clone();
    match action {
        ContactAction::ClearContacts => {
            next.contacts = None;
            next.filtered = None;
            next.filter_text = None;
            next.current = None;
            next.error = None;
            next
        }
        ContactAction::LoadContacts(contacts) => {
            next.loading = false;
            with_contacts(next, contacts)
        }
        ContactAction::AddContact(contact) => {
            let mut list = Vec::with_capacity(state.contacts().len() + 1);
            list.push(contact);
            list.extend_from_slice(state.contacts());
            next.loading = false;
            with_contacts(next, list)
        }
        ContactAction::UpdateContact(_) | ContactAction::DeleteContact(_)
            if state.contacts.is_none() =>
        {
            next.loading = false;
            next
        }
        ContactAction::UpdateContact(contact) => {
            let list = state
                .contacts()
                .iter()
                .map(|c| if c.id == contact.id { contact.clone() } else { c.clone() })
                .collect();
            next.loading = false;
            with_contacts(next, list)
        }
        ContactAction::DeleteContact(id) => {
            let list = state.contacts().iter().filter(|c| c.id != id).cloned().collect();
            next.loading = false;
            with_contacts(next, list)
        }
        ContactAction::SetCurrent(contact) => {
            next.current = Some(Arc::new(contact));
            next
        }
        ContactAction::ClearCurrent => {
            next.current = None;
            next
        }
        ContactAction::FilterContacts(text) => {
            next.filtered = Some(filter_list(state.contacts(), &text));
            next.filter_text = Some(Arc::from(text));
            next
        }
        ContactAction::ClearFilter => {
            next.filtered = None;
            next.filter_text = None;
            next
        }
        ContactAction::ContactError(msg) => {
            next.error = Some(msg);
            next.loading = false;
            next
        }
        ContactAction::ClearErrors => {
            next.error = None;
            next
        }
    }
}

/// Contact state plus the async actions that keep it in sync with the server.
pub struct ContactContext {
    store: Store<ContactsState, ContactAction>,
    api: ApiClient,
}

impl ContactContext {
    pub fn new(api: ApiClient) -> Self {
        Self {
            store: Store::new(ContactsState::default(), contact_reducer),
            api,
        }
    }

    pub fn state(&self) -> Arc<ContactsState> {
        self.store.snapshot()
    }

    pub fn dispatch(&self, action: ContactAction) -> Arc<ContactsState> {
        self.store.dispatch(action)
    }

    fn fail(&self, op: &str, err: ClientError) -> ClientError {
        warn!(op, error = %err, "contact request failed");
        self.store.dispatch(ContactAction::ContactError(err.to_string()));
        err
    }

    pub async fn get_contacts(&self) -> Result<(), ClientError> {
        match self.api.get_contacts().await {
            Ok(contacts) => {
                self.store.dispatch(ContactAction::LoadContacts(contacts));
                Ok(())
            }
            Err(e) => Err(self.fail("get_contacts", e)),
        }
    }

    pub async fn add_contact(&self, contact: CreateContactRequest) -> Result<Contact, ClientError> {
        match self.api.add_contact(&contact).await {
            Ok(created) => {
                self.store.dispatch(ContactAction::AddContact(created.clone()));
                Ok(created)
            }
            Err(e) => Err(self.fail("add_contact", e)),
        }
    }

    pub async fn update_contact(&self, contact: &Contact) -> Result<Contact, ClientError> {
        let body = UpdateContactRequest {
            name: Some(contact.name.clone()),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            kind: Some(contact.kind.clone()),
        };
        match self.api.update_contact(contact.id, &body).await {
            Ok(updated) => {
                self.store.dispatch(ContactAction::UpdateContact(updated.clone()));
                Ok(updated)
            }
            Err(e) => Err(self.fail("update_contact", e)),
        }
    }

    pub async fn delete_contact(&self, id: Uuid) -> Result<(), ClientError> {
        match self.api.delete_contact(id).await {
            Ok(_) => {
                self.store.dispatch(ContactAction::DeleteContact(id));
                Ok(())
            }
            Err(e) => Err(self.fail("delete_contact", e)),
        }
    }

    pub fn clear_contacts(&self) {
        self.store.dispatch(ContactAction::ClearContacts);
    }

    pub fn set_current(&self, contact: Contact) {
        self.store.dispatch(ContactAction::SetCurrent(contact));
    }

    pub fn clear_current(&self) {
        self.store.dispatch(ContactAction::ClearCurrent);
    }

    /// Emptying the filter box drops the filter instead of matching everything.
    pub fn filter_contacts(&self, text: &str) {
        if text.is_empty() {
            self.store.dispatch(ContactAction::ClearFilter);
        } else {
            self.store.dispatch(ContactAction::FilterContacts(text.to_string()));
        }
    }

    pub fn clear_filter(&self) {
        self.store.dispatch(ContactAction::ClearFilter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::OffsetDateTime;

    fn contact(name: &str, email: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            user: Uuid::nil(),
            name: name.into(),
            email: email.map(str::to_string),
            phone: None,
            kind: "personal".into(),
            date: OffsetDateTime::now_utc(),
        }
    }

    fn loaded(list: Vec<Contact>) -> ContactsState {
        contact_reducer(&ContactsState::default(), ContactAction::LoadContacts(list))
    }

    fn ann_and_bob() -> ContactsState {
        loaded(vec![
            contact("Ann", Some("a@x.com")),
            contact("Bob", Some("b@x.com")),
        ])
    }

    fn names(list: &[Contact]) -> Vec<&str> {
        list.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn load_sets_list_and_stops_loading() {
        let state = ann_and_bob();
        assert!(!state.loading);
        assert_eq!(names(state.contacts()), ["Ann", "Bob"]);
    }

    #[test]
    fn clear_contacts_goes_back_to_unloaded() {
        let state = contact_reducer(&ann_and_bob(), ContactAction::ClearContacts);
        assert!(state.contacts.is_none());
        assert!(state.filtered.is_none());
    }

    #[test]
    fn add_prepends() {
        let state = contact_reducer(&ann_and_bob(), ContactAction::AddContact(contact("Cy", None)));
        assert_eq!(names(state.contacts()), ["Cy", "Ann", "Bob"]);
    }

    #[test]
    fn add_to_unloaded_list_starts_one() {
        let state = contact_reducer(
            &ContactsState::default(),
            ContactAction::AddContact(contact("Cy", None)),
        );
        assert_eq!(names(state.contacts()), ["Cy"]);
    }

    #[test]
    fn add_then_delete_restores_list() {
        let before = ann_and_bob();
        let cy = contact("Cy", None);
        let id = cy.id;
        let added = contact_reducer(&before, ContactAction::AddContact(cy));
        let after = contact_reducer(&added, ContactAction::DeleteContact(id));
        assert_eq!(after.contacts, before.contacts);
    }

    #[test]
    fn update_replaces_in_place() {
        let state = ann_and_bob();
        let mut bob = state.contacts()[1].clone();
        bob.name = "Robert".into();
        let next = contact_reducer(&state, ContactAction::UpdateContact(bob));
        assert_eq!(names(next.contacts()), ["Ann", "Robert"]);
    }

    #[test]
    fn update_with_unknown_id_changes_nothing() {
        let state = ann_and_bob();
        let next = contact_reducer(&state, ContactAction::UpdateContact(contact("Ghost", None)));
        assert_eq!(next.contacts, state.contacts);
    }

    #[test]
    fn current_is_set_and_cleared() {
        let state = ann_and_bob();
        let ann = state.contacts()[0].clone();
        let set = contact_reducer(&state, ContactAction::SetCurrent(ann.clone()));
        assert_eq!(set.current.as_deref(), Some(&ann));
        let cleared = contact_reducer(&set, ContactAction::ClearCurrent);
        assert!(cleared.current.is_none());
    }

    #[rstest]
    #[case("", &["Ann", "Bob"])]
    #[case("bob", &["Bob"])]
    #[case("BOB", &["Bob"])]
    #[case("x.com", &["Ann", "Bob"])]
    #[case("a@", &["Ann"])]
    #[case("zed", &[])]
    #[case("(", &[])]
    #[case(".*", &[])]
    fn filter_is_literal_and_case_insensitive(#[case] text: &str, #[case] want: &[&str]) {
        let state = contact_reducer(&ann_and_bob(), ContactAction::FilterContacts(text.into()));
        assert_eq!(names(state.filtered.as_deref().unwrap()), want);
    }

    #[test]
    fn missing_email_never_matches() {
        let state = loaded(vec![contact("Ann", None)]);
        let next = contact_reducer(&state, ContactAction::FilterContacts("@".into()));
        assert!(next.filtered.as_deref().unwrap().is_empty());
    }

    #[test]
    fn clear_filter_drops_results() {
        let state = contact_reducer(&ann_and_bob(), ContactAction::FilterContacts("ann".into()));
        let next = contact_reducer(&state, ContactAction::ClearFilter);
        assert!(next.filtered.is_none());
        assert_eq!(next.visible().len(), 2);
    }

    #[test]
    fn active_filter_follows_list_changes() {
        let state = contact_reducer(&ann_and_bob(), ContactAction::FilterContacts("b".into()));
        assert_eq!(names(state.visible()), ["Bob"]);

        let state = contact_reducer(&state, ContactAction::AddContact(contact("Barb", None)));
        assert_eq!(names(state.visible()), ["Barb", "Bob"]);

        let bob_id = state.contacts()[2].id;
        let state = contact_reducer(&state, ContactAction::DeleteContact(bob_id));
        assert_eq!(names(state.visible()), ["Barb"]);
    }

    #[rstest]
    #[case::default_state(ContactsState::default())]
    #[case::after_clear(contact_reducer(&ann_and_bob(), ContactAction::ClearContacts))]
    fn update_or_delete_on_unloaded_list_stays_unloaded(#[case] state: ContactsState) {
        let late = contact("Late", None);
        for action in [
            ContactAction::UpdateContact(late.clone()),
            ContactAction::DeleteContact(late.id),
        ] {
            let next = contact_reducer(&state, action);
            assert!(next.contacts.is_none());
            assert!(next.filtered.is_none());
            assert!(!next.loading);
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Slot {
        Shared,
        Fresh,
        Gone,
    }

    fn check_slot<T: ?Sized>(field: &str, before: &Option<Arc<T>>, after: &Option<Arc<T>>, want: Slot) {
        let before = before.as_ref().unwrap_or_else(|| panic!("{field} unset in fixture"));
        match (want, after) {
            (Slot::Gone, None) => {}
            (Slot::Shared, Some(after)) => assert!(Arc::ptr_eq(before, after), "{field} was replaced"),
            (Slot::Fresh, Some(after)) => assert!(!Arc::ptr_eq(before, after), "{field} was reused"),
            (want, after) => panic!("{field}: wanted {want:?}, got set={}", after.is_some()),
        }
    }

    /// Every optional field populated, so each action has something to keep or replace.
    fn busy_state() -> ContactsState {
        let state = contact_reducer(&ann_and_bob(), ContactAction::SetCurrent(contact("Cur", None)));
        let state = contact_reducer(&state, ContactAction::FilterContacts("b".into()));
        contact_reducer(&state, ContactAction::ContactError("stale".into()))
    }

    type MakeAction = fn(&ContactsState) -> ContactAction;

    #[rstest]
    #[case::clear_contacts(|_: &ContactsState| ContactAction::ClearContacts, [Slot::Gone, Slot::Gone, Slot::Gone, Slot::Gone])]
    #[case::load(|_: &ContactsState| ContactAction::LoadContacts(vec![contact("Dee", None)]), [Slot::Fresh, Slot::Shared, Slot::Fresh, Slot::Shared])]
    #[case::add(|_: &ContactsState| ContactAction::AddContact(contact("Bo", None)), [Slot::Fresh, Slot::Shared, Slot::Fresh, Slot::Shared])]
    #[case::update(
        |s: &ContactsState| {
            let mut ann = s.contacts()[0].clone();
            ann.name = "Annie".into();
            ContactAction::UpdateContact(ann)
        },
        [Slot::Fresh, Slot::Shared, Slot::Fresh, Slot::Shared]
    )]
    #[case::delete(|s: &ContactsState| ContactAction::DeleteContact(s.contacts()[1].id), [Slot::Fresh, Slot::Shared, Slot::Fresh, Slot::Shared])]
    #[case::set_current(|s: &ContactsState| ContactAction::SetCurrent(s.contacts()[0].clone()), [Slot::Shared, Slot::Fresh, Slot::Shared, Slot::Shared])]
    #[case::clear_current(|_: &ContactsState| ContactAction::ClearCurrent, [Slot::Shared, Slot::Gone, Slot::Shared, Slot::Shared])]
    #[case::filter(|_: &ContactsState| ContactAction::FilterContacts("a".into()), [Slot::Shared, Slot::Shared, Slot::Fresh, Slot::Fresh])]
    #[case::clear_filter(|_: &ContactsState| ContactAction::ClearFilter, [Slot::Shared, Slot::Shared, Slot::Gone, Slot::Gone])]
    #[case::error(|_: &ContactsState| ContactAction::ContactError("boom".into()), [Slot::Shared; 4])]
    #[case::clear_errors(|_: &ContactsState| ContactAction::ClearErrors, [Slot::Shared; 4])]
    fn transitions_never_mutate_input_and_share_untouched_fields(
        #[case] make: MakeAction,
        #[case] want: [Slot; 4],
    ) {
        let state = busy_state();
        let snapshot = state.clone();

        let next = contact_reducer(&state, make(&state));

        assert_eq!(state, snapshot);
        let [contacts, current, filtered, filter_text] = want;
        check_slot("contacts", &state.contacts, &next.contacts, contacts);
        check_slot("current", &state.current, &next.current, current);
        check_slot("filtered", &state.filtered, &next.filtered, filtered);
        check_slot("filter_text", &state.filter_text, &next.filter_text, filter_text);
    }

    #[test]
    fn errors_are_recorded_and_cleared() {
        let state = contact_reducer(&ContactsState::default(), ContactAction::ContactError("boom".into()));
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(!state.loading);
        assert!(contact_reducer(&state, ContactAction::ClearErrors).error.is_none());
    }

    #[test]
    fn context_filter_with_empty_text_clears() {
        let ctx = ContactContext::new(ApiClient::new("http://127.0.0.1:9"));
        ctx.dispatch(ContactAction::LoadContacts(vec![contact("Ann", None)]));
        ctx.filter_contacts("an");
        assert_eq!(ctx.state().filtered.as_ref().map(|f| f.len()), Some(1));
        ctx.filter_contacts("");
        assert!(ctx.state().filtered.is_none());
    }
}
