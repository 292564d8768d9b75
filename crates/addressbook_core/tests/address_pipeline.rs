use addressbook_core::{
    address_id, normalize, order, AddressBookSession, AddressCollection, FormError,
    MemoryKeyValueStore, MockAddressLookup, PersistenceBridge, RawAddress, SearchOutcome,
    DEFAULT_STORAGE_KEY,
};
use addressbook_core::{AddressLookup, LookupError, LookupRequest};
use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lookup that counts calls and returns a fixed response.
struct ScriptedLookup {
    calls: AtomicUsize,
    response: Result<Option<Vec<Value>>, LookupError>,
}

impl ScriptedLookup {
    fn new(response: Result<Option<Vec<Value>>, LookupError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressLookup for ScriptedLookup {
    async fn lookup(&self, _request: &LookupRequest) -> Result<Option<Vec<RawAddress>>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map(|entries| {
            entries.map(|entries| entries.iter().map(RawAddress::from_value).collect())
        })
    }
}

fn edward_street() -> Value {
    json!({
        "line1": "2 Edward Street 7",
        "city": "Brisbane",
        "postcode": "1234",
        "houseNumber": "7"
    })
}

#[tokio::test]
async fn lookup_result_normalizes_to_composite_id() {
    let lookup = ScriptedLookup::new(Ok(Some(vec![edward_street()])));
    let mut session = AddressBookSession::new(lookup.clone());

    assert_eq!(session.find("1234", "7").await, SearchOutcome::Found(1));
    assert_eq!(session.results()[0].id, "1234-2 Edward Street 7-7");
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn empty_fields_are_rejected_without_lookup() {
    let lookup = ScriptedLookup::new(Ok(Some(vec![edward_street()])));
    let mut session = AddressBookSession::new(lookup.clone());

    assert_eq!(session.find("", "7").await, SearchOutcome::Invalid);
    assert_eq!(
        session.message(),
        Some("Postcode and street number fields mandatory!")
    );
    assert_eq!(session.find("1234", "  ").await, SearchOutcome::Invalid);
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn non_digit_postcode_is_rejected() {
    let lookup = ScriptedLookup::new(Ok(None));
    let mut session = AddressBookSession::new(lookup.clone());

    assert_eq!(session.find("12A4", "7").await, SearchOutcome::Invalid);
    assert_eq!(
        session.message(),
        Some("Postcode must be all digits and non negative!")
    );
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn short_postcode_is_rejected_on_length() {
    let lookup = ScriptedLookup::new(Ok(None));
    let mut session = AddressBookSession::new(lookup.clone());

    assert_eq!(session.find("123", "5").await, SearchOutcome::Invalid);
    assert_eq!(session.message(), Some("Please Enter Valid Postcode!"));
}

#[tokio::test]
async fn attaching_person_adds_named_entry_ahead_of_unnamed() {
    let store = Arc::new(MemoryKeyValueStore::new());
    store.insert(
        DEFAULT_STORAGE_KEY,
        json!([{ "street": "Adelaide Street", "postcode": "4000", "houseNumber": "9" }]).to_string(),
    );
    let bridge = PersistenceBridge::new(store);
    let mut session = AddressBookSession::new(Arc::new(MockAddressLookup::new()));
    session.load_saved(&bridge, DEFAULT_STORAGE_KEY).await;

    session.find("1234", "7").await;
    let before = session.collection().len();
    let target = session.results()[0].id.clone();
    session.select(target);
    let stored = session.add_person("Ann", "Lee").unwrap();

    assert_eq!(session.collection().len(), before + 1);
    let display = session.entries();
    assert_eq!(display[0], stored);
    assert_eq!(display[1].first_name, None);
}

#[tokio::test]
async fn falsy_lookup_reports_no_results_and_keeps_collection() {
    let lookup = ScriptedLookup::new(Ok(None));
    let mut session = AddressBookSession::new(lookup);

    assert_eq!(session.find("1234", "7").await, SearchOutcome::NoResults);
    assert_eq!(session.message(), Some("No results found!"));
    assert!(session.collection().is_empty());
}

#[tokio::test]
async fn empty_result_list_counts_as_no_results() {
    let lookup = ScriptedLookup::new(Ok(Some(Vec::new())));
    let mut session = AddressBookSession::new(lookup);

    assert_eq!(session.find("1234", "7").await, SearchOutcome::NoResults);
}

#[tokio::test]
async fn malformed_entries_still_normalize() {
    let lookup = ScriptedLookup::new(Ok(Some(vec![json!(42), json!({ "postCode": 4000 })])));
    let mut session = AddressBookSession::new(lookup);

    assert_eq!(session.find("4000", "1").await, SearchOutcome::Found(2));
    assert_eq!(session.results()[0].id, "--");
    assert_eq!(session.results()[1].postcode, "4000");
}

#[tokio::test]
async fn lookup_failure_message_is_surfaced() {
    let lookup = ScriptedLookup::new(Err(LookupError::Failed(
        "Postcode must be all digits and non negative!".to_string(),
    )));
    let mut session = AddressBookSession::new(lookup);

    assert_eq!(session.find("1234", "7").await, SearchOutcome::Failed);
    assert_eq!(
        session.message(),
        Some("Postcode must be all digits and non negative!")
    );
}

#[tokio::test]
async fn person_form_requires_selection_and_valid_names() {
    let mut session = AddressBookSession::new(Arc::new(MockAddressLookup::new()));

    assert_eq!(
        session.add_person("", "Lee"),
        Err(FormError::MissingNames)
    );
    assert_eq!(
        session.add_person("Ann", "Lee"),
        Err(FormError::NoAddressSelected)
    );

    session.find("1234", "7").await;
    let id = session.results()[0].id.clone();
    session.select(id);
    assert_eq!(
        session.add_person("Ann3", "Lee"),
        Err(FormError::InvalidFirstName)
    );
    assert_eq!(
        session.message(),
        Some("Enter a valid first name (letters only).")
    );
    assert!(session.collection().is_empty());
}

#[tokio::test]
async fn re_adding_same_address_replaces_in_place() {
    let mut session = AddressBookSession::new(Arc::new(MockAddressLookup::new()));

    for house_number in ["1", "2", "3"] {
        session.find("4000", house_number).await;
        let id = session.results()[0].id.clone();
        session.select(id);
        session.add_person("Ann", "Lee").unwrap();
    }

    session.find("4000", "2").await;
    let id = session.results()[0].id.clone();
    session.select(id.clone());
    session.add_person("Bob", "Stone").unwrap();

    let stored = session.collection().select_all();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].id, id);
    assert_eq!(stored[1].first_name.as_deref(), Some("Bob"));
}

fn field() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[ a-zA-Z0-9]{0,12}".prop_map(Value::String),
        any::<u32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn raw_address() -> impl Strategy<Value = RawAddress> {
    (
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
        proptest::option::of(field()),
    )
        .prop_map(
            |(street, line1, postcode, post_code, city, house_number, first_name, last_name)| {
                RawAddress {
                    street,
                    line1,
                    postcode,
                    post_code,
                    city,
                    house_number,
                    first_name,
                    last_name,
                }
            },
        )
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in raw_address()) {
        let once = normalize(&raw);
        let twice = normalize(&once.to_raw());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn id_depends_only_on_identity_fields(
        raw in raw_address(),
        city in "[a-zA-Z ]{0,10}",
        first in "[a-zA-Z]{2,10}",
        last in "[a-zA-Z]{2,10}",
    ) {
        let base = normalize(&raw);
        let mut changed = base.with_person(first, last);
        changed.city = city;
        let renormalized = normalize(&changed.to_raw());

        prop_assert_eq!(&renormalized.id, &base.id);
        prop_assert_eq!(
            base.id.clone(),
            address_id(&base.postcode, &base.street, &base.house_number)
        );
    }

    #[test]
    fn upsert_grows_by_one_or_replaces_in_place(
        houses in proptest::collection::vec(0_u8..6, 1..20),
    ) {
        let mut collection = AddressCollection::new();
        for house in houses {
            let address = normalize(&RawAddress::from_value(&json!({
                "street": "Main",
                "postcode": "4000",
                "houseNumber": house.to_string(),
            })));
            let before = collection.select_all().to_vec();
            let existing = before.iter().position(|a| a.id == address.id);

            collection.upsert(address.clone());

            match existing {
                Some(index) => {
                    prop_assert_eq!(collection.len(), before.len());
                    prop_assert_eq!(&collection.select_all()[index], &address);
                }
                None => {
                    prop_assert_eq!(collection.len(), before.len() + 1);
                    prop_assert_eq!(collection.select_all().last(), Some(&address));
                }
            }
        }
    }

    #[test]
    fn ordering_is_repeatable_and_puts_named_first(raws in proptest::collection::vec(raw_address(), 0..12)) {
        let addresses: Vec<_> = raws.iter().map(normalize).collect();
        let first = order(&addresses);
        let second = order(&addresses);
        prop_assert_eq!(&first, &second);

        let first_unnamed = first.iter().position(|a| !a.has_first_name());
        if let Some(boundary) = first_unnamed {
            prop_assert!(first[boundary..].iter().all(|a| !a.has_first_name()));
        }
    }
}
