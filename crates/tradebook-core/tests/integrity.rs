//! Integration tests for validation, constraints, and cascades.

use std::sync::Arc;
use std::thread;

use tradebook_core::{
    Client, Error, NewClient, NewOrder, NewVendor, Order, RecordStore, StorageConfig,
    ValidationError, ValidationKind, Value, Vendor,
};

struct TestContext {
    store: RecordStore,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(StorageConfig::new(dir.path())).unwrap();
        Self { store, _dir: dir }
    }

    fn client(&self, name: &str, email: &str) -> Client {
        self.store
            .create::<Client>(NewClient::new(name, email))
            .unwrap()
    }

    fn vendor(&self, name: &str) -> Vendor {
        self.store
            .create::<Vendor>(NewVendor::new(name, false))
            .unwrap()
    }

    fn order(&self, client: &Client, vendor: &Vendor, summary: &str) -> Order {
        self.store
            .create::<Order>(NewOrder::new(client.id, vendor.id, summary))
            .unwrap()
    }
}

fn validation(err: Error) -> tradebook_core::ValidationErrors {
    match err {
        Error::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_create_and_read_back() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe Kwon", "joek@example.com");

    assert_eq!(client.id, 1);
    assert!(client.created_at > 0);
    assert_eq!(client.created_at, client.updated_at);
    assert_eq!(ctx.store.get::<Client>(1).unwrap(), Some(client));
    assert_eq!(ctx.store.get::<Client>(2).unwrap(), None);
}

#[test]
fn test_duplicate_email_ignoring_case() {
    let ctx = TestContext::new();
    ctx.client("Joe", "joek@example.com");

    let err = ctx
        .store
        .create::<Client>(NewClient::new("Joe Again", "JOEK@example.com"))
        .unwrap_err();
    let errors = validation(err);
    assert_eq!(errors.len(), 1);
    assert!(errors.has("email", ValidationKind::Uniqueness));
    assert_eq!(ctx.store.count_all("clients").unwrap(), 1);
}

#[test]
fn test_every_violation_is_reported() {
    let ctx = TestContext::new();
    ctx.client("Joe", "joek@example.com");

    let draft = NewClient::new("n".repeat(51), "JoeK@Example.com").with_active(None);
    let errors = validation(ctx.store.create::<Client>(draft).unwrap_err());

    assert!(errors.has("name", ValidationKind::Length));
    assert!(errors.has("email", ValidationKind::Uniqueness));
    assert!(errors.has("active", ValidationKind::Inclusion));
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_order_requires_live_references() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe", "joek@example.com");

    let errors = validation(
        ctx.store
            .create::<Order>(NewOrder::new(client.id, 42, "Sofa"))
            .unwrap_err(),
    );
    assert_eq!(
        errors.iter().collect::<Vec<_>>(),
        vec![&ValidationError::Reference {
            field: "vendor_id".to_string(),
            table: "vendors".to_string(),
            id: 42,
        }]
    );
}

#[test]
fn test_order_field_rules() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe", "joek@example.com");
    let vendor = ctx.vendor("CB2");

    let long = NewOrder::new(client.id, vendor.id, "s".repeat(141));
    let errors = validation(ctx.store.create::<Order>(long).unwrap_err());
    assert!(errors.has("summary", ValidationKind::Length));

    let missing = NewOrder {
        client_id: None,
        ..NewOrder::new(client.id, vendor.id, "")
    };
    let errors = validation(ctx.store.create::<Order>(missing).unwrap_err());
    assert!(errors.has("client_id", ValidationKind::Presence));
    assert!(errors.has("summary", ValidationKind::Presence));
    assert!(!errors.has("vendor_id", ValidationKind::Reference));
}

#[test]
fn test_delete_client_cascades_to_orders() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe", "joek@example.com");
    let vendor = ctx.vendor("DWR");
    let order = ctx.order(&client, &vendor, "test");

    let summary = ctx.store.delete::<Client>(client.id).unwrap();

    assert_eq!(summary.count_for("orders"), 1);
    assert_eq!(summary.count_for("clients"), 1);
    assert_eq!(ctx.store.get::<Order>(order.id).unwrap(), None);
    assert_eq!(ctx.store.get::<Client>(client.id).unwrap(), None);
    assert!(ctx.store.get::<Vendor>(vendor.id).unwrap().is_some());
}

#[test]
fn test_cascade_only_touches_own_orders() {
    let ctx = TestContext::new();
    let joe = ctx.client("Joe", "joe@example.com");
    let ann = ctx.client("Ann", "ann@example.com");
    let vendor = ctx.vendor("CB2");
    for i in 0..3 {
        ctx.order(&joe, &vendor, &format!("joe {i}"));
    }
    ctx.order(&ann, &vendor, "ann");

    let summary = ctx.store.delete::<Client>(joe.id).unwrap();
    assert_eq!(summary.cascaded().len(), 3);
    assert_eq!(ctx.store.count_all("orders").unwrap(), 1);

    let lonely = ctx.client("Lonely", "lonely@example.com");
    let summary = ctx.store.delete::<Client>(lonely.id).unwrap();
    assert!(summary.cascaded().is_empty());
    assert_eq!(ctx.store.count_all("orders").unwrap(), 1);
}

#[test]
fn test_deleted_email_can_be_reused() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe", "joek@example.com");
    ctx.store.delete::<Client>(client.id).unwrap();

    let again = ctx.client("Joe", "JoeK@example.com");
    assert_ne!(again.id, client.id);
}

#[test]
fn test_vendor_delete_is_restricted() {
    let ctx = TestContext::new();
    let client = ctx.client("Joe", "joek@example.com");
    let vendor = ctx.vendor("ABC Home");
    let order = ctx.order(&client, &vendor, "Rug");

    let err = ctx.store.delete::<Vendor>(vendor.id).unwrap_err();
    assert!(matches!(
        err,
        Error::RestrictViolation {
            ref referencing_table,
            count: 1,
            ..
        } if referencing_table == "orders"
    ));
    assert!(ctx.store.get::<Vendor>(vendor.id).unwrap().is_some());

    ctx.store.delete::<Order>(order.id).unwrap();
    ctx.store.delete::<Vendor>(vendor.id).unwrap();
    assert_eq!(ctx.store.count_all("vendors").unwrap(), 0);
}

#[test]
fn test_delete_missing_record() {
    let ctx = TestContext::new();
    assert!(matches!(
        ctx.store.delete::<Client>(7),
        Err(Error::NotFound { id: 7, .. })
    ));
}

#[test]
fn test_update_keeps_own_email_and_moves_index() {
    let ctx = TestContext::new();
    let joe = ctx.client("Joe", "joek@example.com");
    ctx.client("Ann", "ann@example.com");

    let renamed = ctx
        .store
        .update::<Client>(joe.id, NewClient::new("Joseph", "JOEK@example.com"))
        .unwrap();
    assert_eq!(renamed.name, "Joseph");
    assert_eq!(renamed.created_at, joe.created_at);

    let errors = validation(
        ctx.store
            .update::<Client>(joe.id, NewClient::new("Joseph", "ann@example.com"))
            .unwrap_err(),
    );
    assert!(errors.has("email", ValidationKind::Uniqueness));

    ctx.store
        .update::<Client>(joe.id, NewClient::new("Joseph", "joseph@example.com"))
        .unwrap();
    ctx.client("Other Joe", "joek@example.com");
}

#[test]
fn test_update_moves_order_between_clients() {
    let ctx = TestContext::new();
    let joe = ctx.client("Joe", "joe@example.com");
    let ann = ctx.client("Ann", "ann@example.com");
    let vendor = ctx.vendor("CB2");
    let order = ctx.order(&joe, &vendor, "Chair");

    ctx.store
        .update::<Order>(order.id, NewOrder::new(ann.id, vendor.id, "Chair"))
        .unwrap();
    assert_eq!(ctx.store.dependents("client_orders", joe.id).unwrap(), 0);
    assert_eq!(ctx.store.dependents("client_orders", ann.id).unwrap(), 1);

    ctx.store.delete::<Client>(joe.id).unwrap();
    assert!(ctx.store.get::<Order>(order.id).unwrap().is_some());
}

#[test]
fn test_explicit_id_conflict() {
    let ctx = TestContext::new();
    ctx.store
        .create::<Vendor>(NewVendor::new("CB2", true).with_id(3))
        .unwrap();

    let errors = validation(
        ctx.store
            .create::<Vendor>(NewVendor::new("DWR", true).with_id(3))
            .unwrap_err(),
    );
    assert!(errors.has("id", ValidationKind::Uniqueness));
}

#[test]
fn test_find_by_field() {
    let ctx = TestContext::new();
    let joe = ctx.client("Joe", "JoeK@example.com");
    ctx.vendor("Room & Board");

    let row = ctx
        .store
        .find_by_field("clients", "email", &Value::from("joek@EXAMPLE.com"), true)
        .unwrap()
        .unwrap();
    assert_eq!(row.id, joe.id);

    let exact = ctx
        .store
        .find_by_field("clients", "email", &Value::from("joek@example.com"), false)
        .unwrap();
    assert!(exact.is_none());

    let vendor = ctx
        .store
        .find_by_field("vendors", "name", &Value::from("room & board"), true)
        .unwrap();
    assert!(vendor.is_some());

    assert!(matches!(
        ctx.store
            .find_by_field("clients", "nickname", &Value::from("x"), false),
        Err(Error::Catalog(_))
    ));
}

#[test]
fn test_counts_with_predicate() {
    let ctx = TestContext::new();
    ctx.client("A", "a@example.com");
    ctx.store
        .create::<Client>(NewClient::new("B", "b@example.com").with_active(Some(false)))
        .unwrap();

    let active = ctx
        .store
        .count("clients", |row| row.get("active") == Some(&Value::Bool(true)))
        .unwrap();
    assert_eq!(active, 1);
    assert_eq!(ctx.store.count_all("clients").unwrap(), 2);
    assert_eq!(ctx.store.list::<Client>().unwrap().len(), 2);
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = RecordStore::open(StorageConfig::new(dir.path())).unwrap();
        store
            .create::<Client>(NewClient::new("Joe", "joek@example.com"))
            .unwrap();
        store.flush().unwrap();
    }

    let store = RecordStore::open(StorageConfig::new(dir.path())).unwrap();
    assert_eq!(store.catalog().current_version(), 3);
    let err = store
        .create::<Client>(NewClient::new("Joe", "JOEK@example.com"))
        .unwrap_err();
    assert!(validation(err).has("email", ValidationKind::Uniqueness));
}

#[test]
fn test_concurrent_duplicate_emails() {
    let ctx = TestContext::new();
    let store = Arc::new(ctx.store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .create::<Client>(NewClient::new(format!("Joe {i}"), "joek@example.com"))
                    .is_ok()
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(created, 1);
    assert_eq!(store.count_all("clients").unwrap(), 1);
}

#[test]
fn test_exhausted_sequence_never_overwrites() {
    let ctx = TestContext::new();
    let top = ctx
        .store
        .create::<Client>(NewClient::new("Top", "top@example.com").with_id(u64::MAX))
        .unwrap();

    let err = ctx
        .store
        .create::<Client>(NewClient::new("Next", "a@example.com"))
        .unwrap_err();
    assert!(matches!(err, Error::SequenceExhausted { .. }));
    assert_eq!(ctx.store.count_all("clients").unwrap(), 1);
    assert_eq!(ctx.store.get::<Client>(u64::MAX).unwrap(), Some(top));

    // The rejected email was never claimed.
    let explicit = ctx
        .store
        .create::<Client>(NewClient::new("A", "a@example.com").with_id(5))
        .unwrap();
    assert_eq!(explicit.id, 5);
}
