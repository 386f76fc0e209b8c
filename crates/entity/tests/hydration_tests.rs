//! End-to-end hydration and extraction through `#[derive(Entity)]`

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use elif_entity::{
    Entity, EntityError, EntityObject, EntityRegistry, Hydrator, MappingConfig, Property, Row,
};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Default, PartialEq, Entity)]
#[entity(table = "users")]
pub struct User {
    #[id]
    #[field(type = "integer", auto_increment)]
    pub id: Property<i64>,

    #[field(type = "string", length = 120)]
    pub name: Property<String>,

    #[field(type = "boolean", default = false)]
    pub active: Property<bool>,

    #[field(type = "simple_array")]
    pub tags: Property<Vec<String>>,

    #[field(type = "timestamp", nullable)]
    pub created_at: Property<Option<DateTime<Utc>>>,

    #[field(type = "datetimetz")]
    pub last_seen: Property<DateTime<FixedOffset>>,

    #[field(type = "json")]
    pub payload: Property<Option<JsonValue>>,

    #[field(type = "decimal", precision = 12, scale = 5)]
    pub balance: Property<Decimal>,

    #[transient]
    pub cached_label: Option<String>,
}

#[derive(Debug, Default, Entity)]
pub struct Counter {
    #[id]
    pub id: Property<i64>,

    #[field(type = "unsignedBigInt", unsigned)]
    pub hits: Property<u64>,
}

#[derive(Debug, Default, Entity)]
#[entity(abstract_entity)]
pub struct Timestamped {
    #[field(type = "datetime")]
    pub updated_at: Property<DateTime<Utc>>,
}

fn row(value: JsonValue) -> Row {
    Row::try_from(value).unwrap()
}

#[test]
fn test_round_trip_of_mixed_columns() {
    let hydrator = Hydrator::default();
    let user: User = hydrator
        .hydrate(&row(json!({"id": 7, "name": "Ada", "active": "1", "tags": "a,b,c"})))
        .unwrap();

    assert_eq!(user.id.get(), Some(&7));
    assert_eq!(user.active.get(), Some(&true));
    assert_eq!(user.tags.get(), Some(&vec!["a".to_string(), "b".to_string(), "c".to_string()]));

    let extracted = hydrator.extract(&user, None).unwrap();
    assert_eq!(
        extracted.into_json(),
        json!({"id": 7, "name": "Ada", "active": 1, "tags": "a,b,c"})
    );
}

#[test]
fn test_rehydrating_an_extracted_row_is_stable() {
    let hydrator = Hydrator::default();
    let source = row(json!({
        "id": "12",
        "name": "Grace",
        "active": 0,
        "tags": "x,y",
        "created_at": "2024-03-05 10:20:30",
        "payload": "{\"plan\":\"pro\"}",
        "balance": "12345.67890"
    }));

    let first: User = hydrator.hydrate(&source).unwrap();
    let second: User = hydrator.hydrate(&hydrator.extract(&first, None).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_hydration_is_idempotent() {
    let source = row(json!({"id": 3, "name": "Linus", "tags": ""}));
    let a = User::from_row(&source).unwrap();
    let b = User::from_row(&source).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.tags.get(), Some(&Vec::<String>::new()));
}

#[test]
fn test_integer_columns_truncate() {
    let user: User = Hydrator::default().hydrate(&row(json!({"id": 42.9}))).unwrap();
    assert_eq!(user.id.get(), Some(&42));

    let user: User = Hydrator::default().hydrate(&row(json!({"id": "42"}))).unwrap();
    assert_eq!(user.id.get(), Some(&42));
}

#[test]
fn test_non_numeric_integer_is_a_coercion_error() {
    let err = Hydrator::default()
        .hydrate::<User>(&row(json!({"id": "seven"})))
        .unwrap_err();

    assert!(err.is_coercion());
    match err {
        EntityError::Coercion { entity, property, .. } => {
            assert_eq!(entity, User::type_path());
            assert_eq!(property, "id");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_decimal_digits_survive() {
    let hydrator = Hydrator::default();
    let user: User = hydrator.hydrate(&row(json!({"balance": "12345.67890"}))).unwrap();
    assert_eq!(user.balance.get(), Some(&Decimal::new(1234567890, 5)));

    let extracted = hydrator.extract(&user, Some(&["balance"][..])).unwrap();
    assert_eq!(extracted.get("balance"), Some(&json!("12345.67890")));
}

#[test]
fn test_epoch_timestamp() {
    let user: User = Hydrator::default()
        .hydrate(&row(json!({"created_at": 1700000000})))
        .unwrap();

    let created_at = user.created_at.get().cloned().flatten().unwrap();
    assert_eq!(created_at.timestamp(), 1_700_000_000);
}

#[test]
fn test_timezone_is_preserved() {
    let hydrator = Hydrator::default();
    let user: User = hydrator
        .hydrate(&row(json!({"last_seen": "2024-03-05T10:20:30+02:00"})))
        .unwrap();

    let last_seen = user.last_seen.get().unwrap();
    assert_eq!(last_seen.offset().local_minus_utc(), 2 * 3600);

    let extracted = hydrator.extract(&user, Some(&["last_seen"][..])).unwrap();
    assert_eq!(extracted.get("last_seen"), Some(&json!("2024-03-05 08:20:30")));

    // The instant survives a second trip
    let again: User = hydrator.hydrate(&extracted).unwrap();
    assert_eq!(again.last_seen.get().map(DateTime::timestamp), Some(last_seen.timestamp()));
}

#[test]
fn test_unsigned_big_int_holds_u64_max() {
    let hydrator = Hydrator::default();
    let counter: Counter = hydrator
        .hydrate(&row(json!({"id": 1, "hits": "18446744073709551615"})))
        .unwrap();
    assert_eq!(counter.hits.get(), Some(&u64::MAX));

    let extracted = hydrator.extract(&counter, None).unwrap();
    assert_eq!(extracted.into_json(), json!({"id": 1, "hits": u64::MAX}));

    let counter = Counter {
        hits: Property::new(7),
        ..Default::default()
    };
    assert_eq!(counter.to_row().unwrap().into_json(), json!({"hits": 7}));
}

#[test]
fn test_json_decodes_or_fails_soft() {
    let hydrator = Hydrator::default();

    let user: User = hydrator.hydrate(&row(json!({"payload": "{\"a\":1}"}))).unwrap();
    assert_eq!(user.payload.get(), Some(&Some(json!({"a": 1}))));

    let user: User = hydrator.hydrate(&row(json!({"payload": "not json"}))).unwrap();
    assert_eq!(user.payload.get(), Some(&None));
}

#[test]
fn test_null_leaves_non_nullable_property_unset() {
    let user: User = Hydrator::default()
        .hydrate(&row(json!({"name": null, "created_at": null})))
        .unwrap();

    assert!(!user.name.is_set());
    assert!(user.name.require("name").unwrap_err().is_uninitialized());
    // Nullable properties do take the null
    assert_eq!(user.created_at.get(), Some(&None));
}

#[test]
fn test_unset_properties_are_not_extracted() {
    let user: User = Hydrator::default().hydrate(&row(json!({"name": "Ada"}))).unwrap();
    let extracted = user.to_row().unwrap();

    assert_eq!(extracted.columns().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_extract_subset() {
    let user: User = Hydrator::default()
        .hydrate(&row(json!({"id": 1, "name": "Ada", "active": true})))
        .unwrap();

    let extracted = Hydrator::default().extract(&user, Some(&["id", "active", "missing"][..])).unwrap();
    assert_eq!(extracted.into_json(), json!({"id": 1, "active": 1}));
}

#[test]
fn test_unknown_and_transient_columns_are_skipped() {
    let user: User = Hydrator::default()
        .hydrate(&row(json!({"name": "Ada", "nickname": "ada", "cached_label": "x"})))
        .unwrap();

    assert_eq!(user.name.get().map(String::as_str), Some("Ada"));
    assert_eq!(user.cached_label, None);
}

#[test]
fn test_column_mapping() {
    let mut mapping = HashMap::new();
    mapping.insert("user_name".to_string(), "name".to_string());
    mapping.insert("user_id".to_string(), "id".to_string());

    let user: User = Hydrator::default()
        .hydrate_with_mapping(&row(json!({"user_id": "5", "user_name": "Ada"})), &mapping)
        .unwrap();

    assert_eq!(user.id.get(), Some(&5));
    assert_eq!(user.name.get().map(String::as_str), Some("Ada"));
}

#[test]
fn test_records_convert_to_rows() {
    #[derive(serde::Serialize)]
    struct Record {
        id: i64,
        name: &'static str,
    }

    let source = Row::from_record(&Record { id: 9, name: "Ada" }).unwrap();
    let user: User = Hydrator::default().hydrate(&source).unwrap();
    assert_eq!(user.id.get(), Some(&9));
}

#[test]
fn test_abstract_entities_are_rejected() {
    let err = Hydrator::default()
        .hydrate::<Timestamped>(&row(json!({"updated_at": "2024-01-01 00:00:00"})))
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn test_hydrate_by_identifier() {
    let hydrator = Hydrator::default();
    hydrator.register::<User>().unwrap();

    let entity = hydrator
        .hydrate_named(User::type_path(), &row(json!({"id": 11, "name": "Ada"})))
        .unwrap();
    assert_eq!(entity.entity_type(), User::type_path());

    let user = entity.downcast::<User>().unwrap();
    assert_eq!(user.id.get(), Some(&11));

    assert!(matches!(
        hydrator.hydrate_named("nowhere::Missing", &Row::new()),
        Err(EntityError::UnknownEntity(_))
    ));
}

#[test]
fn test_shared_registry() {
    let registry = Arc::new(EntityRegistry::new());
    let a = Hydrator::default().with_registry(registry.clone());
    let b = Hydrator::default().with_registry(registry.clone());

    a.register::<User>().unwrap();
    assert!(b.registry().contains(User::type_path()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lenient_batch_collects_failures() {
    let rows = vec![
        row(json!({"id": 1, "created_at": "2024-01-01 00:00:00"})),
        row(json!({"id": 2, "created_at": "yesterday"})),
        row(json!({"id": 3})),
    ];

    let batch = Hydrator::default().hydrate_batch::<User>(&rows).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(!batch.is_complete());
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].index, 1);
    assert!(batch.failures[0].error.is_coercion());

    let ids: Vec<i64> = batch.into_iter().filter_map(|u| u.id.into_option()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_strict_batch_stops_at_first_failure() {
    let hydrator = Hydrator::new(MappingConfig::default().with_lenient_batches(false));
    let rows = vec![row(json!({"id": 1})), row(json!({"id": "two"}))];

    assert!(hydrator.hydrate_batch::<User>(&rows).unwrap_err().is_coercion());
    assert!(hydrator.hydrate_all::<User>(&rows).is_err());
}

#[test]
fn test_hydrate_into_existing_instance() {
    let hydrator = Hydrator::default();
    let metadata = hydrator.register::<User>().unwrap();

    let mut user = User {
        name: Property::new("Before".to_string()),
        ..Default::default()
    };
    hydrator
        .hydrate_into(&mut user, &metadata, &row(json!({"id": 4, "name": null})))
        .unwrap();

    assert_eq!(user.id.get(), Some(&4));
    assert_eq!(user.name.get().map(String::as_str), Some("Before"));
}
