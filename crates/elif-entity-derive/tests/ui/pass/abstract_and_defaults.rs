use elif_entity::{Entity, Property};

#[derive(Debug, Default, Entity)]
#[entity(abstract_entity)]
pub struct Auditable {
    #[field(type = "datetime")]
    pub created_at: Property<chrono::DateTime<chrono::Utc>>,

    #[field(type = "boolean", default = true)]
    pub visible: Property<bool>,

    #[field(type = "decimal", precision = 10, scale = 2, default = "0.00", unsigned = false)]
    pub total: Property<String>,

    #[field(type = "json", default = serde_json::json!({"a": 1}))]
    pub extra: Property<serde_json::Value>,
}

fn main() {
    let metadata = Auditable::metadata().unwrap();
    assert!(metadata.is_abstract());
    assert_eq!(metadata.fields.len(), 4);
}
