use elif_entity::{Entity, Property};

#[derive(Debug, Default, Entity)]
#[entity(table = "users")]
pub struct User {
    #[id]
    #[field(type = "integer", auto_increment)]
    pub id: Property<i64>,

    #[field(type = "string", length = 120, nullable, comment = "Shown in lists")]
    pub name: Property<Option<String>>,

    pub email: Property<String>,

    #[transient]
    pub session: Option<String>,
}

fn main() {
    assert_eq!(User::type_name(), "User");
    assert_eq!(User::properties().len(), 3);
    let metadata = User::metadata().unwrap();
    assert_eq!(metadata.table_name(), "users");
}
