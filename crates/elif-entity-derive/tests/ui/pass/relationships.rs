use elif_entity::{Entity, Property};

#[derive(Debug, Default, Entity)]
pub struct Post {
    #[id]
    pub id: Property<i64>,

    #[many_to_many(
        target = Tag,
        inversed_by = "posts",
        join_table(name = "post_tag", join_column = "post_id", inverse_column = "tag_id")
    )]
    pub tags: Vec<Tag>,

    #[one_to_one(target = "app::Cover", inversed_by = "post", nullable = false)]
    pub cover: Option<String>,
}

#[derive(Debug, Default, Entity)]
pub struct Tag {
    #[id]
    #[uuid]
    pub id: Property<String>,

    #[many_to_many(target = Post, mapped_by = "tags")]
    pub posts: Vec<String>,
}

fn main() {
    let post = Post::metadata().unwrap();
    assert_eq!(post.relationships.len(), 2);
    assert!(Tag::metadata().is_ok());
}
