//! # elif-entity-derive
//!
//! Derive macro for elif-entity declarative entity mapping.
//!
//! `#[derive(Entity)]` reads the struct- and field-level attributes and
//! implements `elif_entity::Entity` (declarations and metadata) and
//! `elif_entity::EntityObject` (assignment and reads by property name).
//!
//! Supported attributes:
//! - `#[entity]`, `#[entity(table = "...", abstract_entity)]` on the struct
//! - `#[field(type = "...", length, precision, scale, nullable, default,
//!   unique, unsigned, auto_increment, comment)]`
//! - `#[id]`, `#[uuid]`
//! - `#[one_to_one(..)]`, `#[one_to_many(..)]`, `#[many_to_one(..)]`,
//!   `#[many_to_many(..)]` with `target`, `mapped_by`, `inversed_by`,
//!   `nullable` and `join_table(name, join_column, inverse_column)`
//! - `#[transient]` for fields that are not mapped at all

use proc_macro::TokenStream;

mod attrs;
mod expand;

/// Implement `Entity` and `EntityObject` for a struct with named fields
#[proc_macro_derive(
    Entity,
    attributes(
        entity,
        field,
        id,
        uuid,
        one_to_one,
        one_to_many,
        many_to_one,
        many_to_many,
        transient
    )
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    expand::entity_impl(input)
}
