// Shared record types for integration tests.
#![allow(dead_code)]
use std::sync::Arc;

use mastermem::api::{Interner, Key, Record, Registry, Schema, Validator};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub name: Arc<str>,
    pub category: u8,
    pub price: i32,
}

impl Item {
    pub const BY_NAME: Key<Item, Arc<str>> = Key::unique("name", |item| Arc::clone(&item.name));
    pub const BY_CATEGORY: Key<Item, u8> = Key::non_unique("category", |item| item.category);
    pub const BY_PRICE: Key<Item, i32> = Key::non_unique("price", |item| item.price);
}

impl Record for Item {
    const TABLE: &'static str = "Item";
    type PrimaryKey = i32;

    fn primary_key() -> Key<Self, i32> {
        Key::unique("id", |item| item.id)
    }

    fn schema() -> Schema<Self> {
        Schema::new(Self::primary_key())
            .with(Self::BY_NAME)
            .with(Self::BY_CATEGORY)
            .with(Self::BY_PRICE)
    }

    fn validate(&self, v: &mut Validator<'_, Self>) {
        v.ensure(self.price > 0, "price must be positive");
        v.unique_by("name_ignore_case", |item| item.name.to_lowercase());
    }

    fn intern(&mut self, strings: &mut Interner) {
        strings.intern(&mut self.name);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: i32,
    pub title: String,
    pub reward_item: i32,
    pub min_level: u8,
}

impl Record for Quest {
    const TABLE: &'static str = "Quest";
    type PrimaryKey = i32;

    fn primary_key() -> Key<Self, i32> {
        Key::unique("id", |quest| quest.id)
    }

    fn validate(&self, v: &mut Validator<'_, Self>) {
        v.reference(&Item::primary_key(), &self.reward_item);
        v.once(|v| {
            let rows = v.table().len();
            v.ensure(rows <= 1000, format!("too many quests: {rows}"));
        });
    }
}

pub fn item(id: i32, name: &str, category: u8, price: i32) -> Item {
    Item {
        id,
        name: Arc::from(name),
        category,
        price,
    }
}

pub fn quest(id: i32, title: &str, reward_item: i32) -> Quest {
    Quest {
        id,
        title: title.to_string(),
        reward_item,
        min_level: 1,
    }
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register::<Item>()
        .and_then(|registry| registry.register::<Quest>())
        .expect("register");
    registry
}

pub fn item_ids<'a>(rows: impl IntoIterator<Item = &'a Item>) -> Vec<i32> {
    rows.into_iter().map(|item| item.id).collect()
}
