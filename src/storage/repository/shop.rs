// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coin shop and purchase ledger.
//!
//! [`ShopRepository::buy`] is the only path that debits a user's balance.
//! It reads the item, then the buyer, and writes the debit, the stock
//! decrement and the purchase row in one redb write transaction. Any failure
//! aborts the transaction, leaving balance, stock and the purchase log exactly
//! as they were.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::User;
use crate::storage::database::{
    next_id, read_json, scan_json, write_json, Database, StoreError, StoreResult, PURCHASES,
    SHOP_ITEMS, USERS,
};

/// Remaining stock of a shop item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stock {
    /// Finite stock; `Limited(0)` is sold out
    Limited(u32),
    Unlimited,
}

impl Stock {
    pub fn is_sold_out(&self) -> bool {
        matches!(self, Stock::Limited(0))
    }

    /// Stock after one sale. Callers check [`Stock::is_sold_out`] first.
    fn after_sale(self) -> Stock {
        match self {
            Stock::Limited(n) => Stock::Limited(n.saturating_sub(1)),
            Stock::Unlimited => Stock::Unlimited,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Price in coins
    pub price: u64,
    pub stock: Stock,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when listing a new item.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewShopItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: u64,
    pub stock: Stock,
}

/// Append-only purchase record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Purchase {
    pub id: u64,
    pub user_id: u64,
    pub item_id: u64,
    /// Item name at the time of purchase
    pub item_name: String,
    /// Price paid at the time of purchase
    pub price: u64,
    pub created_at: DateTime<Utc>,
}

/// Why a purchase was refused.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("item {0} not found")]
    ItemNotFound(u64),

    #[error("item is out of stock")]
    OutOfStock,

    #[error("user {0} not found")]
    UserNotFound(u64),

    #[error("insufficient coins: balance {balance}, price {price}")]
    InsufficientFunds { balance: u64, price: u64 },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<redb::TableError> for LedgerError {
    fn from(e: redb::TableError) -> Self {
        LedgerError::Storage(e.into())
    }
}

impl From<redb::StorageError> for LedgerError {
    fn from(e: redb::StorageError) -> Self {
        LedgerError::Storage(e.into())
    }
}

impl From<redb::CommitError> for LedgerError {
    fn from(e: redb::CommitError) -> Self {
        LedgerError::Storage(e.into())
    }
}

/// Repository for shop items and the purchase ledger.
pub struct ShopRepository<'a> {
    db: &'a Database,
}

impl<'a> ShopRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn list_items(&self) -> StoreResult<Vec<ShopItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHOP_ITEMS)?;
        scan_json(&table)
    }

    pub fn get_item(&self, item_id: u64) -> StoreResult<ShopItem> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHOP_ITEMS)?;
        read_json(&table, item_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Shop item {item_id}")))
    }

    pub fn create_item(&self, new: NewShopItem) -> StoreResult<ShopItem> {
        let write_txn = self.db.begin_write()?;
        let item = {
            let id = next_id(&write_txn, "shop_items")?;
            let item = ShopItem {
                id,
                name: new.name,
                description: new.description,
                image_url: new.image_url,
                price: new.price,
                stock: new.stock,
                created_at: Utc::now(),
            };
            let mut table = write_txn.open_table(SHOP_ITEMS)?;
            write_json(&mut table, id, &item)?;
            item
        };
        write_txn.commit()?;
        Ok(item)
    }

    /// Remove an item from sale. Past purchases keep their snapshot of it.
    pub fn delete_item(&self, item_id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SHOP_ITEMS)?;
            let removed = table.remove(item_id)?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StoreError::NotFound(format!("Shop item {item_id}")));
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Buy one unit of `item_id` for `user_id`.
    pub fn buy(&self, user_id: u64, item_id: u64) -> Result<Purchase, LedgerError> {
        let write_txn = self.db.begin_write().map_err(LedgerError::Storage)?;
        let outcome = Self::buy_in(&write_txn, user_id, item_id);
        match outcome {
            Ok(purchase) => {
                write_txn.commit()?;
                tracing::info!(
                    user_id,
                    item_id,
                    price = purchase.price,
                    purchase_id = purchase.id,
                    "Purchase recorded"
                );
                Ok(purchase)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    fn buy_in(
        write_txn: &redb::WriteTransaction,
        user_id: u64,
        item_id: u64,
    ) -> Result<Purchase, LedgerError> {
        // Item before user, always.
        let mut items = write_txn.open_table(SHOP_ITEMS)?;
        let mut item: ShopItem =
            read_json(&items, item_id)?.ok_or(LedgerError::ItemNotFound(item_id))?;
        if item.stock.is_sold_out() {
            return Err(LedgerError::OutOfStock);
        }

        let mut users = write_txn.open_table(USERS)?;
        let mut user: User = read_json(&users, user_id)?.ok_or(LedgerError::UserNotFound(user_id))?;
        if user.coins < item.price {
            return Err(LedgerError::InsufficientFunds {
                balance: user.coins,
                price: item.price,
            });
        }

        let now = Utc::now();
        user.coins -= item.price;
        user.updated_at = now;
        item.stock = item.stock.after_sale();
        write_json(&mut users, user_id, &user)?;
        write_json(&mut items, item_id, &item)?;

        let purchase = Purchase {
            id: next_id(write_txn, "purchases")?,
            user_id,
            item_id,
            item_name: item.name,
            price: item.price,
            created_at: now,
        };
        let mut purchases = write_txn.open_table(PURCHASES)?;
        write_json(&mut purchases, purchase.id, &purchase)?;
        Ok(purchase)
    }

    /// A user's purchase history, newest first.
    pub fn purchases_by_user(&self, user_id: u64) -> StoreResult<Vec<Purchase>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PURCHASES)?;
        let mut purchases = Vec::new();
        for entry in table.iter()?.rev() {
            let (_, value) = entry?;
            let purchase: Purchase = serde_json::from_slice(value.value())?;
            if purchase.user_id == user_id {
                purchases.push(purchase);
            }
        }
        Ok(purchases)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;
    use crate::auth::Role;
    use crate::storage::database::tests::temp_db;
    use crate::storage::repository::users::{tests::seed_user, UserRepository};

    fn item(price: u64, stock: Stock) -> NewShopItem {
        NewShopItem {
            name: "Hoodie".into(),
            description: "School hoodie".into(),
            image_url: None,
            price,
            stock,
        }
    }

    #[test]
    fn buy_debits_decrements_and_records() {
        let (db, _dir) = temp_db();
        let buyer = seed_user(&db, 1, Role::Student, 100);
        let shop = ShopRepository::new(&db);
        let hoodie = shop.create_item(item(40, Stock::Limited(3))).unwrap();

        let purchase = shop.buy(buyer.id, hoodie.id).unwrap();

        assert_eq!(purchase.price, 40);
        assert_eq!(purchase.item_name, "Hoodie");
        assert_eq!(UserRepository::new(&db).get(buyer.id).unwrap().coins, 60);
        assert_eq!(shop.get_item(hoodie.id).unwrap().stock, Stock::Limited(2));
        assert_eq!(shop.purchases_by_user(buyer.id).unwrap(), vec![purchase]);
    }

    #[test]
    fn insufficient_funds_leaves_everything_unchanged() {
        let (db, _dir) = temp_db();
        let buyer = seed_user(&db, 1, Role::Student, 5);
        let shop = ShopRepository::new(&db);
        let hoodie = shop.create_item(item(10, Stock::Limited(1))).unwrap();

        let err = shop.buy(buyer.id, hoodie.id).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { balance: 5, price: 10 }));
        assert_eq!(UserRepository::new(&db).get(buyer.id).unwrap().coins, 5);
        assert_eq!(shop.get_item(hoodie.id).unwrap().stock, Stock::Limited(1));
        assert!(shop.purchases_by_user(buyer.id).unwrap().is_empty());
    }

    #[test]
    fn concurrent_buyers_of_last_unit_get_exactly_one_success() {
        let (db, _dir) = temp_db();
        let alice = seed_user(&db, 1, Role::Student, 100);
        let bob = seed_user(&db, 2, Role::Student, 100);
        let last = ShopRepository::new(&db)
            .create_item(item(10, Stock::Limited(1)))
            .unwrap();

        let db = Arc::new(db);
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [alice.id, bob.id]
            .into_iter()
            .map(|user_id| {
                let db = db.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    ShopRepository::new(&db).buy(user_id, last.id)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let sold_out = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::OutOfStock)))
            .count();
        assert_eq!((successes, sold_out), (1, 1));

        let shop = ShopRepository::new(&db);
        assert_eq!(shop.get_item(last.id).unwrap().stock, Stock::Limited(0));
        let total_purchases = shop.purchases_by_user(alice.id).unwrap().len()
            + shop.purchases_by_user(bob.id).unwrap().len();
        assert_eq!(total_purchases, 1);
    }

    #[test]
    fn unlimited_stock_never_sells_out() {
        let (db, _dir) = temp_db();
        let buyer = seed_user(&db, 1, Role::Student, 30);
        let shop = ShopRepository::new(&db);
        let sticker = shop.create_item(item(10, Stock::Unlimited)).unwrap();

        for _ in 0..3 {
            shop.buy(buyer.id, sticker.id).unwrap();
        }
        assert_eq!(shop.get_item(sticker.id).unwrap().stock, Stock::Unlimited);
        assert!(matches!(
            shop.buy(buyer.id, sticker.id),
            Err(LedgerError::InsufficientFunds { balance: 0, .. })
        ));
    }

    #[test]
    fn unknown_item_and_user_are_reported() {
        let (db, _dir) = temp_db();
        let shop = ShopRepository::new(&db);
        assert!(matches!(shop.buy(1, 77), Err(LedgerError::ItemNotFound(77))));

        let hoodie = shop.create_item(item(1, Stock::Limited(1))).unwrap();
        assert!(matches!(shop.buy(404, hoodie.id), Err(LedgerError::UserNotFound(404))));
        assert_eq!(shop.get_item(hoodie.id).unwrap().stock, Stock::Limited(1));
    }

    #[test]
    fn delete_item_removes_listing() {
        let (db, _dir) = temp_db();
        let shop = ShopRepository::new(&db);
        let hoodie = shop.create_item(item(1, Stock::Unlimited)).unwrap();
        shop.delete_item(hoodie.id).unwrap();
        assert!(shop.list_items().unwrap().is_empty());
        assert!(matches!(shop.delete_item(hoodie.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn stock_serializes_as_tagged_enum() {
        assert_eq!(serde_json::to_string(&Stock::Unlimited).unwrap(), "\"unlimited\"");
        assert_eq!(serde_json::to_string(&Stock::Limited(4)).unwrap(), "{\"limited\":4}");
    }
}
