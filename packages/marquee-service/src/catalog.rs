//! Catalog reads used by the tools.

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;

use marquee_domain::{
	CompiledPredicate, Item, ItemId, User, UserGroup, UserId, VocabularyIndex, popularity,
};
use marquee_storage::catalog;

use crate::{BoxFuture, Result};

pub trait Catalog
where
	Self: Send + Sync,
{
	/// Ids of items matching `predicate`, ascending.
	fn filter_items<'a>(
		&'a self,
		predicate: &'a CompiledPredicate,
	) -> BoxFuture<'a, Result<Vec<ItemId>>>;

	/// Items for `ids` in the order given. Unknown ids are skipped.
	fn items<'a>(&'a self, ids: &'a [ItemId]) -> BoxFuture<'a, Result<Vec<Item>>>;

	fn user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>>>;

	/// The user's `limit` most recent interactions, oldest first.
	fn interacted_items(&self, user_id: UserId, limit: u32) -> BoxFuture<'_, Result<Vec<ItemId>>>;

	fn popularity_counts<'a>(
		&'a self,
		groups: &'a [UserGroup],
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, Result<Vec<(ItemId, u64)>>>;

	/// Distinct users who rated any of `items`, and all users.
	fn like_share<'a>(&'a self, items: &'a [ItemId]) -> BoxFuture<'a, Result<(i64, i64)>>;
}

pub struct PgCatalog {
	pool: PgPool,
}
impl PgCatalog {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn vocabulary(&self) -> Result<VocabularyIndex> {
		Ok(catalog::fetch_vocabulary(&self.pool).await?)
	}
}
impl Catalog for PgCatalog {
	fn filter_items<'a>(
		&'a self,
		predicate: &'a CompiledPredicate,
	) -> BoxFuture<'a, Result<Vec<ItemId>>> {
		Box::pin(async move { Ok(catalog::filter_item_ids(&self.pool, predicate).await?) })
	}

	fn items<'a>(&'a self, ids: &'a [ItemId]) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move { Ok(catalog::fetch_items(&self.pool, ids).await?) })
	}

	fn user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>>> {
		Box::pin(async move { Ok(catalog::fetch_user(&self.pool, user_id).await?) })
	}

	fn interacted_items(&self, user_id: UserId, limit: u32) -> BoxFuture<'_, Result<Vec<ItemId>>> {
		Box::pin(async move { Ok(catalog::interacted_items(&self.pool, user_id, limit).await?) })
	}

	fn popularity_counts<'a>(
		&'a self,
		groups: &'a [UserGroup],
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, Result<Vec<(ItemId, u64)>>> {
		Box::pin(async move { Ok(catalog::popularity_counts(&self.pool, groups, items).await?) })
	}

	fn like_share<'a>(&'a self, items: &'a [ItemId]) -> BoxFuture<'a, Result<(i64, i64)>> {
		Box::pin(async move { Ok(catalog::like_share(&self.pool, items).await?) })
	}
}

/// In-process catalog. Ratings are `(user, item)` pairs in the order they happened.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
	items: Vec<Item>,
	users: Vec<User>,
	ratings: Vec<(UserId, ItemId)>,
}
impl MemoryCatalog {
	pub fn new(items: Vec<Item>, users: Vec<User>, ratings: Vec<(UserId, ItemId)>) -> Self {
		let mut items = items;

		items.sort_by_key(|item| item.item_id);

		Self { items, users, ratings }
	}

	pub fn vocabulary(&self) -> VocabularyIndex {
		VocabularyIndex::from_items(&self.items)
	}
}
impl Catalog for MemoryCatalog {
	fn filter_items<'a>(
		&'a self,
		predicate: &'a CompiledPredicate,
	) -> BoxFuture<'a, Result<Vec<ItemId>>> {
		let ids = self
			.items
			.iter()
			.filter(|item| predicate.matches(item))
			.map(|item| item.item_id)
			.collect();

		Box::pin(async move { Ok(ids) })
	}

	fn items<'a>(&'a self, ids: &'a [ItemId]) -> BoxFuture<'a, Result<Vec<Item>>> {
		let by_id = self.items.iter().map(|item| (item.item_id, item)).collect::<HashMap<_, _>>();
		let items = ids.iter().filter_map(|item_id| by_id.get(item_id).map(|item| (*item).clone()));
		let items = items.collect();

		Box::pin(async move { Ok(items) })
	}

	fn user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>>> {
		let user = self.users.iter().find(|user| user.user_id == user_id).cloned();

		Box::pin(async move { Ok(user) })
	}

	fn interacted_items(&self, user_id: UserId, limit: u32) -> BoxFuture<'_, Result<Vec<ItemId>>> {
		let rated = self
			.ratings
			.iter()
			.filter(|(user, _)| *user == user_id)
			.map(|(_, item_id)| *item_id)
			.collect::<Vec<_>>();
		let skip = rated.len().saturating_sub(limit as usize);
		let recent = rated[skip..].to_vec();

		Box::pin(async move { Ok(recent) })
	}

	fn popularity_counts<'a>(
		&'a self,
		groups: &'a [UserGroup],
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, Result<Vec<(ItemId, u64)>>> {
		let selected = self
			.items
			.iter()
			.filter(|item| items.map(|ids| ids.contains(&item.item_id)).unwrap_or(true));
		let counts = popularity::aggregate(selected, groups);

		Box::pin(async move { Ok(counts) })
	}

	fn like_share<'a>(&'a self, items: &'a [ItemId]) -> BoxFuture<'a, Result<(i64, i64)>> {
		let raters = self
			.ratings
			.iter()
			.filter(|(_, item_id)| items.contains(item_id))
			.map(|(user_id, _)| *user_id)
			.collect::<BTreeSet<_>>();
		let share = (raters.len() as i64, self.users.len() as i64);

		Box::pin(async move { Ok(share) })
	}
}
