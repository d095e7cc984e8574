//! Catalog reads against Postgres, including translation of compiled filter predicates into SQL.

use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use marquee_domain::{
	CompiledPredicate, Condition, Item, ItemId, TextField, User, UserGroup, UserId,
	VocabularyIndex,
};

use crate::{
	Result,
	models::{ItemRow, RatingRow, UserRow},
};

const ITEM_COLUMNS: &str = "\
item_id, title, genres, director, producer, actors, release_date, release_month, country, \
duration, age_rating, imdb_rating, imdb_num_reviews, description, storyline, ratings_total, \
ratings_kid, ratings_teenager, ratings_young_adult, ratings_adult, ratings_senior, ratings_male, \
ratings_female";

/// Ids of all items matching `predicate`, ascending.
pub async fn filter_item_ids(
	pool: &PgPool,
	predicate: &CompiledPredicate,
) -> Result<Vec<ItemId>> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT item_id FROM items WHERE ");

	push_predicate(&mut builder, predicate);
	builder.push(" ORDER BY item_id");

	Ok(builder.build_query_scalar::<i64>().fetch_all(pool).await?)
}

/// Items for `ids`, in the order of `ids`. Unknown ids are skipped.
pub async fn fetch_items(pool: &PgPool, ids: &[ItemId]) -> Result<Vec<Item>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ANY($1)");
	let rows: Vec<ItemRow> = sqlx::query_as(&sql).bind(ids).fetch_all(pool).await?;
	let mut by_id =
		rows.into_iter().map(|row| (row.item_id, Item::from(row))).collect::<HashMap<_, _>>();

	Ok(ids.iter().filter_map(|item_id| by_id.remove(item_id)).collect())
}

pub async fn fetch_user(pool: &PgPool, user_id: UserId) -> Result<Option<User>> {
	let row: Option<UserRow> =
		sqlx::query_as("SELECT user_id, age_category, gender FROM users WHERE user_id = $1")
			.bind(user_id)
			.fetch_optional(pool)
			.await?;

	Ok(row.map(User::from))
}

/// The user's `limit` most recent interactions, oldest first.
pub async fn interacted_items(pool: &PgPool, user_id: UserId, limit: u32) -> Result<Vec<ItemId>> {
	let ids = sqlx::query_scalar(
		"\
SELECT item_id
FROM (
	SELECT item_id, rated_at
	FROM ratings
	WHERE user_id = $1
	ORDER BY rated_at DESC, item_id DESC
	LIMIT $2
) recent
ORDER BY rated_at, item_id",
	)
	.bind(user_id)
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(ids)
}

/// Rating counts per item summed over `groups` (overall total when empty), optionally restricted
/// to `items`.
pub async fn popularity_counts(
	pool: &PgPool,
	groups: &[UserGroup],
	items: Option<&[ItemId]>,
) -> Result<Vec<(ItemId, u64)>> {
	let mut builder = popularity_query(groups, items);
	let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(pool).await?;

	Ok(rows
		.into_iter()
		.map(|(item_id, count)| (item_id, u64::try_from(count).unwrap_or(0)))
		.collect())
}

/// Number of distinct users who rated any of `items`, and the number of users overall.
pub async fn like_share(pool: &PgPool, items: &[ItemId]) -> Result<(i64, i64)> {
	let share = sqlx::query_as(
		"\
SELECT
	(SELECT count(DISTINCT user_id) FROM ratings WHERE item_id = ANY($1)),
	(SELECT count(*) FROM users)",
	)
	.bind(items)
	.fetch_one(pool)
	.await?;

	Ok(share)
}

pub async fn fetch_vocabulary(pool: &PgPool) -> Result<VocabularyIndex> {
	let mut builder = VocabularyIndex::builder();

	for field in TextField::ALL {
		let sql = match field {
			TextField::Country =>
				"SELECT DISTINCT country FROM items WHERE country IS NOT NULL".to_string(),
			_ => format!("SELECT DISTINCT unnest({}) FROM items", field.as_str()),
		};
		let values: Vec<String> = sqlx::query_scalar(&sql).fetch_all(pool).await?;

		builder.extend(field, values.iter().map(String::as_str));
	}

	let vocabulary = builder.build();

	tracing::info!(
		genres = vocabulary.len(TextField::Genres),
		actors = vocabulary.len(TextField::Actors),
		directors = vocabulary.len(TextField::Director),
		"Catalog vocabulary loaded."
	);

	Ok(vocabulary)
}

pub async fn upsert_item<'e, E>(executor: E, item: &Item) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let counts = &item.ratings;
	let count = |value: u64| i64::try_from(value).unwrap_or(i64::MAX);

	sqlx::query(
		"\
INSERT INTO items (
	item_id,
	title,
	genres,
	director,
	producer,
	actors,
	release_date,
	release_month,
	country,
	duration,
	age_rating,
	imdb_rating,
	imdb_num_reviews,
	description,
	storyline,
	ratings_total,
	ratings_kid,
	ratings_teenager,
	ratings_young_adult,
	ratings_adult,
	ratings_senior,
	ratings_male,
	ratings_female
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
ON CONFLICT (item_id) DO UPDATE
SET
	title = EXCLUDED.title,
	genres = EXCLUDED.genres,
	director = EXCLUDED.director,
	producer = EXCLUDED.producer,
	actors = EXCLUDED.actors,
	release_date = EXCLUDED.release_date,
	release_month = EXCLUDED.release_month,
	country = EXCLUDED.country,
	duration = EXCLUDED.duration,
	age_rating = EXCLUDED.age_rating,
	imdb_rating = EXCLUDED.imdb_rating,
	imdb_num_reviews = EXCLUDED.imdb_num_reviews,
	description = EXCLUDED.description,
	storyline = EXCLUDED.storyline,
	ratings_total = EXCLUDED.ratings_total,
	ratings_kid = EXCLUDED.ratings_kid,
	ratings_teenager = EXCLUDED.ratings_teenager,
	ratings_young_adult = EXCLUDED.ratings_young_adult,
	ratings_adult = EXCLUDED.ratings_adult,
	ratings_senior = EXCLUDED.ratings_senior,
	ratings_male = EXCLUDED.ratings_male,
	ratings_female = EXCLUDED.ratings_female",
	)
	.bind(item.item_id)
	.bind(item.title.as_deref())
	.bind(&item.genres)
	.bind(&item.director)
	.bind(&item.producer)
	.bind(&item.actors)
	.bind(item.release_date)
	.bind(item.release_month)
	.bind(item.country.as_deref())
	.bind(item.duration)
	.bind(item.age_rating.as_deref())
	.bind(item.imdb_rating)
	.bind(item.imdb_num_reviews)
	.bind(item.description.as_deref())
	.bind(item.storyline.as_deref())
	.bind(count(counts.total))
	.bind(count(counts.kid))
	.bind(count(counts.teenager))
	.bind(count(counts.young_adult))
	.bind(count(counts.adult))
	.bind(count(counts.senior))
	.bind(count(counts.male))
	.bind(count(counts.female))
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn upsert_user<'e, E>(executor: E, user: &User) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO users (user_id, age_category, gender)
VALUES ($1, $2, $3)
ON CONFLICT (user_id) DO UPDATE
SET age_category = EXCLUDED.age_category, gender = EXCLUDED.gender",
	)
	.bind(user.user_id)
	.bind(user.age_category.as_deref())
	.bind(user.gender.as_deref())
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_rating<'e, E>(executor: E, rating: &RatingRow) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO ratings (user_id, item_id, rating, rated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (user_id, item_id) DO UPDATE
SET rating = EXCLUDED.rating, rated_at = EXCLUDED.rated_at",
	)
	.bind(rating.user_id)
	.bind(rating.item_id)
	.bind(rating.rating)
	.bind(rating.rated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Appends `predicate` as a parameterized conjunction. Text conditions match case-insensitively
/// on the comma-joined column with LIKE wildcards in the value escaped.
pub fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &CompiledPredicate) {
	for (idx, condition) in predicate.conditions().iter().enumerate() {
		if idx > 0 {
			builder.push(" AND ");
		}

		match condition {
			Condition::Contains { field, value } => {
				match field {
					TextField::Country => builder.push("lower(coalesce(country, ''))"),
					_ => builder.push(format!("lower(array_to_string({}, ', '))", field.as_str())),
				};

				builder.push(" LIKE '%' || ");
				builder.push_bind(escape_like(&value.to_lowercase()));
				builder.push(" || '%' ESCAPE '\\'");
			},
			Condition::Compare { field, comparison, threshold } => {
				builder.push(format!("{} {} ", field.as_str(), comparison.operator()));
				builder.push_bind(*threshold);
			},
		}
	}
}

fn popularity_query<'a>(
	groups: &[UserGroup],
	items: Option<&'a [ItemId]>,
) -> QueryBuilder<'a, Postgres> {
	let count = if groups.is_empty() {
		"ratings_total".to_string()
	} else {
		groups
			.iter()
			.map(|group| format!("ratings_{}", group.as_str()))
			.collect::<Vec<_>>()
			.join(" + ")
	};
	let mut builder =
		QueryBuilder::<Postgres>::new(format!("SELECT item_id, ({count}) AS count FROM items"));

	if let Some(items) = items {
		builder.push(" WHERE item_id = ANY(");
		builder.push_bind(items);
		builder.push(")");
	}

	builder
}

fn escape_like(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for ch in value.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	escaped
}
