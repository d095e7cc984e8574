use time::OffsetDateTime;

use marquee_domain::{Item, RatingCounts, User};

#[derive(Debug, sqlx::FromRow)]
pub struct ItemRow {
	pub item_id: i64,
	pub title: Option<String>,
	pub genres: Vec<String>,
	pub director: Vec<String>,
	pub producer: Vec<String>,
	pub actors: Vec<String>,
	pub release_date: Option<i32>,
	pub release_month: Option<i32>,
	pub country: Option<String>,
	pub duration: Option<i32>,
	pub age_rating: Option<String>,
	pub imdb_rating: Option<f64>,
	pub imdb_num_reviews: Option<i64>,
	pub description: Option<String>,
	pub storyline: Option<String>,
	pub ratings_total: i64,
	pub ratings_kid: i64,
	pub ratings_teenager: i64,
	pub ratings_young_adult: i64,
	pub ratings_adult: i64,
	pub ratings_senior: i64,
	pub ratings_male: i64,
	pub ratings_female: i64,
}
impl From<ItemRow> for Item {
	fn from(row: ItemRow) -> Self {
		let count = |value: i64| u64::try_from(value).unwrap_or(0);

		Self {
			item_id: row.item_id,
			title: row.title,
			genres: row.genres,
			director: row.director,
			producer: row.producer,
			actors: row.actors,
			release_date: row.release_date,
			release_month: row.release_month,
			country: row.country,
			duration: row.duration,
			age_rating: row.age_rating,
			imdb_rating: row.imdb_rating,
			imdb_num_reviews: row.imdb_num_reviews,
			description: row.description,
			storyline: row.storyline,
			ratings: RatingCounts {
				total: count(row.ratings_total),
				kid: count(row.ratings_kid),
				teenager: count(row.ratings_teenager),
				young_adult: count(row.ratings_young_adult),
				adult: count(row.ratings_adult),
				senior: count(row.ratings_senior),
				male: count(row.ratings_male),
				female: count(row.ratings_female),
			},
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
	pub user_id: i64,
	pub age_category: Option<String>,
	pub gender: Option<String>,
}
impl From<UserRow> for User {
	fn from(row: UserRow) -> Self {
		Self { user_id: row.user_id, age_category: row.age_category, gender: row.gender }
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct RatingRow {
	pub user_id: i64,
	pub item_id: i64,
	pub rating: f32,
	pub rated_at: OffsetDateTime,
}
