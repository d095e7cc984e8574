use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type ItemId = i64;
pub type UserId = i64;

pub const UNKNOWN: &str = "unknown";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Item {
	pub item_id: ItemId,
	pub title: Option<String>,
	#[serde(default)]
	pub genres: Vec<String>,
	#[serde(default)]
	pub director: Vec<String>,
	#[serde(default)]
	pub producer: Vec<String>,
	#[serde(default)]
	pub actors: Vec<String>,
	/// Release year.
	pub release_date: Option<i32>,
	pub release_month: Option<i32>,
	pub country: Option<String>,
	/// Minutes.
	pub duration: Option<i32>,
	pub age_rating: Option<String>,
	pub imdb_rating: Option<f64>,
	pub imdb_num_reviews: Option<i64>,
	pub description: Option<String>,
	pub storyline: Option<String>,
	#[serde(default)]
	pub ratings: RatingCounts,
}
impl Item {
	pub fn field_value(&self, field: ItemField) -> Value {
		fn text(value: &Option<String>) -> Value {
			value.as_deref().map(Value::from).unwrap_or_else(|| Value::from(UNKNOWN))
		}
		fn list(values: &[String]) -> Value {
			if values.is_empty() { Value::from(UNKNOWN) } else { Value::from(values.join(", ")) }
		}
		fn number<T: Into<Value> + Copy>(value: Option<T>) -> Value {
			value.map(Into::into).unwrap_or_else(|| Value::from(UNKNOWN))
		}

		match field {
			ItemField::Title => text(&self.title),
			ItemField::Description => text(&self.description),
			ItemField::Genres => list(&self.genres),
			ItemField::Director => list(&self.director),
			ItemField::Producer => list(&self.producer),
			ItemField::Duration => number(self.duration),
			ItemField::ReleaseDate => number(self.release_date),
			ItemField::ReleaseMonth => number(self.release_month),
			ItemField::Country => text(&self.country),
			ItemField::Actors => list(&self.actors),
			ItemField::ImdbRating => number(self.imdb_rating),
			ItemField::Storyline => text(&self.storyline),
		}
	}
}

/// Number of ratings an item received, overall and per user group.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RatingCounts {
	pub total: u64,
	pub kid: u64,
	pub teenager: u64,
	pub young_adult: u64,
	pub adult: u64,
	pub senior: u64,
	pub male: u64,
	pub female: u64,
}
impl RatingCounts {
	pub fn get(&self, group: UserGroup) -> u64 {
		match group {
			UserGroup::Kid => self.kid,
			UserGroup::Teenager => self.teenager,
			UserGroup::YoungAdult => self.young_adult,
			UserGroup::Adult => self.adult,
			UserGroup::Senior => self.senior,
			UserGroup::Male => self.male,
			UserGroup::Female => self.female,
		}
	}

	/// Sum over `groups`, or the overall total when no group is given.
	pub fn sum(&self, groups: &[UserGroup]) -> u64 {
		if groups.is_empty() {
			return self.total;
		}

		groups.iter().map(|group| self.get(*group)).sum()
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct User {
	pub user_id: UserId,
	pub age_category: Option<String>,
	pub gender: Option<String>,
}
impl User {
	pub fn field_value(&self, field: UserField) -> Value {
		let value = match field {
			UserField::AgeCategory => self.age_category.as_deref(),
			UserField::Gender => self.gender.as_deref(),
		};

		Value::from(value.unwrap_or(UNKNOWN))
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserGroup {
	Kid,
	Teenager,
	YoungAdult,
	Adult,
	Senior,
	Male,
	Female,
}
impl UserGroup {
	pub const ALL: [Self; 7] = [
		Self::Kid,
		Self::Teenager,
		Self::YoungAdult,
		Self::Adult,
		Self::Senior,
		Self::Male,
		Self::Female,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Kid => "kid",
			Self::Teenager => "teenager",
			Self::YoungAdult => "young_adult",
			Self::Adult => "adult",
			Self::Senior => "senior",
			Self::Male => "male",
			Self::Female => "female",
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
	Title,
	Description,
	Genres,
	Director,
	Producer,
	Duration,
	ReleaseDate,
	ReleaseMonth,
	Country,
	Actors,
	ImdbRating,
	Storyline,
}
impl ItemField {
	pub const DEFAULT_METADATA: [Self; 3] = [Self::Title, Self::Genres, Self::Description];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::Description => "description",
			Self::Genres => "genres",
			Self::Director => "director",
			Self::Producer => "producer",
			Self::Duration => "duration",
			Self::ReleaseDate => "release_date",
			Self::ReleaseMonth => "release_month",
			Self::Country => "country",
			Self::Actors => "actors",
			Self::ImdbRating => "imdb_rating",
			Self::Storyline => "storyline",
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
	AgeCategory,
	Gender,
}
impl UserField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::AgeCategory => "age_category",
			Self::Gender => "gender",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_metadata_reads_as_unknown() {
		let item = Item { item_id: 1, title: Some("Toy Story".to_string()), ..Default::default() };

		assert_eq!(item.field_value(ItemField::Title), Value::from("Toy Story"));
		assert_eq!(item.field_value(ItemField::Genres), Value::from(UNKNOWN));
		assert_eq!(item.field_value(ItemField::ImdbRating), Value::from(UNKNOWN));
	}

	#[test]
	fn group_sum_defaults_to_total() {
		let counts = RatingCounts { total: 10, kid: 2, female: 3, ..Default::default() };

		assert_eq!(counts.sum(&[]), 10);
		assert_eq!(counts.sum(&[UserGroup::Kid, UserGroup::Female]), 5);
	}
}
