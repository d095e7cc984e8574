use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Item, UNKNOWN};

/// Free-text catalog fields that are corrected against a vocabulary before filtering.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
	Genres,
	Actors,
	Director,
	Producer,
	Country,
}
impl TextField {
	pub const ALL: [Self; 5] =
		[Self::Genres, Self::Actors, Self::Director, Self::Producer, Self::Country];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Genres => "genres",
			Self::Actors => "actors",
			Self::Director => "director",
			Self::Producer => "producer",
			Self::Country => "country",
		}
	}

	pub fn values<'a>(&self, item: &'a Item) -> Vec<&'a str> {
		match self {
			Self::Genres => item.genres.iter().map(String::as_str).collect(),
			Self::Actors => item.actors.iter().map(String::as_str).collect(),
			Self::Director => item.director.iter().map(String::as_str).collect(),
			Self::Producer => item.producer.iter().map(String::as_str).collect(),
			Self::Country => item.country.as_deref().into_iter().collect(),
		}
	}
}

/// Canonical values per text field. Built once, then shared read-only.
#[derive(Clone, Debug, Default)]
pub struct VocabularyIndex {
	fields: BTreeMap<TextField, Vec<String>>,
}
impl VocabularyIndex {
	pub fn builder() -> VocabularyBuilder {
		VocabularyBuilder::default()
	}

	pub fn from_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
		let mut builder = Self::builder();

		for item in items {
			for field in TextField::ALL {
				builder.extend(field, field.values(item));
			}
		}

		builder.build()
	}

	/// Sorted, deduplicated canonical values for `field`.
	pub fn values(&self, field: TextField) -> &[String] {
		self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn contains(&self, field: TextField, value: &str) -> bool {
		self.values(field).binary_search_by(|probe| probe.as_str().cmp(value)).is_ok()
	}

	pub fn len(&self, field: TextField) -> usize {
		self.values(field).len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.values().all(Vec::is_empty)
	}
}

#[derive(Debug, Default)]
pub struct VocabularyBuilder {
	fields: BTreeMap<TextField, BTreeSet<String>>,
}
impl VocabularyBuilder {
	pub fn insert(&mut self, field: TextField, value: &str) -> &mut Self {
		let value = value.trim();

		if !value.is_empty() && !value.eq_ignore_ascii_case(UNKNOWN) {
			self.fields.entry(field).or_default().insert(value.to_string());
		}

		self
	}

	pub fn extend<'a>(
		&mut self,
		field: TextField,
		values: impl IntoIterator<Item = &'a str>,
	) -> &mut Self {
		for value in values {
			self.insert(field, value);
		}

		self
	}

	pub fn build(self) -> VocabularyIndex {
		VocabularyIndex {
			fields: self
				.fields
				.into_iter()
				.map(|(field, values)| (field, values.into_iter().collect()))
				.collect(),
		}
	}
}
