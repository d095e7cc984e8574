//! Structured filter requests and their compilation into catalog predicates.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
	catalog::Item,
	fuzzy::{self, Correction},
	vocabulary::{TextField, VocabularyIndex},
};

/// Country placeholder meaning "no country requested".
const COUNTRY_UNSET: &str = "unk";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
	#[serde(default, deserialize_with = "one_or_many")]
	pub actors: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub genres: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub director: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub producer: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub country: Vec<String>,
	#[serde(default)]
	pub imdb_rating: Option<NumericFilter>,
	#[serde(default)]
	pub duration: Option<NumericFilter>,
	#[serde(default)]
	pub release_date: Option<NumericFilter>,
	#[serde(default)]
	pub release_month: Option<NumericFilter>,
}
impl FilterRequest {
	/// Requested values per text field, blanks and placeholders removed.
	pub fn text_values(&self) -> Vec<(TextField, Vec<&str>)> {
		[
			(TextField::Actors, &self.actors),
			(TextField::Genres, &self.genres),
			(TextField::Director, &self.director),
			(TextField::Producer, &self.producer),
			(TextField::Country, &self.country),
		]
		.into_iter()
		.map(|(field, values)| {
			let values = values
				.iter()
				.map(|value| value.trim())
				.filter(|value| !value.is_empty())
				.filter(|value| {
					field != TextField::Country || !value.eq_ignore_ascii_case(COUNTRY_UNSET)
				})
				.collect::<Vec<_>>();

			(field, values)
		})
		.filter(|(_, values)| !values.is_empty())
		.collect()
	}

	/// Numeric filters that were actually requested. A zero threshold means "not set".
	pub fn numeric_values(&self) -> Vec<(NumericField, NumericFilter)> {
		[
			(NumericField::ImdbRating, self.imdb_rating),
			(NumericField::Duration, self.duration),
			(NumericField::ReleaseDate, self.release_date),
			(NumericField::ReleaseMonth, self.release_month),
		]
		.into_iter()
		.filter_map(|(field, filter)| filter.map(|filter| (field, filter)))
		.filter(|(_, filter)| filter.threshold.is_finite() && filter.threshold != 0.0)
		.collect()
	}

	pub fn is_empty(&self) -> bool {
		self.text_values().is_empty() && self.numeric_values().is_empty()
	}
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(from = "NumericFilterRepr")]
pub struct NumericFilter {
	pub comparison: Comparison,
	pub threshold: f64,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
	#[default]
	Higher,
	Lower,
	Exact,
}
impl Comparison {
	pub fn holds(&self, value: f64, threshold: f64) -> bool {
		match self {
			Self::Higher => value > threshold,
			Self::Lower => value < threshold,
			Self::Exact => value == threshold,
		}
	}

	pub fn operator(&self) -> &'static str {
		match self {
			Self::Higher => ">",
			Self::Lower => "<",
			Self::Exact => "=",
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
	ImdbRating,
	Duration,
	ReleaseDate,
	ReleaseMonth,
}
impl NumericField {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::ImdbRating => "imdb_rating",
			Self::Duration => "duration",
			Self::ReleaseDate => "release_date",
			Self::ReleaseMonth => "release_month",
		}
	}

	pub fn value(&self, item: &Item) -> Option<f64> {
		match self {
			Self::ImdbRating => item.imdb_rating,
			Self::Duration => item.duration.map(f64::from),
			Self::ReleaseDate => item.release_date.map(f64::from),
			Self::ReleaseMonth => item.release_month.map(f64::from),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
	/// Case-insensitive substring match on the field's joined values.
	Contains { field: TextField, value: String },
	Compare { field: NumericField, comparison: Comparison, threshold: f64 },
}
impl Condition {
	pub fn matches(&self, item: &Item) -> bool {
		match self {
			Self::Contains { field, value } => {
				let haystack = field.values(item).join(", ").to_lowercase();

				haystack.contains(&value.to_lowercase())
			},
			Self::Compare { field, comparison, threshold } => field
				.value(item)
				.map(|value| comparison.holds(value, *threshold))
				.unwrap_or(false),
		}
	}
}
impl Display for Condition {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Contains { field, value } => {
				write!(f, "LOWER({}) LIKE '%{}%'", field.as_str(), value.to_lowercase())
			},
			Self::Compare { field, comparison, threshold } => {
				write!(f, "{} {} {}", field.as_str(), comparison.operator(), threshold)
			},
		}
	}
}

/// Conjunction of conditions. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPredicate {
	conditions: Vec<Condition>,
}
impl CompiledPredicate {
	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn matches(&self, item: &Item) -> bool {
		self.conditions.iter().all(|condition| condition.matches(item))
	}
}
impl Display for CompiledPredicate {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (idx, condition) in self.conditions.iter().enumerate() {
			if idx > 0 {
				f.write_str(" AND ")?;
			}

			write!(f, "{condition}")?;
		}

		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterOutcome {
	/// Nothing was requested.
	NoOp,
	/// Fields were requested but none of their values survived correction.
	Unsatisfiable,
	Compiled(CompiledPredicate),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrectionRecord {
	pub field: TextField,
	pub original: String,
	pub corrected: String,
}
impl Display for CorrectionRecord {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{} -> {}", self.original, self.corrected)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedCorrection {
	pub field: TextField,
	pub original: String,
	pub reason: &'static str,
}
impl Display for FailedCorrection {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.original)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Compilation {
	pub outcome: FilterOutcome,
	pub corrections: Vec<CorrectionRecord>,
	pub failed: Vec<FailedCorrection>,
}
impl Compilation {
	pub fn predicate(&self) -> Option<&CompiledPredicate> {
		match &self.outcome {
			FilterOutcome::Compiled(predicate) => Some(predicate),
			FilterOutcome::NoOp | FilterOutcome::Unsatisfiable => None,
		}
	}
}

/// Compiles `request` against a vocabulary snapshot. Pure: the same request and snapshot always
/// yield the same compilation.
pub fn compile(
	request: &FilterRequest,
	vocabulary: &VocabularyIndex,
	threshold: f64,
) -> Compilation {
	let text_values = request.text_values();
	let numeric_values = request.numeric_values();
	let mut conditions = Vec::new();
	let mut corrections = Vec::new();
	let mut failed = Vec::new();

	if text_values.is_empty() && numeric_values.is_empty() {
		return Compilation { outcome: FilterOutcome::NoOp, corrections, failed };
	}

	for (field, values) in text_values {
		let candidates = vocabulary.values(field);

		for original in values {
			match fuzzy::best_match(original, candidates, threshold) {
				Correction::Matched { value, .. } => {
					if value != original {
						corrections.push(CorrectionRecord {
							field,
							original: original.to_string(),
							corrected: value.to_string(),
						});
					}

					let condition = Condition::Contains { field, value: value.to_string() };

					if !conditions.contains(&condition) {
						conditions.push(condition);
					}
				},
				Correction::Uncorrectable { .. } => failed.push(FailedCorrection {
					field,
					original: original.to_string(),
					reason: "no match above threshold",
				}),
			}
		}
	}

	for (field, filter) in numeric_values {
		conditions.push(Condition::Compare {
			field,
			comparison: filter.comparison,
			threshold: filter.threshold,
		});
	}

	let outcome = if conditions.is_empty() {
		FilterOutcome::Unsatisfiable
	} else {
		FilterOutcome::Compiled(CompiledPredicate { conditions })
	};

	Compilation { outcome, corrections, failed }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
	One(String),
	Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
		None => Vec::new(),
		Some(OneOrMany::One(value)) => vec![value],
		Some(OneOrMany::Many(values)) => values,
	})
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericFilterRepr {
	Bare(f64),
	Full {
		#[serde(default, alias = "request")]
		comparison: Comparison,
		threshold: f64,
	},
}
impl From<NumericFilterRepr> for NumericFilter {
	fn from(repr: NumericFilterRepr) -> Self {
		match repr {
			NumericFilterRepr::Bare(threshold) => Self { comparison: Comparison::Exact, threshold },
			NumericFilterRepr::Full { comparison, threshold } => Self { comparison, threshold },
		}
	}
}
