use serde_json::json;

use marquee_domain::{
	FilterOutcome, FilterRequest, Item, TextField, VocabularyIndex, filter, fuzzy, popularity,
};

fn vocabulary() -> VocabularyIndex {
	let items = [
		Item {
			item_id: 1,
			title: Some("Toy Story".to_string()),
			genres: vec!["Animation".to_string(), "Comedy".to_string()],
			actors: vec!["Tom Hanks".to_string(), "Tim Allen".to_string()],
			director: vec!["John Lasseter".to_string()],
			country: Some("USA".to_string()),
			..Default::default()
		},
		Item {
			item_id: 2,
			title: Some("Heat".to_string()),
			genres: vec!["Action".to_string(), "Crime".to_string(), "Thriller".to_string()],
			actors: vec!["Al Pacino".to_string(), "Robert De Niro".to_string()],
			director: vec!["Michael Mann".to_string()],
			country: Some("USA".to_string()),
			..Default::default()
		},
	];

	VocabularyIndex::from_items(&items)
}

fn request(value: serde_json::Value) -> FilterRequest {
	serde_json::from_value(value).expect("Failed to parse filter request.")
}

#[test]
fn empty_request_is_a_no_op() {
	let compiled = filter::compile(&request(json!({})), &vocabulary(), fuzzy::DEFAULT_THRESHOLD);

	assert_eq!(compiled.outcome, FilterOutcome::NoOp);
	assert!(compiled.corrections.is_empty());
	assert!(compiled.failed.is_empty());
	assert!(compiled.predicate().is_none());
}

#[test]
fn verbatim_values_are_not_corrected() {
	let vocabulary = vocabulary();

	for field in TextField::ALL {
		for value in vocabulary.values(field) {
			let payload = json!({ field.as_str(): [value] });
			let compiled =
				filter::compile(&request(payload), &vocabulary, fuzzy::DEFAULT_THRESHOLD);

			assert!(compiled.corrections.is_empty(), "{value} was corrected");
			assert!(compiled.failed.is_empty(), "{value} failed correction");
			assert!(compiled.predicate().is_some());
		}
	}
}

#[test]
fn misspelled_genre_is_corrected() {
	let compiled = filter::compile(
		&request(json!({ "genres": ["Commedy"] })),
		&vocabulary(),
		fuzzy::DEFAULT_THRESHOLD,
	);
	let corrections = compiled.corrections.iter().map(ToString::to_string).collect::<Vec<_>>();
	let predicate = compiled.predicate().expect("Expected a compiled predicate.");

	assert_eq!(corrections, vec!["Commedy -> Comedy"]);
	assert_eq!(predicate.to_string(), "LOWER(genres) LIKE '%comedy%'");
}

#[test]
fn uncorrectable_only_field_is_unsatisfiable() {
	let compiled = filter::compile(
		&request(json!({ "genres": ["Xyzzy"] })),
		&vocabulary(),
		fuzzy::DEFAULT_THRESHOLD,
	);
	let failed = compiled.failed.iter().map(ToString::to_string).collect::<Vec<_>>();

	assert_eq!(compiled.outcome, FilterOutcome::Unsatisfiable);
	assert!(compiled.predicate().is_none());
	assert_eq!(failed, vec!["Xyzzy"]);
	assert_eq!(compiled.failed[0].reason, "no match above threshold");
}

#[test]
fn failed_values_contribute_no_condition() {
	let compiled = filter::compile(
		&request(json!({
			"genres": ["Xyzzy", "Crime"],
			"imdb_rating": { "comparison": "higher", "threshold": 7 },
		})),
		&vocabulary(),
		fuzzy::DEFAULT_THRESHOLD,
	);
	let predicate = compiled.predicate().expect("Expected a compiled predicate.");

	assert_eq!(compiled.failed.len(), 1);
	assert_eq!(predicate.conditions().len(), 2);
	assert!(!predicate.to_string().contains("xyzzy"));
}

#[test]
fn compilation_is_reproducible() {
	let vocabulary = vocabulary();
	let request = request(json!({ "actors": ["tom hank", "pacino"], "director": "Lasseter" }));
	let first = filter::compile(&request, &vocabulary, fuzzy::DEFAULT_THRESHOLD);
	let second = filter::compile(&request, &vocabulary, fuzzy::DEFAULT_THRESHOLD);

	assert_eq!(first, second);
}

#[test]
fn rank_respects_size_and_cutoff() {
	let candidates = [(1, 40), (2, 3), (3, 17), (4, 17), (5, 0), (6, 90), (7, 8), (8, 55)];
	let counts = candidates.iter().map(|(_, count)| *count).collect::<Vec<_>>();
	let cutoff = popularity::quantile(&counts, popularity::DEFAULT_QUANTILE)
		.expect("Expected a cutoff for non-empty counts.");

	for k in 0..10 {
		let ranked = popularity::rank(&candidates, k, popularity::DEFAULT_QUANTILE);

		assert!(ranked.len() <= k);

		for item_id in ranked {
			let count = candidates
				.iter()
				.find(|(candidate, _)| *candidate == item_id)
				.map(|(_, count)| *count)
				.expect("Ranked id must come from the candidates.");

			assert!(count as f64 > cutoff);
		}
	}
}

#[test]
fn rank_ignores_input_order() {
	let candidates = vec![(1, 40), (2, 3), (3, 17), (4, 17), (5, 0), (6, 90), (7, 8), (8, 55)];
	let mut reversed = candidates.clone();

	reversed.reverse();

	assert_eq!(
		popularity::rank(&candidates, 3, popularity::DEFAULT_QUANTILE),
		popularity::rank(&reversed, 3, popularity::DEFAULT_QUANTILE)
	);
	assert_eq!(popularity::rank(&candidates, 3, popularity::DEFAULT_QUANTILE), vec![6, 8]);
}
