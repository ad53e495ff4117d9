use std::fs;

use time::macros::datetime;

use deja_domain::{Category, Comment, SupportLevel, Ticket, TicketState};
use deja_index::{Error, IndexEntry, LocalIndex, TicketIndex, VectorField};

const DIMENSIONS: u32 = 4;

fn ticket(number: u64) -> Ticket {
	Ticket {
		number,
		title: format!("Node pool scaling issue {number}"),
		body: "Autoscaler refuses to add nodes after upgrade.".to_string(),
		labels: vec!["operational".to_string()],
		state: TicketState::Closed,
		created_at: datetime!(2024-01-01 00:00:00 UTC),
		closed_at: Some(datetime!(2024-01-05 00:00:00 UTC)),
		comment_count: 2,
		comment_excerpts: vec![Comment {
			author: "oncall".to_string(),
			body: "Fixed by raising the quota.".to_string(),
			created_at: datetime!(2024-01-05 00:00:00 UTC),
		}],
		url: format!("https://tickets.example.com/{number}"),
		category: Category::Operational,
		support_level: SupportLevel::L2,
		complexity: 3,
		keywords: vec!["operational".to_string(), "l2".to_string()],
	}
}

fn entry(number: u64, intent: [f32; 4]) -> IndexEntry {
	IndexEntry {
		ticket: ticket(number),
		intent_summary: "User asks why node pools stop scaling.".to_string(),
		solution_summary: "Raised the regional CPU quota.".to_string(),
		intent_vector: Some(intent.to_vec()),
		content_vector: Some(intent.to_vec()),
	}
}

fn snapshot_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
	dir.path().join("index.json")
}

#[tokio::test]
async fn upsert_persists_and_reloads() {
	let dir = tempfile::tempdir().unwrap();
	let path = snapshot_path(&dir);
	let index = LocalIndex::open(&path, DIMENSIONS).unwrap();

	index.upsert(entry(1, [1., 0., 0., 0.])).await.unwrap();
	index.upsert(entry(2, [0., 1., 0., 0.])).await.unwrap();

	let reloaded = LocalIndex::open(&path, DIMENSIONS).unwrap();
	let stats = reloaded.stats().await.unwrap();

	assert_eq!(stats.total_tickets, 2);
	assert_eq!(stats.by_state.get("closed"), Some(&2));
	assert_eq!(stats.by_category.get("operational"), Some(&2));
}

#[tokio::test]
async fn upsert_same_number_replaces_in_place() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();

	index.upsert(entry(7, [1., 0., 0., 0.])).await.unwrap();

	let mut updated = entry(7, [0., 1., 0., 0.]);

	updated.solution_summary = "Rolled back the upgrade.".to_string();

	index.upsert(updated).await.unwrap();

	let stats = index.stats().await.unwrap();

	assert_eq!(stats.total_tickets, 1);

	let hits = index.search(&[0., 1., 0., 0.], 1, VectorField::Intent).await.unwrap();

	assert_eq!(hits[0].solution_summary, "Rolled back the upgrade.");
	assert!((hits[0].score - 1.).abs() < f32::EPSILON);
}

#[tokio::test]
async fn open_rejects_truncated_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let path = snapshot_path(&dir);

	fs::write(&path, "{\"snapshot_version\":1,\"dimensions\":4,\"entr").unwrap();

	assert!(matches!(LocalIndex::open(&path, DIMENSIONS), Err(Error::Corrupt { .. })));
}

#[tokio::test]
async fn open_rejects_version_mismatch() {
	let dir = tempfile::tempdir().unwrap();
	let path = snapshot_path(&dir);

	fs::write(&path, "{\"snapshot_version\":99,\"dimensions\":4,\"entries\":[]}").unwrap();

	assert!(matches!(LocalIndex::open(&path, DIMENSIONS), Err(Error::Corrupt { .. })));
}

#[tokio::test]
async fn open_rejects_dimension_mismatch() {
	let dir = tempfile::tempdir().unwrap();
	let path = snapshot_path(&dir);

	fs::write(&path, "{\"snapshot_version\":1,\"dimensions\":8,\"entries\":[]}").unwrap();

	assert!(matches!(LocalIndex::open(&path, DIMENSIONS), Err(Error::Corrupt { .. })));
}

#[tokio::test]
async fn upsert_rejects_wrong_length_vector() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();
	let mut bad = entry(1, [1., 0., 0., 0.]);

	bad.intent_vector = Some(vec![1., 0.]);

	assert!(matches!(index.upsert(bad).await, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn search_ranks_by_descending_similarity() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();
	let entries = (0..50)
		.map(|i| {
			// Spread vectors across the plane so similarities to the query
			// strictly decrease with the ticket number.
			let angle = i as f32 * 0.03;

			entry(i, [angle.cos(), angle.sin(), 0., 0.])
		})
		.collect();
	let report = index.upsert_batch(entries).await.unwrap();

	assert_eq!(report.upserted, 50);
	assert!(report.failed.is_empty());

	let hits = index.search(&[1., 0., 0., 0.], 5, VectorField::Intent).await.unwrap();

	assert_eq!(hits.len(), 5);
	assert_eq!(hits.iter().map(|hit| hit.ticket.number).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
	assert_eq!(hits.iter().map(|hit| hit.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

	for pair in hits.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}

#[tokio::test]
async fn search_breaks_ties_by_insertion_order() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();

	// Identical vectors, shuffled insertion order.
	for number in [30, 10, 20] {
		index.upsert(entry(number, [0., 0., 1., 0.])).await.unwrap();
	}

	let hits = index.search(&[0., 0., 1., 0.], 3, VectorField::Intent).await.unwrap();

	assert_eq!(hits.iter().map(|hit| hit.ticket.number).collect::<Vec<_>>(), vec![30, 10, 20]);
}

#[tokio::test]
async fn batch_reports_per_item_failures_without_aborting() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();
	let mut no_vectors = entry(2, [0., 1., 0., 0.]);

	no_vectors.intent_vector = None;
	no_vectors.content_vector = None;

	let report = index
		.upsert_batch(vec![entry(1, [1., 0., 0., 0.]), no_vectors, entry(3, [0., 0., 1., 0.])])
		.await
		.unwrap();

	assert_eq!(report.upserted, 2);
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].number, 2);

	let stats = index.stats().await.unwrap();

	assert_eq!(stats.total_tickets, 2);
}

#[tokio::test]
async fn search_skips_entries_missing_the_queried_field() {
	let dir = tempfile::tempdir().unwrap();
	let index = LocalIndex::open(&snapshot_path(&dir), DIMENSIONS).unwrap();
	let mut content_only = entry(1, [1., 0., 0., 0.]);

	content_only.intent_vector = None;

	index.upsert(content_only).await.unwrap();
	index.upsert(entry(2, [1., 0., 0., 0.])).await.unwrap();

	let hits = index.search(&[1., 0., 0., 0.], 5, VectorField::Intent).await.unwrap();

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].ticket.number, 2);
}
