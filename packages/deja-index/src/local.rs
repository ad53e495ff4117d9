use std::{
	collections::HashMap,
	fs,
	path::{Path, PathBuf},
	sync::RwLock,
};

use serde::{Deserialize, Serialize};

use crate::{
	BatchReport, BoxFuture, Error, IndexEntry, IndexStats, ItemFailure, Result, SimilarityResult,
	TicketIndex, VectorField,
};
use deja_domain::cosine_similarity;

/// Bumped whenever the snapshot schema changes. A mismatch on load is
/// corruption, never a silent migration.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Deserialize, Serialize)]
struct Snapshot {
	snapshot_version: u32,
	dimensions: u32,
	entries: Vec<IndexEntry>,
}

#[derive(Default)]
struct State {
	/// Entries in insertion order; an upsert replaces in place so ties in
	/// search keep first-indexed-first ordering.
	entries: Vec<IndexEntry>,
	slots: HashMap<u64, usize>,
}

/// In-process index mirrored to a flat JSON snapshot after every mutating
/// batch. Brute-force exact retrieval; linear in corpus size per query, which
/// is the intended trade at this variant's scale.
pub struct LocalIndex {
	path: PathBuf,
	dimensions: u32,
	state: RwLock<State>,
}
impl LocalIndex {
	/// Loads the snapshot at `path`. A missing file is an empty index; an
	/// unreadable, unparsable, or version-mismatched file is fatal.
	pub fn open(path: &Path, dimensions: u32) -> Result<Self> {
		let state = match fs::read_to_string(path) {
			Ok(raw) => {
				let snapshot: Snapshot =
					serde_json::from_str(&raw).map_err(|err| Error::Corrupt {
						path: path.to_path_buf(),
						message: err.to_string(),
					})?;

				if snapshot.snapshot_version != SNAPSHOT_VERSION {
					return Err(Error::Corrupt {
						path: path.to_path_buf(),
						message: format!(
							"Snapshot version {} is not the supported {SNAPSHOT_VERSION}.",
							snapshot.snapshot_version
						),
					});
				}
				if snapshot.dimensions != dimensions {
					return Err(Error::Corrupt {
						path: path.to_path_buf(),
						message: format!(
							"Snapshot dimensions {} do not match the configured {dimensions}.",
							snapshot.dimensions
						),
					});
				}

				let mut state = State::default();

				for entry in snapshot.entries {
					state.slots.insert(entry.ticket.number, state.entries.len());
					state.entries.push(entry);
				}

				tracing::info!(
					path = %path.display(),
					tickets = state.entries.len(),
					"Loaded ticket index snapshot."
				);

				state
			},
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => State::default(),
			Err(err) => {
				return Err(Error::Corrupt {
					path: path.to_path_buf(),
					message: err.to_string(),
				});
			},
		};

		Ok(Self { path: path.to_path_buf(), dimensions, state: RwLock::new(state) })
	}

	fn apply(state: &mut State, entry: IndexEntry) {
		match state.slots.get(&entry.ticket.number) {
			Some(&slot) => state.entries[slot] = entry,
			None => {
				state.slots.insert(entry.ticket.number, state.entries.len());
				state.entries.push(entry);
			},
		}
	}

	/// Writes the full snapshot to a sibling temp file and atomically renames
	/// it over the previous one, so a crash mid-write never leaves a partial
	/// file as the active snapshot.
	fn persist(&self, state: &State) -> Result<()> {
		let snapshot = Snapshot {
			snapshot_version: SNAPSHOT_VERSION,
			dimensions: self.dimensions,
			entries: state.entries.clone(),
		};
		let encoded = serde_json::to_vec(&snapshot)?;
		let mut tmp = self.path.as_os_str().to_owned();

		tmp.push(".tmp");

		let tmp = PathBuf::from(tmp);

		fs::write(&tmp, encoded)?;
		fs::rename(&tmp, &self.path)?;

		Ok(())
	}
}
impl TicketIndex for LocalIndex {
	fn ensure_ready<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		// The snapshot was validated in `open`; nothing to initialize.
		Box::pin(async { Ok(()) })
	}

	fn upsert<'a>(&'a self, entry: IndexEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			crate::validate_entry(&entry, self.dimensions)?;

			let mut state = self.state.write().unwrap_or_else(|err| err.into_inner());

			Self::apply(&mut state, entry);
			self.persist(&state)
		})
	}

	fn upsert_batch<'a>(&'a self, entries: Vec<IndexEntry>) -> BoxFuture<'a, Result<BatchReport>> {
		Box::pin(async move {
			let mut report = BatchReport::default();
			let mut state = self.state.write().unwrap_or_else(|err| err.into_inner());

			for entry in entries {
				match crate::validate_entry(&entry, self.dimensions) {
					Ok(()) => {
						Self::apply(&mut state, entry);

						report.upserted += 1;
					},
					Err(err) => {
						tracing::warn!(
							number = entry.ticket.number,
							error = %err,
							"Skipping invalid index entry."
						);
						report
							.failed
							.push(ItemFailure { number: entry.ticket.number, message: err.to_string() });
					},
				}
			}

			// One snapshot flush per mutating batch.
			self.persist(&state)?;

			Ok(report)
		})
	}

	fn search<'a>(
		&'a self,
		query: &'a [f32],
		top_k: usize,
		field: VectorField,
	) -> BoxFuture<'a, Result<Vec<SimilarityResult>>> {
		Box::pin(async move {
			crate::validate_vector_dim(query, self.dimensions)?;

			let state = self.state.read().unwrap_or_else(|err| err.into_inner());
			let mut scored: Vec<(usize, f32)> = state
				.entries
				.iter()
				.enumerate()
				.filter_map(|(slot, entry)| {
					entry.vector(field).map(|vector| (slot, cosine_similarity(query, vector)))
				})
				.collect();

			// Stable sort: equal scores keep insertion order.
			scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
			scored.truncate(top_k);

			Ok(scored
				.into_iter()
				.enumerate()
				.map(|(position, (slot, score))| {
					let entry = &state.entries[slot];

					SimilarityResult {
						ticket: entry.ticket.clone(),
						intent_summary: entry.intent_summary.clone(),
						solution_summary: entry.solution_summary.clone(),
						score,
						rank: position + 1,
					}
				})
				.collect())
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, Result<IndexStats>> {
		Box::pin(async move {
			let state = self.state.read().unwrap_or_else(|err| err.into_inner());
			let mut stats = IndexStats { total_tickets: state.entries.len() as u64, ..Default::default() };

			for entry in &state.entries {
				let ticket = &entry.ticket;

				*stats.by_state.entry(ticket.state.as_str().to_string()).or_default() += 1;
				*stats.by_category.entry(ticket.category.as_str().to_string()).or_default() += 1;
				*stats
					.by_support_level
					.entry(ticket.support_level.as_str().to_string())
					.or_default() += 1;
			}

			Ok(stats)
		})
	}
}
