/// Cosine similarity of two vectors in [-1, 1]. Zero-magnitude input has no
/// defined angle and scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	(dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
