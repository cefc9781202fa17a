use crate::random::UniformSource;

/// Draw `share` points uniformly from the square `[-1, 1] x [-1, 1]` and
/// count the ones inside the unit circle.
pub fn count_hits<S: UniformSource + ?Sized>(share: u64, source: &mut S) -> u64 {
    let mut inside = 0;

    for _ in 0..share {
        let x = 2.0 * source.next_unit() - 1.0;
        let y = 2.0 * source.next_unit() - 1.0;
        if x * x + y * y <= 1.0 {
            inside += 1;
        }
    }

    inside
}
