//! Gene vector operations for the weight tuner.
//!
//! A genome is a flat `Vec<f32>` with every gene in `[0, 1]`; the engine's
//! weight struct is built from it in a fixed gene order. The operators here
//! are deliberately plain: uniform crossover and a small bounded mutation
//! step, applied per gene.

use rand::Rng;

/// Largest change a single mutation can apply to a gene.
pub const MUTATION_DELTA: f32 = 0.05;

/// Generates a random genome with every gene uniform in `[0, 1)`.
pub fn random<R>(rng: &mut R, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    (0..len).map(|_| rng.random_range(0.0..1.0)).collect()
}

/// Uniform crossover: each gene is copied from either parent with equal
/// probability.
///
/// # Panics
///
/// Panics if the parents have different lengths.
pub fn crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    p1.iter()
        .zip(p2)
        .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
        .collect()
}

/// Mutates each gene with probability `rate` by a uniform step in
/// `[-MUTATION_DELTA, MUTATION_DELTA]`, clamped back into `[0, 1]`.
///
/// Rates outside `[0, 1]` are treated as their nearest valid probability.
pub fn mutate<R>(genes: &mut [f32], rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let rate = f64::from(rate).clamp(0.0, 1.0);
    for gene in genes {
        if rng.random_bool(rate) {
            let delta = rng.random_range(-MUTATION_DELTA..=MUTATION_DELTA);
            *gene = (*gene + delta).clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_random_genes_stay_in_unit_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let genes = random(&mut rng, 100);
        assert_eq!(genes.len(), 100);
        assert!(genes.iter().all(|g| (0.0..1.0).contains(g)));
    }

    #[test]
    fn test_crossover_takes_each_gene_from_a_parent() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p1 = vec![0.0; 64];
        let p2 = vec![1.0; 64];
        let child = crossover(&p1, &p2, &mut rng);
        assert!(child.iter().all(|&g| g == 0.0 || g == 1.0));
        // With 64 coin flips both parents contribute.
        assert!(child.contains(&0.0));
        assert!(child.contains(&1.0));
    }

    #[test]
    fn test_mutate_rate_zero_is_identity() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut genes = random(&mut rng, 5);
        let before = genes.clone();
        mutate(&mut genes, 0.0, &mut rng);
        assert_eq!(genes, before);
    }

    #[test]
    fn test_mutate_rate_one_moves_every_gene_within_bounds() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut genes = vec![0.5; 20];
        mutate(&mut genes, 1.0, &mut rng);
        for &gene in &genes {
            assert!((gene - 0.5).abs() <= MUTATION_DELTA + f32::EPSILON);
            assert!((0.0..=1.0).contains(&gene));
        }
    }

    #[test]
    fn test_mutate_tolerates_out_of_range_rates() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut genes = vec![0.5; 10];
        mutate(&mut genes, 2.0, &mut rng);
        for &gene in &genes {
            assert!((gene - 0.5).abs() <= MUTATION_DELTA + f32::EPSILON);
        }
        let before = genes.clone();
        mutate(&mut genes, -1.0, &mut rng);
        assert_eq!(genes, before);
    }

    #[test]
    fn test_mutate_clamps_at_unit_bounds() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut genes = vec![0.0, 1.0];
        for _ in 0..50 {
            mutate(&mut genes, 1.0, &mut rng);
        }
        assert!(genes.iter().all(|g| (0.0..=1.0).contains(g)));
    }
}
