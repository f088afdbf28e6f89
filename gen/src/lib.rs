//! Synthetic `station;temperature` data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Station names with their mean temperature.
pub const STATIONS: &[(&str, f64)] = &[
    ("Abha", 18.0),
    ("Accra", 26.4),
    ("Addis Ababa", 16.0),
    ("Amsterdam", 10.2),
    ("Anchorage", 2.8),
    ("Athens", 19.2),
    ("Bangkok", 28.6),
    ("Bulawayo", 18.9),
    ("Cairo", 21.4),
    ("Chihuahua", 18.6),
    ("Dakar", 24.0),
    ("Dunedin", 11.1),
    ("Hamburg", 9.7),
    ("Istanbul", 13.9),
    ("Jakarta", 26.7),
    ("Kyiv", 8.4),
    ("Lagos", 26.8),
    ("Lhasa", 7.6),
    ("Montréal", 6.8),
    ("Ouagadougou", 28.3),
    ("Palembang", 27.3),
    ("Reykjavík", 4.3),
    ("São Paulo", 19.7),
    ("St. John's", 5.0),
    ("Tokyo", 15.4),
    ("Yakutsk", -8.8),
    ("Zürich", 9.3),
];

const STDDEV: f64 = 10.0;

/// `count` readings drawn from per-station normal distributions, reproducible
/// for a given `seed`.
pub fn gen(count: usize, seed: u64) -> impl Iterator<Item = (&'static str, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dists: Vec<Normal<f64>> = STATIONS
        .iter()
        .map(|&(_, mean)| Normal::new(mean, STDDEV).expect("stddev is positive"))
        .collect();
    (0..count).map(move |_| {
        let i = rng.gen_range(0..STATIONS.len());
        let t = dists[i].sample(&mut rng).clamp(-99.9, 99.9);
        (STATIONS[i].0, t)
    })
}
