//! Test fixtures for sub-ensemble decomposition.
//!
//! Seeded synthetic ensembles for unit tests and benchmarks, and a loader for
//! the JSON ensembles under the workspace `test-fixtures/` directory.

use std::path::PathBuf;

use ensemble_core::types::{EnsembleStack, GridShape, VoxelMask};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root directory of the test-fixtures folder.
pub fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find test-fixtures.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("test-fixtures").join("ensembles").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// On-disk ensemble fixture: grid extents, one flat field per member, and an
/// optional mask (all voxels when absent).
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleFixture {
    pub dims: [usize; 3],
    pub members: Vec<Vec<f32>>,
    #[serde(default)]
    pub mask: Option<Vec<bool>>,
}

/// Load `ensembles/<name>.json` as a stack and its mask.
///
/// # Panics
/// Panics if the fixture is missing or inconsistent.
pub fn load_ensemble(name: &str) -> (EnsembleStack, VoxelMask) {
    let fixture: EnsembleFixture = load_fixture(&format!("ensembles/{name}.json"));
    let shape = GridShape::new(fixture.dims).expect("fixture grid");
    let stack = EnsembleStack::new(shape, fixture.members).expect("fixture members");
    let mask = match fixture.mask {
        Some(bits) => VoxelMask::from_bits(shape, bits).expect("fixture mask"),
        None => VoxelMask::full(shape),
    };
    (stack, mask)
}

pub fn grid(dims: [usize; 3]) -> GridShape {
    GridShape::new(dims).expect("non-empty grid")
}

pub fn full_mask(stack: &EnsembleStack) -> VoxelMask {
    VoxelMask::full(stack.shape())
}

fn sample_members(
    shape: GridShape,
    means: impl Fn(usize, usize) -> f64,
    member_count: usize,
    seed: u64,
) -> EnsembleStack {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).expect("unit normal");
    let members = (0..member_count)
        .map(|m| {
            (0..shape.voxel_count())
                .map(|v| (means(m, v) + noise.sample(&mut rng)) as f32)
                .collect()
        })
        .collect();
    EnsembleStack::new(shape, members).expect("synthetic members")
}

/// Every voxel drawn from N(0.1 * voxel, 1) independently per member.
pub fn gaussian_ensemble(dims: [usize; 3], member_count: usize, seed: u64) -> EnsembleStack {
    sample_members(grid(dims), |_, v| 0.1 * v as f64, member_count, seed)
}

/// First half of the members drawn around 0, second half around `separation`.
pub fn bimodal_ensemble(
    dims: [usize; 3],
    member_count: usize,
    separation: f64,
    seed: u64,
) -> EnsembleStack {
    let half = member_count / 2;
    sample_members(
        grid(dims),
        |m, _| if m < half { 0.0 } else { separation },
        member_count,
        seed,
    )
}

/// Every member holds `value` at every voxel.
pub fn constant_ensemble(dims: [usize; 3], member_count: usize, value: f32) -> EnsembleStack {
    let shape = grid(dims);
    EnsembleStack::new(shape, vec![vec![value; shape.voxel_count()]; member_count])
        .expect("constant members")
}

/// Member `m` holds `m + 0.01 * voxel`: strictly ordered, evenly spaced values.
pub fn ramp_ensemble(dims: [usize; 3], member_count: usize) -> EnsembleStack {
    let shape = grid(dims);
    let members = (0..member_count)
        .map(|m| {
            (0..shape.voxel_count())
                .map(|v| m as f32 + 0.01 * v as f32)
                .collect()
        })
        .collect();
    EnsembleStack::new(shape, members).expect("ramp members")
}
