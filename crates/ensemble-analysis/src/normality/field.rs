//! Normality field over an active mask.

use ensemble_core::constants::{DEFAULT_SIGNIFICANCE, MIN_TESTABLE_MEMBERS, UNTESTED_P_VALUE};
use ensemble_core::errors::{EnsembleError, NormalityError};
use ensemble_core::events::types::NormalityProgressEvent;
use ensemble_core::events::EventDispatcher;
use ensemble_core::types::{EnsembleView, NormalityField, VoxelMask};

use super::shapiro_wilk::ShapiroWilk;

/// p-value recorded for a voxel whose samples are not all finite.
const NON_FINITE_P_VALUE: f32 = 0.0;

/// Runs a Shapiro-Wilk test at every active voxel of a (sub-)ensemble.
#[derive(Debug, Clone, Copy)]
pub struct NormalityTester {
    significance: f64,
}

impl Default for NormalityTester {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNIFICANCE)
    }
}

impl NormalityTester {
    pub fn new(significance: f64) -> Self {
        Self { significance }
    }

    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// p-value field for `ensemble` over `mask`.
    ///
    /// Inactive voxels get 1.0. With fewer than three members no test is run
    /// and every voxel gets 1.0. Constant voxels get 1.0; voxels with a
    /// non-finite sample get 0.0.
    pub fn compute(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<NormalityField, EnsembleError> {
        let shape = ensemble.shape();
        shape.ensure_matches(&mask.shape())?;
        let mut field = NormalityField::filled(shape, UNTESTED_P_VALUE);

        let member_count = ensemble.member_count();
        if member_count < MIN_TESTABLE_MEMBERS {
            tracing::debug!(members = member_count, "too few members to test, all voxels normal");
            return Ok(field);
        }
        let test = match ShapiroWilk::new(member_count) {
            Ok(test) => test,
            Err(_) => return Ok(field),
        };

        let total = mask.count();
        let step = (total / 100).max(1);
        let mut samples = Vec::with_capacity(member_count);
        let mut non_finite = 0usize;

        for (i, voxel) in mask.active_voxels().enumerate() {
            ensemble.voxel_samples(voxel, &mut samples);
            let p_value = match test.test(&mut samples) {
                Ok(result) => result.p_value as f32,
                Err(NormalityError::NonFiniteSample) => {
                    non_finite += 1;
                    NON_FINITE_P_VALUE
                }
                Err(_) => UNTESTED_P_VALUE,
            };
            field.set(voxel, p_value);

            let processed = i + 1;
            if processed % step == 0 || processed == total {
                events.emit_normality_progress(&NormalityProgressEvent { processed, total });
            }
        }

        if non_finite > 0 {
            tracing::warn!(
                voxels = non_finite,
                "non-finite samples found, affected voxels marked non-normal"
            );
        }
        Ok(field)
    }

    /// Active voxels of `mask` that are normal for `ensemble`.
    pub fn normal_mask(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<VoxelMask, EnsembleError> {
        self.compute(ensemble, mask, events)?
            .classify(mask, self.significance)
    }

    /// Number of active voxels of `mask` that are normal for `ensemble`.
    pub fn normal_count(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
    ) -> Result<usize, EnsembleError> {
        Ok(self
            .normal_mask(ensemble, mask, &EventDispatcher::new())?
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_core::events::handler::EnsembleEventHandler;
    use ensemble_core::types::{EnsembleStack, GridShape};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn stack(members: Vec<Vec<f32>>) -> EnsembleStack {
        let voxels = members[0].len();
        EnsembleStack::new(GridShape::new([voxels, 1, 1]).unwrap(), members).unwrap()
    }

    #[test]
    fn two_members_are_never_tested() {
        let stack = stack(vec![vec![0.0, 5.0], vec![100.0, -3.0]]);
        let members = [0, 1];
        let view = stack.view(&members).unwrap();
        let mask = VoxelMask::full(stack.shape());
        let field = NormalityTester::default()
            .compute(&view, &mask, &EventDispatcher::new())
            .unwrap();
        assert_eq!(field.p_values(), &[1.0, 1.0]);
    }

    #[test]
    fn inactive_voxels_are_untested() {
        let stack = stack(vec![
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![100.0, 100.0],
        ]);
        let members = [0, 1, 2, 3, 4];
        let view = stack.view(&members).unwrap();
        let mask = VoxelMask::from_bits(stack.shape(), vec![true, false]).unwrap();
        let field = NormalityTester::default()
            .compute(&view, &mask, &EventDispatcher::new())
            .unwrap();
        assert!(field.p_value(0).unwrap() < 0.05);
        assert_eq!(field.p_value(1), Some(1.0));
    }

    #[test]
    fn non_finite_voxel_is_non_normal() {
        let stack = stack(vec![
            vec![1.0, f32::NAN],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ]);
        let members = [0, 1, 2];
        let view = stack.view(&members).unwrap();
        let mask = VoxelMask::full(stack.shape());
        let tester = NormalityTester::default();
        let field = tester.compute(&view, &mask, &EventDispatcher::new()).unwrap();
        assert_eq!(field.p_value(1), Some(0.0));
        assert_eq!(tester.normal_count(&view, &mask).unwrap(), 1);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let stack = stack(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let members = [0, 1, 2];
        let view = stack.view(&members).unwrap();
        let mask = VoxelMask::full(GridShape::new([2, 1, 1]).unwrap());
        assert!(NormalityTester::default()
            .compute(&view, &mask, &EventDispatcher::new())
            .is_err());
    }

    struct ProgressCounter(AtomicUsize);

    impl EnsembleEventHandler for ProgressCounter {
        fn on_normality_progress(&self, _event: &NormalityProgressEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn progress_is_reported_about_every_percent() {
        let voxels = 1000;
        let members: Vec<Vec<f32>> = (0..4)
            .map(|m| (0..voxels).map(|v| (m * v) as f32).collect())
            .collect();
        let stack = stack(members);
        let indices = [0, 1, 2, 3];
        let view = stack.view(&indices).unwrap();
        let counter = Arc::new(ProgressCounter(AtomicUsize::new(0)));
        let events = EventDispatcher::new().with_handler(counter.clone());
        NormalityTester::default()
            .compute(&view, &VoxelMask::full(stack.shape()), &events)
            .unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 100);
    }
}
