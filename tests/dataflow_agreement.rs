//! Every strategy must produce the reference product on the same workload

use dataflow_mm::{
    dense_to_compressed, multiply, reference_matmul, Axis, CompressedMatrix, DataflowConfig,
    DataflowError, DenseMatrix, KernelArgs, Operand, Strategy, TestVectorSet, WorkloadGenerator,
};

fn scenario() -> (DenseMatrix, DenseMatrix) {
    let a = DenseMatrix::from_rows(&[[0, 2], [3, 0]]).unwrap();
    let b = DenseMatrix::from_rows(&[[1, 0], [0, 4]]).unwrap();
    (a, b)
}

#[test]
fn test_two_by_two_scenario_all_strategies() {
    let (a, b) = scenario();
    let expected = DenseMatrix::from_rows(&[[0, 8], [3, 0]]).unwrap();

    for strategy in Strategy::ALL {
        let o = multiply(strategy, &a, &b, &DataflowConfig::default()).unwrap();
        assert_eq!(o, expected, "{strategy}");
    }
}

#[test]
fn test_two_by_two_scenario_from_raw_arrays() {
    // Operand arrays written out by hand, as a host would supply them
    let a_dense = DenseMatrix::new(2, 2, vec![0, 2, 3, 0]).unwrap();
    let b_dense = DenseMatrix::new(2, 2, vec![1, 0, 0, 4]).unwrap();
    let a_csr = CompressedMatrix::csr(2, 2, vec![0, 1, 2], vec![1, 0], vec![2, 3]).unwrap();
    let a_csc = CompressedMatrix::csc(2, 2, vec![0, 1, 2], vec![1, 0], vec![3, 2]).unwrap();
    let b_csc = CompressedMatrix::csc(2, 2, vec![0, 1, 2], vec![0, 1], vec![1, 4]).unwrap();
    let args = KernelArgs::new(2, 2, 2, 2, 2);
    let config = DataflowConfig::default();

    let cases: [(Strategy, Operand, Operand); 4] = [
        (Strategy::DenseTiled, (&a_dense).into(), (&b_dense).into()),
        (Strategy::WeightStationarySparseDense, (&a_csr).into(), (&b_dense).into()),
        (Strategy::MergeBasedSparseSparse, (&a_csr).into(), (&b_csc).into()),
        (Strategy::GatherAccumulateSparseSparse, (&a_csc).into(), (&b_csc).into()),
    ];
    for (strategy, a, b) in cases {
        let o = strategy.compute(a, b, &args, &config).unwrap();
        assert_eq!(o.as_slice(), &[0, 8, 3, 0], "{strategy}");
    }
}

#[test]
fn test_default_workload_matches_golden() {
    let workload = WorkloadGenerator::new(2024)
        .workload(&KernelArgs::default())
        .unwrap();
    let set = TestVectorSet::from_workload(&workload);

    for parallel in [false, true] {
        let config = DataflowConfig::default().with_parallel(parallel);
        for strategy in Strategy::ALL {
            let mismatches = set.verify(strategy, &config).unwrap();
            assert!(
                mismatches.is_empty(),
                "{strategy} (parallel={parallel}): {} cells differ",
                mismatches.len()
            );
        }
    }
}

#[test]
fn test_odd_shapes_agree_with_reference() {
    // Shapes that leave partial tiles and partial lanes
    let shapes = [(1, 1, 1), (5, 3, 7), (17, 2, 33), (3, 19, 1), (33, 9, 17)];
    let mut generator = WorkloadGenerator::new(11);

    for (m, k, n) in shapes {
        let a = generator.random_matrix(m, k, (m * k) / 3).unwrap();
        let b = generator.random_matrix(k, n, (k * n) / 2).unwrap();
        let expected = reference_matmul(&a, &b).unwrap();

        for strategy in Strategy::ALL {
            for parallel in [false, true] {
                let config = DataflowConfig::default().with_parallel(parallel);
                let o = multiply(strategy, &a, &b, &config).unwrap();
                assert_eq!(o, expected, "{strategy} on {m}×{k}×{n}, parallel={parallel}");
            }
        }
    }
}

#[test]
fn test_zero_operands_give_zero_output() {
    let a = DenseMatrix::zeros(6, 5);
    let b = DenseMatrix::zeros(5, 4);
    for strategy in Strategy::ALL {
        let o = multiply(strategy, &a, &b, &DataflowConfig::default()).unwrap();
        assert_eq!(o, DenseMatrix::zeros(6, 4), "{strategy}");
    }
}

#[test]
fn test_empty_rows_and_columns_are_zero() {
    // Row 1 of A and column 0 of B hold no nonzeros
    let a = DenseMatrix::from_rows(&[[1, 2, 0], [0, 0, 0], [0, 5, 6]]).unwrap();
    let b = DenseMatrix::from_rows(&[[0, 1], [0, 2], [0, 3]]).unwrap();
    let expected = DenseMatrix::from_rows(&[[0, 5], [0, 0], [0, 28]]).unwrap();

    for strategy in Strategy::ALL {
        let o = multiply(strategy, &a, &b, &DataflowConfig::default()).unwrap();
        assert_eq!(o, expected, "{strategy}");
    }
}

#[test]
fn test_wrapping_overflow_is_consistent() {
    let a = DenseMatrix::from_rows(&[[i32::MAX, i32::MAX]]).unwrap();
    let b = DenseMatrix::from_rows(&[[2], [3]]).unwrap();
    let expected = reference_matmul(&a, &b).unwrap();
    assert_eq!(
        expected.as_slice()[0],
        i32::MAX.wrapping_mul(2).wrapping_add(i32::MAX.wrapping_mul(3))
    );

    for strategy in Strategy::ALL {
        let o = multiply(strategy, &a, &b, &DataflowConfig::default()).unwrap();
        assert_eq!(o, expected, "{strategy}");
    }
}

#[test]
fn test_lane_widths_do_not_change_results() {
    let mut generator = WorkloadGenerator::new(5);
    let a = generator.random_matrix(13, 11, 40).unwrap();
    let b = generator.random_matrix(11, 9, 30).unwrap();
    let expected = reference_matmul(&a, &b).unwrap();

    for (num_macs, mac_x, mac_y) in [(1, 1, 1), (3, 2, 5), (16, 4, 4), (64, 13, 9)] {
        let config = DataflowConfig {
            num_macs,
            mac_x,
            mac_y,
            ..DataflowConfig::default()
        };
        for strategy in Strategy::ALL {
            let o = multiply(strategy, &a, &b, &config).unwrap();
            assert_eq!(o, expected, "{strategy} with lanes ({num_macs}, {mac_x}, {mac_y})");
        }
    }
}

#[test]
fn test_csc_operand_through_axis_change() {
    // A converted CSR → CSC through the counting sort must feed the gather dataflow
    let mut generator = WorkloadGenerator::new(9);
    let a = generator.random_matrix(8, 6, 20).unwrap();
    let b = generator.random_matrix(6, 5, 12).unwrap();

    let a_csc = dense_to_compressed(&a, Axis::Row).to_axis(Axis::Column);
    let b_csc = dense_to_compressed(&b, Axis::Column);
    let args = KernelArgs::new(8, 6, 5, a_csc.nnz(), b_csc.nnz());

    let o = Strategy::GatherAccumulateSparseSparse
        .compute((&a_csc).into(), (&b_csc).into(), &args, &DataflowConfig::default())
        .unwrap();
    assert_eq!(o, reference_matmul(&a, &b).unwrap());
}

/// Runs `strategy` on the 2×2 scenario with a declared `k` one larger than the operands
fn compute_with_wrong_k(strategy: Strategy) -> dataflow_mm::Result<DenseMatrix> {
    let (a, b) = scenario();
    let (a_op, b_op) = strategy.prepare(&a, &b);
    let args = KernelArgs::new(2, 3, 2, a.nnz(), b.nnz());
    strategy.compute(a_op.as_operand(), b_op.as_operand(), &args, &DataflowConfig::default())
}

fn assert_shape_mismatch(result: dataflow_mm::Result<DenseMatrix>) {
    match result {
        Err(DataflowError::ShapeMismatch { expected, got, .. }) => {
            assert_eq!((expected, got), (3, 2));
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn test_dense_tiled_rejects_wrong_k() {
    assert_shape_mismatch(compute_with_wrong_k(Strategy::DenseTiled));
}

#[test]
fn test_weight_stationary_rejects_wrong_k() {
    assert_shape_mismatch(compute_with_wrong_k(Strategy::WeightStationarySparseDense));
}

#[test]
fn test_merge_rejects_wrong_k() {
    assert_shape_mismatch(compute_with_wrong_k(Strategy::MergeBasedSparseSparse));
}

#[test]
fn test_gather_rejects_wrong_k() {
    assert_shape_mismatch(compute_with_wrong_k(Strategy::GatherAccumulateSparseSparse));
}
