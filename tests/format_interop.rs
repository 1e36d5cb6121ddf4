//! Our matrix formats against sprs and ndarray

use dataflow_mm::{
    compressed_to_dense, dense_to_compressed, from_sprs, multiply, to_sprs, Axis, DataflowConfig,
    DenseMatrix, KernelArgs, Strategy, WorkloadGenerator,
};
use ndarray::array;

#[test]
fn test_sprs_densifies_like_us() {
    let dense = WorkloadGenerator::new(8).random_matrix(7, 9, 20).unwrap();

    for axis in [Axis::Row, Axis::Column] {
        let compressed = dense_to_compressed(&dense, axis);
        let sprs_mat = to_sprs(&compressed).unwrap();
        assert_eq!(sprs_mat.nnz(), dense.nnz());
        for r in 0..dense.n_rows() {
            for c in 0..dense.n_cols() {
                let expected = dense.get(r, c);
                assert_eq!(sprs_mat.get(r, c).copied().unwrap_or(0), expected, "({r}, {c})");
            }
        }
        assert_eq!(compressed_to_dense(&from_sprs(sprs_mat).unwrap()), dense);
    }
}

#[test]
fn test_sprs_operands_feed_the_dataflows() {
    let mut generator = WorkloadGenerator::new(10);
    let a = generator.random_matrix(6, 8, 15).unwrap();
    let b = generator.random_matrix(8, 5, 12).unwrap();

    // CSR built by sprs, then converted to CSC by sprs
    let a_csr = from_sprs(to_sprs(&dense_to_compressed(&a, Axis::Row)).unwrap()).unwrap();
    let b_csc = from_sprs(to_sprs(&dense_to_compressed(&b, Axis::Row)).unwrap().to_csc()).unwrap();
    let args = KernelArgs::new(6, 8, 5, a_csr.nnz(), b_csc.nnz());

    let o = Strategy::MergeBasedSparseSparse
        .compute((&a_csr).into(), (&b_csc).into(), &args, &DataflowConfig::default())
        .unwrap();
    assert_eq!(o.to_ndarray(), a.to_ndarray().dot(&b.to_ndarray()));
}

#[test]
fn test_ndarray_operands() {
    let a = DenseMatrix::from_ndarray(&array![[0, 2], [3, 0]]);
    let b = DenseMatrix::from_ndarray(&array![[1, 0], [0, 4]]);

    for strategy in Strategy::ALL {
        let o = multiply(strategy, &a, &b, &DataflowConfig::default()).unwrap();
        assert_eq!(o.to_ndarray(), array![[0, 8], [3, 0]], "{strategy}");
    }
}
