//! FFT sizing and 2-D transforms over `rustfft`.

use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex64, FftPlanner};

/// Smallest size ≥ `input` of the form 2ⁿ or 3·2ⁿ.
pub fn good_fft_size(input: usize) -> usize {
    if input <= 2 {
        return 2;
    }
    let log2n = usize::BITS - (input - 1).leading_zeros();
    let pow2 = 1usize << log2n;
    let three_quarters = 3 * (pow2 >> 2);
    if input <= three_quarters {
        three_quarters
    } else {
        pow2
    }
}

/// Unnormalised inverse DFT along both axes, in place.
///
/// Entry `[m, n]` becomes Σ_{p,q} a[p,q]·exp(+2πi(mp/rows + nq/cols)).
pub fn inverse_fft_2d(data: &mut Array2<Complex64>) {
    let (rows, cols) = data.dim();
    let mut planner = FftPlanner::<f64>::new();

    let row_fft = planner.plan_fft_inverse(cols);
    let mut buffer = vec![Complex64::new(0.0, 0.0); cols.max(rows)];
    for mut row in data.axis_iter_mut(Axis(0)) {
        let line = &mut buffer[..cols];
        for (dst, src) in line.iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        row_fft.process(line);
        for (dst, src) in row.iter_mut().zip(line.iter()) {
            *dst = *src;
        }
    }

    let col_fft = planner.plan_fft_inverse(rows);
    for mut col in data.axis_iter_mut(Axis(1)) {
        let line = &mut buffer[..rows];
        for (dst, src) in line.iter_mut().zip(col.iter()) {
            *dst = *src;
        }
        col_fft.process(line);
        for (dst, src) in col.iter_mut().zip(line.iter()) {
            *dst = *src;
        }
    }
}
