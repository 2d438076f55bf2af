use ndarray as nd;
use num_traits::Zero;

//ndarray has no gather or tile along an axis, so these mirror the python
// equivalents dst=src[indices] and np.repeat(src, n, axis=0)
pub trait GatherRows<T: Copy + Zero> {
    /// `dst[i] = src[indices[i]]` for every row
    fn gather_rows(&self, indices: &[usize]) -> nd::Array2<T>;
}
impl<T: Copy + Zero, S: nd::Data<Elem = T>> GatherRows<T> for nd::ArrayBase<S, nd::Ix2> {
    fn gather_rows(&self, indices: &[usize]) -> nd::Array2<T> {
        let mut res = nd::Array2::<T>::zeros((indices.len(), self.ncols()));
        for (mut row_out, &i_in) in res.outer_iter_mut().zip(indices) {
            row_out.assign(&self.row(i_in));
        }
        res
    }
}

pub trait RepeatRows<T: Copy + Zero> {
    /// Repeats every row `repeats` times consecutively, so row `i` of the
    /// source ends up at rows `i*repeats..(i+1)*repeats`.
    fn repeat_rows(&self, repeats: usize) -> nd::Array2<T>;
}
impl<T: Copy + Zero, S: nd::Data<Elem = T>> RepeatRows<T> for nd::ArrayBase<S, nd::Ix2> {
    fn repeat_rows(&self, repeats: usize) -> nd::Array2<T> {
        let mut res = nd::Array2::<T>::zeros((self.nrows() * repeats, self.ncols()));
        for (i_in, row_in) in self.outer_iter().enumerate() {
            for mut row_out in res.outer_iter_mut().skip(i_in * repeats).take(repeats) {
                row_out.assign(&row_in);
            }
        }
        res
    }
}
