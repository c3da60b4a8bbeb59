/// Dense row-major matrix. Row `i` holds the incoming weights of unit `i`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    vals: Vec<f64>,
}

impl Matrix {
    pub fn zeroed(rows: usize, cols: usize) -> Self {
        Self { rows, cols, vals: vec![0.0; rows * cols] }
    }

    /// Builds a matrix from a flat row-major buffer, returning `None`
    /// if the buffer does not hold exactly `rows * cols` values.
    pub fn from_vec(rows: usize, cols: usize, vals: Vec<f64>) -> Option<Self> {
        (vals.len() == rows * cols).then_some(Self { rows, cols, vals })
    }

    /// Builds a matrix from a list of equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);

        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }

        let vals = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Some(Self { rows: rows.len(), cols, vals })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn vals(&self) -> &[f64] {
        &self.vals
    }

    pub fn vals_mut(&mut self) -> &mut [f64] {
        &mut self.vals
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.vals[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.vals[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks_exact` panics on a zero chunk size
        self.vals.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.vals[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, val: f64) {
        self.vals[i * self.cols + j] = val;
    }

    pub fn fill(&mut self, val: f64) {
        self.vals.fill(val);
    }

    /// `out = self · x + bias`
    pub fn affine(&self, x: &[f64], bias: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.cols);
        assert_eq!(bias.len(), self.rows);
        assert_eq!(out.len(), self.rows);

        for ((o, row), &b) in out.iter_mut().zip(self.iter_rows()).zip(bias) {
            *o = row.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + b;
        }
    }

    /// `out = selfᵀ · x`
    pub fn transpose_mul(&self, x: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.rows);
        assert_eq!(out.len(), self.cols);

        out.fill(0.0);
        for (row, &xi) in self.iter_rows().zip(x) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += w * xi;
            }
        }
    }

    /// `self += a ⊗ b`
    pub fn add_outer(&mut self, a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), self.rows);
        assert_eq!(b.len(), self.cols);

        for (i, &ai) in a.iter().enumerate() {
            for (w, &bj) in self.row_mut(i).iter_mut().zip(b) {
                *w += ai * bj;
            }
        }
    }

    /// Stacks the rows of `other` underneath the rows of `self`.
    pub fn stack(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.cols);

        let mut vals = Vec::with_capacity(self.vals.len() + other.vals.len());
        vals.extend_from_slice(&self.vals);
        vals.extend_from_slice(&other.vals);

        Matrix { rows: self.rows + other.rows, cols: self.cols, vals }
    }

    /// Splits off the first `rows` rows, the inverse of [`Matrix::stack`].
    pub fn split_rows(&self, rows: usize) -> (Matrix, Matrix) {
        assert!(rows <= self.rows);

        let mid = rows * self.cols;
        let top = Matrix { rows, cols: self.cols, vals: self.vals[..mid].to_vec() };
        let bottom = Matrix { rows: self.rows - rows, cols: self.cols, vals: self.vals[mid..].to_vec() };

        (top, bottom)
    }
}
