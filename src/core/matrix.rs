//! # Matrix Blocks
//!
//! Dense or sparse 2-D `f64` arrays with a self-describing binary form.
//!
//! ## Wire Format
//! ```text
//! [Rows(i32)] [Cols(i32)] [NonZeros(i64)] [BlockType(u8)] [Payload]
//!
//! EMPTY  (0): no payload
//! SPARSE (2): per row [RowNnz(i32)] then RowNnz x [Col(i32)] [Value(f64)]
//! DENSE  (3): Rows*Cols x [Value(f64)], row-major
//! ```
//!
//! The writer picks the smallest form for the current content, so the on-disk
//! size depends only on the shape and the number of non-zeros, never on how
//! the block is stored in memory.
//!
//! ## Security
//! - Declared dimensions and counts are checked against the remaining input
//!   before anything is allocated
//! - Sparse column indices must be in range and strictly increasing

use crate::error::{constants, Result, RpcError};
use bytes::{Buf, BufMut};

/// Fixed header: rows, cols, non-zeros and block type
pub const MATRIX_HEADER_SIZE: u64 = 4 + 4 + 8 + 1;

/// Largest row or column count the header can carry
pub const MAX_DIM: usize = i32::MAX as usize;

const SPARSE_ROW_HEADER: u64 = 4;
const SPARSE_CELL_SIZE: u64 = 4 + 8;
const DENSE_CELL_SIZE: u64 = 8;

/// On-disk block layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// All-zero block, header only
    Empty,
    /// Row-wise (column, value) pairs
    Sparse,
    /// Every cell, row-major
    Dense,
}

impl BlockType {
    /// Get the type byte for the wire format
    pub fn type_byte(self) -> u8 {
        match self {
            BlockType::Empty => 0,
            BlockType::Sparse => 2,
            BlockType::Dense => 3,
        }
    }

    /// Detect block type from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(BlockType::Empty),
            2 => Some(BlockType::Sparse),
            3 => Some(BlockType::Dense),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Empty => "EMPTY",
            BlockType::Sparse => "SPARSE",
            BlockType::Dense => "DENSE",
        }
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Dense(Vec<f64>),
    /// Non-zero (row, col, value) triplets sorted by (row, col)
    Sparse(Vec<(u32, u32, f64)>),
}

/// A 2-D numeric array
#[derive(Debug, Clone)]
pub struct MatrixBlock {
    rows: usize,
    cols: usize,
    nnz: u64,
    storage: Storage,
}

fn check_dims(rows: usize, cols: usize) -> Result<()> {
    if rows > MAX_DIM || cols > MAX_DIM {
        return Err(RpcError::InvalidShape(format!(
            "Dimensions {rows}x{cols} exceed {MAX_DIM}"
        )));
    }
    Ok(())
}

impl MatrixBlock {
    /// All-zero block of the given shape, stored sparse
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_dims(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            nnz: 0,
            storage: Storage::Sparse(Vec::new()),
        })
    }

    /// Dense block from row-major values
    pub fn from_dense(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        check_dims(rows, cols)?;
        let cells = rows.checked_mul(cols).ok_or_else(|| {
            RpcError::InvalidShape(format!("Dense block {rows}x{cols} is too large"))
        })?;
        if values.len() != cells {
            return Err(RpcError::InvalidShape(format!(
                "Expected {cells} values for a {rows}x{cols} block, got {}",
                values.len()
            )));
        }

        let nnz = values.iter().filter(|v| **v != 0.0).count() as u64;
        Ok(Self {
            rows,
            cols,
            nnz,
            storage: Storage::Dense(values),
        })
    }

    /// Dense block from a list of equally long rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(RpcError::InvalidShape(format!(
                "Row {bad} has {} columns, expected {cols}",
                rows[bad].len()
            )));
        }
        Self::from_dense(n, cols, rows.into_iter().flatten().collect())
    }

    /// Sparse block from (row, col, value) triplets.
    ///
    /// Later duplicates overwrite earlier ones; zeros are not stored.
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        check_dims(rows, cols)?;

        let mut cells = Vec::new();
        for (r, c, v) in triplets {
            if r >= rows || c >= cols {
                return Err(RpcError::InvalidShape(format!(
                    "Cell ({r}, {c}) outside a {rows}x{cols} block"
                )));
            }
            cells.push((r as u32, c as u32, v));
        }
        // stable, so duplicates keep insertion order
        cells.sort_by_key(|&(r, c, _)| (r, c));

        let mut entries: Vec<(u32, u32, f64)> = Vec::with_capacity(cells.len());
        for cell in cells {
            match entries.last_mut() {
                Some(last) if (last.0, last.1) == (cell.0, cell.1) => *last = cell,
                _ => entries.push(cell),
            }
        }
        entries.retain(|&(_, _, v)| v != 0.0);

        Ok(Self {
            rows,
            cols,
            nnz: entries.len() as u64,
            storage: Storage::Sparse(entries),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of non-zero cells
    pub fn non_zeros(&self) -> u64 {
        self.nnz
    }

    /// Whether the in-memory representation is sparse
    pub fn is_sparse(&self) -> bool {
        matches!(self.storage, Storage::Sparse(_))
    }

    /// Value at (row, col), or `None` when out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        match &self.storage {
            Storage::Dense(values) => Some(values[row * self.cols + col]),
            Storage::Sparse(entries) => Some(
                entries
                    .binary_search_by_key(&(row as u32, col as u32), |&(r, c, _)| (r, c))
                    .map_or(0.0, |i| entries[i].2),
            ),
        }
    }

    /// Set the value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(RpcError::InvalidShape(format!(
                "Cell ({row}, {col}) outside a {}x{} block",
                self.rows, self.cols
            )));
        }

        let cols = self.cols;
        match &mut self.storage {
            Storage::Dense(values) => {
                let cell = &mut values[row * cols + col];
                match (*cell != 0.0, value != 0.0) {
                    (false, true) => self.nnz += 1,
                    (true, false) => self.nnz -= 1,
                    _ => {}
                }
                *cell = value;
            }
            Storage::Sparse(entries) => {
                let key = (row as u32, col as u32);
                match entries.binary_search_by_key(&key, |&(r, c, _)| (r, c)) {
                    Ok(i) if value == 0.0 => {
                        entries.remove(i);
                        self.nnz -= 1;
                    }
                    Ok(i) => entries[i].2 = value,
                    Err(_) if value == 0.0 => {}
                    Err(i) => {
                        entries.insert(i, (key.0, key.1, value));
                        self.nnz += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Row-major copy of every cell
    pub fn to_dense_vec(&self) -> Vec<f64> {
        match &self.storage {
            Storage::Dense(values) => values.clone(),
            Storage::Sparse(entries) => {
                let mut values = vec![0.0; self.rows * self.cols];
                for &(r, c, v) in entries {
                    values[r as usize * self.cols + c as usize] = v;
                }
                values
            }
        }
    }

    /// Non-zero cells in row-major order
    pub fn iter_non_zeros(&self) -> Box<dyn Iterator<Item = (usize, usize, f64)> + '_> {
        match &self.storage {
            Storage::Dense(values) => {
                let cols = self.cols;
                Box::new(
                    values
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| **v != 0.0)
                        .map(move |(i, v)| (i / cols, i % cols, *v)),
                )
            }
            Storage::Sparse(entries) => Box::new(
                entries
                    .iter()
                    .map(|&(r, c, v)| (r as usize, c as usize, v)),
            ),
        }
    }

    fn dense_payload_size(&self) -> u64 {
        (self.rows as u64)
            .saturating_mul(self.cols as u64)
            .saturating_mul(DENSE_CELL_SIZE)
    }

    fn sparse_payload_size(&self) -> u64 {
        SPARSE_ROW_HEADER * self.rows as u64 + SPARSE_CELL_SIZE * self.nnz
    }

    /// Layout the writer will use for the current content
    pub fn block_type_on_disk(&self) -> BlockType {
        if self.nnz == 0 {
            BlockType::Empty
        } else if self.sparse_payload_size() < self.dense_payload_size() {
            BlockType::Sparse
        } else {
            BlockType::Dense
        }
    }

    /// Exact number of bytes `write_to` produces
    pub fn exact_size_on_disk(&self) -> u64 {
        MATRIX_HEADER_SIZE
            + match self.block_type_on_disk() {
                BlockType::Empty => 0,
                BlockType::Sparse => self.sparse_payload_size(),
                BlockType::Dense => self.dense_payload_size(),
            }
    }

    /// Write the full self-describing form
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        let block_type = self.block_type_on_disk();
        buf.put_i32(self.rows as i32);
        buf.put_i32(self.cols as i32);
        buf.put_i64(self.nnz as i64);
        buf.put_u8(block_type.type_byte());

        match block_type {
            BlockType::Empty => {}
            BlockType::Dense => self.write_dense(buf),
            BlockType::Sparse => self.write_sparse(buf),
        }
    }

    fn write_dense<B: BufMut>(&self, buf: &mut B) {
        match &self.storage {
            Storage::Dense(values) => values.iter().for_each(|v| buf.put_f64(*v)),
            Storage::Sparse(entries) => {
                let mut next = entries.iter().peekable();
                for r in 0..self.rows as u32 {
                    for c in 0..self.cols as u32 {
                        match next.peek() {
                            Some(&&(er, ec, v)) if (er, ec) == (r, c) => {
                                buf.put_f64(v);
                                next.next();
                            }
                            _ => buf.put_f64(0.0),
                        }
                    }
                }
            }
        }
    }

    fn write_sparse<B: BufMut>(&self, buf: &mut B) {
        match &self.storage {
            Storage::Dense(values) => {
                for row in values.chunks(self.cols.max(1)).take(self.rows) {
                    let count = row.iter().filter(|v| **v != 0.0).count();
                    buf.put_i32(count as i32);
                    for (c, v) in row.iter().enumerate().filter(|(_, v)| **v != 0.0) {
                        buf.put_i32(c as i32);
                        buf.put_f64(*v);
                    }
                }
            }
            Storage::Sparse(entries) => {
                let mut i = 0;
                for r in 0..self.rows as u32 {
                    let start = i;
                    while i < entries.len() && entries[i].0 == r {
                        i += 1;
                    }
                    buf.put_i32((i - start) as i32);
                    for &(_, c, v) in &entries[start..i] {
                        buf.put_i32(c as i32);
                        buf.put_f64(v);
                    }
                }
            }
        }
    }

    /// Read one full self-describing block into freshly owned storage
    pub fn read_from<B: Buf>(buf: &mut B) -> Result<Self> {
        if (buf.remaining() as u64) < MATRIX_HEADER_SIZE {
            return Err(RpcError::malformed(constants::ERR_TRUNCATED_MATRIX));
        }

        let rows = buf.get_i32();
        let cols = buf.get_i32();
        let nnz = buf.get_i64();
        let type_byte = buf.get_u8();

        if rows < 0 || cols < 0 {
            return Err(RpcError::malformed(format!(
                "Negative matrix dimensions {rows}x{cols}"
            )));
        }
        let (rows, cols) = (rows as usize, cols as usize);
        let cells = rows as u64 * cols as u64;
        if nnz < 0 || nnz as u64 > cells {
            return Err(RpcError::malformed(format!(
                "Non-zero count {nnz} impossible for a {rows}x{cols} block"
            )));
        }
        let nnz = nnz as u64;

        let block_type = BlockType::from_byte(type_byte).ok_or_else(|| {
            RpcError::malformed(format!("Unknown matrix block type {type_byte}"))
        })?;

        match block_type {
            BlockType::Empty => {
                if nnz != 0 {
                    return Err(RpcError::malformed(format!(
                        "Empty block declares {nnz} non-zeros"
                    )));
                }
                Self::zeros(rows, cols)
            }
            BlockType::Dense => Self::read_dense(buf, rows, cols, nnz),
            BlockType::Sparse => Self::read_sparse(buf, rows, cols, nnz),
        }
    }

    fn read_dense<B: Buf>(buf: &mut B, rows: usize, cols: usize, nnz: u64) -> Result<Self> {
        let cells = rows as u64 * cols as u64;
        let need = cells.saturating_mul(DENSE_CELL_SIZE);
        if need > buf.remaining() as u64 {
            return Err(RpcError::malformed(format!(
                "{}: dense {rows}x{cols} needs {need} bytes, {} remaining",
                constants::ERR_TRUNCATED_MATRIX,
                buf.remaining()
            )));
        }

        let values: Vec<f64> = (0..cells).map(|_| buf.get_f64()).collect();
        let block = Self::from_dense(rows, cols, values)?;
        if block.nnz != nnz {
            return Err(RpcError::malformed(format!(
                "Dense block declares {nnz} non-zeros but holds {}",
                block.nnz
            )));
        }
        Ok(block)
    }

    fn read_sparse<B: Buf>(buf: &mut B, rows: usize, cols: usize, nnz: u64) -> Result<Self> {
        let min_need = SPARSE_ROW_HEADER * rows as u64;
        if min_need > buf.remaining() as u64 {
            return Err(RpcError::malformed(format!(
                "{}: sparse block with {rows} rows needs at least {min_need} bytes",
                constants::ERR_TRUNCATED_MATRIX
            )));
        }

        let cap = nnz.min(buf.remaining() as u64 / SPARSE_CELL_SIZE) as usize;
        let mut entries = Vec::with_capacity(cap);

        for r in 0..rows {
            if buf.remaining() < SPARSE_ROW_HEADER as usize {
                return Err(RpcError::malformed(constants::ERR_TRUNCATED_MATRIX));
            }
            let row_nnz = buf.get_i32();
            if row_nnz < 0 || row_nnz as usize > cols {
                return Err(RpcError::malformed(format!(
                    "Row {r} declares {row_nnz} non-zeros with {cols} columns"
                )));
            }
            if row_nnz as u64 * SPARSE_CELL_SIZE > buf.remaining() as u64 {
                return Err(RpcError::malformed(constants::ERR_TRUNCATED_MATRIX));
            }

            let mut prev: Option<i32> = None;
            for _ in 0..row_nnz {
                let c = buf.get_i32();
                let v = buf.get_f64();
                if c < 0 || c as usize >= cols || prev.is_some_and(|p| p >= c) {
                    return Err(RpcError::malformed(format!(
                        "Invalid column index {c} in row {r}"
                    )));
                }
                if v == 0.0 {
                    return Err(RpcError::malformed(format!(
                        "Explicit zero at ({r}, {c}) in sparse block"
                    )));
                }
                prev = Some(c);
                entries.push((r as u32, c as u32, v));
            }
        }

        if entries.len() as u64 != nnz {
            return Err(RpcError::malformed(format!(
                "Sparse block declares {nnz} non-zeros but holds {}",
                entries.len()
            )));
        }

        Ok(Self {
            rows,
            cols,
            nnz,
            storage: Storage::Sparse(entries),
        })
    }
}

impl PartialEq for MatrixBlock {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.nnz == other.nnz
            && self
                .iter_non_zeros()
                .zip(other.iter_non_zeros())
                .all(|((r1, c1, v1), (r2, c2, v2))| {
                    r1 == r2 && c1 == c2 && (v1 == v2 || (v1.is_nan() && v2.is_nan()))
                })
    }
}
