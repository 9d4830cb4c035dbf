//! # Collections
//!
//! [`NamedCollection`] is the unit exchanged by push and pull: an ordered list
//! of [`Data`] values, optionally carrying one name per entry. Named-ness is a
//! property of the whole collection. Names are not required to be unique.

use crate::core::handle::MatrixObject;
use crate::core::matrix::MatrixBlock;
use crate::error::{Result, RpcError};

/// A value that can sit in a collection
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Matrix(MatrixObject),
    Scalar(f64),
    Boolean(bool),
    String(String),
    List(NamedCollection),
}

impl Data {
    /// Type name of the value
    pub fn data_type(&self) -> &'static str {
        match self {
            Data::Matrix(_) => "MATRIX",
            Data::Scalar(_) => "SCALAR",
            Data::Boolean(_) => "BOOLEAN",
            Data::String(_) => "STRING",
            Data::List(_) => "LIST",
        }
    }

    /// Descriptive identity used in error messages
    pub fn debug_name(&self) -> String {
        match self {
            Data::Matrix(m) => format!("{m:?}"),
            Data::Scalar(v) => format!("SCALAR({v})"),
            Data::Boolean(b) => format!("BOOLEAN({b})"),
            Data::String(s) if s.len() > 32 => format!("STRING({:?}...)", truncate(s, 32)),
            Data::String(s) => format!("STRING({s:?})"),
            Data::List(l) => format!("LIST(len={})", l.len()),
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixObject> {
        match self {
            Data::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl From<MatrixObject> for Data {
    fn from(m: MatrixObject) -> Self {
        Data::Matrix(m)
    }
}

impl From<MatrixBlock> for Data {
    fn from(m: MatrixBlock) -> Self {
        Data::Matrix(MatrixObject::new(m))
    }
}

/// Ordered, optionally named sequence of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedCollection {
    data: Vec<Data>,
    names: Option<Vec<String>>,
}

impl NamedCollection {
    /// Build a collection; when `names` is given it must match `data` in length
    pub fn new(data: Vec<Data>, names: Option<Vec<String>>) -> Result<Self> {
        if let Some(names) = &names {
            if names.len() != data.len() {
                return Err(RpcError::InvalidShape(format!(
                    "{} names for {} entries",
                    names.len(),
                    data.len()
                )));
            }
        }
        Ok(Self { data, names })
    }

    pub fn unnamed(data: Vec<Data>) -> Self {
        Self { data, names: None }
    }

    pub fn named<I, S, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<Data>,
    {
        let (names, data): (Vec<String>, Vec<Data>) = entries
            .into_iter()
            .map(|(n, d)| (n.into(), d.into()))
            .unzip();
        Self {
            data,
            names: Some(names),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_named(&self) -> bool {
        self.names.is_some()
    }

    pub fn data(&self) -> &[Data] {
        &self.data
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn get(&self, index: usize) -> Option<&Data> {
        self.data.get(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.as_ref()?.get(index).map(String::as_str)
    }

    /// First entry carrying `name`; duplicates resolve positionally
    pub fn get_by_name(&self, name: &str) -> Option<&Data> {
        let idx = self.names.as_ref()?.iter().position(|n| n == name)?;
        self.data.get(idx)
    }

    /// Entries paired with their names, if any
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Data)> {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, d)| (self.name(i), d))
    }

    /// Same entries without names
    pub fn into_unnamed(self) -> Self {
        Self {
            data: self.data,
            names: None,
        }
    }

    pub fn into_parts(self) -> (Vec<Data>, Option<Vec<String>>) {
        (self.data, self.names)
    }
}
