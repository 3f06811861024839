use std::borrow::Cow;
use std::ffi::CStr;

/// One result row as the engine delivers it: text columns, NULL as `None`.
///
/// The row borrows engine memory and is only valid inside the row callback.
/// Use [`Row::to_vec`] to keep the values.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    values: Vec<Option<&'a CStr>>,
    names: Vec<Option<&'a CStr>>,
}

impl<'a> Row<'a> {
    pub(crate) fn new(values: Vec<Option<&'a CStr>>, names: Vec<Option<&'a CStr>>) -> Self {
        Self { values, names }
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Text of column `idx`; `None` for SQL NULL or an out-of-range index.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Cow<'a, str>> {
        self.values.get(idx).copied().flatten().map(CStr::to_string_lossy)
    }

    /// Raw bytes of column `idx`, without the trailing NUL.
    #[must_use]
    pub fn get_bytes(&self, idx: usize) -> Option<&'a [u8]> {
        self.values.get(idx).copied().flatten().map(CStr::to_bytes)
    }

    #[must_use]
    pub fn column_name(&self, idx: usize) -> Option<Cow<'a, str>> {
        self.names.get(idx).copied().flatten().map(CStr::to_string_lossy)
    }

    /// Iterate column values in engine order.
    pub fn values(&self) -> impl Iterator<Item = Option<Cow<'a, str>>> + '_ {
        self.values.iter().map(|v| v.map(CStr::to_string_lossy))
    }

    /// Owned copy of every column value.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<String>> {
        self.values().map(|v| v.map(Cow::into_owned)).collect()
    }
}
