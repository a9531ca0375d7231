//! Sparse-to-dense layout of records addressed by a row key and a column key.
//!
//! Callers supply the records already sorted row-major (by row key, then column key) together
//! with the ordered row and column vocabularies. The engine never re-sorts: records sharing a
//! row key must be adjacent, and the output follows the vocabulary order exactly.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Lookup failures raised when a caller breaks the layout contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("duplicate key {key} in index vocabulary")]
    DuplicateKey { key: String },
    #[error("row key {key} is not present in the row index")]
    UnknownRowKey { key: String },
    #[error("column key {key} is not present in the column index")]
    UnknownColumnKey { key: String },
}

/// Ordered vocabulary mapping each key onto a unique position in `[0, len)`.
#[derive(Debug, Clone)]
pub struct KeyIndex<K> {
    keys: Vec<K>,
    positions: HashMap<K, usize>,
}

impl<K> KeyIndex<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Assign sequential positions to `keys` in the order given.
    pub fn new<I>(keys: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = K>,
    {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for key in keys {
            if positions.contains_key(&key) {
                return Err(LayoutError::DuplicateKey {
                    key: format!("{key:?}"),
                });
            }
            positions.insert(key.clone(), ordered.len());
            ordered.push(key);
        }

        Ok(Self {
            keys: ordered,
            positions,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

/// Build a [`KeyIndex`] for the given vocabulary.
pub fn index_vector<K, I>(keys: I) -> Result<KeyIndex<K>, LayoutError>
where
    K: Eq + Hash + Clone + fmt::Debug,
    I: IntoIterator<Item = K>,
{
    KeyIndex::new(keys)
}

/// Spread a sparse row over `col_index.len()` cells, filling the gaps with `empty_value`.
pub fn sparse_to_full_vector<T, C, I, FC>(
    items: I,
    col_index: &KeyIndex<C>,
    col_key: FC,
    empty_value: T,
) -> Result<Vec<T>, LayoutError>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    C: Eq + Hash + Clone + fmt::Debug,
    FC: Fn(&T) -> C,
{
    fill_row(items, col_index, &col_key, &empty_value, &|item| item)
}

/// Lay a row-major sorted sparse sequence out as a dense `rows x columns` grid.
///
/// Rows in `row_index` without any item become all-`empty_value` rows. Grouping is by adjacent
/// runs of equal row keys; should a row key reappear after a different one, the later run wins.
pub fn sparse_to_full_matrix<T, R, C, I, FR, FC>(
    items: I,
    row_index: &KeyIndex<R>,
    row_key: FR,
    col_index: &KeyIndex<C>,
    col_key: FC,
    empty_value: T,
) -> Result<Vec<Vec<T>>, LayoutError>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    R: Eq + Hash + Clone + fmt::Debug,
    C: Eq + Hash + Clone + fmt::Debug,
    FR: Fn(&T) -> R,
    FC: Fn(&T) -> C,
{
    layout(
        items,
        row_index,
        &row_key,
        col_index,
        &col_key,
        empty_value,
        &|item| item,
    )
}

/// [`sparse_to_full_matrix`] with `None` as the empty-cell sentinel.
pub fn sparse_to_option_matrix<T, R, C, I, FR, FC>(
    items: I,
    row_index: &KeyIndex<R>,
    row_key: FR,
    col_index: &KeyIndex<C>,
    col_key: FC,
) -> Result<Vec<Vec<Option<T>>>, LayoutError>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    R: Eq + Hash + Clone + fmt::Debug,
    C: Eq + Hash + Clone + fmt::Debug,
    FR: Fn(&T) -> R,
    FC: Fn(&T) -> C,
{
    layout(items, row_index, &row_key, col_index, &col_key, None, &Some)
}

fn layout<T, V, R, C, I>(
    items: I,
    row_index: &KeyIndex<R>,
    row_key: &dyn Fn(&T) -> R,
    col_index: &KeyIndex<C>,
    col_key: &dyn Fn(&T) -> C,
    empty_value: V,
    place: &dyn Fn(T) -> V,
) -> Result<Vec<Vec<V>>, LayoutError>
where
    I: IntoIterator<Item = T>,
    V: Clone,
    R: Eq + Hash + Clone + fmt::Debug,
    C: Eq + Hash + Clone + fmt::Debug,
{
    let mut rows: Vec<Option<Vec<V>>> = vec![None; row_index.len()];
    let mut run_key: Option<R> = None;
    let mut run: Vec<T> = Vec::new();

    for item in items {
        let key = row_key(&item);
        if run_key.as_ref().is_some_and(|current| *current != key) {
            if let Some(finished) = run_key.take() {
                let run_items = std::mem::take(&mut run);
                store_run(
                    &mut rows,
                    row_index,
                    finished,
                    run_items,
                    col_index,
                    col_key,
                    &empty_value,
                    place,
                )?;
            }
        }
        run_key = Some(key);
        run.push(item);
    }

    if let Some(finished) = run_key {
        store_run(
            &mut rows,
            row_index,
            finished,
            run,
            col_index,
            col_key,
            &empty_value,
            place,
        )?;
    }

    let width = col_index.len();
    Ok(rows
        .into_iter()
        .map(|row| row.unwrap_or_else(|| vec![empty_value.clone(); width]))
        .collect())
}

#[allow(clippy::too_many_arguments)]
fn store_run<T, V, R, C>(
    rows: &mut [Option<Vec<V>>],
    row_index: &KeyIndex<R>,
    key: R,
    run: Vec<T>,
    col_index: &KeyIndex<C>,
    col_key: &dyn Fn(&T) -> C,
    empty_value: &V,
    place: &dyn Fn(T) -> V,
) -> Result<(), LayoutError>
where
    V: Clone,
    R: Eq + Hash + Clone + fmt::Debug,
    C: Eq + Hash + Clone + fmt::Debug,
{
    let position = row_index
        .position(&key)
        .ok_or_else(|| LayoutError::UnknownRowKey {
            key: format!("{key:?}"),
        })?;
    rows[position] = Some(fill_row(run, col_index, col_key, empty_value, place)?);
    Ok(())
}

fn fill_row<T, V, C, I>(
    items: I,
    col_index: &KeyIndex<C>,
    col_key: &dyn Fn(&T) -> C,
    empty_value: &V,
    place: &dyn Fn(T) -> V,
) -> Result<Vec<V>, LayoutError>
where
    I: IntoIterator<Item = T>,
    V: Clone,
    C: Eq + Hash + Clone + fmt::Debug,
{
    let mut row = vec![empty_value.clone(); col_index.len()];
    for item in items {
        let key = col_key(&item);
        let column = col_index
            .position(&key)
            .ok_or_else(|| LayoutError::UnknownColumnKey {
                key: format!("{key:?}"),
            })?;
        row[column] = place(item);
    }
    Ok(row)
}
