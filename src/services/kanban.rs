//! Drag-and-drop reordering across status columns.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KanbanError {
    #[error("card {0} is not on the board")]
    UnknownCard(String),
}

/// Final placement of a card after a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement<K> {
    pub id: String,
    pub column: K,
    pub position: usize,
}

/// Ordered card ids per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board<K: Ord> {
    columns: BTreeMap<K, Vec<String>>,
}

impl<K: Ord + Clone> Board<K> {
    /// Builds a board from `(id, column, position)` rows; ties keep input order.
    pub fn from_cards<I>(columns: &[K], cards: I) -> Self
    where
        I: IntoIterator<Item = (String, K, i64)>,
    {
        let mut grouped: BTreeMap<K, Vec<(i64, String)>> =
            columns.iter().cloned().map(|c| (c, Vec::new())).collect();
        for (id, column, position) in cards {
            grouped.entry(column).or_default().push((position, id));
        }
        let columns = grouped
            .into_iter()
            .map(|(column, mut cards)| {
                cards.sort_by_key(|(position, _)| *position);
                (column, cards.into_iter().map(|(_, id)| id).collect())
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, key: &K) -> &[String] {
        self.columns.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&K, &[String])> {
        self.columns.iter().map(|(k, v)| (k, v.as_slice()))
    }

    fn locate(&self, id: &str) -> Option<(K, usize)> {
        self.columns.iter().find_map(|(column, ids)| {
            ids.iter().position(|c| c == id).map(|idx| (column.clone(), idx))
        })
    }

    /// Moves `id` to `index` in column `to` (clamped to the column length) and
    /// returns every placement in the source and target columns, dense from 0.
    pub fn move_card(&mut self, id: &str, to: K, index: usize) -> Result<Vec<Placement<K>>, KanbanError> {
        let (from, from_idx) = self
            .locate(id)
            .ok_or_else(|| KanbanError::UnknownCard(id.to_string()))?;

        let card = self
            .columns
            .get_mut(&from)
            .map(|ids| ids.remove(from_idx))
            .ok_or_else(|| KanbanError::UnknownCard(id.to_string()))?;

        let target = self.columns.entry(to.clone()).or_default();
        let index = index.min(target.len());
        target.insert(index, card);

        let mut touched = vec![from.clone()];
        if to != from {
            touched.push(to);
        }
        Ok(touched
            .into_iter()
            .flat_map(|column| {
                self.column(&column)
                    .iter()
                    .enumerate()
                    .map(|(position, id)| Placement {
                        id: id.clone(),
                        column: column.clone(),
                        position,
                    })
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}
