use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{CompositionEditor, CompositionError, CompositionRow, RowEdit, validate_quantity};
use crate::confirm::Confirm;

/// One drafted line: a material and the quantity per product unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftEntry {
    pub raw_material_id: i64,
    pub quantity: Decimal,
}

/// In-memory composition for a product that has not been created yet.
///
/// Never issues remote calls. Insertion order is preserved and a material may
/// appear at most once.
#[derive(Debug, Clone, Default)]
pub struct DraftComposition {
    entries: Vec<DraftEntry>,
    editing: Option<usize>,
}

impl DraftComposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, raw_material_id: i64) -> bool {
        self.entries
            .iter()
            .any(|e| e.raw_material_id == raw_material_id)
    }

    /// Append a material. The draft is unchanged on error.
    pub fn add(&mut self, raw_material_id: i64, quantity: Decimal) -> Result<(), CompositionError> {
        if self.contains(raw_material_id) {
            return Err(CompositionError::DuplicateEntry { raw_material_id });
        }
        validate_quantity(quantity)?;
        self.entries.push(DraftEntry {
            raw_material_id,
            quantity,
        });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<DraftEntry, CompositionError> {
        self.check_index(index)?;
        let removed = self.entries.remove(index);
        self.editing = match self.editing {
            Some(e) if e == index => None,
            Some(e) if e > index => Some(e - 1),
            other => other,
        };
        Ok(removed)
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<RowEdit, CompositionError> {
        self.check_index(index)?;
        self.editing = Some(index);
        let entry = self.entries[index];
        Ok(RowEdit {
            row: index,
            raw_material_id: entry.raw_material_id,
            quantity: entry.quantity,
        })
    }

    /// Overwrite the quantity in place. The material is unchanged, so the
    /// uniqueness check is not repeated.
    pub fn commit_edit(&mut self, index: usize, quantity: Decimal) -> Result<(), CompositionError> {
        if self.editing != Some(index) {
            return Err(CompositionError::NotEditing { row: index });
        }
        validate_quantity(quantity)?;
        self.entries[index].quantity = quantity;
        self.editing = None;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.editing = None;
    }

    fn check_index(&self, index: usize) -> Result<(), CompositionError> {
        if index >= self.entries.len() {
            return Err(CompositionError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CompositionEditor for DraftComposition {
    fn rows(&self) -> Vec<CompositionRow> {
        self.entries
            .iter()
            .map(|e| CompositionRow {
                raw_material_id: e.raw_material_id,
                raw_material_name: None,
                quantity: e.quantity,
            })
            .collect()
    }

    fn editing(&self) -> Option<RowEdit> {
        let row = self.editing?;
        let entry = self.entries.get(row)?;
        Some(RowEdit {
            row,
            raw_material_id: entry.raw_material_id,
            quantity: entry.quantity,
        })
    }

    async fn add(
        &mut self,
        raw_material_id: i64,
        quantity: Decimal,
    ) -> Result<(), CompositionError> {
        DraftComposition::add(self, raw_material_id, quantity)
    }

    // Local removal; nothing is lost remotely, so no confirmation.
    async fn remove(&mut self, row: usize, _confirm: &dyn Confirm) -> Result<(), CompositionError> {
        DraftComposition::remove(self, row).map(|_| ())
    }

    fn begin_edit(&mut self, row: usize) -> Result<RowEdit, CompositionError> {
        DraftComposition::begin_edit(self, row)
    }

    async fn commit_edit(
        &mut self,
        row: usize,
        quantity: Decimal,
    ) -> Result<(), CompositionError> {
        DraftComposition::commit_edit(self, row, quantity)
    }

    fn cancel_edit(&mut self) {
        DraftComposition::cancel_edit(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut draft = DraftComposition::new();
        draft.add(3, q(1)).unwrap();
        draft.add(1, q(2)).unwrap();
        draft.add(2, q(3)).unwrap();
        let ids: Vec<i64> = draft.entries().iter().map(|e| e.raw_material_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn duplicate_add_is_rejected_and_draft_unchanged() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(5)).unwrap();
        let err = draft.add(1, q(5)).unwrap_err();
        assert_eq!(err, CompositionError::DuplicateEntry { raw_material_id: 1 });
        assert_eq!(draft.len(), 1);
        assert_eq!(draft.entries()[0].quantity, q(5));
    }

    #[test]
    fn duplicate_with_different_quantity_is_still_rejected() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(5)).unwrap();
        assert!(draft.add(1, q(9)).is_err());
        assert_eq!(draft.entries()[0].quantity, q(5));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut draft = DraftComposition::new();
        for bad in [Decimal::ZERO, q(-1), Decimal::new(-1, 2)] {
            assert_eq!(
                draft.add(7, bad),
                Err(CompositionError::InvalidQuantity(bad))
            );
        }
        assert!(draft.is_empty());
    }

    #[test]
    fn fractional_quantity_is_accepted() {
        let mut draft = DraftComposition::new();
        draft.add(1, Decimal::new(25, 2)).unwrap();
        assert_eq!(draft.entries()[0].quantity, Decimal::new(25, 2));
    }

    #[test]
    fn remove_out_of_range() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        assert_eq!(
            draft.remove(1),
            Err(CompositionError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn remove_then_readd_is_allowed() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.remove(0).unwrap();
        draft.add(1, q(4)).unwrap();
        assert_eq!(draft.entries()[0].quantity, q(4));
    }

    #[test]
    fn commit_edit_overwrites_in_place() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.add(2, q(2)).unwrap();

        let edit = draft.begin_edit(1).unwrap();
        assert_eq!(edit.raw_material_id, 2);
        assert_eq!(edit.quantity, q(2));

        draft.commit_edit(1, q(9)).unwrap();
        assert_eq!(draft.entries()[1].quantity, q(9));
        assert_eq!(draft.entries()[1].raw_material_id, 2);
        assert_eq!(draft.editing_index(), None);
    }

    #[test]
    fn commit_without_begin_is_rejected() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        assert_eq!(
            draft.commit_edit(0, q(3)),
            Err(CompositionError::NotEditing { row: 0 })
        );
    }

    #[test]
    fn commit_with_bad_quantity_stays_in_edit_mode() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.begin_edit(0).unwrap();
        assert!(draft.commit_edit(0, Decimal::ZERO).is_err());
        assert_eq!(draft.editing_index(), Some(0));
        assert_eq!(draft.entries()[0].quantity, q(1));
    }

    #[test]
    fn only_one_row_edits_at_a_time() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.add(2, q(2)).unwrap();
        draft.begin_edit(0).unwrap();
        draft.begin_edit(1).unwrap();
        assert_eq!(draft.editing_index(), Some(1));
        assert!(draft.commit_edit(0, q(5)).is_err());
    }

    #[test]
    fn cancel_edit_leaves_quantity() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.begin_edit(0).unwrap();
        draft.cancel_edit();
        assert_eq!(draft.editing_index(), None);
        assert_eq!(draft.entries()[0].quantity, q(1));
    }

    #[test]
    fn removing_rows_tracks_the_edit_target() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.add(2, q(2)).unwrap();
        draft.add(3, q(3)).unwrap();

        draft.begin_edit(2).unwrap();
        draft.remove(0).unwrap();
        assert_eq!(draft.editing_index(), Some(1));
        assert_eq!(draft.entries()[1].raw_material_id, 3);

        draft.remove(1).unwrap();
        assert_eq!(draft.editing_index(), None);
    }

    #[test]
    fn clear_empties_everything() {
        let mut draft = DraftComposition::new();
        draft.add(1, q(1)).unwrap();
        draft.begin_edit(0).unwrap();
        draft.clear();
        assert!(draft.is_empty());
        assert_eq!(draft.editing_index(), None);
    }

    #[tokio::test]
    async fn editor_interface_never_needs_confirmation() {
        let mut draft = DraftComposition::new();
        let editor: &mut dyn CompositionEditor = &mut draft;
        editor.add(1, q(2)).await.unwrap();
        editor.remove(0, &crate::Declined).await.unwrap();
        assert!(editor.rows().is_empty());
    }
}
