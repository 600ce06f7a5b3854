use serde::Serialize;

/// Which PV line is being stepped through and how many of its moves are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SteppingCursor {
    selected: Option<usize>,
    revealed: usize,
}

impl SteppingCursor {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Selecting the current line again deselects it.
    pub fn select(&mut self, index: usize) {
        self.selected = if self.selected == Some(index) { None } else { Some(index) };
        self.revealed = 0;
    }

    /// Reveals one more move, up to `line_len`. Returns true if anything changed.
    pub fn advance(&mut self, line_len: usize) -> bool {
        if self.selected.is_none() || self.revealed >= line_len {
            return false;
        }
        self.revealed += 1;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_toggles() {
        let mut cursor = SteppingCursor::default();
        cursor.select(1);
        assert_eq!(cursor.selected(), Some(1));
        cursor.advance(4);
        cursor.select(1);
        assert_eq!(cursor.selected(), None);
        assert_eq!(cursor.revealed(), 0);
    }

    #[test]
    fn test_switching_lines_restarts() {
        let mut cursor = SteppingCursor::default();
        cursor.select(0);
        cursor.advance(3);
        cursor.select(2);
        assert_eq!(cursor.selected(), Some(2));
        assert_eq!(cursor.revealed(), 0);
    }

    #[test]
    fn test_advance_is_bounded() {
        let mut cursor = SteppingCursor::default();
        assert!(!cursor.advance(3));

        cursor.select(0);
        assert!(cursor.advance(2));
        assert!(cursor.advance(2));
        assert!(!cursor.advance(2));
        assert_eq!(cursor.revealed(), 2);
    }

    #[test]
    fn test_reset() {
        let mut cursor = SteppingCursor::default();
        cursor.select(0);
        cursor.advance(5);
        cursor.reset();
        assert_eq!(cursor, SteppingCursor::default());
    }
}
