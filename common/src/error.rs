use thiserror::Error;

use crate::board::Point;

/// Reasons a game session cannot be set up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("grid must have at least one row and one column, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("{mines} mines do not fit on a {width}x{height} grid with a safe first cell")]
    TooManyMines {
        width: usize,
        height: usize,
        mines: usize,
    },

    #[error("first cell {start} is outside the {width}x{height} grid")]
    StartOutOfBounds {
        start: Point,
        width: usize,
        height: usize,
    },

    #[error("mine at {at} is outside the grid")]
    MineOutOfBounds { at: Point },

    #[error("mine at {at} is on the first cell, which must be safe")]
    MineOnStart { at: Point },

    #[error("mine at {at} is listed more than once")]
    DuplicateMine { at: Point },
}

/// Shared validation for anything constructed from the session parameters.
pub(crate) fn check_setup(
    width: usize,
    height: usize,
    mines: usize,
    start: Point,
) -> Result<(), SetupError> {
    if width == 0 || height == 0 {
        return Err(SetupError::EmptyGrid { width, height });
    }
    if mines >= width * height {
        return Err(SetupError::TooManyMines {
            width,
            height,
            mines,
        });
    }
    if start.col >= width || start.row >= height {
        return Err(SetupError::StartOutOfBounds {
            start,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_setups() {
        assert_eq!(
            check_setup(0, 3, 1, Point::new(0, 0)),
            Err(SetupError::EmptyGrid {
                width: 0,
                height: 3
            })
        );
        assert!(matches!(
            check_setup(3, 3, 9, Point::new(0, 0)),
            Err(SetupError::TooManyMines { mines: 9, .. })
        ));
        assert!(matches!(
            check_setup(3, 3, 1, Point::new(3, 0)),
            Err(SetupError::StartOutOfBounds { .. })
        ));
        assert!(check_setup(3, 3, 8, Point::new(2, 2)).is_ok());
    }

    #[test]
    fn test_error_messages_name_the_grid() {
        let err = check_setup(4, 2, 1, Point::new(1, 5)).unwrap_err();
        assert_eq!(err.to_string(), "first cell (1, 5) is outside the 4x2 grid");
    }
}
