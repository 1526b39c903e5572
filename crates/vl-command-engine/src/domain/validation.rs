//! Structural checks shared by commands.

use crate::domain::application::Application;
use crate::domain::entities::{Image, ImageType};
use thiserror::Error;

/// Ordered-list position problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderingError {
    #[error("list is empty")]
    Empty,
    #[error("positions must start at 1, found {found}")]
    WrongStart { found: u32 },
    #[error("positions must be sequential, expected {expected} found {found}")]
    Gap { expected: u32, found: u32 },
}

/// Positions, in list order, must read 1, 2, 3, ...
pub fn check_sequential_positions(
    positions: impl IntoIterator<Item = u32>,
) -> Result<(), OrderingError> {
    let mut expected = 1u32;
    for found in positions {
        if found != expected {
            return Err(if expected == 1 {
                OrderingError::WrongStart { found }
            } else {
                OrderingError::Gap { expected, found }
            });
        }
        expected += 1;
    }
    if expected == 1 {
        return Err(OrderingError::Empty);
    }
    Ok(())
}

/// Dynamic images must name a file the application uploaded.
///
/// Returns the first missing file name.
pub fn find_missing_image<'a>(
    app: &Application,
    images: impl IntoIterator<Item = &'a Image>,
) -> Option<&'a str> {
    images
        .into_iter()
        .filter(|image| image.image_type == ImageType::Dynamic)
        .find(|image| !app.has_file(&image.value))
        .map(|image| image.value.as_str())
}

/// True for empty or whitespace-only text
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
