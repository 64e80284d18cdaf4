//! A1 notation helpers.

use crate::errors::{SheetsError, SheetsResult};

/// Converts 1-based (row, col) coordinates to an A1 cell label.
pub fn rowcol_to_a1(row: u32, col: u32) -> SheetsResult<String> {
    if row == 0 || col == 0 {
        return Err(SheetsError::InvalidArgument(format!(
            "cell coordinates are 1-based, got ({row}, {col})"
        )));
    }
    Ok(format!("{}{row}", column_letters(col)))
}

fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Quotes a sheet title for use as a range prefix (`Sheet1` -> `'Sheet1'`).
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Anchors `range` to the sheet unless it already names one.
pub fn absolute_range(title: &str, range: &str) -> String {
    if range.contains('!') {
        range.to_string()
    } else {
        format!("{}!{range}", quote_title(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_coordinates() {
        assert_eq!(rowcol_to_a1(1, 1).unwrap(), "A1");
        assert_eq!(rowcol_to_a1(7, 26).unwrap(), "Z7");
        assert_eq!(rowcol_to_a1(3, 28).unwrap(), "AB3");
        assert_eq!(rowcol_to_a1(10, 702).unwrap(), "ZZ10");
        assert_eq!(rowcol_to_a1(1, 703).unwrap(), "AAA1");
    }

    #[test]
    fn zero_coordinates_are_rejected() {
        assert!(matches!(rowcol_to_a1(0, 1), Err(SheetsError::InvalidArgument(_))));
        assert!(matches!(rowcol_to_a1(1, 0), Err(SheetsError::InvalidArgument(_))));
    }

    #[test]
    fn ranges_are_anchored_to_the_sheet() {
        assert_eq!(absolute_range("Log", "A1:B2"), "'Log'!A1:B2");
        assert_eq!(absolute_range("Log", "Other!A1:B2"), "Other!A1:B2");
        assert_eq!(absolute_range("Bob's", "A1"), "'Bob''s'!A1");
    }
}
