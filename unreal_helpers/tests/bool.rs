use std::io::Cursor;

use unreal_helpers::{error::FStringError, UnrealReadExt};

#[test]
fn test_read_bool() -> Result<(), FStringError> {
    let mut cursor = Cursor::new(vec![0u8, 1u8]);
    let (first, second) = (cursor.read_bool()?, cursor.read_bool()?);

    assert!(!first);
    assert!(second);

    Ok(())
}
