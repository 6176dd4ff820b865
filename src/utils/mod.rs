pub mod chars;
pub mod cursor;
pub mod percent;
