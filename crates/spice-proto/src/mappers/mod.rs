//! Host→guest input mappers and clipboard-format conversions.

pub mod clipboard;
pub mod keycode;
pub mod modifiers;
