//! File operations module for docxiq
//!
//! This module provides native file dialogs for choosing where exported
//! documents are saved.

pub mod dialogs;
