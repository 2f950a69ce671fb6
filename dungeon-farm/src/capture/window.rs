// Picking the game window out of the desktop's window list
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowInfo {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_minimized: bool,
}

impl WindowInfo {
    fn is_capturable(&self) -> bool {
        !self.is_minimized && self.width > 0 && self.height > 0
    }
}

/// Position of the first capturable window whose title contains `needle`,
/// ignoring case.
pub fn find_window<'a>(windows: impl IntoIterator<Item = &'a WindowInfo>, needle: &str) -> Option<usize> {
    let needle = needle.trim().to_lowercase();
    windows
        .into_iter()
        .position(|w| w.is_capturable() && w.title.to_lowercase().contains(&needle))
}
