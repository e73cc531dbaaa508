pub mod playback;
pub mod search;
pub mod voice;

/// Label shown on the device: `《title》 - artist`, artist omitted when empty.
pub fn display_text(title: &str, artist: Option<&str>) -> String {
    match artist.filter(|a| !a.is_empty()) {
        Some(artist) => format!("《{}》 - {}", title, artist),
        None => format!("《{}》", title),
    }
}
