/// Canonical streaming URL for a title and optional artist.
///
/// Both parameters are always present; a missing artist is sent as `artist=`.
pub fn build_stream_url(base_url: &str, song: &str, artist: Option<&str>) -> String {
    format!(
        "{}/stream_pcm?song={}&artist={}",
        base_url,
        urlencoding::encode(song),
        urlencoding::encode(artist.unwrap_or_default())
    )
}
