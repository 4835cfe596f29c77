/// Minimum flow-text length, in characters, for an extraction to count as a
/// success. Shorter output is almost always navigation or a consent wall.
pub const MIN_CONTENT_CHARS: usize = 100;

pub fn is_too_short(text: &str) -> bool {
    text.trim().chars().count() < MIN_CONTENT_CHARS
}
