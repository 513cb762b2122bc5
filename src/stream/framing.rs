/// Marker the server appends to the last text frame of an answer.
pub const END_OF_STREAM: &str = "<EOS>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Part of the answer, more frames follow.
    Content(&'a str),
    /// Final part of the answer with the marker removed.
    Last(&'a str),
}

/// Classifies one text frame. Only a trailing marker (ignoring surrounding
/// whitespace) ends the stream; a marker in the middle of a frame is content.
pub fn split_frame(text: &str) -> Fragment<'_> {
    match text.trim_end().strip_suffix(END_OF_STREAM) {
        Some(rest) => Fragment::Last(rest),
        None => Fragment::Content(text),
    }
}
