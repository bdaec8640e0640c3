//! The [`EditorSurface`] trait an embedding editor implements so the guard can
//! read and insert content without knowing the editor's document model.

/// Narrow capability interface over a rich-text editing surface.
///
/// # Example
///
/// ```
/// use html_guard::EditorSurface;
///
/// struct Buffer {
///     html: String,
/// }
///
/// impl EditorSurface for Buffer {
///     fn html(&self) -> String {
///         self.html.clone()
///     }
///
///     fn insert_content(&mut self, html: &str) {
///         self.html.push_str(html);
///     }
/// }
/// ```
pub trait EditorSurface {
    /// Serialize the current document to HTML.
    ///
    /// The result is untrusted and goes through the guard's pipeline before
    /// it is handed anywhere else.
    fn html(&self) -> String;

    /// Insert already-sanitized content at the current selection.
    fn insert_content(&mut self, html: &str);
}
