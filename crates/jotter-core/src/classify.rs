//! Attachment classification.
//!
//! A note's `type` is a pure function of its attachment list, re-evaluated
//! and written back on every save. The priority order below is fixed; first
//! match wins regardless of list order.

use crate::models::{Attachment, NoteType, LINK_TYPE};

/// Derive a note's type from its attachments.
///
/// # Priority
///
/// 1. Any `image/*` attachment → [`NoteType::Image`]
/// 2. Else any `text/plain` attachment → [`NoteType::Text`]
/// 3. Else any attachment with a non-empty type that is neither
///    `text/plain`, `image/*`, nor the `"link"` sentinel → [`NoteType::File`]
/// 4. Else any `"link"` attachment → [`NoteType::Link`]
/// 5. Else → [`NoteType::Text`] (a pure-text note)
///
/// # Examples
///
/// ```
/// use jotter_core::{classify, Attachment, NoteType};
///
/// assert_eq!(classify(&[]), NoteType::Text);
/// assert_eq!(classify(&[Attachment::link("https://a.example")]), NoteType::Link);
/// ```
pub fn classify(attachments: &[Attachment]) -> NoteType {
    if attachments
        .iter()
        .any(|a| a.content_type.starts_with("image/"))
    {
        NoteType::Image
    } else if attachments.iter().any(|a| a.content_type == "text/plain") {
        NoteType::Text
    } else if attachments.iter().any(|a| {
        !a.content_type.is_empty()
            && a.content_type != "text/plain"
            && !a.content_type.starts_with("image/")
            && a.content_type != LINK_TYPE
    }) {
        NoteType::File
    } else if attachments.iter().any(|a| a.content_type == LINK_TYPE) {
        NoteType::Link
    } else {
        NoteType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn att(content_type: &str) -> Attachment {
        Attachment {
            name: "a".to_string(),
            content_type: content_type.to_string(),
            url: "http://h.example/a".to_string(),
            size: 1,
            file_path: "u/a".to_string(),
        }
    }

    #[test]
    fn test_empty_list_is_text() {
        assert_eq!(classify(&[]), NoteType::Text);
    }

    #[test]
    fn test_image_wins_over_everything() {
        let atts = vec![
            att("application/pdf"),
            att("text/plain"),
            Attachment::link("https://a.example"),
            att("image/png"),
        ];
        assert_eq!(classify(&atts), NoteType::Image);
    }

    #[test]
    fn test_image_priority_is_order_independent() {
        let mut atts = vec![att("image/jpeg"), att("application/zip")];
        assert_eq!(classify(&atts), NoteType::Image);
        atts.reverse();
        assert_eq!(classify(&atts), NoteType::Image);
    }

    #[test]
    fn test_plain_text_wins_over_file_and_link() {
        let atts = vec![
            Attachment::link("https://a.example"),
            att("application/pdf"),
            att("text/plain"),
        ];
        assert_eq!(classify(&atts), NoteType::Text);
    }

    #[test]
    fn test_other_mime_is_file() {
        assert_eq!(classify(&[att("application/pdf")]), NoteType::File);
        assert_eq!(classify(&[att("audio/mpeg")]), NoteType::File);
        assert_eq!(classify(&[att("text/markdown")]), NoteType::File);
    }

    #[test]
    fn test_link_only_is_link() {
        let atts = vec![Attachment::link("https://a.example")];
        assert_eq!(classify(&atts), NoteType::Link);
    }

    #[test]
    fn test_empty_type_never_counts_as_file() {
        assert_eq!(classify(&[att("")]), NoteType::Text);
    }

    #[test]
    fn test_adding_image_flips_file_classification() {
        let mut atts = vec![att("application/pdf")];
        assert_eq!(classify(&atts), NoteType::File);
        atts.push(att("image/gif"));
        assert_eq!(classify(&atts), NoteType::Image);
    }

    #[test]
    fn test_adding_image_flips_link_classification() {
        let mut atts = vec![Attachment::link("https://a.example")];
        assert_eq!(classify(&atts), NoteType::Link);
        atts.push(att("image/webp"));
        assert_eq!(classify(&atts), NoteType::Image);
    }

    #[test]
    fn test_removing_last_plain_text_falls_to_next_category() {
        let atts = vec![att("text/plain"), att("application/pdf")];
        assert_eq!(classify(&atts), NoteType::Text);
        assert_eq!(classify(&atts[1..]), NoteType::File);

        let atts = vec![att("text/plain"), Attachment::link("https://a.example")];
        assert_eq!(classify(&atts), NoteType::Text);
        assert_eq!(classify(&atts[1..]), NoteType::Link);

        let atts = vec![att("text/plain")];
        assert_eq!(classify(&atts[1..]), NoteType::Text);
    }

    #[test]
    fn test_deterministic() {
        let atts = vec![att("application/pdf"), Attachment::link("https://a.example")];
        assert_eq!(classify(&atts), classify(&atts));
    }
}
