//! Admission of uploaded images that arrive as data URLs.

/// Strip `data_url` down to data-URL characters and admit it only if it is a
/// base64-encoded image.
///
/// ```
/// use html_guard::admit_image_data_url;
///
/// assert_eq!(
///     admit_image_data_url("data:image/png;base64,iVBO\"><x>"),
///     Some("data:image/png;base64,iVBOx".to_string())
/// );
/// assert_eq!(admit_image_data_url("data:text/html;base64,PHA+"), None);
/// ```
pub fn admit_image_data_url(data_url: &str) -> Option<String> {
    let cleaned: String = data_url
        .chars()
        .filter(|&c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '/' | '=' | ':' | ';' | ',' | '-')
        })
        .collect();

    if cleaned.starts_with("data:image/") && cleaned.contains("base64,") {
        Some(cleaned)
    } else {
        tracing::debug!("Rejected image upload that is not a base64 image data URL");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_base64_images() {
        let url = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        assert_eq!(admit_image_data_url(url).as_deref(), Some(url));
    }

    #[test]
    fn strips_markup_characters() {
        let admitted = admit_image_data_url("data:image/gif;base64,R0lG\"onload='x()'").unwrap();
        assert!(!admitted.contains('"'));
        assert!(!admitted.contains('\''));
        assert!(!admitted.contains('('));
    }

    #[test]
    fn rejects_non_images_and_non_base64() {
        assert_eq!(admit_image_data_url("data:text/html;base64,PHNjcmlwdD4="), None);
        assert_eq!(admit_image_data_url("data:image/svg+xml,<svg/onload=alert(1)>"), None);
        assert_eq!(admit_image_data_url("https://example.com/a.png"), None);
        assert_eq!(admit_image_data_url(""), None);
    }

    #[test]
    fn leading_whitespace_is_removed_before_checking() {
        assert!(admit_image_data_url("  data:image/png;base64,AAAA").is_some());
    }
}
