//! Element, attribute and URL policy for untrusted HTML
//!
//! This module decides, one element or attribute at a time, what survives
//! sanitization. It does not walk trees; [`crate::sanitizer`] does that and
//! asks the [`SecurityValidator`] about every node it meets.
//!
//! # Threat Model
//!
//! Description text is written by listing authors and is only semi-trusted.
//! Whatever HTML reaches the sanitizer may contain:
//! - Script-bearing elements (`<script>`, `<iframe>`, `<svg onload>`)
//! - Event handler attributes (`onclick`, `onerror`, any `on*`)
//! - Script-executing URLs (`javascript:`, `vbscript:`, `data:text/html`)
//! - Obfuscated schemes (`JaVaScRiPt:`, `java\tscript:`, `&#106;avascript:`)
//!
//! # Policy
//!
//! 1. **Elements**: only tags in [`crate::allowlist`] are kept; anything else is
//!    removed together with its descendants.
//! 2. **Attributes**: only the per-tag allow-list is kept; `on*` is stripped
//!    unconditionally, before the allow-list is even consulted.
//! 3. **URLs**: `href`/`src` keep only `http`, `https`, scheme-less references,
//!    `mailto` (links only) and raster `data:image/*` (images only).
//! 4. **Values**: `class` on `code` must look like `language-xxx`; `start` on
//!    `ol` must be a small decimal number.
//!
//! Entity references are already decoded by html5ever before the policy sees
//! an attribute value, so `&#106;avascript:` is checked as `javascript:`.

use crate::allowlist::Tag;
use crate::error::TransformError;

/// Maximum allowed nesting depth for HTML elements
/// Prevents stack overflow from deeply nested structures
pub const MAX_NESTING_DEPTH: usize = 512;

/// URL schemes allowed on any URL attribute
const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https"];

/// Raster image types allowed in `data:` URLs on `img src`
///
/// `image/svg+xml` is intentionally absent: SVG documents can carry script.
const ALLOWED_DATA_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Action to take when sanitizing an element or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeAction {
    /// Keep as-is
    Allow,
    /// Remove the element and all its children
    Remove,
    /// Drop the attribute (not allow-listed, event handler, or bad value)
    StripAttribute,
    /// Drop a URL attribute whose scheme is not permitted
    StripUrl,
}

/// Scheme classification of a URL attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlScheme {
    /// No scheme: relative path, fragment, query or protocol-relative
    Relative,
    /// Explicit scheme, lowercased (e.g. `"https"`, `"javascript"`)
    Named(String),
}

/// Security validator for untrusted HTML
///
/// Provides the per-node decisions used by the sanitizer.
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    /// Maximum allowed nesting depth
    max_depth: usize,
    /// Permit raster `data:image/*` sources on `img`
    allow_data_images: bool,
}

impl SecurityValidator {
    /// Create a new security validator with default settings
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            allow_data_images: true,
        }
    }

    /// Create a security validator with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::new()
        }
    }

    /// Enable or disable raster `data:` image sources
    pub fn allow_data_images(mut self, allow: bool) -> Self {
        self.allow_data_images = allow;
        self
    }

    /// Check if an element should be kept
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::security::{SecurityValidator, SanitizeAction};
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(validator.check_element("script"), SanitizeAction::Remove);
    /// assert_eq!(validator.check_element("div"), SanitizeAction::Remove);
    /// assert_eq!(validator.check_element("strong"), SanitizeAction::Allow);
    /// ```
    pub fn check_element(&self, tag_name: &str) -> SanitizeAction {
        match Tag::from_name(tag_name) {
            Some(_) => SanitizeAction::Allow,
            None => SanitizeAction::Remove,
        }
    }

    /// Check if an attribute is an inline event handler
    ///
    /// Any name beginning with `on` counts, whatever the case; the list of
    /// handler names grows with every browser release.
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::new();
    /// assert!(validator.is_event_handler("onclick"));
    /// assert!(validator.is_event_handler("ONERROR"));
    /// assert!(validator.is_event_handler("onpointerrawupdate"));
    /// assert!(!validator.is_event_handler("href"));
    /// ```
    pub fn is_event_handler(&self, attr_name: &str) -> bool {
        attr_name
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
    }

    /// Decide whether an attribute survives on an allow-listed element
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::allowlist::Tag;
    /// use safe_markdown::security::{SecurityValidator, SanitizeAction};
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(
    ///     validator.check_attribute(Tag::A, "href", "https://example.com"),
    ///     SanitizeAction::Allow
    /// );
    /// assert_eq!(
    ///     validator.check_attribute(Tag::A, "href", "javascript:alert(1)"),
    ///     SanitizeAction::StripUrl
    /// );
    /// assert_eq!(
    ///     validator.check_attribute(Tag::Img, "onerror", "alert(1)"),
    ///     SanitizeAction::StripAttribute
    /// );
    /// ```
    pub fn check_attribute(&self, tag: Tag, attr_name: &str, value: &str) -> SanitizeAction {
        if self.is_event_handler(attr_name) || !tag.allows_attribute(attr_name) {
            return SanitizeAction::StripAttribute;
        }

        if tag.is_url_attribute(attr_name) {
            return if self.is_allowed_url(tag, attr_name, value) {
                SanitizeAction::Allow
            } else {
                SanitizeAction::StripUrl
            };
        }

        let value_ok = match (tag, attr_name.to_ascii_lowercase().as_str()) {
            (Tag::Code, "class") => is_language_class(value),
            (Tag::Ol, "start") => is_list_start(value),
            _ => true,
        };

        if value_ok {
            SanitizeAction::Allow
        } else {
            SanitizeAction::StripAttribute
        }
    }

    /// Classify the scheme of a URL the way a browser would resolve it
    ///
    /// ASCII whitespace and control characters are ignored anywhere in the
    /// value (browsers strip tabs and newlines from URLs), and the scheme is
    /// lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::security::{SecurityValidator, UrlScheme};
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(validator.url_scheme("/cars/42"), UrlScheme::Relative);
    /// assert_eq!(
    ///     validator.url_scheme(" Java\tScript:alert(1)"),
    ///     UrlScheme::Named("javascript".to_string())
    /// );
    /// ```
    pub fn url_scheme(&self, url: &str) -> UrlScheme {
        let compact = compact_url(url);

        let Some(colon) = compact.find(':') else {
            return UrlScheme::Relative;
        };
        let candidate = &compact[..colon];

        // A path, query or fragment delimiter before the colon makes it relative
        if candidate.contains(['/', '?', '#']) {
            return UrlScheme::Relative;
        }

        let mut chars = candidate.chars();
        let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

        if valid_scheme {
            UrlScheme::Named(candidate.to_ascii_lowercase())
        } else {
            UrlScheme::Relative
        }
    }

    /// Check a URL attribute value against the scheme allow-list
    pub fn is_allowed_url(&self, tag: Tag, attr_name: &str, url: &str) -> bool {
        let scheme = match self.url_scheme(url) {
            UrlScheme::Relative => return true,
            UrlScheme::Named(scheme) => scheme,
        };

        if ALLOWED_URL_SCHEMES.contains(&scheme.as_str()) {
            return true;
        }

        match scheme.as_str() {
            "mailto" => tag == Tag::A && attr_name.eq_ignore_ascii_case("href"),
            "data" => {
                self.allow_data_images
                    && tag == Tag::Img
                    && attr_name.eq_ignore_ascii_case("src")
                    && is_raster_data_image(url)
            }
            _ => false,
        }
    }

    /// Check if a URL would be rejected on a link
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::new();
    /// assert!(validator.is_dangerous_url("javascript:alert('xss')"));
    /// assert!(validator.is_dangerous_url("data:text/html,<script>alert('xss')</script>"));
    /// assert!(!validator.is_dangerous_url("https://example.com"));
    /// assert!(!validator.is_dangerous_url("/relative/path"));
    /// ```
    pub fn is_dangerous_url(&self, url: &str) -> bool {
        !self.is_allowed_url(Tag::A, "href", url)
    }

    /// Sanitize a link URL by rejecting dangerous schemes
    ///
    /// Returns `None` if the URL is dangerous, `Some(url)` if safe.
    pub fn sanitize_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        if self.is_dangerous_url(url) {
            None
        } else {
            Some(url)
        }
    }

    /// Validate nesting depth to prevent stack overflow
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::with_max_depth(100);
    /// assert!(validator.validate_depth(50).is_ok());
    /// assert!(validator.validate_depth(150).is_err());
    /// ```
    pub fn validate_depth(&self, depth: usize) -> Result<(), TransformError> {
        if depth > self.max_depth {
            Err(TransformError::NestingTooDeep {
                depth,
                max: self.max_depth,
            })
        } else {
            Ok(())
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn compact_url(url: &str) -> String {
    url.chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect()
}

fn is_raster_data_image(url: &str) -> bool {
    let compact = compact_url(url).to_ascii_lowercase();
    let Some(rest) = compact.strip_prefix("data:") else {
        return false;
    };
    let mime_end = rest.find([';', ',']).unwrap_or(rest.len());
    ALLOWED_DATA_IMAGE_TYPES.contains(&&rest[..mime_end])
}

/// `language-xxx` with a conservative character set
pub(crate) fn is_language_class(value: &str) -> bool {
    value.strip_prefix("language-").is_some_and(is_language_name)
}

pub(crate) fn is_language_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
}

fn is_list_start(value: &str) -> bool {
    !value.is_empty() && value.len() <= 9 && value.chars().all(|c| c.is_ascii_digit())
}
