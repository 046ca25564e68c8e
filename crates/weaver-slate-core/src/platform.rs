//! Platform capabilities and the DOM queries the core cannot answer itself.
//!
//! `PlatformQuirks` is resolved once from the user agent by the browser
//! layer and handed to everything that branches on browser behaviour.

use std::time::Duration;

use crate::vdom::DomId;

/// Browser/OS capability table.
#[derive(Debug, Clone)]
pub struct PlatformQuirks {
    pub ios: bool,
    /// macOS or iOS: hotkeys use Cmd/Opt.
    pub apple: bool,
    pub android: bool,
    pub chrome: bool,
    /// WebKit without Chrome (Safari and iOS browsers).
    pub webkit: bool,
    pub firefox: bool,
    /// Firefox before 87, which fires composition events differently.
    pub firefox_legacy: bool,
    pub uc_mobile: bool,
    pub wechat: bool,
    pub chrome_version: Option<u32>,
    pub webkit_version: Option<u32>,
    pub mobile: bool,
    /// `beforeinput` fires and `getTargetRanges` is available.
    pub has_before_input: bool,
    /// Whether the zero-width line break carries a U+FEFF before its `<br>`.
    pub line_break_bom: bool,
    /// Characters the browser may insert natively for a plain `insertText`.
    pub native_char: fn(char) -> bool,
}

/// Letters and space only. Long-press accent pickers insert twice when
/// anything wider is let through.
pub fn ascii_letter_or_space(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' '
}

impl Default for PlatformQuirks {
    fn default() -> Self {
        Self {
            ios: false,
            apple: false,
            android: false,
            chrome: false,
            webkit: false,
            firefox: false,
            firefox_legacy: false,
            uc_mobile: false,
            wechat: false,
            chrome_version: None,
            webkit_version: None,
            mobile: false,
            has_before_input: true,
            line_break_bom: true,
            native_char: ascii_letter_or_space,
        }
    }
}

impl PlatformQuirks {
    /// Classify a browser from its user agent and `navigator.platform`.
    pub fn from_user_agent(user_agent: &str, platform: &str, max_touch_points: u32) -> Self {
        let ua = user_agent.to_lowercase();
        let platform = platform.to_lowercase();

        let ios = ua.contains("iphone")
            || ua.contains("ipad")
            || ua.contains("ipod")
            || (platform.contains("mac") && max_touch_points > 0);
        let apple = ios || platform.contains("mac");
        let android = ua.contains("android");
        let edge = ua.contains("edg/") || ua.contains("edge/");
        let chrome = ua.contains("chrome/") && !edge;
        let webkit = ua.contains("applewebkit") && !ua.contains("chrome");
        let firefox = ua.contains("firefox/") && !ua.contains("seamonkey");
        let firefox_version = extract_version(&ua, "firefox/");
        let chrome_version = extract_version(&ua, "chrome/");
        let webkit_version = extract_version(&ua, "applewebkit/");
        let edge_version = extract_version(&ua, "edge/");

        let chrome_legacy = chrome_version.is_some_and(|v| v < 76);
        let edge_legacy = edge_version.is_some_and(|v| v < 79);

        Self {
            ios,
            apple,
            android,
            chrome,
            webkit,
            firefox,
            firefox_legacy: firefox && firefox_version.is_some_and(|v| v < 87),
            uc_mobile: ua.contains("ucbrowser/"),
            wechat: ua.contains("micromessenger"),
            chrome_version,
            webkit_version,
            mobile: ios || android || ua.contains("mobile"),
            has_before_input: !chrome_legacy && !edge_legacy,
            line_break_bom: !(android || ios),
            native_char: ascii_letter_or_space,
        }
    }

    /// How long a placeholder waits before showing. Android keyboards close
    /// and reopen when the placeholder flickers during composition.
    pub fn placeholder_delay(&self) -> Duration {
        if self.android {
            Duration::from_millis(300)
        } else {
            Duration::ZERO
        }
    }

    /// Whether `data` may be inserted by the browser itself.
    pub fn is_native_insertable(&self, data: &str) -> bool {
        let mut chars = data.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => (self.native_char)(c),
            _ => false,
        }
    }

    pub fn with_before_input(mut self, supported: bool) -> Self {
        self.has_before_input = supported;
        self
    }

    pub fn with_line_break_bom(mut self, bom: bool) -> Self {
        self.line_break_bom = bom;
        self
    }

    pub fn with_native_chars(mut self, predicate: fn(char) -> bool) -> Self {
        self.native_char = predicate;
        self
    }
}

fn extract_version(ua: &str, prefix: &str) -> Option<u32> {
    let idx = ua.find(prefix)?;
    let digits: String = ua[idx + prefix.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Live DOM facts the browser layer answers on request.
pub trait DomEnvironment {
    /// Whether the computed `white-space` of a rendered element is `pre`.
    fn is_white_space_pre(&self, element: DomId) -> bool;
}

/// Environment for callers without a live DOM.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl DomEnvironment for Detached {
    fn is_white_space_pre(&self, _element: DomId) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
    const FIREFOX_OLD: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:78.0) Gecko/20100101 Firefox/78.0";

    #[test]
    fn classifies_common_browsers() {
        let safari = PlatformQuirks::from_user_agent(SAFARI, "MacIntel", 0);
        assert!(safari.webkit && safari.apple && !safari.chrome && !safari.ios);
        assert_eq!(safari.webkit_version, Some(605));

        let android = PlatformQuirks::from_user_agent(CHROME_ANDROID, "Linux armv8l", 5);
        assert!(android.android && android.chrome && !android.webkit && android.mobile);
        assert_eq!(android.chrome_version, Some(124));
        assert!(!android.line_break_bom);
        assert_eq!(android.placeholder_delay(), Duration::from_millis(300));

        let firefox = PlatformQuirks::from_user_agent(FIREFOX_OLD, "Linux x86_64", 0);
        assert!(firefox.firefox && firefox.firefox_legacy && firefox.has_before_input);
    }

    #[test]
    fn native_insertion_is_single_letters_or_space() {
        let quirks = PlatformQuirks::default();
        assert!(quirks.is_native_insertable("a"));
        assert!(quirks.is_native_insertable("Q"));
        assert!(quirks.is_native_insertable(" "));
        assert!(!quirks.is_native_insertable("ä"));
        assert!(!quirks.is_native_insertable("ab"));
        assert!(!quirks.is_native_insertable("1"));

        let wide = quirks.with_native_chars(|c| !c.is_control());
        assert!(wide.is_native_insertable("ä"));
    }
}
