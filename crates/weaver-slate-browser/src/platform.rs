//! Platform detection from the browser's `navigator`.

use std::sync::OnceLock;

use weaver_slate_core::PlatformQuirks;

static QUIRKS: OnceLock<PlatformQuirks> = OnceLock::new();

/// Quirks of the running browser, detected once.
pub fn platform_quirks() -> &'static PlatformQuirks {
    QUIRKS.get_or_init(detect)
}

/// Use `quirks` instead of detection. Only effective before the first call
/// to [`platform_quirks`]; returns whether it was applied.
pub fn override_platform_quirks(quirks: PlatformQuirks) -> bool {
    QUIRKS.set(quirks).is_ok()
}

fn detect() -> PlatformQuirks {
    let Some(window) = web_sys::window() else {
        return PlatformQuirks::default();
    };
    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let platform = navigator.platform().unwrap_or_default();
    let touch_points = navigator.max_touch_points().max(0) as u32;
    let quirks = PlatformQuirks::from_user_agent(&user_agent, &platform, touch_points);
    tracing::debug!(
        target: "weaver::platform",
        android = quirks.android,
        ios = quirks.ios,
        firefox = quirks.firefox,
        webkit = quirks.webkit,
        chrome = quirks.chrome,
        before_input = quirks.has_before_input,
        "detected platform"
    );
    quirks
}
