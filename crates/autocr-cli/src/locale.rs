//! Report-language detection.
//!
//! Priority: `--lang` flag, `AUTO_CR_LANG` environment variable, system
//! locale, then the default (`zh`).

use autocr_core::messages::Locale;

pub const LANG_ENV: &str = "AUTO_CR_LANG";

pub fn detect(cli_lang: Option<&str>) -> Locale {
    cli_lang
        .and_then(Locale::parse)
        .or_else(|| {
            std::env::var(LANG_ENV)
                .ok()
                .and_then(|value| Locale::parse(&value))
        })
        .or_else(|| sys_locale::get_locale().and_then(|value| Locale::parse(&value)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cli_flag_takes_priority() {
        unsafe { std::env::set_var(LANG_ENV, "zh") };
        assert_eq!(detect(Some("en")), Locale::En);
        unsafe { std::env::remove_var(LANG_ENV) };
    }

    #[test]
    #[serial]
    fn env_variable_is_consulted() {
        unsafe { std::env::set_var(LANG_ENV, "en-US") };
        assert_eq!(detect(None), Locale::En);
        unsafe { std::env::remove_var(LANG_ENV) };
    }

    #[test]
    #[serial]
    fn unknown_flag_falls_through() {
        unsafe { std::env::set_var(LANG_ENV, "en") };
        assert_eq!(detect(Some("fr")), Locale::En);
        unsafe { std::env::remove_var(LANG_ENV) };
    }
}
