use std::borrow::Cow;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::core::config::AllowList;

/// Cleans raw OCR text down to the configured allow-list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    allow: AllowList,
}

impl Normalizer {
    pub fn new(allow: AllowList) -> Self {
        Self { allow }
    }

    /// Drops every character outside the allow-list. Newlines survive, so this
    /// is safe to run on whole pages.
    pub fn strip(&self, text: &str) -> String {
        let folded: Cow<'_, str> = if self.allow.fold_diacritics && !text.is_ascii() {
            Cow::Owned(text.nfd().filter(|c| !is_combining_mark(*c)).collect())
        } else {
            Cow::Borrowed(text)
        };
        folded.chars().filter(|c| self.allow.permits(*c)).collect()
    }

    /// Line-level normalization: strip, repair missing spaces after periods,
    /// collapse whitespace. Idempotent.
    pub fn normalize(&self, text: &str) -> String {
        let stripped = self.strip(text);
        let spaced = space_after_periods(&stripped);
        spaced.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Inserts a space after every period that is directly followed by a
/// non-whitespace character (`A.B.Jansen` -> `A. B. Jansen`).
pub fn space_after_periods(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '.' {
            if let Some(next) = chars.peek() {
                if !next.is_whitespace() {
                    out.push(' ');
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paren_allowing() -> Normalizer {
        Normalizer::new(AllowList {
            hyphen: true,
            parentheses: true,
            fold_diacritics: true,
        })
    }

    #[test]
    fn strips_disallowed_characters() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize("Jansen* (A.) boek-binder; Hoofdstraat 12!"),
            "Jansen A. boekbinder Hoofdstraat 12"
        );
    }

    #[test]
    fn keeps_optional_characters_when_allowed() {
        assert_eq!(
            paren_allowing().normalize("Jansen (A.) boek-binder"),
            "Jansen (A. ) boek-binder"
        );
    }

    #[test]
    fn repairs_spacing_after_periods() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize("van Dijk A.B.kantoorbediende  Kerkstraat\t3"),
            "van Dijk A. B. kantoorbediende Kerkstraat 3"
        );
    }

    #[test]
    fn folds_diacritics_before_stripping() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize("Hélène Brûlé"), "Helene Brule");

        let strict = Normalizer::new(AllowList {
            fold_diacritics: false,
            ..AllowList::default()
        });
        assert_eq!(strict.normalize("Hélène"), "Hlne");
    }

    #[test]
    fn strip_keeps_newlines() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.strip("BAKKERS.\nJansen A., 12"), "BAKKERS.\nJansen A., 12");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Jansen A. boekbinder Hoofdstraat 12",
            "  van Dijk A.B.kantoorbediende,Kerkstraat 3.  ",
            "Pieters (J.H.) , tel.31033 ... O.Ebbingestr.5a",
            "ﬁrma Wed. Hélène \u{a0} Brûlé.\n\n(12)",
            "....",
            "",
        ];
        for normalizer in [Normalizer::default(), paren_allowing()] {
            for sample in samples {
                let once = normalizer.normalize(sample);
                assert_eq!(normalizer.normalize(&once), once, "input: {sample:?}");
            }
        }
    }

    #[test]
    fn output_stays_inside_allow_list() {
        let allow = AllowList::default();
        let normalizer = Normalizer::new(allow);
        let out = normalizer.normalize("J@nsen (A.) — bäcker; №12 «Kerk» straat\r\n");
        assert!(out.chars().all(|c| allow.permits(c)), "{out:?}");
    }
}
