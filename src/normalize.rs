//! Punctuation canonicalization.
//!
//! Vendor alarm text mixes full-width and half-width punctuation freely and
//! sometimes wraps lines mid-sentence. Markers in the catalog are written in
//! half-width form, so every message passes through here before matching.
//!
//! The mapping is deliberately narrow:
//!
//! ```text
//! \r \n      -> (removed)
//! ：         -> :
//! ；         -> ;
//! 。         -> .
//! ，         -> ,
//! “ ”        -> "
//! ```
//!
//! Nothing else is touched. The output contains none of the input characters
//! above, which makes the transform idempotent.

bitflags::bitflags! {
    /// Which rewrites fired while normalizing a message.
    ///
    /// Only used for reporting; the normalized text is the same either way.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Rewrites: u8 {
        const LINE_BREAKS = 1 << 0;
        const COLON       = 1 << 1;
        const SEMICOLON   = 1 << 2;
        const PERIOD      = 1 << 3;
        const COMMA       = 1 << 4;
        const QUOTES      = 1 << 5;
    }
}

/// Canonicalize `input` for matching.
pub fn normalize(input: &str) -> String {
    normalize_with_report(input).0
}

/// Canonicalize `input` and report which rewrites were applied.
pub fn normalize_with_report(input: &str) -> (String, Rewrites) {
    let mut out = String::with_capacity(input.len());
    let mut rewrites = Rewrites::empty();

    for c in input.chars() {
        match c {
            '\r' | '\n' => rewrites |= Rewrites::LINE_BREAKS,
            '：' => {
                rewrites |= Rewrites::COLON;
                out.push(':');
            }
            '；' => {
                rewrites |= Rewrites::SEMICOLON;
                out.push(';');
            }
            '。' => {
                rewrites |= Rewrites::PERIOD;
                out.push('.');
            }
            '，' => {
                rewrites |= Rewrites::COMMA;
                out.push(',');
            }
            '“' | '”' => {
                rewrites |= Rewrites::QUOTES;
                out.push('"');
            }
            other => out.push(other),
        }
    }

    (out, rewrites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_full_width_punctuation() {
        let (out, rewrites) = normalize_with_report("日期：2024-03-18；设备“SZ608”，完成。");
        assert_eq!(out, "日期:2024-03-18;设备\"SZ608\",完成.");
        assert_eq!(rewrites, Rewrites::COLON | Rewrites::SEMICOLON | Rewrites::QUOTES | Rewrites::COMMA | Rewrites::PERIOD);
    }

    #[test]
    fn strips_line_breaks_only() {
        let (out, rewrites) = normalize_with_report("位置/区域:\r\n1号冷库 /\nA区");
        assert_eq!(out, "位置/区域:1号冷库 /A区");
        assert_eq!(rewrites, Rewrites::LINE_BREAKS);
    }

    #[test]
    fn leaves_other_text_alone() {
        let input = "阈值条件: 高于 8.0°C (温度) 「注意」 ！";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "",
            "重复消息：设备“SZ608”的通道1上有通信警报。\r\n设备描述：冷库探头",
            "阈值警报：9.2°C-2024-03-18 09:14:58+08:00",
            "plain ascii, already: normalized.",
        ];
        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalizing twice changed {sample:?}");
            assert!(normalize_with_report(&once).1.is_empty());
        }
    }
}
