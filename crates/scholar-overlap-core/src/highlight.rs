/// Decides whether a span's color marks it as part of a title run.
///
/// The segmentation algorithm only ever asks this question, so supporting a
/// different export layout or link color means swapping the classifier.
pub trait HighlightClassifier: Send + Sync {
    fn is_highlighted(&self, color: u32) -> bool;
}

/// Split a packed `0xRRGGBB` color into its channels.
pub fn rgb_channels(color: u32) -> (u8, u8, u8) {
    let r = ((color >> 16) & 0xFF) as u8;
    let g = ((color >> 8) & 0xFF) as u8;
    let b = (color & 0xFF) as u8;
    (r, g, b)
}

/// Link-colored text: the blue channel strictly exceeds both red and green.
///
/// Google Scholar renders publication titles as links, and its PDF exports
/// keep the link color while author and venue lines are gray or black.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlueDominant;

impl HighlightClassifier for BlueDominant {
    fn is_highlighted(&self, color: u32) -> bool {
        let (r, g, b) = rgb_channels(color);
        b > r && b > g
    }
}

/// Matches exactly one packed color, ignoring any alpha byte.
#[derive(Debug, Clone, Copy)]
pub struct ExactColor(pub u32);

impl HighlightClassifier for ExactColor {
    fn is_highlighted(&self, color: u32) -> bool {
        color & 0x00FF_FFFF == self.0 & 0x00FF_FFFF
    }
}

/// The default predicate ([`BlueDominant`]).
pub fn is_highlighted(color: u32) -> bool {
    BlueDominant.is_highlighted(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_blue_is_highlighted() {
        assert!(is_highlighted(0x0000FF));
    }

    #[test]
    fn test_pure_red_is_not_highlighted() {
        assert!(!is_highlighted(0xFF0000));
    }

    #[test]
    fn test_gray_is_not_highlighted() {
        assert!(!is_highlighted(0x808080));
        assert!(!is_highlighted(0x000000));
        assert!(!is_highlighted(0xFFFFFF));
    }

    #[test]
    fn test_scholar_link_color() {
        // #1a0dab, the classic link blue
        assert!(is_highlighted(0x1A0DAB));
        // #777777 author line
        assert!(!is_highlighted(0x777777));
    }

    #[test]
    fn test_blue_must_beat_both_channels() {
        assert!(!is_highlighted(0x00FFFF)); // cyan: b == g
        assert!(!is_highlighted(0xFF00FF)); // magenta: b == r
        assert!(is_highlighted(0x1020FF));
    }

    #[test]
    fn test_rgb_channels() {
        assert_eq!(rgb_channels(0x123456), (0x12, 0x34, 0x56));
        assert_eq!(rgb_channels(0xFF123456), (0x12, 0x34, 0x56));
    }

    #[test]
    fn test_exact_color() {
        let c = ExactColor(0x1A0DAB);
        assert!(c.is_highlighted(0x1A0DAB));
        assert!(c.is_highlighted(0xFF1A0DAB));
        assert!(!c.is_highlighted(0x0000FF));
    }
}
