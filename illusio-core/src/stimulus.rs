/// What the presentation layer is asked to draw on a given frame.
///
/// Lengths are in pixels and may be negative for an over-adjusted test
/// line; the renderer decides how to show that.
#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    Fixation,
    Text {
        content: String,
        size: f32,
    },
    MullerLyer {
        angle_deg: i32,
        reference_length: i32,
        test_length: i32,
    },
    Ponzo {
        top_length: i32,
        bottom_length: i32,
    },
}

impl Stimulus {
    pub fn text(content: impl Into<String>, size: f32) -> Self {
        Stimulus::Text {
            content: content.into(),
            size,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Stimulus::Text { .. })
    }
}
